use std::collections::HashSet;

use keybench::{registry, Key, KeyKind, Registry, SampleSet};
use rand::{rngs::StdRng, SeedableRng};

#[test]
fn lookup_ignores_case() {
    let registry = Registry::builtin();
    for name in ["bigserial", "BigSerial", "UUID7", "uuid4", " uuid6 "] {
        assert!(registry.lookup(name).is_some(), "{name}");
    }
    assert!(registry.lookup("uuid5").is_none());
    assert!(registry.lookup("").is_none());
}

#[test]
fn builtin_names_in_registration_order() {
    let names: Vec<_> = registry().names().collect();
    assert_eq!(names, vec!["bigserial", "uuid1", "uuid4", "uuid6", "uuid7"]);
}

#[test]
fn statements_target_a_table_per_strategy() {
    let registry = Registry::builtin();
    let tables: HashSet<_> = registry
        .iter()
        .map(|s| {
            let select = s.select_sql();
            assert!(s.insert_sql().contains("$1") && s.insert_sql().contains("$2"));
            assert!(s.create_table_sql().starts_with("CREATE TABLE IF NOT EXISTS"));
            select.split_whitespace().nth(3).unwrap().to_string()
        })
        .collect();
    assert_eq!(tables.len(), 5);

    let serial = registry.lookup("bigserial").unwrap();
    assert_eq!(serial.kind(), KeyKind::Serial);
    assert!(serial.insert_sql().contains("$1::int8[]"));

    let uuid = registry.lookup("uuid7").unwrap();
    assert_eq!(uuid.kind(), KeyKind::Uuid);
    assert!(uuid.insert_sql().contains("$1::uuid[]"));
    assert!(uuid.create_table_sql().contains("id uuid NOT NULL"));
}

#[test]
fn bigserial_counts_from_one() {
    let registry = Registry::builtin();
    let strategy = registry.lookup("bigserial").unwrap();
    let keys: Vec<_> = (0..3).map(|_| strategy.generate()).collect();
    assert_eq!(keys, vec![Key::Serial(1), Key::Serial(2), Key::Serial(3)]);
}

#[test]
fn uuid_strategies_produce_their_version() {
    let registry = Registry::builtin();
    for (name, version) in [("uuid1", 1), ("uuid4", 4), ("uuid6", 6), ("uuid7", 7)] {
        let strategy = registry.lookup(name).unwrap();
        match strategy.generate() {
            Key::Uuid(id) => assert_eq!(id.get_version_num(), version, "{name}"),
            other => panic!("{name} generated {other:?}"),
        }
    }
}

#[test]
fn time_ordered_keys_sort_in_generation_order() {
    let registry = Registry::builtin();
    for name in ["uuid6", "uuid7"] {
        let strategy = registry.lookup(name).unwrap();
        let keys: Vec<_> = (0..100_000)
            .map(|_| match strategy.generate() {
                Key::Uuid(id) => id,
                other => panic!("{name} generated {other:?}"),
            })
            .collect();
        for (i, w) in keys.windows(2).enumerate() {
            assert!(
                w[0].as_bytes() < w[1].as_bytes(),
                "{name}: key {} ({}) does not sort after key {i} ({})",
                i + 1,
                w[1],
                w[0]
            );
        }
    }
}

#[test]
fn uuid1_ticks_strictly_increase() {
    let registry = Registry::builtin();
    let strategy = registry.lookup("uuid1").unwrap();
    let ticks: Vec<_> = (0..10_000)
        .map(|_| match strategy.generate() {
            Key::Uuid(id) => id.get_timestamp().expect("time-based uuid").to_gregorian().0,
            other => panic!("uuid1 generated {other:?}"),
        })
        .collect();
    assert!(ticks.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn parse_is_the_inverse_of_display() -> keybench::Result<()> {
    let registry = Registry::builtin();
    for strategy in registry.iter() {
        for _ in 0..10 {
            let key = strategy.generate();
            assert_eq!(strategy.parse(&key.to_string())?, key);
        }
    }
    Ok(())
}

#[test]
fn parse_rejects_foreign_text() {
    let registry = Registry::builtin();
    assert!(registry.lookup("bigserial").unwrap().parse("abc").is_err());
    assert!(registry
        .lookup("uuid4")
        .unwrap()
        .parse("12345")
        .is_err());
}

#[test]
fn sample_has_no_duplicates() {
    let mut rng = StdRng::seed_from_u64(7);
    let sample = SampleSet::draw_with(&mut rng, 100, 1_000);
    assert_eq!(sample.len(), 100);
    assert!(sample.iter().all(|offset| offset < 1_000));
    assert_eq!(sample.iter().collect::<HashSet<_>>().len(), 100);
}

#[test]
fn oversized_sample_takes_every_line() {
    let sample = SampleSet::draw(50, 10);
    assert_eq!(sample.iter().collect::<Vec<_>>(), (0..10).collect::<Vec<_>>());

    let empty = SampleSet::draw(50, 0);
    assert!(empty.is_empty());
    assert!(!empty.contains(0));
}
