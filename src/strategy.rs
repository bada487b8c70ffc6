//! Primary-key strategies under benchmark.
//!
//! A [`KeyStrategy`] bundles everything a benchmark run needs to know about one
//! kind of key: how to generate the next key, how to read it back from the key
//! log, and the SQL used to create, fill and query its table. The built-in
//! strategies live in a process-wide [`Registry`], see [`registry`].

use std::fmt::Display;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use uuid::{Timestamp, Uuid};

use crate::{Error, Result};

/// A single primary key in its native representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Serial(i64),
    Uuid(Uuid),
}

impl Key {
    pub fn kind(&self) -> KeyKind {
        match self {
            Key::Serial(_) => KeyKind::Serial,
            Key::Uuid(_) => KeyKind::Uuid,
        }
    }
}

/// Canonical text form, as written to the key log.
impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Serial(id) => write!(f, "{id}"),
            Key::Uuid(id) => write!(f, "{}", id.hyphenated()),
        }
    }
}

/// The database column type a strategy's keys are bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Serial,
    Uuid,
}

impl KeyKind {
    /// Postgres element type used for the key array in batch inserts.
    fn array_cast(&self) -> &'static str {
        match self {
            KeyKind::Serial => "int8",
            KeyKind::Uuid => "uuid",
        }
    }

    fn column_type(&self) -> &'static str {
        match self {
            KeyKind::Serial => "BIGSERIAL",
            KeyKind::Uuid => "uuid",
        }
    }
}

impl Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serial => write!(f, "serial"),
            Self::Uuid => write!(f, "uuid"),
        }
    }
}

/// 100 ns intervals between the Gregorian reform (1582-10-15) and the Unix epoch.
const GREGORIAN_OFFSET: u64 = 0x01B2_1DD2_1381_4000;

/// Strictly increasing 100 ns Gregorian ticks for v1 and v6 keys.
///
/// Two keys never share a tick, so the clock sequence stays fixed and v6 keys
/// sort byte-wise in generation order.
#[derive(Debug)]
pub struct TickClock {
    last: AtomicU64,
    clock_seq: u16,
}

impl TickClock {
    pub fn new(clock_seq: u16) -> Self {
        TickClock {
            last: AtomicU64::new(0),
            clock_seq: clock_seq & 0x3FFF,
        }
    }

    pub fn next_tick(&self) -> u64 {
        let now = gregorian_now();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }

    pub fn next_timestamp(&self) -> Timestamp {
        Timestamp::from_gregorian_time(self.next_tick(), self.clock_seq)
    }
}

fn gregorian_now() -> u64 {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    GREGORIAN_OFFSET + (since_epoch.as_nanos() / 100) as u64
}

/// Produces keys for one strategy.
#[derive(Debug)]
pub enum KeyGenerator {
    /// Process-local counter, the first key is 1.
    Sequence(AtomicI64),
    /// UUID v1.
    TimeBased { node_id: [u8; 6], clock: TickClock },
    /// UUID v4.
    Random,
    /// UUID v6.
    TimeReordered { node_id: [u8; 6], clock: TickClock },
    /// UUID v7.
    TimeEpoch,
}

impl KeyGenerator {
    pub fn sequence() -> Self {
        KeyGenerator::Sequence(AtomicI64::new(0))
    }

    pub fn next_key(&self) -> Key {
        match self {
            KeyGenerator::Sequence(counter) => {
                Key::Serial(counter.fetch_add(1, Ordering::SeqCst) + 1)
            }
            KeyGenerator::TimeBased { node_id, clock } => {
                Key::Uuid(Uuid::new_v1(clock.next_timestamp(), node_id))
            }
            KeyGenerator::Random => Key::Uuid(Uuid::new_v4()),
            KeyGenerator::TimeReordered { node_id, clock } => {
                Key::Uuid(Uuid::new_v6(clock.next_timestamp(), node_id))
            }
            KeyGenerator::TimeEpoch => Key::Uuid(Uuid::now_v7()),
        }
    }
}

#[derive(Debug)]
pub struct KeyStrategy {
    name: &'static str,
    kind: KeyKind,
    generator: KeyGenerator,
    create_table_sql: String,
    insert_sql: String,
    select_sql: String,
}

impl KeyStrategy {
    /// Build a strategy whose statements target `table`, with an `id` column
    /// of the key's native type and a nullable `value` payload column.
    pub fn new(name: &'static str, table: &str, kind: KeyKind, generator: KeyGenerator) -> Self {
        let create_table_sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
             id {} NOT NULL, \
             value bytea NULL, \
             CONSTRAINT \"{table}_pk\" PRIMARY KEY (id))",
            kind.column_type()
        );
        let insert_sql = format!(
            "INSERT INTO {table} (id, value) SELECT * FROM UNNEST($1::{}[], $2::bytea[])",
            kind.array_cast()
        );
        let select_sql = format!("SELECT value FROM {table} WHERE id = $1");

        KeyStrategy {
            name,
            kind,
            generator,
            create_table_sql,
            insert_sql,
            select_sql,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Generate the next key. Called once per written row.
    pub fn generate(&self) -> Key {
        self.generator.next_key()
    }

    /// Rebuild a key from its canonical text form.
    pub fn parse(&self, text: &str) -> Result<Key> {
        let text = text.trim();
        let invalid = |reason: String| Error::InvalidKey {
            line: 0,
            value: text.to_string(),
            reason,
        };
        match self.kind {
            KeyKind::Serial => text
                .parse::<i64>()
                .map(Key::Serial)
                .map_err(|e| invalid(e.to_string())),
            KeyKind::Uuid => Uuid::parse_str(text)
                .map(Key::Uuid)
                .map_err(|e| invalid(e.to_string())),
        }
    }

    pub fn create_table_sql(&self) -> &str {
        &self.create_table_sql
    }

    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }
}

/// Named set of key strategies. Lookups ignore case.
#[derive(Debug)]
pub struct Registry {
    strategies: Vec<KeyStrategy>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// The five built-in strategies. Every call yields fresh generators, so
    /// the bigserial sequence starts again from 1.
    pub fn builtin() -> Registry {
        let mut rng = rand::thread_rng();
        let node_id: [u8; 6] = rng.gen();

        Registry {
            strategies: vec![
                KeyStrategy::new(
                    "bigserial",
                    "uuid_long",
                    KeyKind::Serial,
                    KeyGenerator::sequence(),
                ),
                KeyStrategy::new(
                    "uuid1",
                    "uuid_v1",
                    KeyKind::Uuid,
                    KeyGenerator::TimeBased {
                        node_id,
                        clock: TickClock::new(rng.gen()),
                    },
                ),
                KeyStrategy::new("uuid4", "uuid_v4", KeyKind::Uuid, KeyGenerator::Random),
                KeyStrategy::new(
                    "uuid6",
                    "uuid_v6",
                    KeyKind::Uuid,
                    KeyGenerator::TimeReordered {
                        node_id,
                        clock: TickClock::new(rng.gen()),
                    },
                ),
                KeyStrategy::new("uuid7", "uuid_v7", KeyKind::Uuid, KeyGenerator::TimeEpoch),
            ],
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&KeyStrategy> {
        self.strategies
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Strategy names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.iter().map(|s| s.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyStrategy> {
        self.strategies.iter()
    }
}

/// The process-wide registry, built on first use.
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::builtin)
}
