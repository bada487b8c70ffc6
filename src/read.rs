//! The read benchmark: replay a random sample of logged keys as point lookups.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::engine::BenchEngine;
use crate::key_log::{KeyLog, SampleSet};
use crate::strategy::{Key, KeyStrategy};
use crate::timer::Stopwatch;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadReport {
    /// Keys available in the key log.
    pub total_keys: usize,

    /// Point lookups issued.
    pub lookups: usize,

    /// Rows returned across all lookups.
    pub rows: usize,

    /// Total time spent in lookups, result draining included.
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The strategy has no key log yet, nothing was read.
    NoData { path: PathBuf },
    Completed(ReadReport),
}

/// Keys sampled from a key log, ready to be looked up.
#[derive(Debug)]
pub struct ReadPlan<'a> {
    strategy: &'a KeyStrategy,
    total_keys: usize,
    keys: Vec<Key>,
}

impl<'a> ReadPlan<'a> {
    /// Sample up to `row_count` distinct keys from `key_log`.
    ///
    /// Returns `None` when the key log does not exist. The log is scanned
    /// twice: once to count its lines and once to parse the sampled ones,
    /// which are kept in file order.
    pub fn prepare(
        strategy: &'a KeyStrategy,
        key_log: &KeyLog,
        row_count: usize,
    ) -> Result<Option<ReadPlan<'a>>> {
        if !key_log.exists() {
            debug!(path = ?key_log.path().display(), "No key log");
            return Ok(None);
        }

        let total_keys = key_log.count_lines()?;
        let sample = SampleSet::draw(row_count, total_keys);
        let keys = key_log.read_sampled(&sample, strategy)?;
        debug!(
            strategy = strategy.name(),
            total_keys,
            sampled = keys.len(),
            "Prepared read plan"
        );

        Ok(Some(ReadPlan {
            strategy,
            total_keys,
            keys,
        }))
    }

    pub fn total_keys(&self) -> usize {
        self.total_keys
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Look up every sampled key, one query each. Each timing window spans
    /// issuing the query until its last row has been read.
    pub async fn run<E>(&self, engine: &mut E) -> Result<ReadReport>
    where
        E: BenchEngine,
    {
        let sql = self.strategy.select_sql();
        let mut stopwatch = Stopwatch::new();
        let mut rows = 0;

        for key in &self.keys {
            rows += stopwatch.measure(engine.select(sql, key)).await?;
        }

        let report = ReadReport {
            total_keys: self.total_keys,
            lookups: self.keys.len(),
            rows,
            elapsed: stopwatch.total(),
        };
        info!(
            strategy = self.strategy.name(),
            lookups = report.lookups,
            rows = report.rows,
            elapsed = ?report.elapsed,
            "Read benchmark complete"
        );
        Ok(report)
    }
}

/// Prepare and run a read benchmark in one go.
pub async fn run_read<E>(
    engine: &mut E,
    strategy: &KeyStrategy,
    key_log: &KeyLog,
    row_count: usize,
) -> Result<ReadOutcome>
where
    E: BenchEngine,
{
    match ReadPlan::prepare(strategy, key_log, row_count)? {
        Some(plan) => Ok(ReadOutcome::Completed(plan.run(engine).await?)),
        None => Ok(ReadOutcome::NoData {
            path: key_log.path().to_path_buf(),
        }),
    }
}
