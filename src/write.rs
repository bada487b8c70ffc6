//! The write benchmark: generate keys, log them, insert them in batches and
//! time only the batch executions.

use std::time::Duration;

use rand::RngCore;
use tracing::{debug, info};

use crate::engine::{Batch, BenchEngine};
use crate::key_log::{KeyLog, KeyLogWriter};
use crate::strategy::KeyStrategy;
use crate::timer::Stopwatch;
use crate::{Error, Result, BATCH_SIZE, DEFAULT_ROW_COUNT, VALUE_SIZE};

#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub row_count: u64,

    /// Pending inserts that trigger a batch execution.
    pub batch_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            row_count: DEFAULT_ROW_COUNT,
            batch_size: BATCH_SIZE,
        }
    }
}

impl WriteOptions {
    pub fn with_rows(row_count: u64) -> Self {
        WriteOptions {
            row_count,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    /// Rows generated, logged and inserted.
    pub rows: u64,

    /// Batch executions issued.
    pub batches: u64,

    /// Total time spent executing batches.
    pub elapsed: Duration,
}

/// Write `options.row_count` rows keyed by `strategy` and append every key to
/// `key_log`.
///
/// The table is created first when missing. Pending inserts are executed
/// whenever `options.batch_size` of them are queued, and once more for the
/// remainder. The key log is flushed before each execution, so a key that
/// reaches the database is always in the log. Only the execution calls are
/// timed.
pub async fn run_write<E>(
    engine: &mut E,
    strategy: &KeyStrategy,
    key_log: &KeyLog,
    options: &WriteOptions,
) -> Result<WriteReport>
where
    E: BenchEngine,
{
    if options.batch_size == 0 {
        return Err(Error::InvalidBatchSize);
    }

    engine.create_table(strategy.create_table_sql()).await?;
    debug!(strategy = strategy.name(), "Table ready");

    let mut writer = key_log.appender()?;
    let mut batch = Batch::with_capacity(
        strategy.kind(),
        options.batch_size.min(options.row_count as usize),
    );
    let mut stopwatch = Stopwatch::new();
    let mut rng = rand::thread_rng();

    for _ in 0..options.row_count {
        let key = strategy.generate();
        writer.append(&key)?;

        let mut value = vec![0; VALUE_SIZE];
        rng.fill_bytes(&mut value);
        batch.push(key, value)?;

        if batch.len() == options.batch_size {
            flush(engine, strategy, &mut writer, &mut batch, &mut stopwatch).await?;
        }
    }

    if !batch.is_empty() {
        flush(engine, strategy, &mut writer, &mut batch, &mut stopwatch).await?;
    }

    let report = WriteReport {
        rows: writer.appended(),
        batches: stopwatch.windows(),
        elapsed: stopwatch.total(),
    };
    info!(
        strategy = strategy.name(),
        rows = report.rows,
        batches = report.batches,
        elapsed = ?report.elapsed,
        "Write benchmark complete"
    );
    Ok(report)
}

async fn flush<E>(
    engine: &mut E,
    strategy: &KeyStrategy,
    writer: &mut KeyLogWriter,
    batch: &mut Batch,
    stopwatch: &mut Stopwatch,
) -> Result<()>
where
    E: BenchEngine,
{
    writer.flush()?;
    let written = stopwatch
        .measure(engine.execute_batch(strategy.insert_sql(), batch))
        .await?;
    debug!(
        strategy = strategy.name(),
        batch = stopwatch.windows(),
        rows = written,
        "Executed batch"
    );
    batch.clear();
    Ok(())
}
