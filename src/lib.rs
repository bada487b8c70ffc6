pub mod config;
pub mod engine;
mod error;
pub mod key_log;
pub mod read;
pub mod store;
pub mod strategy;
pub mod timer;
pub mod write;

pub use config::ConnectionConfig;
pub use engine::{Batch, BenchEngine, KeyColumn};
pub use error::Error;
pub use key_log::{KeyLog, SampleSet};
pub use read::{run_read, ReadOutcome, ReadPlan, ReadReport};
pub use store::PgStore;
pub use strategy::{registry, Key, KeyKind, KeyStrategy, Registry};
pub use timer::{iso8601, Stopwatch};
pub use write::{run_write, WriteOptions, WriteReport};

use tracing::level_filters::LevelFilter;

/// Number of rows written or looked up when no row count is given.
pub const DEFAULT_ROW_COUNT: u64 = 1_000_000;

/// Number of pending inserts that triggers a batch execution.
pub const BATCH_SIZE: usize = 10_000;

/// Size in bytes of the payload stored alongside every key.
pub const VALUE_SIZE: usize = 1024;

/// Extension of the per-strategy key log files.
pub const KEY_LOG_EXTENSION: &str = "csv";

pub type Result<T> = std::result::Result<T, Error>;

/// Install a global stderr subscriber at the given level and forward `log`
/// records from dependencies into it.
pub fn setup_logging(level: LevelFilter) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}
