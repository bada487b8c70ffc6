use clap::Parser;
use keybench::{
    iso8601, registry, run_write, ConnectionConfig, KeyLog, KeyStrategy, PgStore, ReadPlan,
    WriteOptions, BATCH_SIZE, DEFAULT_ROW_COUNT,
};
use std::path::PathBuf;
use tracing::info;

/// Measure insert and point-lookup latency of a Postgres table keyed by
/// different primary-key strategies.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct App {
    #[arg(value_enum, ignore_case = true)]
    action: Action,

    /// bigserial, uuid1, uuid4, uuid6 or uuid7.
    #[arg(value_parser = parse_strategy)]
    key_strategy: &'static KeyStrategy,

    /// The number of rows to insert or select.
    #[arg(
        default_value_t = DEFAULT_ROW_COUNT,
        value_parser = clap::value_parser!(u64).range(1..),
        allow_negative_numbers = true
    )]
    row_count: u64,

    #[arg(long, default_value_t = BATCH_SIZE as u64, env = "KEYBENCH_BATCH_SIZE",
          value_parser = clap::value_parser!(u64).range(1..))]
    batch_size: u64,

    #[arg(long, env = "POSTGRES_HOST")]
    host: String,

    #[arg(long, env = "POSTGRES_PORT")]
    port: u16,

    #[arg(long, env = "POSTGRES_DB")]
    database: String,

    #[arg(long, env = "POSTGRES_USER")]
    user: String,

    #[arg(long, env = "POSTGRES_PASSWORD", hide_env_values = true)]
    password: String,

    /// Directory holding the key logs.
    #[arg(long, env = "DATA_DIR")]
    data_dir: PathBuf,

    #[clap(long, default_value = "info", env = "KEYBENCH_LOG")]
    log_level: tracing_subscriber::filter::LevelFilter,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Action {
    Insert,
    Select,
}

impl App {
    fn connection(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }
}

fn parse_strategy(name: &str) -> Result<&'static KeyStrategy, String> {
    registry().lookup(name).ok_or_else(|| {
        format!(
            "Unknown key strategy '{name}', expected one of: {}",
            registry().names().collect::<Vec<_>>().join(", ")
        )
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = App::parse();
    keybench::setup_logging(app.log_level)?;

    let strategy = app.key_strategy;
    let key_log = KeyLog::new(&app.data_dir, strategy.name());
    info!(
        "keybench version: {}, action: {:?}, strategy: {}, rows: {}",
        env!("CARGO_PKG_VERSION"),
        app.action,
        strategy.name(),
        app.row_count
    );

    match app.action {
        Action::Insert => insert_keys(&app, strategy, &key_log).await?,
        Action::Select => select_keys(&app, strategy, &key_log).await?,
    }

    println!("Done!");
    Ok(())
}

async fn insert_keys(app: &App, strategy: &KeyStrategy, key_log: &KeyLog) -> anyhow::Result<()> {
    println!("Inserting keys...");
    let options = WriteOptions {
        row_count: app.row_count,
        batch_size: app.batch_size as usize,
    };

    let mut store = PgStore::connect(&app.connection()).await?;
    let report = run_write(&mut store, strategy, key_log, &options).await?;
    store.close().await?;

    println!("Total time = {}", iso8601(report.elapsed));
    Ok(())
}

async fn select_keys(app: &App, strategy: &KeyStrategy, key_log: &KeyLog) -> anyhow::Result<()> {
    println!("Selecting keys...");
    let Some(plan) = ReadPlan::prepare(strategy, key_log, app.row_count as usize)? else {
        println!("The data file not found: {}", key_log.path().display());
        return Ok(());
    };
    println!("The number of IDs in the file: {}", plan.total_keys());
    println!("The number of IDs to read: {}", plan.keys().len());

    let mut store = PgStore::connect(&app.connection()).await?;
    let report = plan.run(&mut store).await?;
    store.close().await?;

    println!("Total time = {}", iso8601(report.elapsed));
    Ok(())
}
