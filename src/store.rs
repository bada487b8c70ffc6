use futures::TryStreamExt;
use sqlx::{Connection, PgConnection, Row};
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::engine::{Batch, BenchEngine, KeyColumn};
use crate::strategy::Key;
use crate::Result;

/// A [`BenchEngine`] backed by a single Postgres connection.
///
/// Statements go through sqlx's per-connection statement cache, so the insert
/// and select of a run are prepared once and reused for every call.
pub struct PgStore {
    conn: PgConnection,
}

impl PgStore {
    pub async fn connect(config: &ConnectionConfig) -> Result<PgStore> {
        debug!(?config, "Connecting");
        let conn = PgConnection::connect_with(&config.connect_options()).await?;
        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connected"
        );
        Ok(PgStore { conn })
    }

    /// Gracefully terminate the connection. Dropping the store also releases
    /// it, without the goodbye message.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

impl BenchEngine for PgStore {
    async fn create_table(&mut self, sql: &str) -> Result<()> {
        debug!(sql, "Creating table");
        sqlx::raw_sql(sql).execute(&mut self.conn).await?;
        Ok(())
    }

    async fn execute_batch(&mut self, sql: &str, batch: &Batch) -> Result<u64> {
        let query = sqlx::query(sql);
        let query = match batch.keys() {
            KeyColumn::Serial(ids) => query.bind(ids.as_slice()),
            KeyColumn::Uuid(ids) => query.bind(ids.as_slice()),
        };
        let done = query
            .bind(batch.values())
            .execute(&mut self.conn)
            .await?;
        Ok(done.rows_affected())
    }

    async fn select(&mut self, sql: &str, key: &Key) -> Result<usize> {
        let query = sqlx::query(sql);
        let query = match *key {
            Key::Serial(id) => query.bind(id),
            Key::Uuid(id) => query.bind(id),
        };

        let mut rows = query.fetch(&mut self.conn);
        let mut count = 0;
        while let Some(row) = rows.try_next().await? {
            for column in 0..row.len() {
                let _: Option<Vec<u8>> = row.try_get(column)?;
            }
            count += 1;
        }
        Ok(count)
    }
}
