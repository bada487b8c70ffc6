use std::future::Future;

use uuid::Uuid;

use crate::strategy::{Key, KeyKind};
use crate::{Error, Result};

/// The database operations a benchmark run drives.
///
/// Implementations execute exactly what they are given; timing is done by the
/// caller around each call.
pub trait BenchEngine {
    /// Run an idempotent create-table statement.
    fn create_table(&mut self, sql: &str) -> impl Future<Output = Result<()>>;

    /// Execute every pending insert of `batch` in one round trip, binding the
    /// key column as `$1` and the payload column as `$2`. Returns the number
    /// of rows written.
    fn execute_batch(&mut self, sql: &str, batch: &Batch) -> impl Future<Output = Result<u64>>;

    /// Run a point select bound to `key` and drain every returned row and
    /// column. Returns the number of rows read.
    fn select(&mut self, sql: &str, key: &Key) -> impl Future<Output = Result<usize>>;
}

/// Keys of a batch, kept in their native column type.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyColumn {
    Serial(Vec<i64>),
    Uuid(Vec<Uuid>),
}

impl KeyColumn {
    fn kind(&self) -> KeyKind {
        match self {
            KeyColumn::Serial(_) => KeyKind::Serial,
            KeyColumn::Uuid(_) => KeyKind::Uuid,
        }
    }
}

/// Pending insert operations, flushed as a single statement.
#[derive(Debug, Clone)]
pub struct Batch {
    keys: KeyColumn,
    values: Vec<Vec<u8>>,
}

impl Batch {
    pub fn with_capacity(kind: KeyKind, capacity: usize) -> Batch {
        let keys = match kind {
            KeyKind::Serial => KeyColumn::Serial(Vec::with_capacity(capacity)),
            KeyKind::Uuid => KeyColumn::Uuid(Vec::with_capacity(capacity)),
        };
        Batch {
            keys,
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, key: Key, value: Vec<u8>) -> Result<()> {
        match (&mut self.keys, key) {
            (KeyColumn::Serial(ids), Key::Serial(id)) => ids.push(id),
            (KeyColumn::Uuid(ids), Key::Uuid(id)) => ids.push(id),
            (column, key) => {
                return Err(Error::KeyKindMismatch {
                    expected: column.kind(),
                    found: key.kind(),
                })
            }
        }
        self.values.push(value);
        Ok(())
    }

    pub fn keys(&self) -> &KeyColumn {
        &self.keys
    }

    pub fn values(&self) -> &[Vec<u8>] {
        &self.values
    }

    /// Keys in insertion order.
    pub fn iter_keys(&self) -> Box<dyn Iterator<Item = Key> + '_> {
        match &self.keys {
            KeyColumn::Serial(ids) => Box::new(ids.iter().copied().map(Key::Serial)),
            KeyColumn::Uuid(ids) => Box::new(ids.iter().copied().map(Key::Uuid)),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        match &mut self.keys {
            KeyColumn::Serial(ids) => ids.clear(),
            KeyColumn::Uuid(ids) => ids.clear(),
        }
        self.values.clear();
    }
}
