#![allow(dead_code)]

use std::collections::BTreeMap;

use keybench::{Batch, BenchEngine, Key, Result};

/// In-memory engine that records every call the benchmark loops make.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub create_calls: Vec<String>,
    pub batch_sizes: Vec<usize>,
    pub selects: Vec<Key>,
    pub rows: BTreeMap<Key, Vec<u8>>,

    /// Fail the batch execution with this (1-based) index.
    pub fail_batch: Option<usize>,
    /// Fail the lookup with this (1-based) index.
    pub fail_select: Option<usize>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_batch(batch: usize) -> Self {
        RecordingEngine {
            fail_batch: Some(batch),
            ..Default::default()
        }
    }

    pub fn failing_on_select(select: usize) -> Self {
        RecordingEngine {
            fail_select: Some(select),
            ..Default::default()
        }
    }
}

impl BenchEngine for RecordingEngine {
    async fn create_table(&mut self, sql: &str) -> Result<()> {
        self.create_calls.push(sql.to_string());
        Ok(())
    }

    async fn execute_batch(&mut self, _sql: &str, batch: &Batch) -> Result<u64> {
        if self.fail_batch == Some(self.batch_sizes.len() + 1) {
            return Err(sqlx::Error::Protocol("injected batch failure".to_string()).into());
        }
        self.batch_sizes.push(batch.len());
        for (key, value) in batch.iter_keys().zip(batch.values()) {
            self.rows.insert(key, value.clone());
        }
        Ok(batch.len() as u64)
    }

    async fn select(&mut self, _sql: &str, key: &Key) -> Result<usize> {
        self.selects.push(*key);
        if self.fail_select == Some(self.selects.len()) {
            return Err(sqlx::Error::Protocol("injected select failure".to_string()).into());
        }
        Ok(usize::from(self.rows.contains_key(key)))
    }
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("key log should be readable")
        .lines()
        .map(str::to_string)
        .collect()
}
