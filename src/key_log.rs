//! The key log: every key a write run generated, one per line, replayed by
//! read runs.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::debug;

use crate::strategy::{Key, KeyStrategy};
use crate::{Error, Result, KEY_LOG_EXTENSION};

const LINE_ENDING: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Location of the append-only key log of one strategy.
#[derive(Debug, Clone)]
pub struct KeyLog {
    path: PathBuf,
}

impl KeyLog {
    /// The key log of `strategy` inside `data_dir`, i.e. `<data_dir>/<name>.csv`.
    pub fn new<P>(data_dir: P, strategy: &str) -> KeyLog
    where
        P: AsRef<Path>,
    {
        KeyLog {
            path: data_dir
                .as_ref()
                .join(format!("{strategy}.{KEY_LOG_EXTENSION}")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Open the log for appending, creating it when absent. Existing lines
    /// are never truncated.
    pub fn appender(&self) -> Result<KeyLogWriter> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(Error::io(&self.path))?;
        debug!(path = ?self.path.display(), "Opened key log for append");
        Ok(KeyLogWriter {
            path: self.path.clone(),
            writer: BufWriter::new(file),
            appended: 0,
        })
    }

    fn reader(&self) -> Result<BufReader<File>> {
        let file = File::open(&self.path).map_err(Error::io(&self.path))?;
        Ok(BufReader::new(file))
    }

    /// Number of lines in the log, one full sequential scan.
    pub fn count_lines(&self) -> Result<usize> {
        let mut count = 0;
        for line in self.reader()?.lines() {
            line.map_err(Error::io(&self.path))?;
            count += 1;
        }
        Ok(count)
    }

    /// Parse the lines selected by `sample`, in file order.
    pub fn read_sampled(&self, sample: &SampleSet, strategy: &KeyStrategy) -> Result<Vec<Key>> {
        let mut keys = Vec::with_capacity(sample.len());
        let mut wanted = sample.offsets.iter().peekable();

        for (offset, line) in self.reader()?.lines().enumerate() {
            let Some(&&next) = wanted.peek() else {
                break;
            };
            let line = line.map_err(Error::io(&self.path))?;
            if offset != next {
                continue;
            }
            wanted.next();

            let key = strategy.parse(&line).map_err(|e| match e {
                Error::InvalidKey { value, reason, .. } => Error::InvalidKey {
                    line: offset + 1,
                    value,
                    reason,
                },
                e => e,
            })?;
            keys.push(key);
        }
        Ok(keys)
    }
}

/// Buffered appender over a key log.
#[derive(Debug)]
pub struct KeyLogWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    appended: u64,
}

impl KeyLogWriter {
    pub fn append(&mut self, key: &Key) -> Result<()> {
        write!(self.writer, "{key}{LINE_ENDING}").map_err(Error::io(&self.path))?;
        self.appended += 1;
        Ok(())
    }

    /// Push buffered lines down to durable storage.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(Error::io(&self.path))?;
        self.writer
            .get_ref()
            .sync_data()
            .map_err(Error::io(&self.path))
    }

    /// Lines appended through this writer.
    pub fn appended(&self) -> u64 {
        self.appended
    }
}

/// Distinct line offsets drawn uniformly without replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSet {
    offsets: BTreeSet<usize>,
}

impl SampleSet {
    /// Draw `min(requested, line_count)` offsets from `[0, line_count)`.
    pub fn draw(requested: usize, line_count: usize) -> SampleSet {
        Self::draw_with(&mut rand::thread_rng(), requested, line_count)
    }

    pub fn draw_with<R>(rng: &mut R, requested: usize, line_count: usize) -> SampleSet
    where
        R: Rng + ?Sized,
    {
        let amount = requested.min(line_count);
        let offsets = rand::seq::index::sample(rng, line_count, amount)
            .into_iter()
            .collect::<BTreeSet<_>>();
        debug_assert_eq!(offsets.len(), amount);
        SampleSet { offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.offsets.contains(&offset)
    }

    /// Offsets in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.offsets.iter().copied()
    }
}
