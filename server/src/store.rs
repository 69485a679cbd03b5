//! Server-side weather data store
//!
//! Records are held behind a single lock as an `Arc` snapshot. A reload parses
//! the whole source first and only then swaps the snapshot in, so readers see
//! either the old collection or the new one and a failed reload leaves the
//! served data untouched.

use log::info;
use shared::WeatherRecord;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinError;

/// Lines that make up one record: name, today, tomorrow, in 2 days
pub const LINES_PER_RECORD: usize = 4;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read data source {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("data source is malformed: {0}")]
    Malformed(String),
    #[error("reading the data source was interrupted: {0}")]
    Interrupted(#[from] JoinError),
}

/// Line-oriented source of weather records. Reads may block; the store runs
/// them on the blocking pool.
pub trait RecordSource: Send + Sync {
    fn read_lines(&self) -> Result<Vec<String>, LoadError>;
}

/// Record source backed by a text file on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for FileSource {
    fn read_lines(&self) -> Result<Vec<String>, LoadError> {
        let contents =
            std::fs::read_to_string(&self.path).map_err(|source| LoadError::Unreadable {
                path: self.path.clone(),
                source,
            })?;
        Ok(contents.lines().map(str::to_string).collect())
    }
}

impl RecordSource for Vec<String> {
    fn read_lines(&self) -> Result<Vec<String>, LoadError> {
        Ok(self.clone())
    }
}

/// Groups lines into records of four. Blank lines at the end of the source
/// are ignored; a source that stops mid-record is rejected.
pub fn parse_records(mut lines: Vec<String>) -> Result<Vec<WeatherRecord>, LoadError> {
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    if lines.len() % LINES_PER_RECORD != 0 {
        return Err(LoadError::Malformed(format!(
            "{} lines is not a multiple of {}",
            lines.len(),
            LINES_PER_RECORD
        )));
    }

    lines
        .chunks(LINES_PER_RECORD)
        .enumerate()
        .map(|(index, chunk)| {
            let name = chunk[0].trim();
            if name.is_empty() {
                return Err(LoadError::Malformed(format!(
                    "record {} has an empty city name",
                    index + 1
                )));
            }
            Ok(WeatherRecord::new(
                name,
                chunk[1].as_str(),
                chunk[2].as_str(),
                chunk[3].as_str(),
            ))
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct DataStore {
    records: RwLock<Arc<Vec<WeatherRecord>>>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<WeatherRecord>) -> Self {
        Self {
            records: RwLock::new(Arc::new(records)),
        }
    }

    /// Replaces the whole collection from `source`, returning the new record
    /// count. On error the previous collection stays in place.
    pub async fn reload<S>(&self, source: Arc<S>) -> Result<usize, LoadError>
    where
        S: RecordSource + ?Sized + 'static,
    {
        let lines = tokio::task::spawn_blocking(move || source.read_lines()).await??;
        let records = parse_records(lines)?;
        let count = records.len();

        *self.records.write().await = Arc::new(records);

        info!("Loaded {} city records", count);
        Ok(count)
    }

    /// Current snapshot; stays valid even if a reload swaps in a new one.
    pub async fn snapshot(&self) -> Arc<Vec<WeatherRecord>> {
        Arc::clone(&*self.records.read().await)
    }

    pub async fn find_by_name(&self, name: &str) -> Option<WeatherRecord> {
        self.snapshot()
            .await
            .iter()
            .find(|record| record.name() == name)
            .cloned()
    }

    pub async fn all_names(&self) -> Vec<String> {
        self.snapshot()
            .await
            .iter()
            .map(|record| record.name().to_string())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.snapshot().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
