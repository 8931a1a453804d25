use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use quiz_core::model::{HistoryLedger, HistoryRecord, QuestionBank, QuestionRecord};

use crate::csv_file::CsvTableStore;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// A required column is absent from the source table. Fatal: the
    /// session cannot start against a table the loader cannot map.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("io error: {0}")]
    Io(String),
}

/// Read side of the question bank table.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Load and normalize the question bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::MissingColumn` when a required field is absent
    /// and other `StorageError` values for unreadable rows.
    async fn load_bank(&self) -> Result<QuestionBank, StorageError>;
}

/// Durable per-question counters, loaded at initialization and persisted at
/// session end.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load counters for every distinct question text in `bank`, defaulting
    /// to zeros for texts absent from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing table cannot be read.
    async fn load_history(&self, bank: &QuestionBank) -> Result<HistoryLedger, StorageError>;

    /// Write all counters keyed by question text.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on a failed write. The caller's in-memory
    /// ledger is untouched by a failure and may be retried as-is.
    async fn persist_history(&self, ledger: &HistoryLedger) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<Mutex<Vec<QuestionRecord>>>,
    history: Arc<Mutex<BTreeMap<String, HistoryRecord>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new(records: Vec<QuestionRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            history: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Seed persisted counters, e.g. to simulate an earlier session.
    pub fn seed_history(&self, question: impl Into<String>, record: HistoryRecord) {
        if let Ok(mut guard) = self.history.lock() {
            guard.insert(question.into(), record);
        }
    }

    /// Snapshot of the persisted counters, for test inspection.
    #[must_use]
    pub fn persisted(&self) -> BTreeMap<String, HistoryRecord> {
        self.history.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl QuestionSource for InMemoryStore {
    async fn load_bank(&self) -> Result<QuestionBank, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(QuestionBank::from_records(guard.clone()))
    }
}

#[async_trait]
impl HistoryStore for InMemoryStore {
    async fn load_history(&self, bank: &QuestionBank) -> Result<HistoryLedger, StorageError> {
        let guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        let persisted: Vec<_> = guard
            .iter()
            .map(|(text, record)| (text.clone(), *record))
            .collect();
        Ok(HistoryLedger::for_bank(bank, persisted))
    }

    async fn persist_history(&self, ledger: &HistoryLedger) -> Result<(), StorageError> {
        let mut guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        *guard = ledger
            .iter()
            .map(|(text, record)| (text.to_string(), *record))
            .collect();
        Ok(())
    }
}

/// Aggregates the two ports behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub bank: Arc<dyn QuestionSource>,
    pub history: Arc<dyn HistoryStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory(records: Vec<QuestionRecord>) -> Self {
        let store = InMemoryStore::new(records);
        let bank: Arc<dyn QuestionSource> = Arc::new(store.clone());
        let history: Arc<dyn HistoryStore> = Arc::new(store);
        Self { bank, history }
    }

    /// Both ports backed by one CSV table file.
    #[must_use]
    pub fn csv(path: impl Into<PathBuf>) -> Self {
        let store = CsvTableStore::new(path);
        let bank: Arc<dyn QuestionSource> = Arc::new(store.clone());
        let history: Arc<dyn HistoryStore> = Arc::new(store);
        Self { bank, history }
    }
}
