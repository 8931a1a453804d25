#![forbid(unsafe_code)]

pub mod csv_file;
pub mod repository;

pub use csv_file::CsvTableStore;
pub use repository::{HistoryStore, InMemoryStore, QuestionSource, Storage, StorageError};
