//! CSV adapter for the combined question/history table.
//!
//! One file holds both the question bank and the per-question history
//! columns. The adapter normalizes the source's column names at the load
//! boundary, fills the placeholder for empty option cells, and on persist
//! rewrites the table with the three history columns updated while every
//! other column and the row order are preserved.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::debug;

use quiz_core::model::{
    CategoryName, HistoryLedger, HistoryRecord, OPTION_COUNT, QuestionBank, QuestionRecord,
};

use crate::repository::{HistoryStore, QuestionSource, StorageError};

/// Placeholder for option cells left empty in the source table.
const MISSING_OPTION: &str = "N/A";

const CATEGORY_NAMES: [&str; 2] = ["Category", "Categorie"];
const QUESTION_NAMES: [&str; 2] = ["Question", "Intrebare"];
const OPTION_NAMES: [[&str; 1]; OPTION_COUNT] = [["Raspuns"], ["Raspuns 2"], ["Raspuns 3"]];
const FLAG_NAMES: [[&str; 1]; OPTION_COUNT] = [["Corect 1"], ["Corect 2"], ["Corect 3"]];
const TIMES_ASKED: &str = "Times Asked";
const CORRECT_ANSWERS: &str = "Correct Answers";
const WRONG_ANSWERS: &str = "Wrong Answers";

/// Column positions resolved from the table's header row.
#[derive(Debug, Clone)]
struct ColumnMap {
    category: usize,
    question: usize,
    options: [usize; OPTION_COUNT],
    flags: [usize; OPTION_COUNT],
    times_asked: Option<usize>,
    correct_answers: Option<usize>,
    wrong_answers: Option<usize>,
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        names
            .iter()
            .any(|name| header.trim().eq_ignore_ascii_case(name))
    })
}

fn require_column(headers: &[String], names: &[&str]) -> Result<usize, StorageError> {
    find_column(headers, names).ok_or_else(|| StorageError::MissingColumn(names[0].to_string()))
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Result<Self, StorageError> {
        let mut options = [0_usize; OPTION_COUNT];
        let mut flags = [0_usize; OPTION_COUNT];
        for index in 0..OPTION_COUNT {
            options[index] = require_column(headers, &OPTION_NAMES[index])?;
            flags[index] = require_column(headers, &FLAG_NAMES[index])?;
        }

        Ok(Self {
            category: require_column(headers, &CATEGORY_NAMES)?,
            question: require_column(headers, &QUESTION_NAMES)?,
            options,
            flags,
            times_asked: find_column(headers, &[TIMES_ASKED]),
            correct_answers: find_column(headers, &[CORRECT_ANSWERS]),
            wrong_answers: find_column(headers, &[WRONG_ANSWERS]),
        })
    }
}

/// Snapshot of the file: headers, raw rows and the resolved column map.
///
/// Captured on load and reused on persist so one session is a single pass
/// over one view of the table.
#[derive(Debug, Clone)]
struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    columns: ColumnMap,
}

impl RawTable {
    fn cell<'a>(row: &'a [String], index: usize) -> &'a str {
        row.get(index).map_or("", |value| value.trim())
    }

    fn question_text<'a>(&self, row: &'a [String]) -> &'a str {
        Self::cell(row, self.columns.question)
    }

    /// Append any history column missing from the header row.
    fn ensure_history_columns(&mut self) {
        if self.columns.times_asked.is_none() {
            self.headers.push(TIMES_ASKED.to_string());
            self.columns.times_asked = Some(self.headers.len() - 1);
        }
        if self.columns.correct_answers.is_none() {
            self.headers.push(CORRECT_ANSWERS.to_string());
            self.columns.correct_answers = Some(self.headers.len() - 1);
        }
        if self.columns.wrong_answers.is_none() {
            self.headers.push(WRONG_ANSWERS.to_string());
            self.columns.wrong_answers = Some(self.headers.len() - 1);
        }
    }
}

fn set_cell(row: &mut Vec<String>, index: usize, value: String) {
    if row.len() <= index {
        row.resize(index + 1, String::new());
    }
    row[index] = value;
}

fn parse_flag(raw: &str) -> Result<bool, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(false);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Ok(false);
    }
    match trimmed.parse::<f64>() {
        Ok(value) => Ok(value != 0.0),
        Err(_) => Err(format!("unrecognized correctness flag {trimmed:?}")),
    }
}

fn parse_counter(raw: &str) -> Result<u32, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| format!("unrecognized counter value {trimmed:?}"))
}

fn read_table(path: &Path) -> Result<RawTable, StorageError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| StorageError::Io(e.to_string()))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| StorageError::Io(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record: StringRecord = result.map_err(|e| StorageError::Malformed(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable {
        headers,
        rows,
        columns,
    })
}

fn record_from_row(
    columns: &ColumnMap,
    line: usize,
    row: &[String],
) -> Result<QuestionRecord, StorageError> {
    let malformed = |message: String| StorageError::Malformed(format!("row {line}: {message}"));

    let category = CategoryName::new(RawTable::cell(row, columns.category))
        .map_err(|e| malformed(e.to_string()))?;

    let mut options: [String; OPTION_COUNT] = Default::default();
    for (slot, index) in options.iter_mut().zip(columns.options) {
        let raw = RawTable::cell(row, index);
        *slot = if raw.is_empty() {
            MISSING_OPTION.to_string()
        } else {
            raw.to_string()
        };
    }

    let mut flags = [false; OPTION_COUNT];
    for (slot, index) in flags.iter_mut().zip(columns.flags) {
        *slot = parse_flag(RawTable::cell(row, index)).map_err(malformed)?;
    }

    QuestionRecord::new(
        RawTable::cell(row, columns.question),
        category,
        options,
        flags,
    )
    .map_err(|e| StorageError::Malformed(format!("row {line}: {e}")))
}

fn history_from_row(
    columns: &ColumnMap,
    line: usize,
    row: &[String],
) -> Result<HistoryRecord, StorageError> {
    let malformed = |message: String| StorageError::Malformed(format!("row {line}: {message}"));

    let counter = |index: Option<usize>| -> Result<u32, StorageError> {
        index.map_or(Ok(0), |index| {
            parse_counter(RawTable::cell(row, index)).map_err(malformed)
        })
    };

    let times_asked = counter(columns.times_asked)?;
    let correct = counter(columns.correct_answers)?;
    let wrong = counter(columns.wrong_answers)?;
    HistoryRecord::from_persisted(times_asked, correct, wrong)
        .map_err(|e| StorageError::Malformed(format!("row {line}: {e}")))
}

fn write_table(path: &Path, table: &RawTable) -> Result<(), StorageError> {
    let io_err = |e: std::io::Error| StorageError::Io(e.to_string());
    let csv_err = |e: csv::Error| StorageError::Io(e.to_string());

    // Write a sibling temp file first so a failed write never truncates the
    // original table.
    let tmp = path.with_extension("tmp");
    {
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_path(&tmp)
            .map_err(csv_err)?;
        writer.write_record(&table.headers).map_err(csv_err)?;
        for row in &table.rows {
            let mut padded = row.clone();
            if padded.len() < table.headers.len() {
                padded.resize(table.headers.len(), String::new());
            }
            writer.write_record(&padded).map_err(csv_err)?;
        }
        writer.flush().map_err(io_err)?;
    }
    fs::rename(&tmp, path).map_err(io_err)
}

/// File-backed store for the combined question/history table.
#[derive(Clone)]
pub struct CsvTableStore {
    path: PathBuf,
    table: Arc<Mutex<Option<RawTable>>>,
}

impl CsvTableStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QuestionSource for CsvTableStore {
    async fn load_bank(&self) -> Result<QuestionBank, StorageError> {
        let table = read_table(&self.path)?;

        let mut records = Vec::with_capacity(table.rows.len());
        for (offset, row) in table.rows.iter().enumerate() {
            // header line is 1, data starts at 2
            records.push(record_from_row(&table.columns, offset + 2, row)?);
        }
        debug!(
            path = %self.path.display(),
            rows = records.len(),
            "loaded question table"
        );

        let mut guard = self
            .table
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        *guard = Some(table);

        Ok(QuestionBank::from_records(records))
    }
}

#[async_trait]
impl HistoryStore for CsvTableStore {
    async fn load_history(&self, bank: &QuestionBank) -> Result<HistoryLedger, StorageError> {
        let mut guard = self
            .table
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        if guard.is_none() {
            *guard = Some(read_table(&self.path)?);
        }
        let table = guard
            .as_ref()
            .ok_or_else(|| StorageError::Io("table snapshot unavailable".to_string()))?;

        let mut persisted = Vec::with_capacity(table.rows.len());
        for (offset, row) in table.rows.iter().enumerate() {
            let text = table.question_text(row);
            if text.is_empty() {
                continue;
            }
            let record = history_from_row(&table.columns, offset + 2, row)?;
            persisted.push((text.to_string(), record));
        }

        Ok(HistoryLedger::for_bank(bank, persisted))
    }

    async fn persist_history(&self, ledger: &HistoryLedger) -> Result<(), StorageError> {
        let mut guard = self
            .table
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        if guard.is_none() {
            *guard = Some(read_table(&self.path)?);
        }
        let table = guard
            .as_mut()
            .ok_or_else(|| StorageError::Io("table snapshot unavailable".to_string()))?;

        table.ensure_history_columns();
        let columns = table.columns.clone();
        let mut updated = 0_usize;
        for row in &mut table.rows {
            let text = RawTable::cell(row, columns.question).to_string();
            let Some(record) = ledger.get(&text) else {
                continue;
            };
            if let Some(index) = columns.times_asked {
                set_cell(row, index, record.times_asked().to_string());
            }
            if let Some(index) = columns.correct_answers {
                set_cell(row, index, record.correct_answers().to_string());
            }
            if let Some(index) = columns.wrong_answers {
                set_cell(row, index, record.wrong_answers().to_string());
            }
            updated += 1;
        }

        write_table(&self.path, table)?;
        debug!(
            path = %self.path.display(),
            rows = updated,
            "persisted history columns"
        );
        Ok(())
    }
}
