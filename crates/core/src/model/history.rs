use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bank::QuestionBank;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HistoryError {
    #[error("outcome counters ({correct} correct + {wrong} wrong) exceed times asked ({asked})")]
    CountOverflow { asked: u32, correct: u32, wrong: u32 },
}

/// Cumulative counters for one question text.
///
/// Counters only ever grow within a session; persistence happens as a whole
/// at session end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    times_asked: u32,
    correct_answers: u32,
    wrong_answers: u32,
}

impl HistoryRecord {
    /// Rehydrate a record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::CountOverflow` if the outcome counters exceed
    /// the number of times the question was asked.
    pub fn from_persisted(
        times_asked: u32,
        correct_answers: u32,
        wrong_answers: u32,
    ) -> Result<Self, HistoryError> {
        if correct_answers.saturating_add(wrong_answers) > times_asked {
            return Err(HistoryError::CountOverflow {
                asked: times_asked,
                correct: correct_answers,
                wrong: wrong_answers,
            });
        }
        Ok(Self {
            times_asked,
            correct_answers,
            wrong_answers,
        })
    }

    /// Count one graded attempt. Not idempotent: call exactly once per
    /// graded question.
    pub fn record(&mut self, was_correct: bool) {
        self.times_asked = self.times_asked.saturating_add(1);
        if was_correct {
            self.correct_answers = self.correct_answers.saturating_add(1);
        } else {
            self.wrong_answers = self.wrong_answers.saturating_add(1);
        }
    }

    #[must_use]
    pub fn times_asked(&self) -> u32 {
        self.times_asked
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn wrong_answers(&self) -> u32 {
        self.wrong_answers
    }

    /// Fraction of correct answers, `None` when the question was never asked.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        if self.times_asked == 0 {
            return None;
        }
        Some(f64::from(self.correct_answers) / f64::from(self.times_asked))
    }
}

/// In-memory history for the running process, keyed by question text.
///
/// Loaded once at initialization, mutated during sessions, persisted as a
/// whole at session end. The ledger outlives individual sessions; a restart
/// does not reset it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLedger {
    entries: BTreeMap<String, HistoryRecord>,
}

impl HistoryLedger {
    /// Build a ledger with one entry per distinct question text in `bank`,
    /// defaulting to zeros when a text is absent from `persisted`.
    ///
    /// Persisted entries for texts no longer in the bank are retained, so a
    /// trimmed bank does not erase earlier counters.
    #[must_use]
    pub fn for_bank(
        bank: &QuestionBank,
        persisted: impl IntoIterator<Item = (String, HistoryRecord)>,
    ) -> Self {
        let mut entries: BTreeMap<String, HistoryRecord> = persisted.into_iter().collect();
        for record in bank.records() {
            entries.entry(record.text().to_string()).or_default();
        }
        Self { entries }
    }

    /// Count one graded attempt for `question`. Unknown texts get a fresh
    /// zeroed entry first.
    pub fn record_attempt(&mut self, question: &str, was_correct: bool) {
        self.entries
            .entry(question.to_string())
            .or_default()
            .record(was_correct);
    }

    #[must_use]
    pub fn get(&self, question: &str) -> Option<&HistoryRecord> {
        self.entries.get(question)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HistoryRecord)> {
        self.entries.iter().map(|(text, record)| (text.as_str(), record))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
