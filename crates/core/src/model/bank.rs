use std::collections::HashSet;

use super::question::{CategoryName, QuestionRecord};

/// Normalized view of the loaded question records.
///
/// The bank preserves the source's relative record order; lookups and
/// deduplication never reorder what they return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    records: Vec<QuestionRecord>,
}

impl QuestionBank {
    #[must_use]
    pub fn from_records(records: Vec<QuestionRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in the given category, original relative order preserved.
    #[must_use]
    pub fn by_category(&self, category: &CategoryName) -> Vec<&QuestionRecord> {
        self.records
            .iter()
            .filter(|record| record.category() == category)
            .collect()
    }

    /// Distinct categories, in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<&CategoryName> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(QuestionRecord::category)
            .filter(|category| seen.insert(*category))
            .collect()
    }

    /// Removes records with a repeated question text, keeping the first
    /// occurrence.
    ///
    /// Later occurrences are dropped even when their other fields differ;
    /// the source tables carry occasional copy-paste duplicates and the
    /// first row wins.
    #[must_use]
    pub fn deduplicate(self) -> Self {
        let mut seen = HashSet::new();
        let records = self
            .records
            .into_iter()
            .filter(|record| seen.insert(record.text().to_string()))
            .collect();
        Self { records }
    }
}
