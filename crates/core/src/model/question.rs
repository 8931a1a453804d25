use std::fmt;

use thiserror::Error;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("category name cannot be empty")]
    EmptyCategory,

    #[error("question text cannot be empty")]
    EmptyText,

    #[error("answer option {index} cannot be empty")]
    EmptyOption { index: usize },
}

/// Validated category label (trimmed, non-empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a validated category name.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyCategory` if the name is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, QuestionError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QuestionError::EmptyCategory);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single quiz question: text, category, three option texts and the
/// per-option correctness flags from the source table.
///
/// The question text doubles as the record's identity once a bank has been
/// deduplicated. Flag combinations are not validated here; whether an answer
/// key resolves is the grader's judgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    text: String,
    category: CategoryName,
    options: [String; OPTION_COUNT],
    correct: [bool; OPTION_COUNT],
}

impl QuestionRecord {
    /// Create a validated question record.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` if the question text is blank and
    /// `QuestionError::EmptyOption` for a blank option cell.
    pub fn new(
        text: impl Into<String>,
        category: CategoryName,
        options: [String; OPTION_COUNT],
        correct: [bool; OPTION_COUNT],
    ) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let mut trimmed: [String; OPTION_COUNT] = Default::default();
        for (index, option) in options.into_iter().enumerate() {
            let option = option.trim().to_string();
            if option.is_empty() {
                return Err(QuestionError::EmptyOption { index });
            }
            trimmed[index] = option;
        }

        Ok(Self {
            text,
            category,
            options: trimmed,
            correct,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn category(&self) -> &CategoryName {
        &self.category
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn correct_flags(&self) -> [bool; OPTION_COUNT] {
        self.correct
    }
}
