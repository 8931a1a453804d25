use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("too many questions for a single session: {len}")]
    TooManyQuestions { len: usize },

    #[error("answer counts ({counted}) do not match session total ({total})")]
    CountMismatch { total: u32, counted: u32 },
}

/// Answer recorded for one presented question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredQuestion {
    chosen: String,
    was_correct: bool,
    integrity_flagged: bool,
}

impl AnsweredQuestion {
    #[must_use]
    pub fn new(chosen: impl Into<String>, was_correct: bool, integrity_flagged: bool) -> Self {
        Self {
            chosen: chosen.into(),
            was_correct,
            integrity_flagged,
        }
    }

    #[must_use]
    pub fn chosen(&self) -> &str {
        &self.chosen
    }

    #[must_use]
    pub fn was_correct(&self) -> bool {
        self.was_correct
    }

    /// True when the question's answer key did not resolve and the answer
    /// was graded wrong by default.
    #[must_use]
    pub fn integrity_flagged(&self) -> bool {
        self.integrity_flagged
    }
}

/// Aggregate summary for a quiz run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    total: u32,
    correct: u32,
    wrong: u32,
    unanswered: u32,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl SessionSummary {
    /// Rehydrate a summary from already-counted totals.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::InvalidTimeRange` if `completed_at` precedes
    /// `started_at` and `SummaryError::CountMismatch` if the outcome counts
    /// do not sum to `total`.
    pub fn from_persisted(
        total: u32,
        correct: u32,
        wrong: u32,
        unanswered: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SummaryError> {
        if completed_at < started_at {
            return Err(SummaryError::InvalidTimeRange);
        }
        let counted = correct + wrong + unanswered;
        if counted != total {
            return Err(SummaryError::CountMismatch { total, counted });
        }
        Ok(Self {
            total,
            correct,
            wrong,
            unanswered,
            started_at,
            completed_at,
        })
    }

    /// Build a summary from the per-index recorded answers of a run.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::InvalidTimeRange` for reversed timestamps and
    /// `SummaryError::TooManyQuestions` if the answer count cannot fit in
    /// `u32`.
    pub fn from_answers(
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        answers: &[Option<AnsweredQuestion>],
    ) -> Result<Self, SummaryError> {
        if completed_at < started_at {
            return Err(SummaryError::InvalidTimeRange);
        }
        let total = u32::try_from(answers.len()).map_err(|_| SummaryError::TooManyQuestions {
            len: answers.len(),
        })?;

        let mut correct = 0_u32;
        let mut wrong = 0_u32;
        let mut unanswered = 0_u32;
        for answer in answers {
            match answer {
                Some(answer) if answer.was_correct() => correct += 1,
                Some(_) => wrong += 1,
                None => unanswered += 1,
            }
        }

        Self::from_persisted(total, correct, wrong, unanswered, started_at, completed_at)
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn wrong(&self) -> u32 {
        self.wrong
    }

    #[must_use]
    pub fn unanswered(&self) -> u32 {
        self.unanswered
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Score as a percentage of the total; `0.0` for an empty run.
    #[must_use]
    pub fn score_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total) * 100.0
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({:.2}%)",
            self.correct,
            self.total,
            self.score_percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn summary_counts_outcomes() {
        let now = fixed_now();
        let answers = vec![
            Some(AnsweredQuestion::new("a", true, false)),
            Some(AnsweredQuestion::new("b", false, false)),
            None,
        ];

        let summary = SessionSummary::from_answers(now, now, &answers).unwrap();

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.correct(), 1);
        assert_eq!(summary.wrong(), 1);
        assert_eq!(summary.unanswered(), 1);
    }

    #[test]
    fn one_of_two_renders_fifty_percent() {
        let now = fixed_now();
        let answers = vec![
            Some(AnsweredQuestion::new("a", true, false)),
            Some(AnsweredQuestion::new("b", false, false)),
        ];

        let summary = SessionSummary::from_answers(now, now, &answers).unwrap();

        assert_eq!(summary.to_string(), "1/2 (50.00%)");
    }

    #[test]
    fn empty_run_scores_zero() {
        let now = fixed_now();
        let summary = SessionSummary::from_answers(now, now, &[]).unwrap();
        assert_eq!(summary.score_percent(), 0.0);
        assert_eq!(summary.to_string(), "0/0 (0.00%)");
    }

    #[test]
    fn rejects_reversed_timestamps() {
        let now = fixed_now();
        let earlier = now - chrono::Duration::seconds(1);
        let err = SessionSummary::from_answers(now, earlier, &[]).unwrap_err();
        assert_eq!(err, SummaryError::InvalidTimeRange);
    }

    #[test]
    fn from_persisted_validates_counts() {
        let now = fixed_now();
        let err = SessionSummary::from_persisted(3, 1, 1, 0, now, now).unwrap_err();
        assert_eq!(err, SummaryError::CountMismatch { total: 3, counted: 2 });
    }
}
