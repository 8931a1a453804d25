use thiserror::Error;

use crate::model::QuestionRecord;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Answer-key integrity failures.
///
/// A well-formed question flags exactly one of its options as correct.
/// Anything else is malformed source data and is surfaced, not guessed
/// around: the source tables occasionally ship rows with no flag set, and
/// silently grading against the first flagged option would mis-grade them.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum GradeError {
    #[error("question has no option flagged as correct")]
    NoCorrectOption,

    #[error("question flags {count} options as correct, expected exactly one")]
    AmbiguousCorrectOptions { count: usize },
}

//
// ─── GRADING ───────────────────────────────────────────────────────────────────
//

/// Outcome of grading one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeOutcome {
    pub is_correct: bool,
    /// Correct option text, when the answer key resolves.
    pub correct_option: Option<String>,
    /// Set when the question's answer key did not resolve; such questions
    /// grade as wrong and are flagged for the review report.
    pub integrity: Option<GradeError>,
}

/// Resolve the position of the single option flagged correct.
///
/// # Errors
///
/// Returns `GradeError::NoCorrectOption` when no flag is set and
/// `GradeError::AmbiguousCorrectOptions` when more than one is.
pub fn correct_option_index(question: &QuestionRecord) -> Result<usize, GradeError> {
    let flags = question.correct_flags();
    let mut flagged = flags
        .iter()
        .enumerate()
        .filter_map(|(index, flag)| flag.then_some(index));
    match (flagged.next(), flagged.next()) {
        (Some(index), None) => Ok(index),
        (None, _) => Err(GradeError::NoCorrectOption),
        (Some(_), Some(_)) => Err(GradeError::AmbiguousCorrectOptions {
            count: flags.iter().filter(|flag| **flag).count(),
        }),
    }
}

/// Returns true when the question's answer key resolves to exactly one option.
#[must_use]
pub fn has_resolvable_key(question: &QuestionRecord) -> bool {
    correct_option_index(question).is_ok()
}

/// Grade a submitted option text against the question's answer key.
///
/// A question with an unresolvable key grades as incorrect (not an error)
/// and carries the integrity failure in the outcome.
#[must_use]
pub fn grade(question: &QuestionRecord, selected_option: &str) -> GradeOutcome {
    match correct_option_index(question) {
        Ok(index) => {
            let correct_text = &question.options()[index];
            GradeOutcome {
                is_correct: selected_option == correct_text,
                correct_option: Some(correct_text.clone()),
                integrity: None,
            }
        }
        Err(err) => GradeOutcome {
            is_correct: false,
            correct_option: None,
            integrity: Some(err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryName, OPTION_COUNT};

    fn build_question(correct: [bool; OPTION_COUNT]) -> QuestionRecord {
        QuestionRecord::new(
            "Q",
            CategoryName::new("1.RND").unwrap(),
            ["alpha".to_string(), "bravo".to_string(), "charlie".to_string()],
            correct,
        )
        .unwrap()
    }

    #[test]
    fn resolves_single_flag() {
        let question = build_question([false, false, true]);
        assert_eq!(correct_option_index(&question), Ok(2));
        assert!(has_resolvable_key(&question));
    }

    #[test]
    fn no_flag_is_an_integrity_error() {
        let question = build_question([false, false, false]);
        assert_eq!(
            correct_option_index(&question),
            Err(GradeError::NoCorrectOption)
        );
    }

    #[test]
    fn multiple_flags_are_ambiguous() {
        let question = build_question([true, true, false]);
        assert_eq!(
            correct_option_index(&question),
            Err(GradeError::AmbiguousCorrectOptions { count: 2 })
        );
    }

    #[test]
    fn grades_matching_text_as_correct() {
        let question = build_question([false, true, false]);
        let outcome = grade(&question, "bravo");
        assert!(outcome.is_correct);
        assert_eq!(outcome.correct_option.as_deref(), Some("bravo"));
        assert!(outcome.integrity.is_none());
    }

    #[test]
    fn grades_other_text_as_wrong() {
        let question = build_question([false, true, false]);
        let outcome = grade(&question, "alpha");
        assert!(!outcome.is_correct);
        assert_eq!(outcome.correct_option.as_deref(), Some("bravo"));
    }

    #[test]
    fn unkeyed_question_grades_wrong_and_flags() {
        let question = build_question([false, false, false]);
        let outcome = grade(&question, "alpha");
        assert!(!outcome.is_correct);
        assert!(outcome.correct_option.is_none());
        assert_eq!(outcome.integrity, Some(GradeError::NoCorrectOption));
    }
}
