use chrono::{DateTime, Utc};
use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::grader;
use quiz_core::model::{AnsweredQuestion, OPTION_COUNT, SessionSummary};

use super::plan::SelectedQuestion;
use super::progress::QuizProgress;
use crate::error::SessionError;

/// Discrete lifecycle states for a quiz run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    Presenting,
    Complete,
}

/// View of the current question handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPrompt {
    pub index: usize,
    pub total: usize,
    pub question: String,
    /// Option texts in the session-fixed shuffled order.
    pub options: Vec<String>,
}

/// Outcome of one graded submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub index: usize,
    pub was_correct: bool,
    /// Correct option text, when the answer key resolves.
    pub correct_option: Option<String>,
    pub integrity_flagged: bool,
    pub is_complete: bool,
}

/// Drives one quiz run through `NotStarted` → `Presenting` → `Complete`.
///
/// Transitions are triggered by discrete events (start, submit, restart),
/// independent of how often the presentation layer redraws. The session owns
/// its question list, current index, score and per-index recorded answers;
/// nothing here touches storage.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<SelectedQuestion>,
    current: usize,
    score: usize,
    answers: Vec<Option<AnsweredQuestion>>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            questions: Vec::new(),
            current: 0,
            score: 0,
            answers: Vec::new(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Begin a run over `questions`, resetting score and recorded answers.
    ///
    /// `started_at` should come from the services layer clock. Starting with
    /// an empty list lands directly in `Complete` (a zero-question run).
    pub fn start(&mut self, questions: Vec<SelectedQuestion>, started_at: DateTime<Utc>) {
        self.answers = vec![None; questions.len()];
        self.questions = questions;
        self.current = 0;
        self.score = 0;
        self.started_at = Some(started_at);
        self.completed_at = self.questions.is_empty().then_some(started_at);
    }

    /// Abandon the run and return to `NotStarted`. Nothing is persisted.
    pub fn restart(&mut self) {
        *self = Self::new();
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.started_at.is_none() {
            SessionPhase::NotStarted
        } else if self.current >= self.questions.len() {
            SessionPhase::Complete
        } else {
            SessionPhase::Presenting
        }
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn questions(&self) -> &[SelectedQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<AnsweredQuestion>] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns a snapshot of the current progress.
    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            total: self.questions.len(),
            answered: self.answers.iter().filter(|answer| answer.is_some()).count(),
            remaining: self.questions.len().saturating_sub(self.current),
            is_complete: self.phase() == SessionPhase::Complete,
        }
    }

    /// Present the current question, fixing its option order on first call.
    ///
    /// Repeated calls for the same index return the same order; the shuffle
    /// happens once per question per run.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `start` and
    /// `SessionError::Completed` once the run is over.
    pub fn present_current(&mut self) -> Result<QuestionPrompt, SessionError> {
        match self.phase() {
            SessionPhase::NotStarted => return Err(SessionError::NotStarted),
            SessionPhase::Complete => return Err(SessionError::Completed),
            SessionPhase::Presenting => {}
        }

        let index = self.current;
        let total = self.questions.len();
        let selected = &mut self.questions[index];
        let order = match selected.option_order() {
            Some(order) => order,
            None => {
                let mut order: [usize; OPTION_COUNT] = std::array::from_fn(|i| i);
                order.shuffle(&mut rng());
                selected.assign_option_order(order);
                order
            }
        };

        let record = selected.record();
        Ok(QuestionPrompt {
            index,
            total,
            question: record.text().to_string(),
            options: order.iter().map(|&i| record.options()[i].clone()).collect(),
        })
    }

    /// Grade `chosen_option` for the question at `index` and advance.
    ///
    /// Legal only for the current index while presenting. The final
    /// submission transitions the run to `Complete` and stamps
    /// `completed_at` with `answered_at`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `start`,
    /// `SessionError::Completed` after the run is over and
    /// `SessionError::IndexMismatch` for a stale or future index.
    pub fn submit_answer(
        &mut self,
        index: usize,
        chosen_option: &str,
        answered_at: DateTime<Utc>,
    ) -> Result<AnswerOutcome, SessionError> {
        match self.phase() {
            SessionPhase::NotStarted => return Err(SessionError::NotStarted),
            SessionPhase::Complete => return Err(SessionError::Completed),
            SessionPhase::Presenting => {}
        }
        if index != self.current {
            return Err(SessionError::IndexMismatch {
                submitted: index,
                current: self.current,
            });
        }

        let outcome = grader::grade(self.questions[index].record(), chosen_option);
        if outcome.is_correct {
            self.score += 1;
        }
        let integrity_flagged = outcome.integrity.is_some();
        self.answers[index] = Some(AnsweredQuestion::new(
            chosen_option,
            outcome.is_correct,
            integrity_flagged,
        ));

        self.current += 1;
        let is_complete = self.current >= self.questions.len();
        if is_complete {
            self.completed_at = Some(answered_at);
        }

        Ok(AnswerOutcome {
            index,
            was_correct: outcome.is_correct,
            correct_option: outcome.correct_option,
            integrity_flagged,
            is_complete,
        })
    }

    /// Build the aggregate summary for a completed run.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `start` and
    /// `SessionError::NotComplete` while questions remain.
    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        let started_at = self.started_at.ok_or(SessionError::NotStarted)?;
        let completed_at = self.completed_at.ok_or(SessionError::NotComplete)?;
        Ok(SessionSummary::from_answers(
            started_at,
            completed_at,
            &self.answers,
        )?)
    }
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{CategoryName, QuestionRecord};
    use quiz_core::time::fixed_now;

    fn build_selected(text: &str, correct_index: usize) -> SelectedQuestion {
        let mut flags = [false; OPTION_COUNT];
        flags[correct_index] = true;
        SelectedQuestion::new(
            QuestionRecord::new(
                text,
                CategoryName::new("1.RND").unwrap(),
                ["alpha".to_string(), "bravo".to_string(), "charlie".to_string()],
                flags,
            )
            .unwrap(),
        )
    }

    fn started_session(questions: Vec<SelectedQuestion>) -> QuizSession {
        let mut session = QuizSession::new();
        session.start(questions, fixed_now());
        session
    }

    #[test]
    fn starts_in_not_started() {
        let session = QuizSession::new();
        assert_eq!(session.phase(), SessionPhase::NotStarted);
    }

    #[test]
    fn present_before_start_fails() {
        let mut session = QuizSession::new();
        assert!(matches!(
            session.present_current(),
            Err(SessionError::NotStarted)
        ));
    }

    #[test]
    fn submit_before_start_fails() {
        let mut session = QuizSession::new();
        assert!(matches!(
            session.submit_answer(0, "alpha", fixed_now()),
            Err(SessionError::NotStarted)
        ));
    }

    #[test]
    fn option_order_is_fixed_after_first_presentation() {
        let mut session = started_session(vec![build_selected("q1", 0)]);

        let first = session.present_current().unwrap();
        let second = session.present_current().unwrap();

        assert_eq!(first.options, second.options);
        let mut sorted = first.options.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn submit_at_wrong_index_fails() {
        let mut session = started_session(vec![build_selected("q1", 0), build_selected("q2", 1)]);

        let err = session.submit_answer(1, "alpha", fixed_now()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::IndexMismatch {
                submitted: 1,
                current: 0
            }
        ));
    }

    #[test]
    fn answers_advance_score_and_complete() {
        let mut session = started_session(vec![build_selected("q1", 0), build_selected("q2", 1)]);

        let first = session.submit_answer(0, "alpha", fixed_now()).unwrap();
        assert!(first.was_correct);
        assert!(!first.is_complete);
        assert_eq!(session.phase(), SessionPhase::Presenting);

        let second = session.submit_answer(1, "alpha", fixed_now()).unwrap();
        assert!(!second.was_correct);
        assert_eq!(second.correct_option.as_deref(), Some("bravo"));
        assert!(second.is_complete);

        assert_eq!(session.phase(), SessionPhase::Complete);
        assert_eq!(session.score(), 1);
        assert!(session.score() <= session.total());
        assert_eq!(session.summary().unwrap().to_string(), "1/2 (50.00%)");
    }

    #[test]
    fn submit_after_completion_fails() {
        let mut session = started_session(vec![build_selected("q1", 0)]);
        session.submit_answer(0, "alpha", fixed_now()).unwrap();

        assert!(matches!(
            session.submit_answer(0, "alpha", fixed_now()),
            Err(SessionError::Completed)
        ));
    }

    #[test]
    fn empty_start_completes_immediately() {
        let session = started_session(Vec::new());
        assert_eq!(session.phase(), SessionPhase::Complete);
        let summary = session.summary().unwrap();
        assert_eq!(summary.total(), 0);
        assert_eq!(summary.score_percent(), 0.0);
    }

    #[test]
    fn restart_abandons_the_run() {
        let mut session = started_session(vec![build_selected("q1", 0)]);
        session.submit_answer(0, "bravo", fixed_now()).unwrap();
        assert_eq!(session.phase(), SessionPhase::Complete);

        session.restart();

        assert_eq!(session.phase(), SessionPhase::NotStarted);
        assert_eq!(session.total(), 0);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn progress_tracks_answers() {
        let mut session = started_session(vec![build_selected("q1", 0), build_selected("q2", 0)]);
        assert_eq!(
            session.progress(),
            QuizProgress {
                total: 2,
                answered: 0,
                remaining: 2,
                is_complete: false
            }
        );

        session.submit_answer(0, "alpha", fixed_now()).unwrap();
        let progress = session.progress();
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.remaining, 1);
        assert!(!progress.is_complete);
    }

    #[test]
    fn unkeyed_question_grades_wrong_and_flags() {
        let record = QuestionRecord::new(
            "broken",
            CategoryName::new("1.RND").unwrap(),
            ["alpha".to_string(), "bravo".to_string(), "charlie".to_string()],
            [false, false, false],
        )
        .unwrap();
        let mut session = started_session(vec![SelectedQuestion::new(record)]);

        let outcome = session.submit_answer(0, "alpha", fixed_now()).unwrap();

        assert!(!outcome.was_correct);
        assert!(outcome.integrity_flagged);
        assert!(outcome.correct_option.is_none());
        assert_eq!(session.score(), 0);
    }
}
