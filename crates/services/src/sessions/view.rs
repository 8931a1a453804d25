use quiz_core::grader;
use quiz_core::model::{HistoryLedger, HistoryRecord, SessionSummary};

use super::service::QuizSession;
use crate::error::SessionError;

/// One row of the end-of-session review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewLine {
    pub question: String,
    /// `None` when the question was never answered.
    pub chosen_option: Option<String>,
    pub was_correct: Option<bool>,
    /// Correct option text, when the answer key resolves.
    pub correct_option: Option<String>,
    pub integrity_flagged: bool,
    /// Cumulative counters for this question across sessions.
    pub history: HistoryRecord,
}

/// Review handed to the presentation layer when a run completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub summary: SessionSummary,
    pub lines: Vec<ReviewLine>,
}

impl SessionReport {
    /// Build the report from a completed session and the loaded history.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` or `SessionError::NotComplete`
    /// when the session cannot produce a summary yet.
    pub fn build(session: &QuizSession, ledger: &HistoryLedger) -> Result<Self, SessionError> {
        let summary = session.summary()?;

        let mut lines = Vec::with_capacity(session.total());
        for (selected, answer) in session.questions().iter().zip(session.answers()) {
            let record = selected.record();
            let key = grader::correct_option_index(record).ok();
            lines.push(ReviewLine {
                question: record.text().to_string(),
                chosen_option: answer.as_ref().map(|a| a.chosen().to_string()),
                was_correct: answer.as_ref().map(|a| a.was_correct()),
                correct_option: key.map(|index| record.options()[index].clone()),
                integrity_flagged: answer
                    .as_ref()
                    .map_or(key.is_none(), |a| a.integrity_flagged()),
                history: ledger.get(record.text()).copied().unwrap_or_default(),
            });
        }

        Ok(Self { summary, lines })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::plan::SelectedQuestion;
    use quiz_core::model::{CategoryName, QuestionBank, QuestionRecord};
    use quiz_core::time::fixed_now;

    fn build_record(text: &str) -> QuestionRecord {
        QuestionRecord::new(
            text,
            CategoryName::new("1.RND").unwrap(),
            ["alpha".to_string(), "bravo".to_string(), "charlie".to_string()],
            [false, true, false],
        )
        .unwrap()
    }

    #[test]
    fn report_carries_answers_and_history() {
        let records = vec![build_record("q1"), build_record("q2")];
        let bank = QuestionBank::from_records(records.clone());

        let mut session = QuizSession::new();
        session.start(
            records.into_iter().map(SelectedQuestion::new).collect(),
            fixed_now(),
        );
        session.submit_answer(0, "bravo", fixed_now()).unwrap();
        session.submit_answer(1, "alpha", fixed_now()).unwrap();

        let mut ledger = HistoryLedger::for_bank(&bank, Vec::new());
        ledger.record_attempt("q1", true);
        ledger.record_attempt("q2", false);

        let report = SessionReport::build(&session, &ledger).unwrap();

        assert_eq!(report.summary.to_string(), "1/2 (50.00%)");
        assert_eq!(report.lines.len(), 2);

        let first = &report.lines[0];
        assert_eq!(first.question, "q1");
        assert_eq!(first.chosen_option.as_deref(), Some("bravo"));
        assert_eq!(first.was_correct, Some(true));
        assert_eq!(first.correct_option.as_deref(), Some("bravo"));
        assert_eq!(first.history.times_asked(), 1);
        assert!(!first.integrity_flagged);

        let second = &report.lines[1];
        assert_eq!(second.was_correct, Some(false));
        assert_eq!(second.history.wrong_answers(), 1);
    }

    #[test]
    fn incomplete_session_has_no_report() {
        let mut session = QuizSession::new();
        session.start(
            vec![SelectedQuestion::new(build_record("q1"))],
            fixed_now(),
        );
        let ledger = HistoryLedger::default();

        assert!(matches!(
            SessionReport::build(&session, &ledger),
            Err(SessionError::NotComplete)
        ));
    }
}
