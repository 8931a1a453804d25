use std::sync::Arc;

use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::model::{CategoryQuotas, HistoryLedger, QuestionBank};
use storage::repository::{HistoryStore, QuestionSource, StorageError};

use super::plan::QuizPlanner;
use super::service::{AnswerOutcome, QuizSession};
use super::view::SessionReport;
use crate::error::SessionError;

/// Result of answering one question through the persisted workflow.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub answer: AnswerOutcome,
    /// Set when the run completed but the history write failed. The
    /// in-memory ledger still holds the session's counters; retry with
    /// [`QuizFlowService::persist_history`].
    pub persist_error: Option<StorageError>,
}

/// Orchestrates session start, grading, history bookkeeping and persistence.
///
/// The ledger is owned by the caller, not the service: it is process-wide
/// state that outlives individual sessions and restarts.
#[derive(Clone)]
pub struct QuizFlowService {
    clock: Clock,
    bank: Arc<dyn QuestionSource>,
    history: Arc<dyn HistoryStore>,
}

impl QuizFlowService {
    #[must_use]
    pub fn new(clock: Clock, bank: Arc<dyn QuestionSource>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            clock,
            bank,
            history,
        }
    }

    async fn load_bank(&self) -> Result<QuestionBank, SessionError> {
        Ok(self.bank.load_bank().await?.deduplicate())
    }

    /// Load history counters for the current bank, zeros for unseen texts.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the backing table cannot be read.
    pub async fn load_history(&self) -> Result<HistoryLedger, SessionError> {
        let bank = self.load_bank().await?;
        Ok(self.history.load_history(&bank).await?)
    }

    /// Draw a fresh selection and start a session over it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when the quotas match no questions and
    /// `SessionError::Storage` for load failures.
    pub async fn start_session(&self, quotas: &CategoryQuotas) -> Result<QuizSession, SessionError> {
        let bank = self.load_bank().await?;
        let plan = QuizPlanner::new(quotas).draw(&bank);
        if plan.is_empty() {
            return Err(SessionError::Empty);
        }
        debug!(
            total = plan.total(),
            skipped = plan.integrity_skipped,
            "starting quiz session"
        );

        let mut session = QuizSession::new();
        session.start(plan.questions, self.clock.now());
        Ok(session)
    }

    /// Grade the current question, count it in the ledger exactly once and,
    /// when the run completes, persist the ledger.
    ///
    /// A failed persist does not roll back the graded answer or the ledger;
    /// the failure rides along in the outcome for the caller to surface and
    /// retry.
    ///
    /// # Errors
    ///
    /// Propagates the session's state errors (`NotStarted`, `Completed`,
    /// `IndexMismatch`).
    pub async fn submit_answer(
        &self,
        session: &mut QuizSession,
        ledger: &mut HistoryLedger,
        index: usize,
        chosen_option: &str,
    ) -> Result<SubmitOutcome, SessionError> {
        let answered_at = self.clock.now();
        let answer = session.submit_answer(index, chosen_option, answered_at)?;

        let question_text = session.questions()[answer.index].record().text().to_string();
        ledger.record_attempt(&question_text, answer.was_correct);

        let mut persist_error = None;
        if answer.is_complete {
            info!(
                score = session.score(),
                total = session.total(),
                "quiz session complete"
            );
            if let Err(err) = self.history.persist_history(ledger).await {
                warn!(error = %err, "history persistence failed; in-memory counters retained");
                persist_error = Some(err);
            }
        }

        Ok(SubmitOutcome {
            answer,
            persist_error,
        })
    }

    /// Retry history persistence after a failed write.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the write fails again; the
    /// ledger is untouched either way.
    pub async fn persist_history(&self, ledger: &HistoryLedger) -> Result<(), SessionError> {
        self.history.persist_history(ledger).await?;
        Ok(())
    }

    /// Build the completion review for the presentation layer.
    ///
    /// # Errors
    ///
    /// Returns the session's state errors while the run is unfinished.
    pub fn report(
        &self,
        session: &QuizSession,
        ledger: &HistoryLedger,
    ) -> Result<SessionReport, SessionError> {
        SessionReport::build(session, ledger)
    }
}
