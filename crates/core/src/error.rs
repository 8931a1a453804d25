use thiserror::Error;

use crate::grader::GradeError;
use crate::model::{HistoryError, QuestionError, SummaryError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Grade(#[from] GradeError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
}
