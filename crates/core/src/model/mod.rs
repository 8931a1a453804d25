mod bank;
mod history;
mod question;
mod quota;
mod session;

pub use bank::QuestionBank;
pub use history::{HistoryError, HistoryLedger, HistoryRecord};
pub use question::{CategoryName, OPTION_COUNT, QuestionError, QuestionRecord};
pub use quota::CategoryQuotas;
pub use session::{AnsweredQuestion, SessionSummary, SummaryError};
