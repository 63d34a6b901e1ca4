use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("invalid birth date: {0}")]
    InvalidBirthDate(String),
    #[error("birth date {0} lies in the future")]
    BirthDateInFuture(NaiveDate),
    #[error("unknown withdrawal policy: {0}")]
    UnknownStrategy(String),
    #[error("unknown market weather regime: {0}")]
    UnknownRegime(String),
}
