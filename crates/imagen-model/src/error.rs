use thiserror::Error;

/// Errors raised when parsing model codes from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown session code '{0}'")]
    Session(String),
    #[error("unknown sex label '{0}'")]
    Sex(String),
    #[error("unknown site '{0}'")]
    Site(String),
    #[error("unknown cohort class '{0}'")]
    Class(String),
    #[error("unknown dataset split '{0}'")]
    Dataset(String),
}
