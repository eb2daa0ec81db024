use thiserror::Error;

use crate::domain::finalize::OptionId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("draft failed validation at step {step}: {codes}")]
    StepValidationFailed { step: u8, codes: String },
    #[error("option name `{0}` is already used on this draft")]
    DuplicateOptionName(String),
    #[error("unknown option `{0}`")]
    UnknownOption(OptionId),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
}
