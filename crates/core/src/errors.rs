use thiserror::Error;

use crate::domain::priority::GuardMode;
use crate::facts::GuardBuildError;
use crate::guard::GuardParseError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid guard transition from {from:?} to {to:?}")]
    InvalidGuardTransition { from: GuardMode, to: GuardMode },
    #[error(transparent)]
    GuardParse(#[from] GuardParseError),
    #[error(transparent)]
    GuardBuild(#[from] GuardBuildError),
    #[error("invalid agent document: {0}")]
    InvalidDocument(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("input failure: {0}")]
    Input(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Stable class name reported to operators alongside the message.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::InvalidGuardTransition { .. }) => "domain_invariant",
            Self::Domain(DomainError::GuardParse(_)) | Self::Domain(DomainError::GuardBuild(_)) => {
                "guard_invalid"
            }
            Self::Domain(DomainError::InvalidDocument(_)) => "document_invalid",
            Self::Input(_) => "input",
            Self::Configuration(_) => "config_validation",
        }
    }

    /// Exit code for command-line callers: 1 for bad input, 2 for environment.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Domain(_) | Self::Input(_) => 1,
            Self::Configuration(_) => 2,
        }
    }
}
