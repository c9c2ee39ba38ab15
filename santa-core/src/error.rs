use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SantaError {
    #[error("only the organizer can run the draw")]
    NotAuthorized,
    #[error("assignments have already been generated")]
    AlreadyGenerated,
    #[error("the draw has already happened for this group")]
    DrawAlreadyCompleted,
    #[error("need at least 2 members to draw, found {found}")]
    InsufficientMembers { found: usize },
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

impl SantaError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SantaError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

pub type SantaResult<T> = Result<T, SantaError>;
