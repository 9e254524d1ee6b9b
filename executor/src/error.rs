use crate::action::TargetId;
use gavel_types::Digest;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("command digest {actual} does not match the voted description {expected}")]
    HashMismatch { expected: Digest, actual: Digest },

    #[error("motion contents reference a document, not a bundled action")]
    NotAction,

    #[error("no target registered under {0:?}")]
    UnknownTarget(TargetId),

    #[error("command {index} failed validation: {reason}")]
    Validation { index: usize, reason: String },

    #[error("bundle refused by {target:?}: {reason}")]
    Bundle { target: TargetId, reason: String },
}
