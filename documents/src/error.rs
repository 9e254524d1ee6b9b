use crate::capability::Capability;
use crate::deal::DealState;
use crate::document::DocState;
use gavel_types::{Account, DocId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    // ── Access control ───────────────────────────────────────────────
    #[error("{account} does not hold the {capability:?} capability")]
    MissingCapability {
        account: Account,
        capability: Capability,
    },

    #[error("{0} is not a registered party of this document")]
    NotParty(Account),

    // ── State control ────────────────────────────────────────────────
    #[error("document {0} not found")]
    DocumentNotFound(DocId),

    #[error("document is {actual:?}, operation requires {expected:?}")]
    WrongState { expected: DocState, actual: DocState },

    #[error("deal {seq} is {actual:?}, operation requires {expected:?}")]
    DealWrongState {
        seq: u16,
        expected: DealState,
        actual: DealState,
    },

    #[error("deal {0} not found")]
    DealNotFound(u16),

    #[error("{0} has already signed")]
    AlreadySigned(Account),

    #[error("cannot finalize a document with no registered parties")]
    NoParties,

    #[error("document is not established")]
    NotEstablished,

    #[error("document approval by motion is required and not yet recorded")]
    ApprovalPending,

    #[error("deal {0} has unresolved priority claims")]
    OutstandingClaims(u16),

    // ── Timing control ───────────────────────────────────────────────
    #[error("signing window closed at {closed_at}s, now {now}s")]
    SignWindowClosed { now: u64, closed_at: u64 },

    #[error("closing deadline expired at {expired_at}s, now {now}s")]
    Expired { now: u64, expired_at: u64 },

    // ── Integrity control ────────────────────────────────────────────
    #[error("presented key does not match the deal's hash-lock")]
    BadKey,
}
