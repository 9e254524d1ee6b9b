use crate::motion::MotionState;
use gavel_types::Account;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MotionError {
    // ── Access control ───────────────────────────────────────────────
    #[error("creator weight below proposal threshold: {have_bps} < {need_bps} basis points")]
    NotEligible { have_bps: u64, need_bps: u64 },

    #[error("{0} is not the designated executor of this motion")]
    NotExecutor(Account),

    #[error("{0} is not the voting-rule admin")]
    NotAdmin(Account),

    // ── State control ────────────────────────────────────────────────
    #[error("motion {0} not found")]
    MotionNotFound(u64),

    #[error("voting rule {0} not found")]
    RuleNotFound(u16),

    #[error("voting rule seq {0} is already set")]
    SeqInUse(u16),

    #[error("motion is {actual:?}, operation requires {expected:?}")]
    WrongState {
        expected: MotionState,
        actual: MotionState,
    },

    #[error("motion has already been executed")]
    AlreadyExecuted,

    #[error("{0} has already voted in the current window")]
    AlreadyVoted(Account),

    #[error("{principal} has entrusted this category to {delegate}")]
    HasDelegate { principal: Account, delegate: Account },

    #[error("delegation has been exercised and can no longer be revoked or replaced")]
    DelegationExercised,

    #[error("{0} has no delegation for this category")]
    DelegationNotFound(Account),

    #[error("cannot entrust voting right to oneself")]
    SelfDelegation,

    #[error("delegation chains are not allowed (depth is capped at 1)")]
    DelegationChain,

    // ── Timing control ───────────────────────────────────────────────
    #[error("too early: window opens at {opens_at}s, now {now}s")]
    TooEarly { now: u64, opens_at: u64 },

    #[error("too late: window closed at {closed_at}s, now {now}s")]
    TooLate { now: u64, closed_at: u64 },

    // ── External preconditions ───────────────────────────────────────
    #[error("subject has an outstanding unresolved claim")]
    Blocked,

    #[error("bound action failed: {0}")]
    ActionFailed(String),
}
