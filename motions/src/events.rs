//! Governance events for external indexing.
//!
//! Consumed by the cap-table, order-book, and redemption modules; never part
//! of internal control flow.

use crate::ballot::{Attitude, VoteResult};
use gavel_types::{Account, ContentsRef, MotionCategory, Timestamp};

/// Events emitted by the [`MotionRegistry`](crate::MotionRegistry).
#[derive(Clone, Debug)]
pub enum GovernanceEvent {
    MotionCreated {
        seq: u64,
        category: MotionCategory,
        creator: Account,
    },
    MotionProposed {
        seq: u64,
        proposer: Account,
        vote_start: Timestamp,
        vote_end: Timestamp,
    },
    VoteCast {
        seq: u64,
        voter: Account,
        attitude: Attitude,
    },
    VoteCounted {
        seq: u64,
        result: VoteResult,
    },
    /// The `onMotionExecuted` surface: fired after the bound action ran.
    MotionExecuted {
        seq: u64,
        contents: ContentsRef,
    },
    DelegationEntrusted {
        principal: Account,
        delegate: Account,
        category: MotionCategory,
    },
}
