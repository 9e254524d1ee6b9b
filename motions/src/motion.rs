//! Motions and their strictly-forward lifecycle.

use crate::rules::VotingRule;
use gavel_types::{Account, ContentsRef, MotionCategory, Timestamp};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a motion. Strictly forward-moving; no state is revisited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionState {
    /// Registered, not yet put to the members.
    Created,
    /// Proposed; voting window is fixed and the power snapshot taken.
    Proposed,
    /// Tallied and approved; awaiting execution.
    Passed,
    /// Tallied and refused (quorum, threshold, or veto).
    Rejected,
    /// The bound action has run. Terminal.
    Executed,
}

impl MotionState {
    /// Whether the lifecycle can still advance from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Executed)
    }
}

/// A proposed, voted-upon action.
///
/// The head fields are fixed at creation; the body fields are stamped at
/// proposal time. `power_snapshot_at` is fixed then and never recomputed, so
/// later ownership transfers cannot retroactively change the tally.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Motion {
    // Head.
    pub category: MotionCategory,
    pub seq: u64,
    pub seq_of_rule: u16,
    pub creator: Account,
    pub executor: Account,
    pub created_at: Timestamp,
    pub contents: ContentsRef,

    // Body.
    pub proposer: Option<Account>,
    pub proposed_at: Option<Timestamp>,
    pub power_snapshot_at: Option<Timestamp>,
    pub vote_start: Option<Timestamp>,
    pub vote_end: Option<Timestamp>,
    pub state: MotionState,
}

impl Motion {
    pub fn new(
        category: MotionCategory,
        seq: u64,
        seq_of_rule: u16,
        creator: Account,
        executor: Account,
        contents: ContentsRef,
        created_at: Timestamp,
    ) -> Self {
        Self {
            category,
            seq,
            seq_of_rule,
            creator,
            executor,
            created_at,
            contents,
            proposer: None,
            proposed_at: None,
            power_snapshot_at: None,
            vote_start: None,
            vote_end: None,
            state: MotionState::Created,
        }
    }

    /// Stamp the body: `vote_start = proposed_at + prepare_days`,
    /// `vote_end = vote_start + voting_days`, snapshot at proposal time.
    pub fn mark_proposed(&mut self, proposer: Account, now: Timestamp, rule: &VotingRule) {
        let vote_start = now.add_days(rule.vote_prepare_days);
        self.proposer = Some(proposer);
        self.proposed_at = Some(now);
        self.power_snapshot_at = Some(now);
        self.vote_start = Some(vote_start);
        self.vote_end = Some(vote_start.add_days(rule.voting_days));
        self.state = MotionState::Proposed;
    }

    /// Whether `now` falls inside the half-open voting window `[start, end)`.
    pub fn voting_open(&self, now: Timestamp) -> bool {
        match (self.vote_start, self.vote_end) {
            (Some(start), Some(end)) => now >= start && now < end,
            _ => false,
        }
    }

    /// Last instant at which execution is permitted, if the rule bounds it.
    pub fn exec_deadline(&self, rule: &VotingRule) -> Option<Timestamp> {
        if rule.exec_days == 0 {
            return None;
        }
        self.vote_end.map(|end| end.add_days(rule.exec_days))
    }
}
