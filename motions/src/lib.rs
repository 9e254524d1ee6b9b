//! The governance motion engine.
//!
//! A proposed action becomes an executed one only after eligibility, quorum,
//! veto, and timing rules are satisfied:
//!
//! 1. [`VotingRuleStore`] holds the immutable-once-set catalog of named rules.
//! 2. [`MotionRegistry`] creates motions, advances their strictly-forward
//!    lifecycle, and triggers execution.
//! 3. [`BallotBox`] records at most one counted ballot per voter per motion
//!    and tallies them with checkpointed weight.
//! 4. [`DelegationMap`] moves voting right (not ownership) between members,
//!    one hop deep, per motion category.
//!
//! Weight is always read through [`gavel_power::PowerSource`] at the motion's
//! power snapshot, so ownership transfers ordered during the voting window can
//! never change an already-settled tally.

pub mod ballot;
pub mod delegation;
pub mod error;
pub mod events;
pub mod motion;
pub mod registry;
pub mod rules;

pub use ballot::{Attitude, Ballot, BallotBox, Tally, VoteResult};
pub use delegation::{DelegationMap, Entrustment};
pub use error::MotionError;
pub use events::GovernanceEvent;
pub use motion::{Motion, MotionState};
pub use registry::{ClearGate, MotionAction, MotionRegistry, ProposalGate};
pub use rules::{VotingRule, VotingRuleStore};
