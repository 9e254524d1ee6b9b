//! The motion registry — creates motions, advances their state, and triggers
//! execution.

use crate::ballot::{Attitude, BallotBox, VoteResult};
use crate::delegation::{DelegationMap, DelegationSnapshot};
use crate::error::MotionError;
use crate::events::GovernanceEvent;
use crate::motion::{Motion, MotionState};
use crate::rules::{VotingRule, VotingRuleStore};
use gavel_power::PowerSource;
use gavel_types::{
    Account, ContentsRef, EventBus, MotionCategory, Timestamp, BPS_DENOM,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// External precondition hook consulted at proposal time.
///
/// The collaborator that tracks outstanding claims (e.g. an unaccepted
/// along-right on the subject document) answers through this seam; the
/// registry never interprets the contents reference itself.
pub trait ProposalGate {
    fn is_blocked(&self, contents: &ContentsRef) -> bool;
}

/// A gate that never blocks — for motions without external preconditions.
pub struct ClearGate;

impl ProposalGate for ClearGate {
    fn is_blocked(&self, _contents: &ContentsRef) -> bool {
        false
    }
}

/// The side effect a passed motion authorizes. Implemented by the action
/// executor; the registry only guarantees it runs at most once.
pub trait MotionAction {
    fn run(&mut self, motion_seq: u64, contents: &ContentsRef) -> Result<(), String>;
}

/// Creates motions, accumulates ballots, resolves Pass/Reject, and triggers
/// execution. One registry per organization, passed as an explicit handle —
/// no ambient state.
pub struct MotionRegistry {
    rules: VotingRuleStore,
    motions: BTreeMap<u64, Motion>,
    ballots: HashMap<u64, BallotBox>,
    delegations: DelegationMap,
    next_seq: u64,
    bus: EventBus<GovernanceEvent>,
}

impl MotionRegistry {
    pub fn new(rules: VotingRuleStore) -> Self {
        Self {
            rules,
            motions: BTreeMap::new(),
            ballots: HashMap::new(),
            delegations: DelegationMap::new(),
            next_seq: 1,
            bus: EventBus::new(),
        }
    }

    pub fn rules(&self) -> &VotingRuleStore {
        &self.rules
    }

    pub fn motion(&self, seq: u64) -> Result<&Motion, MotionError> {
        self.motions.get(&seq).ok_or(MotionError::MotionNotFound(seq))
    }

    pub fn ballots(&self, seq: u64) -> Option<&BallotBox> {
        self.ballots.get(&seq)
    }

    pub fn delegations(&self) -> &DelegationMap {
        &self.delegations
    }

    /// Subscribe to governance events.
    pub fn subscribe(&mut self, listener: impl Fn(&GovernanceEvent) + Send + Sync + 'static) {
        self.bus.subscribe(listener);
    }

    /// Register a motion. The creator must hold the minimum proposal right
    /// defined by the voting rule, measured at `now`.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        category: MotionCategory,
        seq_of_rule: u16,
        creator: Account,
        executor: Account,
        contents: ContentsRef,
        now: Timestamp,
        power: &dyn PowerSource,
    ) -> Result<u64, MotionError> {
        let rule = self.rules.get(seq_of_rule)?;
        if rule.proposal_threshold_bps > 0 {
            let have = power.weight_of(&creator, now, rule.ratio_type, rule.class_filter);
            let total = power.total_weight(now, rule.ratio_type, rule.class_filter);
            let have_scaled = u128::from(have) * u128::from(BPS_DENOM);
            if have_scaled < u128::from(rule.proposal_threshold_bps) * u128::from(total) {
                let have_bps = if total == 0 {
                    0
                } else {
                    (have_scaled / u128::from(total)) as u64
                };
                return Err(MotionError::NotEligible {
                    have_bps,
                    need_bps: u64::from(rule.proposal_threshold_bps),
                });
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let motion = Motion::new(
            category,
            seq,
            seq_of_rule,
            creator.clone(),
            executor,
            contents,
            now,
        );
        self.motions.insert(seq, motion);
        self.ballots.insert(seq, BallotBox::new());

        tracing::debug!(seq, ?category, %creator, "motion created");
        self.bus.emit(&GovernanceEvent::MotionCreated {
            seq,
            category,
            creator,
        });
        Ok(seq)
    }

    /// Put a created motion to the members, fixing its voting window and
    /// power snapshot.
    pub fn propose(
        &mut self,
        seq: u64,
        proposer: Account,
        now: Timestamp,
        gate: &dyn ProposalGate,
    ) -> Result<(), MotionError> {
        let rule = {
            let motion = self.motion(seq)?;
            if motion.state != MotionState::Created {
                return Err(MotionError::WrongState {
                    expected: MotionState::Created,
                    actual: motion.state,
                });
            }
            if gate.is_blocked(&motion.contents) {
                return Err(MotionError::Blocked);
            }
            self.rules.get(motion.seq_of_rule)?.clone()
        };

        let motion = self
            .motions
            .get_mut(&seq)
            .ok_or(MotionError::MotionNotFound(seq))?;
        motion.mark_proposed(proposer.clone(), now, &rule);
        let (vote_start, vote_end) = (
            motion.vote_start.unwrap_or(now),
            motion.vote_end.unwrap_or(now),
        );

        tracing::info!(seq, %proposer, %vote_start, %vote_end, "motion proposed");
        self.bus.emit(&GovernanceEvent::MotionProposed {
            seq,
            proposer,
            vote_start,
            vote_end,
        });
        Ok(())
    }

    /// Cast (or recast) a ballot inside the voting window.
    pub fn cast_vote(
        &mut self,
        seq: u64,
        voter: Account,
        attitude: Attitude,
        now: Timestamp,
    ) -> Result<(), MotionError> {
        let category = {
            let motion = self.motion(seq)?;
            if motion.state != MotionState::Proposed {
                return Err(MotionError::WrongState {
                    expected: MotionState::Proposed,
                    actual: motion.state,
                });
            }
            let start = motion.vote_start.unwrap_or(Timestamp::EPOCH);
            let end = motion.vote_end.unwrap_or(Timestamp::EPOCH);
            if now < start {
                return Err(MotionError::TooEarly {
                    now: now.as_secs(),
                    opens_at: start.as_secs(),
                });
            }
            if now >= end {
                return Err(MotionError::TooLate {
                    now: now.as_secs(),
                    closed_at: end.as_secs(),
                });
            }
            motion.category
        };

        if let Some(delegate) = self.delegations.delegate_of(&voter, category) {
            return Err(MotionError::HasDelegate {
                principal: voter,
                delegate: delegate.clone(),
            });
        }

        let ballot_box = self.ballots.entry(seq).or_default();
        ballot_box.cast(voter.clone(), attitude, now);
        // The voter may be carrying principals' rights; they are spent now.
        self.delegations.mark_exercised(&voter, category);

        tracing::debug!(seq, %voter, ?attitude, "vote cast");
        self.bus.emit(&GovernanceEvent::VoteCast {
            seq,
            voter,
            attitude,
        });
        Ok(())
    }

    /// Entrust `principal`'s voting right for `category` to `delegate`.
    ///
    /// Fails `AlreadyVoted` if the principal has a counted ballot on a motion
    /// of the category whose window is still open at `now`.
    pub fn entrust(
        &mut self,
        principal: &Account,
        delegate: &Account,
        category: MotionCategory,
        now: Timestamp,
    ) -> Result<(), MotionError> {
        for motion in self.motions.values() {
            if motion.category != category || motion.state != MotionState::Proposed {
                continue;
            }
            let still_open = motion.vote_end.map(|end| now < end).unwrap_or(false);
            let voted = self
                .ballots
                .get(&motion.seq)
                .is_some_and(|bx| bx.has_voted(principal));
            if still_open && voted {
                return Err(MotionError::AlreadyVoted(principal.clone()));
            }
        }
        self.delegations.entrust(principal, delegate, category, now)?;

        tracing::debug!(%principal, %delegate, ?category, "delegation entrusted");
        self.bus.emit(&GovernanceEvent::DelegationEntrusted {
            principal: principal.clone(),
            delegate: delegate.clone(),
            category,
        });
        Ok(())
    }

    /// Revoke a standing entrustment (only before it has been exercised).
    pub fn revoke_delegation(
        &mut self,
        principal: &Account,
        category: MotionCategory,
    ) -> Result<(), MotionError> {
        self.delegations.revoke(principal, category)
    }

    /// Tally the ballots once the window has closed and resolve Pass/Reject.
    pub fn count_votes(
        &mut self,
        seq: u64,
        now: Timestamp,
        power: &dyn PowerSource,
    ) -> Result<VoteResult, MotionError> {
        let (rule, snapshot, window_end, category) = {
            let motion = self.motion(seq)?;
            if motion.state != MotionState::Proposed {
                return Err(MotionError::WrongState {
                    expected: MotionState::Proposed,
                    actual: motion.state,
                });
            }
            let end = motion.vote_end.unwrap_or(Timestamp::EPOCH);
            if now < end {
                return Err(MotionError::TooEarly {
                    now: now.as_secs(),
                    opens_at: end.as_secs(),
                });
            }
            let snapshot = motion.power_snapshot_at.unwrap_or(motion.created_at);
            (
                self.rules.get(motion.seq_of_rule)?.clone(),
                snapshot,
                end,
                motion.category,
            )
        };

        let ballot_box = self.ballots.entry(seq).or_default();
        let tally = ballot_box.tally(&rule, snapshot, window_end, category, power, &self.delegations);
        let total = power.total_weight(snapshot, rule.ratio_type, rule.class_filter);
        let result = tally.decide(&rule, total);

        let motion = self
            .motions
            .get_mut(&seq)
            .ok_or(MotionError::MotionNotFound(seq))?;
        motion.state = match result {
            VoteResult::Passed => MotionState::Passed,
            VoteResult::Rejected => MotionState::Rejected,
        };

        tracing::info!(
            seq,
            weight_for = tally.weight_for,
            weight_against = tally.weight_against,
            weight_abstain = tally.weight_abstain,
            vetoed = tally.vetoed,
            ?result,
            "votes counted"
        );
        self.bus.emit(&GovernanceEvent::VoteCounted { seq, result });
        Ok(result)
    }

    /// Run the action bound to a passed motion. At most once: the state flips
    /// to `Executed` *before* the action runs so re-entrant calls observe the
    /// terminal state; if the action fails, the flip is undone and the whole
    /// operation reverts.
    pub fn execute(
        &mut self,
        seq: u64,
        caller: &Account,
        now: Timestamp,
        action: &mut dyn MotionAction,
    ) -> Result<(), MotionError> {
        let (contents, deadline) = {
            let motion = self.motion(seq)?;
            if caller != &motion.executor {
                return Err(MotionError::NotExecutor(caller.clone()));
            }
            match motion.state {
                MotionState::Executed => return Err(MotionError::AlreadyExecuted),
                MotionState::Passed => {}
                actual => {
                    return Err(MotionError::WrongState {
                        expected: MotionState::Passed,
                        actual,
                    })
                }
            }
            let rule = self.rules.get(motion.seq_of_rule)?;
            (motion.contents, motion.exec_deadline(rule))
        };
        if let Some(deadline) = deadline {
            if deadline.has_passed(now) {
                return Err(MotionError::TooLate {
                    now: now.as_secs(),
                    closed_at: deadline.as_secs(),
                });
            }
        }

        // Reentrancy guard: terminal state first, then the external calls.
        if let Some(motion) = self.motions.get_mut(&seq) {
            motion.state = MotionState::Executed;
        }
        if let Err(reason) = action.run(seq, &contents) {
            // Whole-transaction revert: the motion returns to Passed and the
            // action is guaranteed by its executor to have had no effect.
            if let Some(motion) = self.motions.get_mut(&seq) {
                motion.state = MotionState::Passed;
            }
            return Err(MotionError::ActionFailed(reason));
        }

        tracing::info!(seq, %caller, "motion executed");
        self.bus
            .emit(&GovernanceEvent::MotionExecuted { seq, contents });
        Ok(())
    }
}

/// Serializable snapshot of the registry (event subscriptions excluded).
#[derive(Serialize, Deserialize)]
pub struct RegistrySnapshot {
    rules: VotingRuleStore,
    motions: BTreeMap<u64, Motion>,
    ballots: HashMap<u64, BallotBox>,
    delegations: DelegationSnapshot,
    next_seq: u64,
}

impl MotionRegistry {
    /// Serialize the registry state for persistence.
    pub fn save_state(&self) -> Vec<u8> {
        let snapshot = RegistrySnapshot {
            rules: self.rules.clone(),
            motions: self.motions.clone(),
            ballots: self.ballots.clone(),
            delegations: self.delegations.to_snapshot(),
            next_seq: self.next_seq,
        };
        bincode::serialize(&snapshot).unwrap_or_default()
    }

    /// Restore a registry from serialized bytes. Listeners must re-subscribe.
    pub fn load_state(data: &[u8], fallback_rules: VotingRuleStore) -> Self {
        match bincode::deserialize::<RegistrySnapshot>(data) {
            Ok(snapshot) => Self {
                rules: snapshot.rules,
                motions: snapshot.motions,
                ballots: snapshot.ballots,
                delegations: DelegationMap::from_snapshot(snapshot.delegations),
                next_seq: snapshot.next_seq,
                bus: EventBus::new(),
            },
            Err(_) => Self::new(fallback_rules),
        }
    }
}

/// Convenience for rules whose motions need no external gate or are created
/// by accounts the rule does not threshold.
impl MotionRegistry {
    /// Look up the rule a motion is bound to.
    pub fn rule_of(&self, seq: u64) -> Result<&VotingRule, MotionError> {
        let motion = self.motion(seq)?;
        self.rules.get(motion.seq_of_rule)
    }
}
