//! Ballots and the quorum/veto tally.

use crate::delegation::DelegationMap;
use crate::rules::VotingRule;
use gavel_power::PowerSource;
use gavel_types::{Account, MotionCategory, Timestamp, BPS_DENOM};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A voter's recorded attitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attitude {
    For,
    Against,
    /// Counts toward quorum but not toward the pass ratio.
    Abstain,
}

/// One account's recorded vote. Weight is deliberately absent: it is resolved
/// lazily at tally time against the motion's power snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ballot {
    pub voter: Account,
    pub attitude: Attitude,
    pub cast_at: Timestamp,
}

/// Outcome of counting one motion's votes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteResult {
    Passed,
    Rejected,
}

/// Per-motion record of who voted, counted at most once.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BallotBox {
    ballots: BTreeMap<Account, Ballot>,
}

impl BallotBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a ballot. Recasting overwrites rather than accumulates; returns
    /// whether an earlier ballot was replaced.
    pub fn cast(&mut self, voter: Account, attitude: Attitude, now: Timestamp) -> bool {
        self.ballots
            .insert(
                voter.clone(),
                Ballot {
                    voter,
                    attitude,
                    cast_at: now,
                },
            )
            .is_some()
    }

    pub fn has_voted(&self, voter: &Account) -> bool {
        self.ballots.contains_key(voter)
    }

    pub fn get(&self, voter: &Account) -> Option<&Ballot> {
        self.ballots.get(voter)
    }

    pub fn len(&self) -> usize {
        self.ballots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ballots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ballot> {
        self.ballots.values()
    }

    /// Partition cast weight by attitude under `rule`, reading every weight at
    /// `snapshot`. A delegate's ballot carries the combined weight of itself
    /// and every principal entrusted for `category` before `window_end`;
    /// entrustments made after the window closed, and principals with a
    /// counted ballot of their own, are never folded in. A pure fold over an
    /// ordered map: commutative over cast order and replayable.
    pub fn tally(
        &self,
        rule: &VotingRule,
        snapshot: Timestamp,
        window_end: Timestamp,
        category: MotionCategory,
        power: &dyn PowerSource,
        delegations: &DelegationMap,
    ) -> Tally {
        let mut tally = Tally::default();
        for ballot in self.ballots.values() {
            let own = power.weight_of(&ballot.voter, snapshot, rule.ratio_type, rule.class_filter);
            if rule.class_filter.is_some() && own == 0 {
                // Outside the consenting class: the ballot is excluded
                // entirely, veto power included.
                continue;
            }
            let entrusted: u64 = delegations
                .principals_of(&ballot.voter, category)
                .iter()
                .filter(|principal| {
                    !self.ballots.contains_key(*principal)
                        && delegations
                            .entrustment(principal, category)
                            .is_some_and(|e| e.valid_from < window_end)
                })
                .map(|p| power.weight_of(p, snapshot, rule.ratio_type, rule.class_filter))
                .fold(0u64, u64::saturating_add);
            let weight = own.saturating_add(entrusted);

            match ballot.attitude {
                Attitude::For => tally.weight_for = tally.weight_for.saturating_add(weight),
                Attitude::Against => {
                    tally.weight_against = tally.weight_against.saturating_add(weight);
                    if rule.vetoers.contains(&ballot.voter) {
                        tally.vetoed = true;
                    }
                }
                Attitude::Abstain => {
                    tally.weight_abstain = tally.weight_abstain.saturating_add(weight)
                }
            }
        }
        tally
    }
}

/// Cast weight partitioned by attitude.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub weight_for: u64,
    pub weight_against: u64,
    pub weight_abstain: u64,
    /// A designated vetoer cast Against.
    pub vetoed: bool,
}

impl Tally {
    /// Weight that counts toward quorum.
    pub fn participating(&self) -> u64 {
        self.weight_for
            .saturating_add(self.weight_against)
            .saturating_add(self.weight_abstain)
    }

    /// Resolve Pass/Reject against `rule`, with `total_weight` as the quorum
    /// base. Any veto short-circuits to Rejected. The pass ratio must reach
    /// the threshold share; a dead For/Against tie always rejects.
    pub fn decide(&self, rule: &VotingRule, total_weight: u64) -> VoteResult {
        if self.vetoed {
            return VoteResult::Rejected;
        }
        let participating = u128::from(self.participating()) * u128::from(BPS_DENOM);
        if participating < u128::from(rule.quorum_bps) * u128::from(total_weight) {
            return VoteResult::Rejected;
        }
        if self.weight_for == self.weight_against {
            return VoteResult::Rejected;
        }
        let valid = u128::from(self.weight_for) + u128::from(self.weight_against);
        let for_scaled = u128::from(self.weight_for) * u128::from(BPS_DENOM);
        if for_scaled >= u128::from(rule.pass_threshold_bps) * valid {
            VoteResult::Passed
        } else {
            VoteResult::Rejected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_power::CheckpointLedger;
    use gavel_types::{ClassCode, RatioType};
    use std::collections::BTreeSet;

    fn acct(name: &str) -> Account {
        Account::new(format!("gvl_{name}"))
    }

    fn rule() -> VotingRule {
        VotingRule {
            seq: 9,
            ratio_type: RatioType::CapitalAmount,
            proposal_threshold_bps: 0,
            pass_threshold_bps: 5_000,
            quorum_bps: 3_000,
            vetoers: BTreeSet::new(),
            vote_prepare_days: 0,
            voting_days: 7,
            exec_days: 0,
            class_filter: None,
        }
    }

    /// Four holders with capital weights 40/30/20/10, recorded before the snapshot.
    fn cap_table() -> (CheckpointLedger, [Account; 4]) {
        let holders = [acct("w40"), acct("w30"), acct("w20"), acct("w10")];
        let mut ledger = CheckpointLedger::new();
        for (holder, units) in holders.iter().zip([40u64, 30, 20, 10]) {
            ledger
                .record(holder, ClassCode(1), units, Timestamp::new(0))
                .unwrap();
        }
        (ledger, holders)
    }

    const SNAPSHOT: Timestamp = Timestamp::EPOCH;
    const CATEGORY: MotionCategory = MotionCategory::GeneralAction;

    fn window_end() -> Timestamp {
        Timestamp::new(600)
    }

    #[test]
    fn recast_overwrites_and_counts_once() {
        let (ledger, holders) = cap_table();
        let mut bx = BallotBox::new();
        assert!(!bx.cast(holders[0].clone(), Attitude::For, Timestamp::new(1)));
        assert!(bx.cast(holders[0].clone(), Attitude::Against, Timestamp::new(2)));
        assert_eq!(bx.len(), 1);

        let t = bx.tally(&rule(), SNAPSHOT, window_end(), CATEGORY, &ledger, &DelegationMap::new());
        assert_eq!(t.weight_for, 0);
        assert_eq!(t.weight_against, 40);
    }

    #[test]
    fn quorum_and_threshold_pass() {
        let (ledger, holders) = cap_table();
        let mut bx = BallotBox::new();
        bx.cast(holders[0].clone(), Attitude::For, Timestamp::new(1));
        bx.cast(holders[1].clone(), Attitude::For, Timestamp::new(1));

        let t = bx.tally(&rule(), SNAPSHOT, window_end(), CATEGORY, &ledger, &DelegationMap::new());
        assert_eq!(t.weight_for, 70);
        assert_eq!(t.decide(&rule(), 100), VoteResult::Passed);
    }

    #[test]
    fn below_quorum_rejects_despite_unanimous_for() {
        let (ledger, holders) = cap_table();
        let mut bx = BallotBox::new();
        bx.cast(holders[3].clone(), Attitude::For, Timestamp::new(1));

        let t = bx.tally(&rule(), SNAPSHOT, window_end(), CATEGORY, &ledger, &DelegationMap::new());
        assert_eq!(t.participating(), 10);
        assert_eq!(t.decide(&rule(), 100), VoteResult::Rejected);
    }

    #[test]
    fn abstain_counts_toward_quorum_not_ratio() {
        let (ledger, holders) = cap_table();
        let mut bx = BallotBox::new();
        bx.cast(holders[3].clone(), Attitude::For, Timestamp::new(1));
        bx.cast(holders[0].clone(), Attitude::Abstain, Timestamp::new(1));

        let t = bx.tally(&rule(), SNAPSHOT, window_end(), CATEGORY, &ledger, &DelegationMap::new());
        // Quorum: 50 of 100 >= 30%. Ratio: 10/(10+0) = 100%.
        assert_eq!(t.decide(&rule(), 100), VoteResult::Passed);
    }

    #[test]
    fn exact_tie_rejects() {
        let (ledger, holders) = cap_table();
        let mut bx = BallotBox::new();
        bx.cast(holders[1].clone(), Attitude::For, Timestamp::new(1)); // 30
        bx.cast(holders[2].clone(), Attitude::Against, Timestamp::new(1)); // 20
        bx.cast(holders[3].clone(), Attitude::Against, Timestamp::new(1)); // 10

        let t = bx.tally(&rule(), SNAPSHOT, window_end(), CATEGORY, &ledger, &DelegationMap::new());
        // 30 vs 30: a dead tie rejects even though 50% meets the threshold.
        assert_eq!(t.decide(&rule(), 100), VoteResult::Rejected);
    }

    #[test]
    fn ratio_exactly_at_threshold_passes() {
        let (ledger, holders) = cap_table();
        let mut r = rule();
        r.pass_threshold_bps = 6_000;

        let mut bx = BallotBox::new();
        bx.cast(holders[1].clone(), Attitude::For, Timestamp::new(1)); // 30
        bx.cast(holders[2].clone(), Attitude::Against, Timestamp::new(1)); // 20

        let t = bx.tally(&r, SNAPSHOT, window_end(), CATEGORY, &ledger, &DelegationMap::new());
        // 30/(30+20) is exactly 60%.
        assert_eq!(t.decide(&r, 100), VoteResult::Passed);
    }

    #[test]
    fn post_window_entrustment_is_not_folded_in() {
        let (ledger, holders) = cap_table();
        let mut delegations = DelegationMap::new();
        // w30 entrusts w10 only once the window has already closed.
        delegations
            .entrust(&holders[1], &holders[3], CATEGORY, window_end())
            .unwrap();

        let mut bx = BallotBox::new();
        bx.cast(holders[3].clone(), Attitude::For, Timestamp::new(1));

        let t = bx.tally(&rule(), SNAPSHOT, window_end(), CATEGORY, &ledger, &delegations);
        assert_eq!(t.weight_for, 10);
    }

    #[test]
    fn principal_with_a_counted_ballot_is_not_folded_in() {
        let (ledger, holders) = cap_table();
        let mut delegations = DelegationMap::new();
        delegations
            .entrust(&holders[1], &holders[3], CATEGORY, Timestamp::EPOCH)
            .unwrap();

        // The principal's own ballot is already in the box; the delegate's
        // ballot must not carry that weight a second time.
        let mut bx = BallotBox::new();
        bx.cast(holders[1].clone(), Attitude::Against, Timestamp::new(1));
        bx.cast(holders[3].clone(), Attitude::For, Timestamp::new(2));

        let t = bx.tally(&rule(), SNAPSHOT, window_end(), CATEGORY, &ledger, &delegations);
        assert_eq!(t.weight_for, 10);
        assert_eq!(t.weight_against, 30);
    }

    #[test]
    fn veto_short_circuits_everything() {
        let (ledger, holders) = cap_table();
        let mut r = rule();
        r.vetoers.insert(holders[3].clone());

        let mut bx = BallotBox::new();
        bx.cast(holders[0].clone(), Attitude::For, Timestamp::new(1));
        bx.cast(holders[1].clone(), Attitude::For, Timestamp::new(1));
        bx.cast(holders[2].clone(), Attitude::For, Timestamp::new(1));
        bx.cast(holders[3].clone(), Attitude::Against, Timestamp::new(1));

        let t = bx.tally(&r, SNAPSHOT, window_end(), CATEGORY, &ledger, &DelegationMap::new());
        assert!(t.vetoed);
        // Quorum 100%, 90% For — still rejected.
        assert_eq!(t.decide(&r, 100), VoteResult::Rejected);
    }

    #[test]
    fn vetoer_voting_for_does_not_veto() {
        let (ledger, holders) = cap_table();
        let mut r = rule();
        r.vetoers.insert(holders[0].clone());

        let mut bx = BallotBox::new();
        bx.cast(holders[0].clone(), Attitude::For, Timestamp::new(1));
        bx.cast(holders[1].clone(), Attitude::For, Timestamp::new(1));

        let t = bx.tally(&r, SNAPSHOT, window_end(), CATEGORY, &ledger, &DelegationMap::new());
        assert!(!t.vetoed);
        assert_eq!(t.decide(&r, 100), VoteResult::Passed);
    }

    #[test]
    fn class_filter_excludes_outside_ballots() {
        let mut ledger = CheckpointLedger::new();
        let common = acct("common");
        let preferred = acct("preferred");
        ledger
            .record(&common, ClassCode(1), 90, Timestamp::new(0))
            .unwrap();
        ledger
            .record(&preferred, ClassCode(2), 10, Timestamp::new(0))
            .unwrap();

        let mut r = rule();
        r.class_filter = Some(ClassCode(2));
        // The common holder is also a vetoer, but votes from outside the
        // class are excluded before veto evaluation.
        r.vetoers.insert(common.clone());

        let mut bx = BallotBox::new();
        bx.cast(common.clone(), Attitude::Against, Timestamp::new(1));
        bx.cast(preferred.clone(), Attitude::For, Timestamp::new(1));

        let t = bx.tally(&r, SNAPSHOT, window_end(), CATEGORY, &ledger, &DelegationMap::new());
        assert!(!t.vetoed);
        assert_eq!(t.weight_for, 10);
        assert_eq!(t.weight_against, 0);

        let total = ledger.total_weight(SNAPSHOT, RatioType::CapitalAmount, Some(ClassCode(2)));
        assert_eq!(t.decide(&r, total), VoteResult::Passed);
    }

    #[test]
    fn head_count_weights_one_per_voter() {
        let (ledger, holders) = cap_table();
        let mut r = rule();
        r.ratio_type = RatioType::HeadCount;

        let mut bx = BallotBox::new();
        bx.cast(holders[0].clone(), Attitude::Against, Timestamp::new(1)); // 40 units, 1 head
        bx.cast(holders[2].clone(), Attitude::For, Timestamp::new(1));
        bx.cast(holders[3].clone(), Attitude::For, Timestamp::new(1));

        let t = bx.tally(&r, SNAPSHOT, window_end(), CATEGORY, &ledger, &DelegationMap::new());
        assert_eq!(t.weight_for, 2);
        assert_eq!(t.weight_against, 1);
        let total = ledger.total_weight(SNAPSHOT, RatioType::HeadCount, None);
        assert_eq!(t.decide(&r, total), VoteResult::Passed);
    }
}
