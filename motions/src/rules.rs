//! Voting rules and their write-once catalog.

use crate::error::MotionError;
use gavel_types::{Account, ClassCode, RatioType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A named voting rule. Immutable after registration; addressed by `seq`
/// everywhere else and referenced by value, never copied onto motions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VotingRule {
    /// Catalog key.
    pub seq: u16,
    /// How ballots are weighted.
    pub ratio_type: RatioType,
    /// Minimum weight share (basis points of total) required to create a motion.
    pub proposal_threshold_bps: u32,
    /// For/(For+Against) share that must be strictly exceeded to pass.
    pub pass_threshold_bps: u32,
    /// Participating-weight share (basis points of total) required for validity.
    pub quorum_bps: u32,
    /// Accounts whose Against vote unilaterally rejects the motion.
    pub vetoers: BTreeSet<Account>,
    /// Days between proposal and the opening of the vote.
    pub vote_prepare_days: u16,
    /// Length of the voting window, in days.
    pub voting_days: u16,
    /// Days after `vote_end` during which execution is permitted (0 = no limit).
    pub exec_days: u16,
    /// Restricts eligible voters to holders of one ownership class.
    pub class_filter: Option<ClassCode>,
}

/// Immutable-once-set catalog of voting rules, keyed by `seq`.
///
/// Only the governance admin fixed at construction may register rules, and a
/// `seq` can never be overwritten.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VotingRuleStore {
    admin: Account,
    rules: BTreeMap<u16, VotingRule>,
}

impl VotingRuleStore {
    pub fn new(admin: Account) -> Self {
        Self {
            admin,
            rules: BTreeMap::new(),
        }
    }

    /// Register a rule under its `seq`. Write-once: a used seq is rejected.
    pub fn register(&mut self, caller: &Account, rule: VotingRule) -> Result<(), MotionError> {
        if caller != &self.admin {
            return Err(MotionError::NotAdmin(caller.clone()));
        }
        if self.rules.contains_key(&rule.seq) {
            return Err(MotionError::SeqInUse(rule.seq));
        }
        self.rules.insert(rule.seq, rule);
        Ok(())
    }

    pub fn get(&self, seq: u16) -> Result<&VotingRule, MotionError> {
        self.rules.get(&seq).ok_or(MotionError::RuleNotFound(seq))
    }

    pub fn contains(&self, seq: u16) -> bool {
        self.rules.contains_key(&seq)
    }

    pub fn admin(&self) -> &Account {
        &self.admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(name: &str) -> Account {
        Account::new(format!("gvl_{name}"))
    }

    fn rule(seq: u16) -> VotingRule {
        VotingRule {
            seq,
            ratio_type: RatioType::CapitalAmount,
            proposal_threshold_bps: 0,
            pass_threshold_bps: 5_000,
            quorum_bps: 3_000,
            vetoers: BTreeSet::new(),
            vote_prepare_days: 1,
            voting_days: 7,
            exec_days: 0,
            class_filter: None,
        }
    }

    #[test]
    fn register_and_get() {
        let admin = acct("admin");
        let mut store = VotingRuleStore::new(admin.clone());
        store.register(&admin, rule(9)).unwrap();
        assert_eq!(store.get(9).unwrap().quorum_bps, 3_000);
        assert!(matches!(store.get(10), Err(MotionError::RuleNotFound(10))));
    }

    #[test]
    fn seq_is_write_once() {
        let admin = acct("admin");
        let mut store = VotingRuleStore::new(admin.clone());
        store.register(&admin, rule(9)).unwrap();
        let mut changed = rule(9);
        changed.quorum_bps = 1;
        assert!(matches!(
            store.register(&admin, changed),
            Err(MotionError::SeqInUse(9))
        ));
        // The original is untouched.
        assert_eq!(store.get(9).unwrap().quorum_bps, 3_000);
    }

    #[test]
    fn only_admin_registers() {
        let admin = acct("admin");
        let outsider = acct("outsider");
        let mut store = VotingRuleStore::new(admin);
        assert!(matches!(
            store.register(&outsider, rule(1)),
            Err(MotionError::NotAdmin(_))
        ));
    }
}
