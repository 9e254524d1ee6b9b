//! Vote delegation — entrust voting right (not ownership) per motion category.
//!
//! Depth is capped at 1: a principal hands its voting right directly to a
//! delegate, and chains are rejected at entrustment time in both directions
//! (a delegate who has entrusted onward, and a principal who already holds
//! someone else's right). Cycles are therefore impossible by construction,
//! and resolution at read time is a single hash lookup, never a walk.
//!
//! Weight is *not* moved at entrustment: the delegate's ballot picks up the
//! combined weight of itself and its principals at tally time, so principals
//! added before the window closes are still captured. Entrustments dated at
//! or after a motion's `vote_end` are ignored for that motion's tally.

use crate::error::MotionError;
use gavel_types::{Account, MotionCategory, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One principal's standing entrustment for a motion category.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entrustment {
    pub delegate: Account,
    pub valid_from: Timestamp,
    /// Set once the delegate casts a ballot carrying this entrustment;
    /// revocation is barred from then on.
    pub exercised: bool,
}

/// Flat map of entrustments, resolved by one lookup at read time.
#[derive(Clone, Debug, Default)]
pub struct DelegationMap {
    entrustments: BTreeMap<(Account, MotionCategory), Entrustment>,
    /// Reverse index: (delegate, category) → principals.
    principals: HashMap<(Account, MotionCategory), HashSet<Account>>,
}

impl DelegationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entrust `principal`'s voting right for `category` to `delegate`.
    ///
    /// Structural checks only; the registry separately rejects principals who
    /// already cast a ballot in an open window of the category.
    pub fn entrust(
        &mut self,
        principal: &Account,
        delegate: &Account,
        category: MotionCategory,
        valid_from: Timestamp,
    ) -> Result<(), MotionError> {
        if principal == delegate {
            return Err(MotionError::SelfDelegation);
        }
        // Depth cap: the delegate must not have entrusted onward, and the
        // principal must not already hold someone else's right.
        if self
            .entrustments
            .contains_key(&(delegate.clone(), category))
        {
            return Err(MotionError::DelegationChain);
        }
        if self
            .principals
            .get(&(principal.clone(), category))
            .is_some_and(|set| !set.is_empty())
        {
            return Err(MotionError::DelegationChain);
        }
        if let Some(existing) = self.entrustments.get(&(principal.clone(), category)) {
            if existing.exercised {
                return Err(MotionError::DelegationExercised);
            }
            let old = existing.delegate.clone();
            self.unindex(principal, &old, category);
        }
        self.entrustments.insert(
            (principal.clone(), category),
            Entrustment {
                delegate: delegate.clone(),
                valid_from,
                exercised: false,
            },
        );
        self.principals
            .entry((delegate.clone(), category))
            .or_default()
            .insert(principal.clone());
        Ok(())
    }

    /// Revoke a standing entrustment. Only permitted before it has been
    /// exercised.
    pub fn revoke(
        &mut self,
        principal: &Account,
        category: MotionCategory,
    ) -> Result<(), MotionError> {
        let key = (principal.clone(), category);
        let entrustment = self
            .entrustments
            .get(&key)
            .ok_or_else(|| MotionError::DelegationNotFound(principal.clone()))?;
        if entrustment.exercised {
            return Err(MotionError::DelegationExercised);
        }
        let delegate = entrustment.delegate.clone();
        self.entrustments.remove(&key);
        self.unindex(principal, &delegate, category);
        Ok(())
    }

    /// The delegate currently holding `principal`'s right, if any.
    pub fn delegate_of(&self, principal: &Account, category: MotionCategory) -> Option<&Account> {
        self.entrustment(principal, category).map(|e| &e.delegate)
    }

    /// The full entrustment record for `principal`, if any.
    pub fn entrustment(&self, principal: &Account, category: MotionCategory) -> Option<&Entrustment> {
        self.entrustments.get(&(principal.clone(), category))
    }

    /// All principals whose right `delegate` currently carries for `category`.
    pub fn principals_of(&self, delegate: &Account, category: MotionCategory) -> Vec<Account> {
        self.principals
            .get(&(delegate.clone(), category))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Mark every entrustment carried by `delegate` for `category` as
    /// exercised. Called when the delegate casts a ballot.
    pub fn mark_exercised(&mut self, delegate: &Account, category: MotionCategory) {
        let Some(principals) = self.principals.get(&(delegate.clone(), category)) else {
            return;
        };
        for principal in principals {
            if let Some(e) = self.entrustments.get_mut(&(principal.clone(), category)) {
                e.exercised = true;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entrustments.is_empty()
    }

    fn unindex(&mut self, principal: &Account, delegate: &Account, category: MotionCategory) {
        if let Some(set) = self.principals.get_mut(&(delegate.clone(), category)) {
            set.remove(principal);
            if set.is_empty() {
                self.principals.remove(&(delegate.clone(), category));
            }
        }
    }
}

/// Serializable snapshot of the delegation map (reverse index rebuilt on load).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DelegationSnapshot {
    entrustments: BTreeMap<(Account, MotionCategory), Entrustment>,
}

impl DelegationMap {
    /// Snapshot the entrustments (the reverse index is derived state).
    pub fn to_snapshot(&self) -> DelegationSnapshot {
        DelegationSnapshot {
            entrustments: self.entrustments.clone(),
        }
    }

    /// Rebuild from a snapshot, reverse index included.
    pub fn from_snapshot(snapshot: DelegationSnapshot) -> Self {
        Self::from_entrustments(snapshot.entrustments)
    }

    /// Serialize the entrustments for persistence.
    pub fn save_state(&self) -> Vec<u8> {
        bincode::serialize(&self.to_snapshot()).unwrap_or_default()
    }

    /// Restore from serialized bytes, rebuilding the reverse index.
    pub fn load_state(data: &[u8]) -> Self {
        match bincode::deserialize::<DelegationSnapshot>(data) {
            Ok(snapshot) => Self::from_snapshot(snapshot),
            Err(_) => Self::default(),
        }
    }

    fn from_entrustments(
        entrustments: BTreeMap<(Account, MotionCategory), Entrustment>,
    ) -> Self {
        let mut principals: HashMap<(Account, MotionCategory), HashSet<Account>> = HashMap::new();
        for ((principal, category), e) in &entrustments {
            principals
                .entry((e.delegate.clone(), *category))
                .or_default()
                .insert(principal.clone());
        }
        Self {
            entrustments,
            principals,
        }
    }
}
