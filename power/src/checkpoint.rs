//! In-memory checkpointed cap-table view.

use crate::error::PowerError;
use crate::source::PowerSource;
use gavel_types::{Account, ClassCode, RatioType, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One recorded holding: `units` of one class, effective from `effective_at`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    pub effective_at: Timestamp,
    pub units: u64,
}

/// Append-only, per-account, per-class holding histories.
///
/// Each history is a time-ordered list of checkpoints; a lookup at time `t`
/// returns the units of the last checkpoint with `effective_at <= t`, or 0 if
/// none exists yet. Recording is append-only and must move forward in time —
/// the ledger's total transaction order guarantees the feed arrives that way.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckpointLedger {
    holdings: HashMap<Account, BTreeMap<ClassCode, Vec<Checkpoint>>>,
}

impl CheckpointLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `account` holds `units` of `class` from `at` onward.
    pub fn record(
        &mut self,
        account: &Account,
        class: ClassCode,
        units: u64,
        at: Timestamp,
    ) -> Result<(), PowerError> {
        let history = self
            .holdings
            .entry(account.clone())
            .or_default()
            .entry(class)
            .or_default();
        if let Some(last) = history.last() {
            if at < last.effective_at {
                return Err(PowerError::CheckpointOutOfOrder {
                    at: at.as_secs(),
                    last: last.effective_at.as_secs(),
                });
            }
        }
        history.push(Checkpoint {
            effective_at: at,
            units,
        });
        Ok(())
    }

    /// Units of one class held by `account` as of `as_of`.
    pub fn units_at(&self, account: &Account, class: ClassCode, as_of: Timestamp) -> u64 {
        self.holdings
            .get(account)
            .and_then(|classes| classes.get(&class))
            .map(|history| Self::lookup(history, as_of))
            .unwrap_or(0)
    }

    /// Capital units across all classes (or one class) as of `as_of`.
    fn capital_at(&self, account: &Account, as_of: Timestamp, class: Option<ClassCode>) -> u64 {
        let Some(classes) = self.holdings.get(account) else {
            return 0;
        };
        match class {
            Some(c) => classes
                .get(&c)
                .map(|h| Self::lookup(h, as_of))
                .unwrap_or(0),
            None => classes
                .values()
                .map(|h| Self::lookup(h, as_of))
                .fold(0u64, u64::saturating_add),
        }
    }

    /// All accounts the ledger has ever seen.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.holdings.keys()
    }

    fn lookup(history: &[Checkpoint], as_of: Timestamp) -> u64 {
        history
            .iter()
            .rev()
            .find(|cp| cp.effective_at <= as_of)
            .map(|cp| cp.units)
            .unwrap_or(0)
    }
}

impl PowerSource for CheckpointLedger {
    fn weight_of(
        &self,
        account: &Account,
        as_of: Timestamp,
        ratio: RatioType,
        class_filter: Option<ClassCode>,
    ) -> u64 {
        let capital = self.capital_at(account, as_of, class_filter);
        match ratio {
            RatioType::HeadCount => u64::from(capital > 0),
            RatioType::CapitalAmount => capital,
        }
    }

    fn total_weight(
        &self,
        as_of: Timestamp,
        ratio: RatioType,
        class_filter: Option<ClassCode>,
    ) -> u64 {
        self.holdings
            .keys()
            .map(|account| self.weight_of(account, as_of, ratio, class_filter))
            .fold(0u64, u64::saturating_add)
    }
}
