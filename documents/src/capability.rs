//! Per-document, per-account capabilities.
//!
//! Edit rights are explicit capability grants checked by a pure function —
//! no role-admin indirection, no inheritance. The document owner starts with
//! every capability and may hand out specific ones (including the right to
//! grant further) without transferring ownership of anything else.

use crate::error::DocumentError;
use gavel_types::Account;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One grantable edit or settlement right on a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Set or amend term clauses and embedded deals while drafting.
    EditTerms,
    /// Set the signing/closing windows while drafting.
    SetTiming,
    /// Add or remove parties while drafting.
    ManageParties,
    /// Freeze the document.
    Finalize,
    /// Put the frozen document out for signature.
    Circulate,
    /// Clear, terminate, and allocate deals once established.
    SettleDeals,
    /// Grant or revoke capabilities on this document.
    GrantCapability,
}

impl Capability {
    /// Every capability, for seeding the owner's grant set.
    pub const ALL: [Capability; 7] = [
        Capability::EditTerms,
        Capability::SetTiming,
        Capability::ManageParties,
        Capability::Finalize,
        Capability::Circulate,
        Capability::SettleDeals,
        Capability::GrantCapability,
    ];
}

/// Per-account capability grants on one document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CapabilityTable {
    grants: BTreeMap<Account, BTreeSet<Capability>>,
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, account: &Account, capability: Capability) {
        self.grants
            .entry(account.clone())
            .or_default()
            .insert(capability);
    }

    pub fn grant_all(&mut self, account: &Account) {
        for capability in Capability::ALL {
            self.grant(account, capability);
        }
    }

    pub fn revoke(&mut self, account: &Account, capability: Capability) {
        if let Some(set) = self.grants.get_mut(account) {
            set.remove(&capability);
            if set.is_empty() {
                self.grants.remove(account);
            }
        }
    }

    /// Pure check: does `account` hold `capability`?
    pub fn allows(&self, account: &Account, capability: Capability) -> bool {
        self.grants
            .get(account)
            .is_some_and(|set| set.contains(&capability))
    }

    /// `allows` as a guard returning the typed access-control error.
    pub fn require(&self, account: &Account, capability: Capability) -> Result<(), DocumentError> {
        if self.allows(account, capability) {
            Ok(())
        } else {
            Err(DocumentError::MissingCapability {
                account: account.clone(),
                capability,
            })
        }
    }
}
