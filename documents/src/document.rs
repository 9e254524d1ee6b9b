//! The document state machine.

use crate::capability::{Capability, CapabilityTable};
use crate::deal::Deal;
use crate::error::DocumentError;
use gavel_types::{Account, Digest, DocId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Lifecycle state of a document. Strictly forward; the `Ord` derive follows
/// the progression so monotonicity is checkable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DocState {
    /// Terms, parties, deals, and timing are editable (capability-gated).
    Drafting,
    /// Frozen. Terms and parties can never change again.
    Finalized,
    /// Out for signature; deadlines stamped.
    Circulated,
    /// Every registered party signed before the deadline. Derived state.
    Established,
}

/// A multi-party agreement and its embedded deals.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub state: DocState,
    capabilities: CapabilityTable,
    terms: BTreeMap<u16, Digest>,
    parties: BTreeSet<Account>,
    signatures: BTreeMap<Account, Timestamp>,
    signing_days: u16,
    closing_days: u16,
    pub sign_deadline: Option<Timestamp>,
    pub close_deadline: Option<Timestamp>,
    /// Whether deal settlement additionally requires a passed approval motion.
    requires_approval: bool,
    /// Seq of the executed approval motion, once recorded.
    motion_approval: Option<u64>,
    pub(crate) deals: BTreeMap<u16, Deal>,
    pub(crate) next_deal_seq: u16,
}

impl Document {
    /// Default signature window, in days, unless timing is set while drafting.
    pub const DEFAULT_SIGNING_DAYS: u16 = 30;
    /// Default closing window, in days.
    pub const DEFAULT_CLOSING_DAYS: u16 = 90;

    /// A fresh draft. The owner starts with every capability.
    pub fn new(id: DocId, owner: &Account) -> Self {
        let mut capabilities = CapabilityTable::new();
        capabilities.grant_all(owner);
        Self {
            id,
            state: DocState::Drafting,
            capabilities,
            terms: BTreeMap::new(),
            parties: BTreeSet::new(),
            signatures: BTreeMap::new(),
            signing_days: Self::DEFAULT_SIGNING_DAYS,
            closing_days: Self::DEFAULT_CLOSING_DAYS,
            sign_deadline: None,
            close_deadline: None,
            requires_approval: false,
            motion_approval: None,
            deals: BTreeMap::new(),
            next_deal_seq: 1,
        }
    }

    fn require_state(&self, expected: DocState) -> Result<(), DocumentError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(DocumentError::WrongState {
                expected,
                actual: self.state,
            })
        }
    }

    // ── Drafting-time edits ──────────────────────────────────────────

    /// Set or amend one term clause (keyed by clause seq).
    pub fn set_term(
        &mut self,
        caller: &Account,
        clause_seq: u16,
        content: Digest,
    ) -> Result<(), DocumentError> {
        self.require_state(DocState::Drafting)?;
        self.capabilities.require(caller, Capability::EditTerms)?;
        self.terms.insert(clause_seq, content);
        Ok(())
    }

    pub fn add_party(&mut self, caller: &Account, party: Account) -> Result<(), DocumentError> {
        self.require_state(DocState::Drafting)?;
        self.capabilities
            .require(caller, Capability::ManageParties)?;
        self.parties.insert(party);
        Ok(())
    }

    pub fn remove_party(&mut self, caller: &Account, party: &Account) -> Result<(), DocumentError> {
        self.require_state(DocState::Drafting)?;
        self.capabilities
            .require(caller, Capability::ManageParties)?;
        self.parties.remove(party);
        Ok(())
    }

    pub fn set_timing(
        &mut self,
        caller: &Account,
        signing_days: u16,
        closing_days: u16,
    ) -> Result<(), DocumentError> {
        self.require_state(DocState::Drafting)?;
        self.capabilities.require(caller, Capability::SetTiming)?;
        self.signing_days = signing_days;
        self.closing_days = closing_days;
        Ok(())
    }

    /// Mark that deal settlement needs an approval motion on top of
    /// establishment.
    pub fn set_requires_approval(
        &mut self,
        caller: &Account,
        required: bool,
    ) -> Result<(), DocumentError> {
        self.require_state(DocState::Drafting)?;
        self.capabilities.require(caller, Capability::EditTerms)?;
        self.requires_approval = required;
        Ok(())
    }

    pub fn grant_capability(
        &mut self,
        caller: &Account,
        to: &Account,
        capability: Capability,
    ) -> Result<(), DocumentError> {
        self.capabilities
            .require(caller, Capability::GrantCapability)?;
        self.capabilities.grant(to, capability);
        Ok(())
    }

    pub fn revoke_capability(
        &mut self,
        caller: &Account,
        from: &Account,
        capability: Capability,
    ) -> Result<(), DocumentError> {
        self.capabilities
            .require(caller, Capability::GrantCapability)?;
        self.capabilities.revoke(from, capability);
        Ok(())
    }

    // ── Lifecycle transitions ────────────────────────────────────────

    /// Freeze terms and parties. Irreversible.
    pub fn finalize(&mut self, caller: &Account) -> Result<(), DocumentError> {
        self.require_state(DocState::Drafting)?;
        self.capabilities.require(caller, Capability::Finalize)?;
        if self.parties.is_empty() {
            return Err(DocumentError::NoParties);
        }
        self.state = DocState::Finalized;
        Ok(())
    }

    /// Put the frozen document out for signature, stamping both deadlines.
    pub fn circulate(&mut self, caller: &Account, now: Timestamp) -> Result<(), DocumentError> {
        self.require_state(DocState::Finalized)?;
        self.capabilities.require(caller, Capability::Circulate)?;
        self.sign_deadline = Some(now.add_days(self.signing_days));
        self.close_deadline = Some(now.add_days(self.closing_days));
        self.state = DocState::Circulated;
        Ok(())
    }

    /// Record a party's signature; establishes the document when the last
    /// registered party signs. Returns whether establishment happened.
    pub fn sign(&mut self, party: &Account, now: Timestamp) -> Result<bool, DocumentError> {
        self.require_state(DocState::Circulated)?;
        if !self.parties.contains(party) {
            return Err(DocumentError::NotParty(party.clone()));
        }
        if let Some(deadline) = self.sign_deadline {
            if deadline.has_passed(now) {
                return Err(DocumentError::SignWindowClosed {
                    now: now.as_secs(),
                    closed_at: deadline.as_secs(),
                });
            }
        }
        if self.signatures.contains_key(party) {
            return Err(DocumentError::AlreadySigned(party.clone()));
        }
        self.signatures.insert(party.clone(), now);
        if self.signatures.len() == self.parties.len() {
            self.state = DocState::Established;
            return Ok(true);
        }
        Ok(false)
    }

    // ── Approval gate ────────────────────────────────────────────────

    /// Record that an approval motion about this document was executed.
    pub fn record_motion_approval(&mut self, motion_seq: u64) {
        self.motion_approval = Some(motion_seq);
    }

    /// Both settlement gates: established, and approved when approval is
    /// required. The two are independent AND preconditions.
    pub(crate) fn require_settleable(&self) -> Result<(), DocumentError> {
        if self.state != DocState::Established {
            return Err(DocumentError::NotEstablished);
        }
        if self.requires_approval && self.motion_approval.is_none() {
            return Err(DocumentError::ApprovalPending);
        }
        Ok(())
    }

    // ── Read access ──────────────────────────────────────────────────

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    pub fn term(&self, clause_seq: u16) -> Option<&Digest> {
        self.terms.get(&clause_seq)
    }

    pub fn parties(&self) -> impl Iterator<Item = &Account> {
        self.parties.iter()
    }

    pub fn has_signed(&self, party: &Account) -> bool {
        self.signatures.contains_key(party)
    }

    pub fn requires_approval(&self) -> bool {
        self.requires_approval
    }

    pub fn motion_approval(&self) -> Option<u64> {
        self.motion_approval
    }

    pub fn deal(&self, seq: u16) -> Result<&Deal, DocumentError> {
        self.deals.get(&seq).ok_or(DocumentError::DealNotFound(seq))
    }

    pub fn deals(&self) -> impl Iterator<Item = &Deal> {
        self.deals.values()
    }
}
