//! The document controller — owns every document record and wraps each
//! mutation with event emission.

use crate::capability::Capability;
use crate::deal::{CapTable, DealTerms, PriorityClaimResolver, SettlementRecord};
use crate::document::{DocState, Document};
use crate::error::DocumentError;
use crate::events::DocumentEvent;
use gavel_types::{Account, Digest, DocId, EventBus, HashLock, Timestamp};
use std::collections::BTreeMap;

/// Owns documents keyed by their ledger address. One controller per
/// organization, passed as an explicit handle.
pub struct DocumentController {
    documents: BTreeMap<DocId, Document>,
    bus: EventBus<DocumentEvent>,
}

impl DocumentController {
    pub fn new() -> Self {
        Self {
            documents: BTreeMap::new(),
            bus: EventBus::new(),
        }
    }

    /// Subscribe to document events.
    pub fn subscribe(&mut self, listener: impl Fn(&DocumentEvent) + Send + Sync + 'static) {
        self.bus.subscribe(listener);
    }

    /// Open a fresh draft owned by `owner`.
    pub fn create_document(&mut self, owner: &Account, now: Timestamp) -> DocId {
        let id = DocId::derive(owner.as_str().as_bytes(), now.as_secs());
        self.documents.insert(id, Document::new(id, owner));
        tracing::debug!(doc = %id, %owner, "document drafted");
        id
    }

    pub fn document(&self, id: &DocId) -> Result<&Document, DocumentError> {
        self.documents
            .get(id)
            .ok_or(DocumentError::DocumentNotFound(*id))
    }

    fn document_mut(&mut self, id: &DocId) -> Result<&mut Document, DocumentError> {
        self.documents
            .get_mut(id)
            .ok_or(DocumentError::DocumentNotFound(*id))
    }

    // ── Drafting ─────────────────────────────────────────────────────

    pub fn set_term(
        &mut self,
        id: &DocId,
        caller: &Account,
        clause_seq: u16,
        content: Digest,
    ) -> Result<(), DocumentError> {
        self.document_mut(id)?.set_term(caller, clause_seq, content)
    }

    pub fn add_party(
        &mut self,
        id: &DocId,
        caller: &Account,
        party: Account,
    ) -> Result<(), DocumentError> {
        self.document_mut(id)?.add_party(caller, party)
    }

    pub fn remove_party(
        &mut self,
        id: &DocId,
        caller: &Account,
        party: &Account,
    ) -> Result<(), DocumentError> {
        self.document_mut(id)?.remove_party(caller, party)
    }

    pub fn set_timing(
        &mut self,
        id: &DocId,
        caller: &Account,
        signing_days: u16,
        closing_days: u16,
    ) -> Result<(), DocumentError> {
        self.document_mut(id)?
            .set_timing(caller, signing_days, closing_days)
    }

    pub fn set_requires_approval(
        &mut self,
        id: &DocId,
        caller: &Account,
        required: bool,
    ) -> Result<(), DocumentError> {
        self.document_mut(id)?.set_requires_approval(caller, required)
    }

    pub fn grant_capability(
        &mut self,
        id: &DocId,
        caller: &Account,
        to: &Account,
        capability: Capability,
    ) -> Result<(), DocumentError> {
        self.document_mut(id)?.grant_capability(caller, to, capability)
    }

    pub fn revoke_capability(
        &mut self,
        id: &DocId,
        caller: &Account,
        from: &Account,
        capability: Capability,
    ) -> Result<(), DocumentError> {
        self.document_mut(id)?
            .revoke_capability(caller, from, capability)
    }

    pub fn add_deal(
        &mut self,
        id: &DocId,
        caller: &Account,
        terms: DealTerms,
    ) -> Result<u16, DocumentError> {
        self.document_mut(id)?.add_deal(caller, terms)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    pub fn finalize(&mut self, id: &DocId, caller: &Account) -> Result<(), DocumentError> {
        self.document_mut(id)?.finalize(caller)?;
        self.state_changed(id, DocState::Drafting, DocState::Finalized);
        Ok(())
    }

    pub fn circulate(
        &mut self,
        id: &DocId,
        caller: &Account,
        now: Timestamp,
    ) -> Result<(), DocumentError> {
        self.document_mut(id)?.circulate(caller, now)?;
        self.state_changed(id, DocState::Finalized, DocState::Circulated);
        Ok(())
    }

    pub fn sign(
        &mut self,
        id: &DocId,
        party: &Account,
        now: Timestamp,
    ) -> Result<(), DocumentError> {
        let established = self.document_mut(id)?.sign(party, now)?;
        if established {
            self.state_changed(id, DocState::Circulated, DocState::Established);
            tracing::info!(doc = %id, "document established");
            self.bus.emit(&DocumentEvent::Established { doc: *id });
        }
        Ok(())
    }

    /// Record an executed approval motion about this document (fired from the
    /// motion side when a `DocumentApproval` motion executes).
    pub fn record_motion_approval(
        &mut self,
        id: &DocId,
        motion_seq: u64,
    ) -> Result<(), DocumentError> {
        self.document_mut(id)?.record_motion_approval(motion_seq);
        Ok(())
    }

    // ── Deal settlement ──────────────────────────────────────────────

    pub fn clear_deal(
        &mut self,
        id: &DocId,
        caller: &Account,
        seq: u16,
        lock: HashLock,
        deadline: Timestamp,
        now: Timestamp,
    ) -> Result<(), DocumentError> {
        self.document_mut(id)?
            .clear_deal(caller, seq, lock, deadline, now)?;
        tracing::debug!(doc = %id, deal = seq, "deal cleared");
        self.bus
            .emit(&DocumentEvent::DealCleared { doc: *id, deal: seq });
        Ok(())
    }

    pub fn close_deal(
        &mut self,
        id: &DocId,
        seq: u16,
        key: &[u8],
        now: Timestamp,
    ) -> Result<SettlementRecord, DocumentError> {
        let record = self.document_mut(id)?.close_deal(seq, key, now)?;
        tracing::info!(doc = %id, deal = seq, "deal closed");
        self.bus
            .emit(&DocumentEvent::DealClosed { doc: *id, deal: seq });
        Ok(record)
    }

    /// Close a deal and hand the settlement straight to the external
    /// cap-table.
    pub fn settle_deal(
        &mut self,
        id: &DocId,
        seq: u16,
        key: &[u8],
        now: Timestamp,
        cap_table: &mut dyn CapTable,
    ) -> Result<(), DocumentError> {
        let record = self.close_deal(id, seq, key, now)?;
        cap_table.apply_settlement(&record);
        Ok(())
    }

    pub fn terminate_deal(
        &mut self,
        id: &DocId,
        caller: &Account,
        seq: u16,
    ) -> Result<(), DocumentError> {
        self.document_mut(id)?.terminate_deal(caller, seq)?;
        self.bus
            .emit(&DocumentEvent::DealTerminated { doc: *id, deal: seq });
        Ok(())
    }

    pub fn register_claim(
        &mut self,
        id: &DocId,
        seq: u16,
        claimant: Account,
        weight: u64,
        now: Timestamp,
    ) -> Result<(), DocumentError> {
        self.document_mut(id)?
            .register_claim(seq, claimant, weight, now)
    }

    pub fn apply_priority_claims(
        &mut self,
        id: &DocId,
        caller: &Account,
        seq: u16,
        resolver: &dyn PriorityClaimResolver,
    ) -> Result<Vec<u16>, DocumentError> {
        let seqs = self
            .document_mut(id)?
            .apply_priority_claims(caller, seq, resolver)?;
        self.bus
            .emit(&DocumentEvent::DealTerminated { doc: *id, deal: seq });
        Ok(seqs)
    }

    fn state_changed(&self, id: &DocId, from: DocState, to: DocState) {
        tracing::info!(doc = %id, ?from, ?to, "document state changed");
        self.bus.emit(&DocumentEvent::StateChanged {
            doc: *id,
            from,
            to,
        });
    }
}

impl DocumentController {
    /// Serialize every document record for persistence.
    pub fn save_state(&self) -> Vec<u8> {
        bincode::serialize(&self.documents).unwrap_or_default()
    }

    /// Restore a controller from serialized bytes. Listeners must
    /// re-subscribe.
    pub fn load_state(data: &[u8]) -> Self {
        Self {
            documents: bincode::deserialize(data).unwrap_or_default(),
            bus: EventBus::new(),
        }
    }
}

impl Default for DocumentController {
    fn default() -> Self {
        Self::new()
    }
}
