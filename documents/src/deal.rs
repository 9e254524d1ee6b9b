//! Deal settlement — commit-reveal closing of individual deals.
//!
//! A cleared deal records a hash-lock and a closing deadline; whoever holds
//! the preimage can close it unilaterally before the deadline, and the
//! counterparty cannot extract the asset without the secret eventually being
//! revealed. This decouples off-ledger consideration payment from on-ledger
//! transfer.

use crate::capability::Capability;
use crate::document::Document;
use crate::error::DocumentError;
use gavel_types::{Account, ClassCode, DocId, HashLock, Timestamp};
use serde::{Deserialize, Serialize};

/// Settlement state of one deal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealState {
    /// Declared in the document; nothing committed yet.
    Open,
    /// Locked under a commitment and a closing deadline.
    Cleared,
    /// Preimage presented in time; ready for the cap-table to apply.
    Closed,
    /// Withdrawn or replaced; will never settle.
    Terminated,
}

/// The economic terms of one deal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealTerms {
    pub payer: Account,
    pub payee: Account,
    pub class: ClassCode,
    pub units: u64,
    pub price_per_unit: u64,
}

/// A registered first-refusal claim on an open deal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claim {
    pub claimant: Account,
    pub weight: u64,
    pub registered_at: Timestamp,
}

/// One deal inside a document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Deal {
    pub seq: u16,
    pub terms: DealTerms,
    pub state: DealState,
    pub hash_lock: Option<HashLock>,
    pub closing_deadline: Option<Timestamp>,
    pub(crate) claims: Vec<Claim>,
}

impl Deal {
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }
}

/// What the external cap-table applies once a deal closes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub doc: DocId,
    pub deal_seq: u16,
    pub terms: DealTerms,
    pub closed_at: Timestamp,
}

/// External cap-table collaborator. Share transfer arithmetic lives outside
/// this crate; closed settlements are handed over through this seam.
pub trait CapTable {
    fn apply_settlement(&mut self, record: &SettlementRecord);
}

/// External collaborator that splits one deal among priority claimants.
///
/// Runs once, deterministically, after the claim-registration window; the
/// returned terms replace the original deal pro-rata by claimant weight.
pub trait PriorityClaimResolver {
    fn allocate(&self, deal: &Deal, claims: &[Claim]) -> Vec<DealTerms>;
}

impl Document {
    /// Declare a deal while drafting. Deals freeze with the rest of the
    /// terms at finalization.
    pub fn add_deal(&mut self, caller: &Account, terms: DealTerms) -> Result<u16, DocumentError> {
        if self.state != crate::document::DocState::Drafting {
            return Err(DocumentError::WrongState {
                expected: crate::document::DocState::Drafting,
                actual: self.state,
            });
        }
        self.capabilities().require(caller, Capability::EditTerms)?;
        let seq = self.next_deal_seq;
        self.next_deal_seq += 1;
        self.deals.insert(
            seq,
            Deal {
                seq,
                terms,
                state: DealState::Open,
                hash_lock: None,
                closing_deadline: None,
                claims: Vec::new(),
            },
        );
        Ok(seq)
    }

    /// Commit step: lock a deal under `lock` until `deadline`.
    ///
    /// Permitted on an `Open` deal, or on a `Cleared` deal whose deadline has
    /// lapsed (re-clear with a fresh lock). Unresolved priority claims must
    /// be allocated first.
    pub fn clear_deal(
        &mut self,
        caller: &Account,
        seq: u16,
        lock: HashLock,
        deadline: Timestamp,
        now: Timestamp,
    ) -> Result<(), DocumentError> {
        self.require_settleable()?;
        self.capabilities().require(caller, Capability::SettleDeals)?;
        let deal = self
            .deals
            .get_mut(&seq)
            .ok_or(DocumentError::DealNotFound(seq))?;
        let reclearable = deal.state == DealState::Cleared
            && deal
                .closing_deadline
                .map(|d| d.has_passed(now))
                .unwrap_or(false);
        if deal.state != DealState::Open && !reclearable {
            return Err(DocumentError::DealWrongState {
                seq,
                expected: DealState::Open,
                actual: deal.state,
            });
        }
        if !deal.claims.is_empty() {
            return Err(DocumentError::OutstandingClaims(seq));
        }
        deal.hash_lock = Some(lock);
        deal.closing_deadline = Some(deadline);
        deal.state = DealState::Cleared;
        Ok(())
    }

    /// Reveal step: present the preimage and close the deal.
    ///
    /// Fails `BadKey` or `Expired` without touching the deal; a failed close
    /// can be retried indefinitely.
    pub fn close_deal(
        &mut self,
        seq: u16,
        key: &[u8],
        now: Timestamp,
    ) -> Result<SettlementRecord, DocumentError> {
        self.require_settleable()?;
        let doc_id = self.id;
        let deal = self
            .deals
            .get_mut(&seq)
            .ok_or(DocumentError::DealNotFound(seq))?;
        if deal.state != DealState::Cleared {
            return Err(DocumentError::DealWrongState {
                seq,
                expected: DealState::Cleared,
                actual: deal.state,
            });
        }
        let lock = deal.hash_lock.ok_or(DocumentError::BadKey)?;
        if !lock.matches(key) {
            return Err(DocumentError::BadKey);
        }
        if let Some(deadline) = deal.closing_deadline {
            if deadline.has_passed(now) {
                return Err(DocumentError::Expired {
                    now: now.as_secs(),
                    expired_at: deadline.as_secs(),
                });
            }
        }
        deal.state = DealState::Closed;
        Ok(SettlementRecord {
            doc: doc_id,
            deal_seq: seq,
            terms: deal.terms.clone(),
            closed_at: now,
        })
    }

    /// Withdraw a deal that has not closed.
    pub fn terminate_deal(&mut self, caller: &Account, seq: u16) -> Result<(), DocumentError> {
        self.require_settleable()?;
        self.capabilities().require(caller, Capability::SettleDeals)?;
        let deal = self
            .deals
            .get_mut(&seq)
            .ok_or(DocumentError::DealNotFound(seq))?;
        match deal.state {
            DealState::Open | DealState::Cleared => {
                deal.state = DealState::Terminated;
                Ok(())
            }
            actual => Err(DocumentError::DealWrongState {
                seq,
                expected: DealState::Open,
                actual,
            }),
        }
    }

    /// Register a first-refusal claim during the window before clearing.
    pub fn register_claim(
        &mut self,
        seq: u16,
        claimant: Account,
        weight: u64,
        now: Timestamp,
    ) -> Result<(), DocumentError> {
        self.require_settleable()?;
        let deal = self
            .deals
            .get_mut(&seq)
            .ok_or(DocumentError::DealNotFound(seq))?;
        if deal.state != DealState::Open {
            return Err(DocumentError::DealWrongState {
                seq,
                expected: DealState::Open,
                actual: deal.state,
            });
        }
        deal.claims.push(Claim {
            claimant,
            weight,
            registered_at: now,
        });
        Ok(())
    }

    /// Single deterministic allocation pass: the resolver splits the deal
    /// among claimants, the replacements are installed as fresh open deals,
    /// and the original is terminated. Returns the replacement seqs.
    pub fn apply_priority_claims(
        &mut self,
        caller: &Account,
        seq: u16,
        resolver: &dyn PriorityClaimResolver,
    ) -> Result<Vec<u16>, DocumentError> {
        self.require_settleable()?;
        self.capabilities().require(caller, Capability::SettleDeals)?;
        let replacements = {
            let deal = self
                .deals
                .get_mut(&seq)
                .ok_or(DocumentError::DealNotFound(seq))?;
            if deal.state != DealState::Open {
                return Err(DocumentError::DealWrongState {
                    seq,
                    expected: DealState::Open,
                    actual: deal.state,
                });
            }
            let claims = std::mem::take(&mut deal.claims);
            let replacements = resolver.allocate(deal, &claims);
            deal.state = DealState::Terminated;
            replacements
        };

        let mut seqs = Vec::with_capacity(replacements.len());
        for terms in replacements {
            let new_seq = self.next_deal_seq;
            self.next_deal_seq += 1;
            self.deals.insert(
                new_seq,
                Deal {
                    seq: new_seq,
                    terms,
                    state: DealState::Open,
                    hash_lock: None,
                    closing_deadline: None,
                    claims: Vec::new(),
                },
            );
            seqs.push(new_seq);
        }
        Ok(seqs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocState;

    fn acct(name: &str) -> Account {
        Account::new(format!("gvl_{name}"))
    }

    fn terms(payer: &str, payee: &str, units: u64) -> DealTerms {
        DealTerms {
            payer: acct(payer),
            payee: acct(payee),
            class: ClassCode(1),
            units,
            price_per_unit: 10,
        }
    }

    /// An established document with one open deal, owner holding all caps.
    fn established() -> (Document, Account, u16) {
        let owner = acct("owner");
        let id = DocId::derive(owner.as_str().as_bytes(), 0);
        let mut doc = Document::new(id, &owner);
        let seq = doc.add_deal(&owner, terms("buyer", "seller", 100)).unwrap();
        doc.add_party(&owner, acct("buyer")).unwrap();
        doc.add_party(&owner, acct("seller")).unwrap();
        doc.finalize(&owner).unwrap();
        doc.circulate(&owner, Timestamp::EPOCH).unwrap();
        doc.sign(&acct("buyer"), Timestamp::new(100)).unwrap();
        doc.sign(&acct("seller"), Timestamp::new(200)).unwrap();
        assert_eq!(doc.state, DocState::Established);
        (doc, owner, seq)
    }

    #[test]
    fn clear_then_close_with_correct_key() {
        let (mut doc, owner, seq) = established();
        let lock = HashLock::from_key(b"the secret");
        doc.clear_deal(&owner, seq, lock, Timestamp::new(10_000), Timestamp::new(300))
            .unwrap();
        assert_eq!(doc.deal(seq).unwrap().state, DealState::Cleared);

        let record = doc.close_deal(seq, b"the secret", Timestamp::new(400)).unwrap();
        assert_eq!(doc.deal(seq).unwrap().state, DealState::Closed);
        assert_eq!(record.deal_seq, seq);
        assert_eq!(record.terms.units, 100);
    }

    #[test]
    fn wrong_key_leaves_cleared_state_untouched() {
        let (mut doc, owner, seq) = established();
        doc.clear_deal(
            &owner,
            seq,
            HashLock::from_key(b"right"),
            Timestamp::new(10_000),
            Timestamp::new(300),
        )
        .unwrap();

        for _ in 0..3 {
            assert!(matches!(
                doc.close_deal(seq, b"wrong", Timestamp::new(400)),
                Err(DocumentError::BadKey)
            ));
            assert_eq!(doc.deal(seq).unwrap().state, DealState::Cleared);
        }
        // The correct key still works afterwards.
        doc.close_deal(seq, b"right", Timestamp::new(500)).unwrap();
    }

    #[test]
    fn close_past_deadline_expires_until_recleared() {
        let (mut doc, owner, seq) = established();
        doc.clear_deal(
            &owner,
            seq,
            HashLock::from_key(b"key"),
            Timestamp::new(1_000),
            Timestamp::new(300),
        )
        .unwrap();

        assert!(matches!(
            doc.close_deal(seq, b"key", Timestamp::new(1_000)),
            Err(DocumentError::Expired { .. })
        ));
        assert_eq!(doc.deal(seq).unwrap().state, DealState::Cleared);

        // Stuck until re-cleared with a fresh lock.
        doc.clear_deal(
            &owner,
            seq,
            HashLock::from_key(b"new key"),
            Timestamp::new(5_000),
            Timestamp::new(1_100),
        )
        .unwrap();
        doc.close_deal(seq, b"new key", Timestamp::new(1_200)).unwrap();
    }

    #[test]
    fn reclear_before_expiry_is_refused() {
        let (mut doc, owner, seq) = established();
        doc.clear_deal(
            &owner,
            seq,
            HashLock::from_key(b"key"),
            Timestamp::new(1_000),
            Timestamp::new(300),
        )
        .unwrap();
        assert!(matches!(
            doc.clear_deal(
                &owner,
                seq,
                HashLock::from_key(b"other"),
                Timestamp::new(2_000),
                Timestamp::new(400),
            ),
            Err(DocumentError::DealWrongState { .. })
        ));
    }

    #[test]
    fn clear_requires_settle_capability() {
        let (mut doc, _, seq) = established();
        let stranger = acct("stranger");
        assert!(matches!(
            doc.clear_deal(
                &stranger,
                seq,
                HashLock::from_key(b"key"),
                Timestamp::new(1_000),
                Timestamp::new(300),
            ),
            Err(DocumentError::MissingCapability { .. })
        ));
    }

    #[test]
    fn settlement_requires_establishment() {
        let owner = acct("owner");
        let id = DocId::derive(owner.as_str().as_bytes(), 0);
        let mut doc = Document::new(id, &owner);
        let seq = doc.add_deal(&owner, terms("buyer", "seller", 10)).unwrap();
        assert!(matches!(
            doc.clear_deal(
                &owner,
                seq,
                HashLock::from_key(b"key"),
                Timestamp::new(1_000),
                Timestamp::EPOCH,
            ),
            Err(DocumentError::NotEstablished)
        ));
    }

    #[test]
    fn approval_gate_blocks_until_motion_recorded() {
        let owner = acct("owner");
        let id = DocId::derive(owner.as_str().as_bytes(), 0);
        let mut doc = Document::new(id, &owner);
        doc.set_requires_approval(&owner, true).unwrap();
        let seq = doc.add_deal(&owner, terms("buyer", "seller", 10)).unwrap();
        doc.add_party(&owner, acct("buyer")).unwrap();
        doc.finalize(&owner).unwrap();
        doc.circulate(&owner, Timestamp::EPOCH).unwrap();
        doc.sign(&acct("buyer"), Timestamp::new(1)).unwrap();

        // Established, but the vote gate is still down.
        assert!(matches!(
            doc.clear_deal(
                &owner,
                seq,
                HashLock::from_key(b"key"),
                Timestamp::new(1_000),
                Timestamp::new(10),
            ),
            Err(DocumentError::ApprovalPending)
        ));

        doc.record_motion_approval(42);
        doc.clear_deal(
            &owner,
            seq,
            HashLock::from_key(b"key"),
            Timestamp::new(1_000),
            Timestamp::new(10),
        )
        .unwrap();
    }

    struct ProRata;
    impl PriorityClaimResolver for ProRata {
        fn allocate(&self, deal: &Deal, claims: &[Claim]) -> Vec<DealTerms> {
            let total: u64 = claims.iter().map(|c| c.weight).sum();
            claims
                .iter()
                .map(|c| DealTerms {
                    payer: c.claimant.clone(),
                    payee: deal.terms.payee.clone(),
                    class: deal.terms.class,
                    units: deal.terms.units * c.weight / total,
                    price_per_unit: deal.terms.price_per_unit,
                })
                .collect()
        }
    }

    #[test]
    fn priority_claims_split_and_terminate_original() {
        let (mut doc, owner, seq) = established();
        doc.register_claim(seq, acct("claimant-a"), 3, Timestamp::new(300))
            .unwrap();
        doc.register_claim(seq, acct("claimant-b"), 1, Timestamp::new(310))
            .unwrap();

        // Clearing with claims outstanding is refused.
        assert!(matches!(
            doc.clear_deal(
                &owner,
                seq,
                HashLock::from_key(b"key"),
                Timestamp::new(1_000),
                Timestamp::new(320),
            ),
            Err(DocumentError::OutstandingClaims(_))
        ));

        let new_seqs = doc.apply_priority_claims(&owner, seq, &ProRata).unwrap();
        assert_eq!(new_seqs.len(), 2);
        assert_eq!(doc.deal(seq).unwrap().state, DealState::Terminated);

        let a = doc.deal(new_seqs[0]).unwrap();
        let b = doc.deal(new_seqs[1]).unwrap();
        assert_eq!(a.terms.units, 75);
        assert_eq!(b.terms.units, 25);
        assert_eq!(a.state, DealState::Open);

        // The replacements settle like any other deal.
        doc.clear_deal(
            &owner,
            new_seqs[0],
            HashLock::from_key(b"key"),
            Timestamp::new(1_000),
            Timestamp::new(330),
        )
        .unwrap();
    }

    #[test]
    fn terminate_only_open_or_cleared() {
        let (mut doc, owner, seq) = established();
        doc.clear_deal(
            &owner,
            seq,
            HashLock::from_key(b"key"),
            Timestamp::new(1_000),
            Timestamp::new(300),
        )
        .unwrap();
        doc.close_deal(seq, b"key", Timestamp::new(400)).unwrap();
        assert!(matches!(
            doc.terminate_deal(&owner, seq),
            Err(DocumentError::DealWrongState { .. })
        ));
    }
}
