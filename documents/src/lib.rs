//! Multi-party agreement lifecycle and deal settlement.
//!
//! A document moves strictly forward through
//! `Drafting → Finalized → Circulated → Established`. Drafting-time edits are
//! gated by explicit per-account capabilities; `Finalized` freezes terms and
//! parties irreversibly; `Established` is derived — it is reached
//! automatically when the last registered party signs before the deadline,
//! never set directly.
//!
//! Deals embedded in an established document settle by commit-reveal: a
//! controller clears a deal under a hash-lock and a closing deadline, and the
//! party holding the preimage closes it unilaterally before that deadline.

pub mod capability;
pub mod controller;
pub mod deal;
pub mod document;
pub mod error;
pub mod events;

pub use capability::{Capability, CapabilityTable};
pub use controller::DocumentController;
pub use deal::{
    CapTable, Claim, Deal, DealState, DealTerms, PriorityClaimResolver, SettlementRecord,
};
pub use document::{DocState, Document};
pub use error::DocumentError;
pub use events::DocumentEvent;
