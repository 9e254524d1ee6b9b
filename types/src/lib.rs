//! Fundamental types for the gavel governance ledger.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: member accounts, the shared logical clock, content digests and
//! hash-locks, ownership classes, and the closed enums that describe motions.

pub mod account;
pub mod events;
pub mod governance;
pub mod hash;
pub mod time;

pub use account::Account;
pub use events::EventBus;
pub use governance::{ClassCode, ContentsRef, MotionCategory, RatioType};
pub use hash::{Digest, DocId, HashLock};
pub use time::Timestamp;

/// Basis-point denominator used by every ratio in the protocol (100% = 10_000).
pub const BPS_DENOM: u64 = 10_000;
