//! Checkpointed voting-power source.
//!
//! Vote tallies read ownership weight **as of the motion's power snapshot**,
//! never as of "now". This crate provides the read seam ([`PowerSource`]) the
//! motion engine depends on, plus an in-memory checkpointed cap-table view
//! ([`CheckpointLedger`]) that honors it: holdings are recorded as an
//! append-only history and every lookup resolves against the last checkpoint
//! at or before the queried time, so ownership transfers ordered after a
//! snapshot can never change an earlier reading.

pub mod checkpoint;
pub mod error;
pub mod source;

pub use checkpoint::CheckpointLedger;
pub use error::PowerError;
pub use source::PowerSource;
