//! The read seam between the motion engine and the cap-table.

use gavel_types::{Account, ClassCode, RatioType, Timestamp};

/// Read-only view of voting weight at a past point on the logical clock.
///
/// Implemented here by [`CheckpointLedger`](crate::CheckpointLedger); in a
/// deployment the real cap-table module stands behind this trait. The motion
/// engine never reads weight any other way.
pub trait PowerSource {
    /// Voting weight of one account at `as_of`.
    ///
    /// `HeadCount` yields 1 for any account holding a positive position (in
    /// `class_filter` if set, in any class otherwise) and 0 for everyone
    /// else. `CapitalAmount` yields the account's capital units.
    fn weight_of(
        &self,
        account: &Account,
        as_of: Timestamp,
        ratio: RatioType,
        class_filter: Option<ClassCode>,
    ) -> u64;

    /// Total eligible weight at `as_of` — the quorum base.
    fn total_weight(
        &self,
        as_of: Timestamp,
        ratio: RatioType,
        class_filter: Option<ClassCode>,
    ) -> u64;
}
