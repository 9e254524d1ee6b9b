//! Shared closed enums describing motions and voting weight.

use crate::hash::{Digest, DocId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ownership class code (common, preferred, a growth series, ...).
///
/// Class-specific voting rules restrict eligibility to holders of one class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassCode(pub u16);

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// How ballots are weighted when a motion is tallied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatioType {
    /// One unit per distinct qualifying voter.
    HeadCount,
    /// Each voter's capital weight at the motion's power snapshot.
    CapitalAmount,
}

/// The category of action a motion authorizes.
///
/// Categories scope delegations (a member may entrust election votes without
/// entrusting fund-transfer votes) and select the executor's command variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MotionCategory {
    /// Elect or remove an officer.
    Election,
    /// Move funds out of the treasury.
    FundTransfer,
    /// Distribute profits to members.
    ProfitDistribution,
    /// Approve a circulated document.
    DocumentApproval,
    /// Any other bundled action.
    GeneralAction,
}

/// Opaque reference to the subject of a motion.
///
/// The motion engine never interprets the reference; it only checks external
/// preconditions against it and hands it to the executor on success.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentsRef {
    /// A document record on the ledger.
    Document(DocId),
    /// The digest of a bundled action (target/payload list).
    Action(Digest),
}
