//! Commands, the voted description digest, and the target seam.
//!
//! A motion never stores the action it authorizes; it stores a digest of the
//! serialized command list. At execution time the presented commands are
//! re-hashed and compared, so the members always vote on the exact bytes that
//! will run.

use gavel_types::{Account, Digest, DocId};
use serde::{Deserialize, Serialize};

/// Addressable execution targets. Closed by construction: a motion cannot
/// reach code that is not enumerated here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TargetId {
    Treasury,
    OfficerRoster,
    ApprovalDesk,
}

/// One operation a target knows how to perform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionPayload {
    /// Pay `amount` from the organization's funds to `to`.
    Transfer { to: Account, amount: u64 },
    /// Distribute profit: pay every listed allocation from the funds.
    Distribute { allocations: Vec<(Account, u64)> },
    /// Seat `account` under `title`.
    AppointOfficer { account: Account, title: String },
    RemoveOfficer { account: Account },
    /// Record the executing motion as the approval of `doc`.
    ApproveDocument { doc: DocId },
}

/// One addressed operation in a voted bundle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub target: TargetId,
    pub payload: ActionPayload,
}

/// The digest a motion's contents must carry to authorize `commands`.
///
/// Order-sensitive: reordering the bundle produces a different digest.
pub fn description_digest(commands: &[Command]) -> Digest {
    match bincode::serialize(commands) {
        Ok(bytes) => Digest::of(&bytes),
        Err(_) => Digest::ZERO,
    }
}

/// Ambient facts about the executing motion, passed to every call.
pub struct CallContext {
    pub motion_seq: u64,
}

/// A registered execution target.
///
/// `validate` inspects a payload against the current state without touching
/// it; `apply` performs a payload that has passed validation and must not
/// fail. The executor validates a whole bundle before applying any of it.
pub trait Callable {
    fn validate(&self, ctx: &CallContext, payload: &ActionPayload) -> Result<(), String>;

    /// Check every payload routed to this target within one bundle. Targets
    /// with cumulative constraints (a treasury drained by several commands of
    /// the same bundle) override this; the default accepts whatever
    /// `validate` accepted.
    fn validate_bundle(&self, ctx: &CallContext, payloads: &[&ActionPayload]) -> Result<(), String> {
        let _ = (ctx, payloads);
        Ok(())
    }

    fn apply(&mut self, ctx: &CallContext, payload: &ActionPayload);
}
