//! Executes the side effects passed motions authorize.
//!
//! A motion carries only a digest of the serialized command bundle it
//! describes. When the designated executor triggers a passed motion, the
//! presented bundle is re-hashed against that digest, every command is
//! validated against the current state, and only then is the whole bundle
//! applied. Any failure leaves both the targets and the motion untouched.

pub mod action;
pub mod error;
pub mod executor;
pub mod gate;
pub mod targets;

pub use action::{description_digest, ActionPayload, CallContext, Callable, Command, TargetId};
pub use error::ExecError;
pub use executor::{ActionExecutor, BoundAction};
pub use gate::DocumentGate;
pub use targets::{ApprovalDesk, OfficerRoster, Shared, Treasury};
