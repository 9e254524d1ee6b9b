//! The action executor — routes voted command bundles to their targets.

use crate::action::{description_digest, ActionPayload, CallContext, Callable, Command, TargetId};
use crate::error::ExecError;
use gavel_motions::MotionAction;
use gavel_types::ContentsRef;
use std::collections::BTreeMap;

/// Routes commands to registered targets, all-or-nothing.
///
/// Every command in a bundle is validated against the pre-execution state
/// before any is applied; a single failing command aborts the whole bundle
/// with nothing changed. Constraints that accumulate across commands of one
/// bundle are checked through each target's `validate_bundle`.
pub struct ActionExecutor {
    targets: BTreeMap<TargetId, Box<dyn Callable>>,
}

impl ActionExecutor {
    pub fn new() -> Self {
        Self {
            targets: BTreeMap::new(),
        }
    }

    /// Install the target behind `id`, replacing any previous one.
    pub fn register(&mut self, id: TargetId, target: Box<dyn Callable>) {
        self.targets.insert(id, target);
    }

    /// Validate the whole bundle, then apply the whole bundle.
    pub fn run(&mut self, ctx: &CallContext, commands: &[Command]) -> Result<(), ExecError> {
        for (index, command) in commands.iter().enumerate() {
            let target = self
                .targets
                .get(&command.target)
                .ok_or(ExecError::UnknownTarget(command.target))?;
            target
                .validate(ctx, &command.payload)
                .map_err(|reason| ExecError::Validation { index, reason })?;
        }
        let mut grouped: BTreeMap<TargetId, Vec<&ActionPayload>> = BTreeMap::new();
        for command in commands {
            grouped
                .entry(command.target)
                .or_default()
                .push(&command.payload);
        }
        for (id, payloads) in &grouped {
            if let Some(target) = self.targets.get(id) {
                target
                    .validate_bundle(ctx, payloads)
                    .map_err(|reason| ExecError::Bundle {
                        target: *id,
                        reason,
                    })?;
            }
        }
        for command in commands {
            if let Some(target) = self.targets.get_mut(&command.target) {
                target.apply(ctx, &command.payload);
            }
        }
        tracing::info!(
            motion = ctx.motion_seq,
            commands = commands.len(),
            "action bundle applied"
        );
        Ok(())
    }
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapter that lets a motion registry trigger the executor.
///
/// Checks the presented bundle against the digest the members voted on
/// before anything runs, so a passed motion can only ever authorize the
/// exact commands it described.
pub struct BoundAction<'a> {
    executor: &'a mut ActionExecutor,
    commands: &'a [Command],
}

impl<'a> BoundAction<'a> {
    pub fn new(executor: &'a mut ActionExecutor, commands: &'a [Command]) -> Self {
        Self { executor, commands }
    }
}

impl MotionAction for BoundAction<'_> {
    fn run(&mut self, motion_seq: u64, contents: &ContentsRef) -> Result<(), String> {
        let expected = match contents {
            ContentsRef::Action(digest) => *digest,
            ContentsRef::Document(_) => return Err(ExecError::NotAction.to_string()),
        };
        let actual = description_digest(self.commands);
        if expected != actual {
            return Err(ExecError::HashMismatch { expected, actual }.to_string());
        }
        let ctx = CallContext { motion_seq };
        self.executor
            .run(&ctx, self.commands)
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionPayload;
    use gavel_types::{Account, Digest, DocId};

    fn acct(name: &str) -> Account {
        Account::new(format!("gvl_{name}"))
    }

    /// Counts applies; refuses payloads whose amount exceeds `limit`.
    struct Recorder {
        limit: u64,
        applied: Vec<ActionPayload>,
    }

    impl Callable for Recorder {
        fn validate(&self, _ctx: &CallContext, payload: &ActionPayload) -> Result<(), String> {
            if let ActionPayload::Transfer { amount, .. } = payload {
                if *amount > self.limit {
                    return Err(format!("amount {amount} over limit {}", self.limit));
                }
            }
            Ok(())
        }

        fn apply(&mut self, _ctx: &CallContext, payload: &ActionPayload) {
            self.applied.push(payload.clone());
        }
    }

    fn transfer(amount: u64) -> Command {
        Command {
            target: TargetId::Treasury,
            payload: ActionPayload::Transfer {
                to: acct("alice"),
                amount,
            },
        }
    }

    #[test]
    fn unknown_target_refused() {
        let mut executor = ActionExecutor::new();
        let ctx = CallContext { motion_seq: 1 };
        assert!(matches!(
            executor.run(&ctx, &[transfer(1)]),
            Err(ExecError::UnknownTarget(TargetId::Treasury))
        ));
    }

    #[test]
    fn one_invalid_command_aborts_the_bundle() {
        let mut executor = ActionExecutor::new();
        executor.register(
            TargetId::Treasury,
            Box::new(Recorder {
                limit: 10,
                applied: Vec::new(),
            }),
        );
        let ctx = CallContext { motion_seq: 1 };

        // Second command fails validation; the first must not apply.
        let err = executor.run(&ctx, &[transfer(5), transfer(50)]);
        assert!(matches!(err, Err(ExecError::Validation { index: 1, .. })));

        executor.run(&ctx, &[transfer(5), transfer(6)]).unwrap();
    }

    #[test]
    fn bound_action_rejects_digest_mismatch() {
        let mut executor = ActionExecutor::new();
        executor.register(
            TargetId::Treasury,
            Box::new(Recorder {
                limit: u64::MAX,
                applied: Vec::new(),
            }),
        );

        let voted = [transfer(10)];
        let presented = [transfer(9_999)];
        let contents = ContentsRef::Action(description_digest(&voted));

        let mut action = BoundAction::new(&mut executor, &presented);
        assert!(action.run(1, &contents).is_err());

        let mut action = BoundAction::new(&mut executor, &voted);
        action.run(1, &contents).unwrap();
    }

    #[test]
    fn bound_action_rejects_document_contents() {
        let mut executor = ActionExecutor::new();
        let commands = [transfer(1)];
        let mut action = BoundAction::new(&mut executor, &commands);
        let contents = ContentsRef::Document(DocId::derive(b"gvl_owner", 0));
        assert!(action.run(1, &contents).is_err());
    }

    #[test]
    fn empty_bundle_digest_is_stable() {
        assert_eq!(description_digest(&[]), description_digest(&[]));
        assert_ne!(description_digest(&[]), Digest::ZERO);
    }
}
