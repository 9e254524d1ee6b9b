//! The concrete execution targets.

use crate::action::{ActionPayload, CallContext, Callable};
use gavel_documents::DocumentController;
use gavel_types::Account;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Shared handle over a target, so the same state can sit behind the
/// executor and still be read by the rest of the system.
pub struct Shared<T>(Rc<RefCell<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Callable> Callable for Shared<T> {
    fn validate(&self, ctx: &CallContext, payload: &ActionPayload) -> Result<(), String> {
        self.0.borrow().validate(ctx, payload)
    }

    fn validate_bundle(&self, ctx: &CallContext, payloads: &[&ActionPayload]) -> Result<(), String> {
        self.0.borrow().validate_bundle(ctx, payloads)
    }

    fn apply(&mut self, ctx: &CallContext, payload: &ActionPayload) {
        self.0.borrow_mut().apply(ctx, payload)
    }
}

/// The organization's funds. Pays out `Transfer` commands.
pub struct Treasury {
    funds: u64,
    balances: BTreeMap<Account, u64>,
}

impl Treasury {
    pub fn new(funds: u64) -> Self {
        Self {
            funds,
            balances: BTreeMap::new(),
        }
    }

    pub fn funds(&self) -> u64 {
        self.funds
    }

    pub fn balance_of(&self, account: &Account) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

impl Callable for Treasury {
    fn validate(&self, _ctx: &CallContext, payload: &ActionPayload) -> Result<(), String> {
        match payload {
            ActionPayload::Transfer { amount, .. } => {
                if *amount > self.funds {
                    Err(format!(
                        "treasury holds {}, transfer needs {amount}",
                        self.funds
                    ))
                } else {
                    Ok(())
                }
            }
            ActionPayload::Distribute { allocations } => {
                let total: u64 = allocations
                    .iter()
                    .try_fold(0u64, |acc, (_, amount)| acc.checked_add(*amount))
                    .ok_or("distribution total overflows")?;
                if total > self.funds {
                    Err(format!(
                        "treasury holds {}, distribution needs {total}",
                        self.funds
                    ))
                } else {
                    Ok(())
                }
            }
            other => Err(format!("treasury cannot perform {other:?}")),
        }
    }

    fn validate_bundle(&self, _ctx: &CallContext, payloads: &[&ActionPayload]) -> Result<(), String> {
        // Each command alone may fit the funds while their sum does not.
        let mut total: u64 = 0;
        for payload in payloads {
            let drain = match payload {
                ActionPayload::Transfer { amount, .. } => *amount,
                ActionPayload::Distribute { allocations } => allocations
                    .iter()
                    .try_fold(0u64, |acc, (_, amount)| acc.checked_add(*amount))
                    .ok_or("distribution total overflows")?,
                _ => 0,
            };
            total = total.checked_add(drain).ok_or("bundle total overflows")?;
        }
        if total > self.funds {
            Err(format!(
                "treasury holds {}, bundle drains {total}",
                self.funds
            ))
        } else {
            Ok(())
        }
    }

    fn apply(&mut self, _ctx: &CallContext, payload: &ActionPayload) {
        match payload {
            ActionPayload::Transfer { to, amount } => {
                self.funds = self.funds.saturating_sub(*amount);
                *self.balances.entry(to.clone()).or_default() += amount;
                tracing::debug!(%to, amount, remaining = self.funds, "treasury payout");
            }
            ActionPayload::Distribute { allocations } => {
                for (to, amount) in allocations {
                    self.funds = self.funds.saturating_sub(*amount);
                    *self.balances.entry(to.clone()).or_default() += amount;
                }
                tracing::debug!(
                    recipients = allocations.len(),
                    remaining = self.funds,
                    "profit distributed"
                );
            }
            _ => {}
        }
    }
}

/// Seated officers, keyed by account. Handles elections' appoint/remove.
pub struct OfficerRoster {
    officers: BTreeMap<Account, String>,
}

impl OfficerRoster {
    pub fn new() -> Self {
        Self {
            officers: BTreeMap::new(),
        }
    }

    pub fn is_officer(&self, account: &Account) -> bool {
        self.officers.contains_key(account)
    }

    pub fn title_of(&self, account: &Account) -> Option<&str> {
        self.officers.get(account).map(String::as_str)
    }
}

impl Default for OfficerRoster {
    fn default() -> Self {
        Self::new()
    }
}

impl Callable for OfficerRoster {
    fn validate(&self, _ctx: &CallContext, payload: &ActionPayload) -> Result<(), String> {
        match payload {
            ActionPayload::AppointOfficer { title, .. } => {
                if title.is_empty() {
                    Err("officer title must not be empty".into())
                } else {
                    Ok(())
                }
            }
            ActionPayload::RemoveOfficer { account } => {
                if self.officers.contains_key(account) {
                    Ok(())
                } else {
                    Err(format!("{account} holds no seat"))
                }
            }
            other => Err(format!("roster cannot perform {other:?}")),
        }
    }

    fn apply(&mut self, _ctx: &CallContext, payload: &ActionPayload) {
        match payload {
            ActionPayload::AppointOfficer { account, title } => {
                tracing::info!(%account, title, "officer appointed");
                self.officers.insert(account.clone(), title.clone());
            }
            ActionPayload::RemoveOfficer { account } => {
                tracing::info!(%account, "officer removed");
                self.officers.remove(account);
            }
            _ => {}
        }
    }
}

/// Records an executed approval motion on its subject document.
pub struct ApprovalDesk {
    controller: Shared<DocumentController>,
}

impl ApprovalDesk {
    pub fn new(controller: Shared<DocumentController>) -> Self {
        Self { controller }
    }
}

impl Callable for ApprovalDesk {
    fn validate(&self, _ctx: &CallContext, payload: &ActionPayload) -> Result<(), String> {
        match payload {
            ActionPayload::ApproveDocument { doc } => self
                .controller
                .borrow()
                .document(doc)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            other => Err(format!("approval desk cannot perform {other:?}")),
        }
    }

    fn apply(&mut self, ctx: &CallContext, payload: &ActionPayload) {
        if let ActionPayload::ApproveDocument { doc } = payload {
            let recorded = self
                .controller
                .borrow_mut()
                .record_motion_approval(doc, ctx.motion_seq);
            debug_assert!(recorded.is_ok(), "existence was checked in validate");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Command, TargetId};
    use crate::error::ExecError;
    use crate::executor::ActionExecutor;
    use gavel_types::Timestamp;

    fn acct(name: &str) -> Account {
        Account::new(format!("gvl_{name}"))
    }

    fn ctx() -> CallContext {
        CallContext { motion_seq: 7 }
    }

    #[test]
    fn treasury_pays_within_funds() {
        let mut treasury = Treasury::new(100);
        let alice = acct("alice");
        let pay = ActionPayload::Transfer {
            to: alice.clone(),
            amount: 60,
        };

        treasury.validate(&ctx(), &pay).unwrap();
        treasury.apply(&ctx(), &pay);
        assert_eq!(treasury.funds(), 40);
        assert_eq!(treasury.balance_of(&alice), 60);

        // Another 60 no longer validates.
        assert!(treasury.validate(&ctx(), &pay).is_err());
    }

    #[test]
    fn treasury_distributes_within_funds() {
        let mut treasury = Treasury::new(100);
        let split = ActionPayload::Distribute {
            allocations: vec![(acct("a"), 60), (acct("b"), 30)],
        };
        treasury.validate(&ctx(), &split).unwrap();
        treasury.apply(&ctx(), &split);
        assert_eq!(treasury.funds(), 10);
        assert_eq!(treasury.balance_of(&acct("a")), 60);
        assert_eq!(treasury.balance_of(&acct("b")), 30);

        // Each leg fits alone, the sum does not.
        let over = ActionPayload::Distribute {
            allocations: vec![(acct("a"), 6), (acct("b"), 6)],
        };
        assert!(treasury.validate(&ctx(), &over).is_err());
    }

    #[test]
    fn bundle_cannot_overdraw_the_treasury() {
        let treasury = Shared::new(Treasury::new(100));
        let mut executor = ActionExecutor::new();
        executor.register(TargetId::Treasury, Box::new(treasury.clone()));

        let pay = |amount| Command {
            target: TargetId::Treasury,
            payload: ActionPayload::Transfer {
                to: acct("alice"),
                amount,
            },
        };

        // Each 60 validates alone; together they would drain 120 from 100.
        let err = executor.run(&ctx(), &[pay(60), pay(60)]);
        assert!(matches!(err, Err(ExecError::Bundle { .. })));
        assert_eq!(treasury.borrow().funds(), 100);
        assert_eq!(treasury.borrow().balance_of(&acct("alice")), 0);

        // Within the funds the same shape of bundle applies in full.
        executor.run(&ctx(), &[pay(60), pay(40)]).unwrap();
        assert_eq!(treasury.borrow().funds(), 0);
        assert_eq!(treasury.borrow().balance_of(&acct("alice")), 100);
    }

    #[test]
    fn treasury_refuses_foreign_payloads() {
        let treasury = Treasury::new(100);
        let appoint = ActionPayload::AppointOfficer {
            account: acct("bob"),
            title: "auditor".into(),
        };
        assert!(treasury.validate(&ctx(), &appoint).is_err());
    }

    #[test]
    fn roster_appoint_and_remove() {
        let mut roster = OfficerRoster::new();
        let bob = acct("bob");
        let appoint = ActionPayload::AppointOfficer {
            account: bob.clone(),
            title: "secretary".into(),
        };
        let remove = ActionPayload::RemoveOfficer {
            account: bob.clone(),
        };

        // Removing an empty seat fails validation.
        assert!(roster.validate(&ctx(), &remove).is_err());

        roster.validate(&ctx(), &appoint).unwrap();
        roster.apply(&ctx(), &appoint);
        assert_eq!(roster.title_of(&bob), Some("secretary"));

        roster.validate(&ctx(), &remove).unwrap();
        roster.apply(&ctx(), &remove);
        assert!(!roster.is_officer(&bob));
    }

    #[test]
    fn approval_desk_stamps_the_motion_seq() {
        let controller = Shared::new(DocumentController::new());
        let owner = acct("owner");
        let doc = controller
            .borrow_mut()
            .create_document(&owner, Timestamp::EPOCH);

        let mut desk = ApprovalDesk::new(controller.clone());
        let approve = ActionPayload::ApproveDocument { doc };
        desk.validate(&ctx(), &approve).unwrap();
        desk.apply(&ctx(), &approve);

        assert_eq!(
            controller.borrow().document(&doc).unwrap().motion_approval(),
            Some(7)
        );
    }

    #[test]
    fn shared_handle_sees_applied_state() {
        let treasury = Shared::new(Treasury::new(50));
        let mut handle: Box<dyn Callable> = Box::new(treasury.clone());
        let pay = ActionPayload::Transfer {
            to: acct("alice"),
            amount: 20,
        };
        handle.apply(&ctx(), &pay);
        assert_eq!(treasury.borrow().funds(), 30);
    }
}
