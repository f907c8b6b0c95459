//! Command dispatcher - maps session commands onto the services
//!
//! The CLI turns menu choices into [`Command`]s and renders the
//! [`CommandOutput`]. All looping and prompting stays on the CLI side.

use rust_decimal::Decimal;

use super::audit::AuditService;
use super::directory::{AccountSummary, DirectoryService};
use super::ledger::LedgerService;
use super::status::{StatusService, StatusSummary};
use crate::domain::result::{Error, Result};
use crate::domain::{Role, Session, TransactionRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // User commands, applied to the session's own account
    Balance,
    Deposit { amount: Decimal },
    Withdraw { amount: Decimal },
    /// `confirm` is the second entry of the new PIN
    ChangePin {
        old_pin: String,
        new_pin: String,
        confirm: String,
    },

    // Admin commands
    ListAccounts,
    CreateAccount {
        username: String,
        role: Role,
        initial_balance: Decimal,
        pin: Option<String>,
    },
    DeleteAccount { username: String },
    ChangeRole { username: String, role: Role },
    ResetPin { username: String },
    /// Most recent records; `None` uses the configured tail limit
    Transactions { limit: Option<usize> },
    SetVaultCash { amount: Decimal },
    Status,
}

impl Command {
    pub fn requires_admin(&self) -> bool {
        !matches!(
            self,
            Command::Balance
                | Command::Deposit { .. }
                | Command::Withdraw { .. }
                | Command::ChangePin { .. }
        )
    }
}

#[derive(Debug)]
pub enum CommandOutput {
    Balance(Decimal),
    /// Balance after a deposit or withdrawal
    NewBalance(Decimal),
    Accounts(Vec<AccountSummary>),
    Transactions(Vec<TransactionRecord>),
    Status(StatusSummary),
    Done,
}

pub struct Dispatcher<'a> {
    directory: &'a DirectoryService,
    ledger: &'a LedgerService,
    audit: &'a AuditService,
    status: &'a StatusService,
    tail_limit: usize,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        directory: &'a DirectoryService,
        ledger: &'a LedgerService,
        audit: &'a AuditService,
        status: &'a StatusService,
        tail_limit: usize,
    ) -> Self {
        Self {
            directory,
            ledger,
            audit,
            status,
            tail_limit,
        }
    }

    pub fn execute(&self, session: &Session, command: Command) -> Result<CommandOutput> {
        if command.requires_admin() {
            self.require_admin(session)?;
        }
        let me = session.username.as_str();

        let output = match command {
            Command::Balance => CommandOutput::Balance(self.ledger.balance_of(me)?),
            Command::Deposit { amount } => CommandOutput::NewBalance(self.ledger.deposit(me, amount)?),
            Command::Withdraw { amount } => CommandOutput::NewBalance(self.ledger.withdraw(me, amount)?),
            Command::ChangePin {
                old_pin,
                new_pin,
                confirm,
            } => {
                if new_pin != confirm {
                    return Err(Error::PinMismatchOnSetup);
                }
                self.directory.change_pin(me, &old_pin, &new_pin)?;
                CommandOutput::Done
            }

            Command::ListAccounts => CommandOutput::Accounts(self.directory.list_accounts()?),
            Command::CreateAccount {
                username,
                role,
                initial_balance,
                pin,
            } => {
                self.directory
                    .create_account(session, &username, role, initial_balance, pin.as_deref())?;
                CommandOutput::Done
            }
            Command::DeleteAccount { username } => {
                self.directory.delete_account(session, &username)?;
                CommandOutput::Done
            }
            Command::ChangeRole { username, role } => {
                self.directory.change_role(session, &username, role)?;
                CommandOutput::Done
            }
            Command::ResetPin { username } => {
                self.directory.reset_pin(session, &username)?;
                CommandOutput::Done
            }
            Command::Transactions { limit } => {
                CommandOutput::Transactions(self.audit.tail(limit.unwrap_or(self.tail_limit))?)
            }
            Command::SetVaultCash { amount } => {
                self.ledger.set_vault_cash(session, amount)?;
                CommandOutput::Done
            }
            Command::Status => CommandOutput::Status(self.status.summary()?),
        };
        Ok(output)
    }

    /// Checked against the live account, not the role captured at login
    fn require_admin(&self, session: &Session) -> Result<()> {
        match self.directory.role_of(&session.username) {
            Ok(role) if role.is_admin() => Ok(()),
            Ok(_) | Err(Error::NotFound(_)) => Err(Error::Forbidden(format!(
                "'{}' is not an admin",
                session.username
            ))),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::MemoryRepository;
    use crate::domain::{Argon2Params, PinHasher, PinScheme};
    use crate::services::AuthOutcome;
    use crate::store::LedgerStore;

    struct Fixture {
        directory: DirectoryService,
        ledger: LedgerService,
        audit: AuditService,
        status: StatusService,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(
                LedgerStore::open(Box::new(MemoryRepository::new()), Decimal::from(10_000)).unwrap(),
            );
            let hasher = PinHasher::new(
                PinScheme::Argon2id,
                Argon2Params { time_cost: 1, memory_cost: 64, parallelism: 1, hash_len: 32 },
            );
            Self {
                directory: DirectoryService::new(Arc::clone(&store), hasher),
                ledger: LedgerService::new(Arc::clone(&store)),
                audit: AuditService::new(Arc::clone(&store)),
                status: StatusService::new(store),
            }
        }

        fn dispatcher(&self) -> Dispatcher<'_> {
            Dispatcher::new(&self.directory, &self.ledger, &self.audit, &self.status, 3)
        }
    }

    #[test]
    fn test_user_cannot_run_admin_commands() {
        let fx = Fixture::new();
        let root = fx.directory.bootstrap_admin("root", "1234", "1234").unwrap();
        fx.directory
            .create_account(&root, "alice", Role::User, Decimal::ZERO, Some("1111"))
            .unwrap();
        let alice = Session::new("alice", Role::User);
        let forged = Session::new("alice", Role::Admin);

        for session in [&alice, &forged] {
            for command in [
                Command::ListAccounts,
                Command::Status,
                Command::Transactions { limit: None },
                Command::SetVaultCash { amount: Decimal::ZERO },
                Command::DeleteAccount { username: "root".into() },
            ] {
                let err = fx.dispatcher().execute(session, command).unwrap_err();
                assert!(matches!(err, Error::Forbidden(_)));
            }
        }
        assert_eq!(fx.ledger.vault_cash().unwrap(), Decimal::from(10_000));
    }

    #[test]
    fn test_user_flow() {
        let fx = Fixture::new();
        let root = fx.directory.bootstrap_admin("root", "1234", "1234").unwrap();
        let d = fx.dispatcher();
        d.execute(
            &root,
            Command::CreateAccount {
                username: "alice".into(),
                role: Role::User,
                initial_balance: Decimal::ZERO,
                pin: Some("1111".into()),
            },
        )
        .unwrap();
        let alice = Session::new("alice", Role::User);

        let out = d.execute(&alice, Command::Deposit { amount: Decimal::from(100) }).unwrap();
        assert!(matches!(out, CommandOutput::NewBalance(b) if b == Decimal::from(100)));

        let out = d.execute(&alice, Command::Withdraw { amount: Decimal::from(40) }).unwrap();
        assert!(matches!(out, CommandOutput::NewBalance(b) if b == Decimal::from(60)));

        let out = d.execute(&alice, Command::Balance).unwrap();
        assert!(matches!(out, CommandOutput::Balance(b) if b == Decimal::from(60)));
    }

    #[test]
    fn test_transactions_default_limit() {
        let fx = Fixture::new();
        let root = fx.directory.bootstrap_admin("root", "1234", "1234").unwrap();
        let d = fx.dispatcher();
        for name in ["a", "b", "c", "d"] {
            d.execute(
                &root,
                Command::CreateAccount {
                    username: name.into(),
                    role: Role::User,
                    initial_balance: Decimal::ZERO,
                    pin: None,
                },
            )
            .unwrap();
        }

        match d.execute(&root, Command::Transactions { limit: None }).unwrap() {
            CommandOutput::Transactions(records) => {
                let users: Vec<_> = records.iter().map(|r| r.user.as_str()).collect();
                assert_eq!(users, vec!["b", "c", "d"]);
            }
            other => panic!("unexpected output: {:?}", other),
        }
        match d.execute(&root, Command::Transactions { limit: Some(100) }).unwrap() {
            CommandOutput::Transactions(records) => assert_eq!(records.len(), 5),
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_set_vault_cash_via_dispatcher() {
        let fx = Fixture::new();
        let root = fx.directory.bootstrap_admin("root", "1234", "1234").unwrap();
        fx.dispatcher()
            .execute(&root, Command::SetVaultCash { amount: Decimal::ZERO })
            .unwrap();

        match fx.dispatcher().execute(&root, Command::Status).unwrap() {
            CommandOutput::Status(status) => assert_eq!(status.vault_cash, Decimal::ZERO),
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_change_pin_needs_matching_confirmation() {
        let fx = Fixture::new();
        let root = fx.directory.bootstrap_admin("root", "1234", "1234").unwrap();
        let before = fx.audit.len().unwrap();

        let mismatched = Command::ChangePin {
            old_pin: "1234".into(),
            new_pin: "5678".into(),
            confirm: "5679".into(),
        };
        let err = fx.dispatcher().execute(&root, mismatched).unwrap_err();
        assert!(matches!(err, Error::PinMismatchOnSetup));
        assert_eq!(fx.audit.len().unwrap(), before);
        assert!(matches!(
            fx.directory.authenticate("root", "1234").unwrap(),
            AuthOutcome::Authenticated(_)
        ));

        let confirmed = Command::ChangePin {
            old_pin: "1234".into(),
            new_pin: "5678".into(),
            confirm: "5678".into(),
        };
        fx.dispatcher().execute(&root, confirmed).unwrap();
        assert!(matches!(
            fx.directory.authenticate("root", "5678").unwrap(),
            AuthOutcome::Authenticated(_)
        ));
    }
}
