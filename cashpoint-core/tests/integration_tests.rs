//! Integration tests for cashpoint-core services
//!
//! These tests drive the full context over a real ledger file in a
//! temporary data directory.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::path::Path;

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

use cashpoint_core::adapters::MemoryRepository;
use cashpoint_core::config::{Config, SETTINGS_FILE};
use cashpoint_core::domain::{LedgerSnapshot, PinScheme};
use cashpoint_core::services::{AuthOutcome, Command, CommandOutput};
use cashpoint_core::{CashpointContext, Error, Role, Session, TransactionKind, LEDGER_FILE};

// ============================================================================
// Test Helpers
// ============================================================================

/// Write settings with cheap Argon2 costs so tests stay fast
fn write_fast_settings(dir: &Path) {
    std::fs::write(
        dir.join(SETTINGS_FILE),
        r#"{"argon2": {"timeCost": 1, "memoryCost": 64, "parallelism": 1, "hashLen": 32}}"#,
    )
    .unwrap();
}

fn open_context(temp_dir: &TempDir) -> CashpointContext {
    write_fast_settings(temp_dir.path());
    CashpointContext::new(temp_dir.path()).expect("Failed to open context")
}

fn dec(n: i64) -> Decimal {
    Decimal::from(n)
}

fn login(ctx: &CashpointContext, username: &str, pin: &str) -> Session {
    match ctx.directory_service.authenticate(username, pin).unwrap() {
        AuthOutcome::Authenticated(session) => session,
        AuthOutcome::SetupRequired(name) => panic!("{} still needs PIN setup", name),
    }
}

fn read_ledger_file(dir: &Path) -> LedgerSnapshot {
    let content = std::fs::read_to_string(dir.join(LEDGER_FILE)).unwrap();
    serde_json::from_str(&content).unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

/// Admin creates alice without a PIN; alice sets it up, deposits and withdraws
#[test]
fn test_alice_and_root_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    let dir = &ctx.directory_service;

    assert!(dir.needs_admin_bootstrap().unwrap());
    let root = dir.bootstrap_admin("root", "9999", "9999").unwrap();

    ctx.dispatcher()
        .execute(
            &root,
            Command::CreateAccount {
                username: "alice".into(),
                role: Role::User,
                initial_balance: Decimal::ZERO,
                pin: None,
            },
        )
        .unwrap();

    assert_eq!(
        dir.authenticate("alice", "").unwrap(),
        AuthOutcome::SetupRequired("alice".to_string())
    );
    let alice = dir.complete_first_time_setup("alice", "1234", "1234").unwrap();

    ctx.dispatcher()
        .execute(&alice, Command::Deposit { amount: dec(100) })
        .unwrap();
    let out = ctx
        .dispatcher()
        .execute(&alice, Command::Withdraw { amount: dec(30) })
        .unwrap();
    assert!(matches!(out, CommandOutput::NewBalance(b) if b == dec(70)));
    assert_eq!(ctx.ledger_service.vault_cash().unwrap(), dec(10_070));

    let err = ctx
        .dispatcher()
        .execute(&alice, Command::Withdraw { amount: dec(1000) })
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds { .. }));

    let kinds: Vec<_> = ctx
        .audit_service
        .history_for("alice")
        .unwrap()
        .into_iter()
        .map(|r| r.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TransactionKind::CreateUser,
            TransactionKind::SetupPin,
            TransactionKind::Deposit,
            TransactionKind::Withdraw,
        ]
    );
}

/// With the vault emptied, withdrawals fail even with funds, deposits still work
#[test]
fn test_vault_at_zero_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    let root = ctx.directory_service.bootstrap_admin("root", "9999", "9999").unwrap();
    ctx.directory_service
        .create_account(&root, "alice", Role::User, dec(500), Some("1234"))
        .unwrap();
    let alice = login(&ctx, "alice", "1234");

    ctx.dispatcher()
        .execute(&root, Command::SetVaultCash { amount: Decimal::ZERO })
        .unwrap();
    let last = ctx.audit_service.tail(1).unwrap().remove(0);
    assert_eq!(last.kind, TransactionKind::SetAtmCash);
    assert_eq!(last.user, "root");

    let err = ctx
        .dispatcher()
        .execute(&alice, Command::Withdraw { amount: dec(10) })
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientVaultCash));
    assert_eq!(ctx.ledger_service.balance_of("alice").unwrap(), dec(500));

    ctx.dispatcher()
        .execute(&alice, Command::Deposit { amount: dec(10) })
        .unwrap();
    ctx.dispatcher()
        .execute(&alice, Command::Withdraw { amount: dec(10) })
        .unwrap();
    assert_eq!(ctx.ledger_service.vault_cash().unwrap(), Decimal::ZERO);
}

#[test]
fn test_delete_keeps_history() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    let root = ctx.directory_service.bootstrap_admin("root", "9999", "9999").unwrap();
    ctx.directory_service
        .create_account(&root, "bob", Role::User, dec(5), Some("1111"))
        .unwrap();
    ctx.ledger_service.deposit("bob", dec(1)).unwrap();

    let before = ctx.audit_service.len().unwrap();
    ctx.directory_service.delete_account(&root, "bob").unwrap();

    assert!(matches!(ctx.ledger_service.balance_of("bob"), Err(Error::NotFound(_))));
    assert_eq!(ctx.audit_service.len().unwrap(), before + 1);
    assert_eq!(ctx.audit_service.history_for("bob").unwrap().len(), 3);

    // Still there after a reload from disk
    let on_disk = read_ledger_file(temp_dir.path());
    assert_eq!(on_disk.transactions.iter().filter(|r| r.user == "bob").count(), 3);
}

#[test]
fn test_pin_change_invalidates_old_pin() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    let root = ctx.directory_service.bootstrap_admin("root", "9999", "9999").unwrap();
    ctx.directory_service
        .create_account(&root, "alice", Role::User, Decimal::ZERO, Some("1111"))
        .unwrap();
    let alice = login(&ctx, "alice", "1111");

    let err = ctx
        .dispatcher()
        .execute(
            &alice,
            Command::ChangePin { old_pin: "0000".into(), new_pin: "2222".into(), confirm: "2222".into() },
        )
        .unwrap_err();
    assert!(matches!(err, Error::WrongCredential));

    ctx.dispatcher()
        .execute(
            &alice,
            Command::ChangePin { old_pin: "1111".into(), new_pin: "2222".into(), confirm: "2222".into() },
        )
        .unwrap();

    assert!(matches!(
        ctx.directory_service.authenticate("alice", "1111"),
        Err(Error::WrongCredential)
    ));
    login(&ctx, "alice", "2222");
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn test_deposit_withdraw_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    let root = ctx.directory_service.bootstrap_admin("root", "9999", "9999").unwrap();
    ctx.directory_service
        .create_account(&root, "alice", Role::User, dec(42), Some("1"))
        .unwrap();

    for cents in [1, 99, 12_345] {
        let amount = Decimal::new(cents, 2);
        ctx.ledger_service.deposit("alice", amount).unwrap();
        ctx.ledger_service.withdraw("alice", amount).unwrap();
        assert_eq!(ctx.ledger_service.balance_of("alice").unwrap(), dec(42));
        assert_eq!(ctx.ledger_service.vault_cash().unwrap(), dec(10_000));
    }
}

#[test]
fn test_one_record_per_successful_mutation() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    let root = ctx.directory_service.bootstrap_admin("root", "9999", "9999").unwrap();
    let mut expected = ctx.audit_service.len().unwrap();
    assert_eq!(expected, 1);

    let mut check = |result: Result<(), Error>, logged: bool| {
        if logged {
            result.unwrap();
            expected += 1;
        } else {
            assert!(result.is_err());
        }
        assert_eq!(ctx.audit_service.len().unwrap(), expected);
    };

    let dir = &ctx.directory_service;
    check(dir.create_account(&root, "alice", Role::User, dec(10), Some("1")), true);
    check(dir.create_account(&root, "alice", Role::User, dec(10), None), false);
    check(ctx.ledger_service.deposit("alice", dec(5)).map(|_| ()), true);
    check(ctx.ledger_service.withdraw("alice", dec(500)).map(|_| ()), false);
    check(ctx.ledger_service.withdraw("alice", Decimal::new(1, 3)).map(|_| ()), false);
    check(dir.change_role(&root, "alice", Role::Admin), true);
    check(dir.change_pin("alice", "1", "2"), true);
    check(dir.reset_pin(&root, "alice"), true);
    check(ctx.ledger_service.set_vault_cash(&root, dec(7)), true);
    check(dir.delete_account(&root, "alice"), true);
    check(dir.delete_account(&root, "alice"), false);

    let records = ctx.audit_service.tail(usize::MAX).unwrap();
    assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn test_last_admin_cannot_be_removed() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    let root = ctx.directory_service.bootstrap_admin("root", "9999", "9999").unwrap();

    assert!(matches!(
        ctx.directory_service.change_role(&root, "root", Role::User),
        Err(Error::LastAdmin)
    ));
    assert!(!ctx.directory_service.needs_admin_bootstrap().unwrap());
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_reload_yields_same_state() {
    let temp_dir = TempDir::new().unwrap();
    let snapshot = {
        let ctx = open_context(&temp_dir);
        let root = ctx.directory_service.bootstrap_admin("root", "9999", "9999").unwrap();
        ctx.directory_service
            .create_account(&root, "alice", Role::User, Decimal::new(1050, 2), Some("1234"))
            .unwrap();
        ctx.ledger_service.withdraw("alice", Decimal::new(25, 2)).unwrap();
        ctx.store.snapshot().unwrap()
    };

    // The first context has been dropped, releasing the session lock
    let ctx = CashpointContext::new(temp_dir.path()).unwrap();
    assert_eq!(ctx.store.snapshot().unwrap(), snapshot);
    assert_eq!(ctx.ledger_service.balance_of("alice").unwrap(), Decimal::new(1025, 2));
    login(&ctx, "alice", "1234");
}

#[test]
fn test_reload_keeps_every_cent_of_large_balances() {
    let temp_dir = TempDir::new().unwrap();
    let large = Decimal::new(12345678901234567, 2);
    {
        let ctx = open_context(&temp_dir);
        let root = ctx.directory_service.bootstrap_admin("root", "9999", "9999").unwrap();
        ctx.directory_service
            .create_account(&root, "rich", Role::User, large, Some("1234"))
            .unwrap();
        ctx.ledger_service.deposit("rich", Decimal::new(1, 2)).unwrap();
        ctx.ledger_service.set_vault_cash(&root, large).unwrap();
    }

    let ctx = CashpointContext::new(temp_dir.path()).unwrap();
    assert_eq!(
        ctx.ledger_service.balance_of("rich").unwrap(),
        Decimal::new(12345678901234568, 2)
    );
    assert_eq!(ctx.store.snapshot().unwrap().vault_cash, large);

    let raw = std::fs::read_to_string(temp_dir.path().join(LEDGER_FILE)).unwrap();
    assert!(raw.contains("123456789012345.68"));
    assert!(!raw.contains("\"123456789012345.68\""));
}

#[test]
fn test_oversized_deposit_leaves_machine_usable() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    let root = ctx.directory_service.bootstrap_admin("root", "9999", "9999").unwrap();
    ctx.directory_service
        .create_account(&root, "alice", Role::User, dec(10), Some("1234"))
        .unwrap();
    let before = ctx.store.snapshot().unwrap();

    assert!(matches!(
        ctx.ledger_service.deposit("alice", Decimal::MAX),
        Err(Error::InvalidAmount(_))
    ));
    assert_eq!(ctx.store.snapshot().unwrap(), before);
    assert_eq!(read_ledger_file(temp_dir.path()), before);

    assert_eq!(ctx.ledger_service.deposit("alice", dec(5)).unwrap(), dec(15));
}

#[test]
fn test_fresh_ledger_uses_configured_vault_cash() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join(SETTINGS_FILE), r#"{"initialVaultCash": 250}"#).unwrap();

    let ctx = CashpointContext::new(temp_dir.path()).unwrap();
    assert_eq!(ctx.ledger_service.vault_cash().unwrap(), dec(250));
    assert!(temp_dir.path().join(LEDGER_FILE).exists());
}

#[test]
fn test_legacy_file_loads_and_verifies() {
    let temp_dir = TempDir::new().unwrap();
    let salt = "a1b2c3d4e5f60718";
    let hash = hex::encode(Sha256::digest(format!("{}{}", salt, "4321").as_bytes()));
    let legacy = format!(
        r#"{{
  "atm_cash": 9000.0,
  "users": {{
    "admin": {{"role": "admin", "pin_salt": "{salt}", "pin_hash": "{hash}", "balance": 0.0}},
    "carol": {{"role": "user", "pin_salt": null, "pin_hash": null, "balance": 12.5}}
  }},
  "transactions": [
    {{"time": "2024-03-01 10:00:00", "user": "admin", "type": "create_user", "amount": 0.0, "note": "role=admin"}},
    {{"time": "2024-03-01 10:05:00", "user": "carol", "type": "create_user", "amount": 12.5, "note": "role=user"}}
  ]
}}"#
    );
    std::fs::write(temp_dir.path().join(LEDGER_FILE), legacy).unwrap();
    write_fast_settings(temp_dir.path());

    let ctx = CashpointContext::new(temp_dir.path()).unwrap();
    assert!(!ctx.directory_service.needs_admin_bootstrap().unwrap());
    assert_eq!(ctx.ledger_service.vault_cash().unwrap(), dec(9000));
    assert_eq!(ctx.audit_service.len().unwrap(), 2);

    let admin = login(&ctx, "admin", "4321");
    assert!(admin.is_admin());
    assert_eq!(
        ctx.directory_service.authenticate("carol", "x").unwrap(),
        AuthOutcome::SetupRequired("carol".to_string())
    );

    // A PIN change moves the account to the configured scheme
    ctx.directory_service.change_pin("admin", "4321", "5555").unwrap();
    let account = ctx.store.snapshot().unwrap().accounts["admin"].clone();
    assert_eq!(account.credential.unwrap().scheme, PinScheme::Argon2id);
    login(&ctx, "admin", "5555");
}

#[test]
fn test_failed_save_leaves_state_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let repo = std::sync::Arc::new(MemoryRepository::new());
    let ctx = CashpointContext::with_repository(
        temp_dir.path(),
        Config::default(),
        Box::new(std::sync::Arc::clone(&repo)),
    )
    .unwrap();
    let root = ctx.directory_service.bootstrap_admin("root", "9999", "9999").unwrap();
    let before = ctx.store.snapshot().unwrap();

    repo.fail_saves(true);
    let err = ctx
        .directory_service
        .create_account(&root, "alice", Role::User, dec(5), None)
        .unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(ctx.store.snapshot().unwrap(), before);
    assert_eq!(repo.saved().unwrap(), before);
}

#[test]
fn test_export_csv_of_full_log() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    let root = ctx.directory_service.bootstrap_admin("root", "9999", "9999").unwrap();
    ctx.ledger_service.set_vault_cash(&root, dec(20)).unwrap();

    let path = temp_dir.path().join("audit.csv");
    assert_eq!(ctx.audit_service.export_csv(&path).unwrap(), 2);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("time,user,type,amount,note\n"));
    assert!(content.contains(",root,set_atm_cash,20.00,previous=10000.00"));
}

#[test]
fn test_backup_create_and_list() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    ctx.directory_service.bootstrap_admin("root", "9999", "9999").unwrap();

    let meta = ctx.backup_service.create(Some(ctx.config.max_backups)).unwrap();
    let listed = ctx.backup_service.list().unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, meta.name);
    assert!(temp_dir.path().join("backups").join(&meta.name).exists());
}
