//! Binary-level tests driving `receipts` against a throwaway data directory

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn receipts(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("receipts").unwrap();
    cmd.env("RECEIPTS_LEDGER_DATA_DIR", data_dir.path())
        .env("RECEIPTS_USER_ID", "cli-user")
        .env("RECEIPTS_IP_ADDRESS", "10.0.0.7")
        .env_remove("RECEIPTS_API_KEY_ID")
        .env_remove("LOG_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

/// Value printed after `label` on its own line
fn field(stdout: &[u8], label: &str) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .find_map(|line| line.trim().strip_prefix(label).map(|v| v.trim().to_string()))
        .unwrap()
}

#[test]
fn help_lists_command_groups() {
    let dir = TempDir::new().unwrap();
    receipts(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("account"))
        .stdout(predicate::str::contains("receipt"))
        .stdout(predicate::str::contains("audit"));
}

#[test]
fn config_reports_the_data_directory() {
    let dir = TempDir::new().unwrap();
    receipts(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("ledger.json"))
        .stdout(predicate::str::contains("Audit retention days: 365"));

    assert!(dir.path().join("config.json").exists());
}

#[test]
fn account_lifecycle_is_audited() {
    let dir = TempDir::new().unwrap();

    receipts(&dir)
        .args(["account", "create", "ACC001", "Test Account"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created account: Test Account (ACC001)"));

    receipts(&dir)
        .args(["account", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ACC001"));

    receipts(&dir)
        .args(["account", "edit", "ACC001", "--name", "Renamed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated account: Renamed (ACC001)"));

    receipts(&dir)
        .args(["account", "delete", "ACC001"])
        .assert()
        .success();

    receipts(&dir)
        .args(["account", "restore", "ACC001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored account"));

    receipts(&dir)
        .args(["audit", "entity", "account", "ACC001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE"))
        .stdout(predicate::str::contains("UPDATE"))
        .stdout(predicate::str::contains("DELETE"))
        .stdout(predicate::str::contains("RESTORE"))
        .stdout(predicate::str::contains("cli-user"));
}

#[test]
fn duplicate_account_code_is_rejected() {
    let dir = TempDir::new().unwrap();

    receipts(&dir)
        .args(["account", "create", "ACC001", "First"])
        .assert()
        .success();

    receipts(&dir)
        .args(["account", "create", "acc001", "Second"])
        .assert()
        .failure();

    receipts(&dir)
        .args(["audit", "recent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("First").not())
        .stdout(predicate::str::contains("CREATE").count(1));
}

#[test]
fn receipt_with_items_and_charge() {
    let dir = TempDir::new().unwrap();

    receipts(&dir)
        .args(["account", "create", "CARD", "Credit Card"])
        .assert()
        .success();

    let created = receipts(&dir)
        .args([
            "receipt",
            "create",
            "Corner Market",
            "--date",
            "2024-03-15",
            "--tax",
            "0.50",
            "-i",
            "APL:Apples:3:0.99:Produce",
            "-i",
            "BRD:Bread:1:2.49:Bakery:Loaves",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Items: 2"))
        .get_output()
        .stdout
        .clone();
    let receipt_id = field(&created, "ID:");

    receipts(&dir)
        .args(["receipt", "show", &receipt_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Apples"))
        .stdout(predicate::str::contains("Bread"));

    receipts(&dir)
        .args(["receipt", "charge", &receipt_id, "CARD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Charged"));

    receipts(&dir)
        .args(["audit", "entity", "receipt", &receipt_id, "--details"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Corner Market"));

    receipts(&dir)
        .args(["audit", "recent", "-n", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ReceiptItem"))
        .stdout(predicate::str::contains("Transaction"));
}

#[test]
fn malformed_item_is_rejected_without_writing() {
    let dir = TempDir::new().unwrap();

    receipts(&dir)
        .args(["receipt", "create", "Somewhere", "-i", "BAD"])
        .assert()
        .failure();

    receipts(&dir)
        .args(["audit", "recent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No audit records found."));
}

#[test]
fn audit_queries_by_user_and_count() {
    let dir = TempDir::new().unwrap();

    receipts(&dir)
        .args(["account", "create", "ACC001", "Mine"])
        .assert()
        .success();
    receipts(&dir)
        .env("RECEIPTS_USER_ID", "someone-else")
        .args(["account", "create", "ACC002", "Theirs"])
        .assert()
        .success();

    receipts(&dir)
        .args(["audit", "user", "someone-else"])
        .assert()
        .success()
        .stdout(predicate::str::contains("someone-else"))
        .stdout(predicate::str::contains("cli-user").not());

    receipts(&dir)
        .args(["audit", "recent", "-n", "-5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No audit records found."));

    receipts(&dir)
        .args(["audit", "api-key", "not-a-uuid"])
        .assert()
        .failure();
}

#[test]
fn prune_keeps_recent_records() {
    let dir = TempDir::new().unwrap();

    receipts(&dir)
        .args(["account", "create", "ACC001", "Keep Me"])
        .assert()
        .success();

    receipts(&dir)
        .args(["audit", "prune", "--days", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pruned 0 audit record(s)"));

    receipts(&dir)
        .args(["audit", "recent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE").count(1));
}
