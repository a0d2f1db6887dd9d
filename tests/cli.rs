use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn bin() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pwvault"));
    cmd.env_remove("PWVAULT_PASSWORD")
        .env_remove("PWVAULT_PATH")
        .env_remove("PWVAULT_BACKUP_DIR")
        .env_remove("PWVAULT_MAX_BACKUPS")
        .env_remove("PWVAULT_KDF_ITERATIONS");
    cmd
}

fn vault_cmd(store: &Path, password: &str) -> Command {
    let mut cmd = bin();
    cmd.env("PWVAULT_PASSWORD", password).arg("--vault").arg(store);
    cmd
}

fn add(store: &Path, service: &str, account: &str, password: &str) {
    vault_cmd(store, "pw")
        .args(["add", service, account, password])
        .assert()
        .success()
        .stdout(predicate::str::contains("stored password"));
}

#[test]
fn generate_prints_password_of_requested_length() {
    let output = bin()
        .args(["generate", "--length", "20"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let password = String::from_utf8(output).unwrap();
    assert_eq!(password.trim_end_matches('\n').chars().count(), 20);
}

#[test]
fn generate_respects_class_toggles() {
    let output = bin()
        .args(["generate", "--no-upper", "--no-lower", "--no-symbols"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let password = String::from_utf8(output).unwrap();
    let password = password.trim_end();
    assert_eq!(password.len(), 16);
    assert!(password.chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn generate_without_classes_fails() {
    bin()
        .args([
            "generate",
            "--no-upper",
            "--no-lower",
            "--no-digits",
            "--no-symbols",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("select at least one character class"));
}

#[test]
fn generate_length_out_of_range_fails() {
    bin().args(["generate", "--length", "7"]).assert().failure();
    bin().args(["generate", "--length", "33"]).assert().failure();
}

#[test]
fn generate_and_save_stores_the_password() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");

    let output = vault_cmd(&store, "pw")
        .args(["generate", "--save", "github", "--account", "octocat"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    let password = stdout.lines().next().unwrap();

    vault_cmd(&store, "pw")
        .args(["get", "github"])
        .assert()
        .success()
        .stdout(predicate::str::contains(password));
}

#[test]
fn add_and_get_roundtrip() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");
    assert!(!store.exists());

    add(&store, "github", "octocat", "hunter2");
    assert!(store.exists());

    vault_cmd(&store, "pw")
        .args(["get", "github"])
        .assert()
        .success()
        .stdout(predicate::str::contains("octocat"))
        .stdout(predicate::str::contains("hunter2"));
}

#[test]
fn add_existing_service_fails() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");
    add(&store, "github", "octocat", "hunter2");

    vault_cmd(&store, "pw")
        .args(["add", "github", "other", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn empty_names_are_rejected() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");

    vault_cmd(&store, "pw")
        .args(["add", " ", "acct", "pw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be empty"));
    assert!(!store.exists());
}

#[test]
fn wrong_password_fails() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");
    add(&store, "github", "octocat", "hunter2");

    vault_cmd(&store, "wrong_pw")
        .args(["get", "github"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid password or corrupted data"));
}

#[test]
fn get_missing_service_fails() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");
    add(&store, "github", "octocat", "hunter2");

    vault_cmd(&store, "pw")
        .args(["get", "gitlab"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn list_is_sorted() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");
    add(&store, "zeta", "z", "1");
    add(&store, "alpha", "a", "2");

    vault_cmd(&store, "pw")
        .arg("list")
        .assert()
        .success()
        .stdout("alpha\nzeta\n");

    vault_cmd(&store, "pw")
        .args(["list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Service"))
        .stdout(predicate::str::contains("Account"))
        .stdout(predicate::str::contains("2").not());
}

#[test]
fn list_on_first_run_is_empty() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");

    vault_cmd(&store, "pw")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No credentials stored."));
    assert!(!store.exists());
}

#[test]
fn search_matches_service_and_account() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");
    add(&store, "github", "octocat", "x");
    add(&store, "mail", "me@example.com", "y");

    vault_cmd(&store, "pw")
        .args(["search", "EXAMPLE"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mail"))
        .stdout(predicate::str::contains("github").not());

    vault_cmd(&store, "pw")
        .args(["search", "nothing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no matches"));
}

#[test]
fn edit_renames_and_updates() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");
    add(&store, "github", "octocat", "hunter2");

    vault_cmd(&store, "pw")
        .args(["edit", "github", "--rename", "gitlab", "--password", "new"])
        .assert()
        .success()
        .stdout(predicate::str::contains("updated 'gitlab'"));

    vault_cmd(&store, "pw")
        .args(["get", "gitlab"])
        .assert()
        .success()
        .stdout(predicate::str::contains("octocat"))
        .stdout(predicate::str::contains("new"));

    vault_cmd(&store, "pw")
        .args(["get", "github"])
        .assert()
        .failure();
}

#[test]
fn edit_without_changes_is_reported() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");
    add(&store, "github", "octocat", "hunter2");

    vault_cmd(&store, "pw")
        .args(["edit", "github", "--account", "octocat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing changed"));
}

#[test]
fn remove_secret_works() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");
    add(&store, "github", "octocat", "hunter2");

    vault_cmd(&store, "pw")
        .args(["remove", "github"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed successfully"));

    vault_cmd(&store, "pw")
        .args(["remove", "github"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn change_passphrase_reencrypts_vault() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");
    add(&store, "github", "octocat", "hunter2");

    vault_cmd(&store, "pw")
        .arg("change-passphrase")
        .write_stdin("fresh\nfresh\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("master password changed"));

    vault_cmd(&store, "pw")
        .args(["get", "github"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid password or corrupted data"));

    vault_cmd(&store, "fresh")
        .args(["get", "github"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2"));
}

#[test]
fn change_passphrase_mismatch_keeps_old_one() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");
    add(&store, "github", "octocat", "hunter2");

    vault_cmd(&store, "pw")
        .arg("change-passphrase")
        .write_stdin("fresh\nfrseh\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("passwords do not match"));

    vault_cmd(&store, "pw")
        .args(["get", "github"])
        .assert()
        .success();
}

#[test]
fn first_run_password_from_stdin_needs_confirmation() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");

    bin()
        .arg("--vault")
        .arg(&store)
        .args(["add", "github", "octocat", "hunter2"])
        .write_stdin("pw\npw\n")
        .assert()
        .success();

    bin()
        .arg("--vault")
        .arg(&store)
        .args(["get", "github"])
        .write_stdin("pw\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2"));
}

#[test]
fn saves_rotate_bounded_backups() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");
    let backups = dir.path().join("snapshots");

    for service in ["a", "b", "c"] {
        vault_cmd(&store, "pw")
            .arg("--backup-dir")
            .arg(&backups)
            .args(["--max-backups", "1"])
            .args(["add", service, "acct", "secret"])
            .assert()
            .success();
    }

    let names: Vec<_> = std::fs::read_dir(&backups)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("vault_backup_"));
    assert!(names[0].ends_with(".dat"));
}

#[test]
fn backup_command_without_vault_is_noop() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");

    bin()
        .arg("--vault")
        .arg(&store)
        .arg("backup")
        .assert()
        .success()
        .stdout(predicate::str::contains("no vault to back up"));
}

#[test]
fn low_kdf_iterations_are_rejected() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("vault.dat");

    vault_cmd(&store, "pw")
        .args(["--kdf-iterations", "1000"])
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("iteration count"));
}
