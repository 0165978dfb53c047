//! Integration tests for the CLI binary.
//!
//! Drives the `sigdb` binary against a temporary root directory.
//!
//! This test is registered as a [[test]] in the uefi-sigdb-cli crate
//! so that CARGO_BIN_EXE_sigdb is available.

use std::path::Path;
use std::process::{Command, Output};

const DIGEST_A: &str = "0101010101010101010101010101010101010101010101010101010101010101";
const DIGEST_B: &str = "0202020202020202020202020202020202020202020202020202020202020202";

/// Get a Command pointing to the `sigdb` binary.
fn sigdb_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sigdb"))
}

/// Run `sigdb --root <root> <args...>`.
fn sigdb(root: &Path, args: &[&str]) -> Output {
    sigdb_binary()
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("failed to execute sigdb")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn cli_responds_to_help() {
    let output = sigdb_binary()
        .arg("--help")
        .output()
        .expect("failed to execute sigdb --help");

    assert!(
        output.status.success(),
        "sigdb --help should exit with success, stderr: {}",
        stderr(&output)
    );
    assert!(
        stdout(&output).contains("Usage"),
        "sigdb --help output should contain usage information"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = sigdb_binary()
        .arg("--version")
        .output()
        .expect("failed to execute sigdb --version");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("sigdb") && out.contains("0.3"), "got: {out}");
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = sigdb_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute sigdb");

    assert!(
        !output.status.success(),
        "sigdb with unknown flag should exit with error"
    );
}

#[test]
fn cli_formats_lists_tags() {
    let output = sigdb_binary()
        .arg("formats")
        .output()
        .expect("failed to execute sigdb formats");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("EFI_CERT_SHA256_GUID"));
    assert!(out.contains("EFI_CERT_X509_GUID"));
}

#[test]
fn cli_add_list_delete() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    let output = sigdb(root, &["add", "--content", DIGEST_A, "--format", "sha256"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Added signature 1"));

    let output = sigdb(root, &["add", "--content", DIGEST_B, "--format", "sha256"]);
    assert!(stdout(&output).contains("Added signature 2"));
    assert!(root.join("db").join("2").is_file());

    let output = sigdb(root, &["list"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains(DIGEST_A));
    assert!(out.contains(DIGEST_B));
    assert!(out.contains("2 signature(s)"));

    let output = sigdb(root, &["delete", "1"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!root.join("db").join("1").exists());

    // The freed id is handed out again by the next process.
    let output = sigdb(root, &["add", "--content", "MIIBcert", "--format", "x509"]);
    assert!(stdout(&output).contains("Added signature 1"));
}

#[test]
fn cli_rejects_duplicate_content() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    assert!(sigdb(root, &["add", "--content", DIGEST_A, "--format", "sha256"])
        .status
        .success());
    let output = sigdb(root, &["add", "--content", DIGEST_A, "--format", "sha256"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("already exists"), "stderr: {}", stderr(&output));
}

#[test]
fn cli_rejects_malformed_digest() {
    let tmp = tempfile::tempdir().unwrap();
    let output = sigdb(tmp.path(), &["add", "--content", "abcd", "--format", "sha256"]);
    assert!(!output.status.success());
    assert!(!tmp.path().join("db").join("1").exists());
}

#[test]
fn cli_show_and_set_json() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let owner = "77fa9abd-0359-4d32-bd60-28f4e78f784b";

    sigdb(root, &["add", "--content", DIGEST_A, "--format", "sha256"]);
    let output = sigdb(root, &["set", "1", "--owner", owner]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = sigdb(root, &["show", "1", "--json"]);
    assert!(output.status.success());
    let view: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(view["id"], 1);
    assert_eq!(view["content"], DIGEST_A);
    assert_eq!(view["format"], "EFI_CERT_SHA256_GUID");
    assert_eq!(view["owner"], owner);
}

#[test]
fn cli_add_digest_hashes_file() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("root");
    let file = tmp.path().join("payload.efi");
    std::fs::write(&file, b"abc").unwrap();

    let output = sigdb(
        &root,
        &["--db", "dbx", "add-digest", "--file", file.to_str().unwrap()],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output)
        .contains("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"));
    assert!(root.join("dbx").join("1").is_file());
}

#[test]
fn cli_delete_all_and_unknown_id() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    sigdb(root, &["add", "--content", DIGEST_A, "--format", "sha256"]);
    sigdb(root, &["add", "--content", DIGEST_B, "--format", "sha256"]);

    let output = sigdb(root, &["delete-all"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Deleted 2 signature(s)"));

    let output = sigdb(root, &["delete", "5"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("not found"));

    let output = sigdb(root, &["list"]);
    assert!(stdout(&output).contains("No signatures."));
}

#[test]
fn cli_rejects_unknown_database() {
    let tmp = tempfile::tempdir().unwrap();
    let output = sigdb(tmp.path(), &["--db", "mok", "list"]);
    assert!(!output.status.success());
}

#[test]
fn cli_add_digest_rejects_sha1_before_reading() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("missing.efi");

    let output = sigdb(
        tmp.path(),
        &["add-digest", "--file", missing.to_str().unwrap(), "--format", "sha1"],
    );
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("cannot compute EFI_CERT_SHA1_GUID"), "stderr: {err}");
    assert!(err.contains("EFI_CERT_SHA256_GUID"), "stderr: {err}");
}
