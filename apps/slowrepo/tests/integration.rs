//! Integration tests for slowrepo CLI

use std::io::Write;
use std::process::Command;

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_slowrepo"))
        .arg("--version")
        .output()
        .expect("Failed to execute slowrepo");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("slowrepo"));
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_slowrepo"))
        .arg("--help")
        .output()
        .expect("Failed to execute slowrepo");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Deliberately slow chart repository server"));
    assert!(stdout.contains("--max-index-concurrency"));
    assert!(stdout.contains("--simulate-index-duration"));
}

#[test]
fn test_duplicate_catalog_exits_before_binding() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        config,
        r#"
[[catalog.charts]]
name = "guestbook"
version = "0.0.0"
archive_path = "charts/guestbook-0.0.0.tgz"
digest = "ab"

[[catalog.charts]]
name = "guestbook"
version = "0.0.0"
archive_path = "charts/guestbook-0.0.0.tgz"
digest = "ab"
"#
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_slowrepo"))
        .arg("--config")
        .arg(config.path())
        .args(["--listen-addr", "127.0.0.1:0"])
        .output()
        .expect("Failed to execute slowrepo");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("duplicate chart entry"));
    assert!(stderr.contains("index.duplicate_entry"));
}

#[test]
fn test_zero_concurrency_rejected() {
    let output = Command::new(env!("CARGO_BIN_EXE_slowrepo"))
        .args(["--listen-addr", "127.0.0.1:0", "--max-index-concurrency", "0"])
        .env_remove("SLOWREPO_MAX_INDEX_CONCURRENCY")
        .output()
        .expect("Failed to execute slowrepo");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("max_index_concurrency"));
}
