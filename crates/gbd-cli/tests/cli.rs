//! Integration tests running the `gbd` binary

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn gbd(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gbd"))
        .args(args)
        // Keep a user's ~/.gbd/config.toml out of the tests.
        .env("HOME", dir)
        .env_remove("GBD_CONFIG")
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_id_matches_hash() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "a.cnf", "c x\np cnf 2 2\n1 -2 0\n2 0\n");
    let path = path.to_str().unwrap();

    let id = gbd(dir.path(), &["id", path]);
    assert!(id.status.success());
    let hash = gbd(dir.path(), &["hash", "--kind", "cnf", path]);
    assert!(hash.status.success());

    assert_eq!(stdout(&id), stdout(&hash));
    assert_eq!(stdout(&id).trim().len(), 32);
}

#[test]
fn test_extract_plain() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "a.cnf", "p cnf 2 2\n1 -2 0\n2 0\n");

    let output = gbd(dir.path(), &["extract", path.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.lines().any(|l| l == "clauses=2"));
    assert!(text.lines().any(|l| l == "variables=2"));
    assert_eq!(text.lines().count(), 56);
}

#[test]
fn test_batch_reports_failures_with_exit_code() {
    let dir = TempDir::new().unwrap();
    let good = write(&dir, "good.cnf", "p cnf 2 1\n1 2 0\n");
    let bad = write(&dir, "bad.cnf", "p cnf 2 1\n1 z 0\n");

    let output = gbd(
        dir.path(),
        &[
            "batch",
            "--format",
            "json",
            "--mem-max",
            "64",
            "--jobs",
            "2",
            good.to_str().unwrap(),
            bad.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());

    let lines: Vec<serde_json::Value> = stdout(&output)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines.iter().filter(|v| v["success"] == true).count(), 1);

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Completed: 1"));
}

#[test]
fn test_sanitize_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "dirty.cnf", "p cnf 3 2\n1 1 2 0\n3 -3 0\n");

    let check = gbd(dir.path(), &["check-sanitized", path.to_str().unwrap()]);
    assert_eq!(stdout(&check).trim(), "not sanitized");

    let sanitized = gbd(dir.path(), &["sanitize", path.to_str().unwrap()]);
    assert!(sanitized.status.success());
    assert_eq!(stdout(&sanitized), "p cnf 3 1\n1 2 0\n");
}

#[test]
fn test_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "gbd.toml", "[output]\nformat = \"csv\"\nheader = false\n");
    let path = write(&dir, "a.cnf", "1 0\n");

    let output = gbd(
        dir.path(),
        &["--config", config.to_str().unwrap(), "id", path.to_str().unwrap()],
    );
    assert!(output.status.success());
    assert!(stdout(&output).starts_with(path.to_str().unwrap()));
}

#[test]
fn test_unknown_format_fails() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "a.txt", "1 0\n");
    let output = gbd(dir.path(), &["id", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr).unwrap().contains("Unsupported format"));
}

#[test]
fn test_isohash_ignores_polarity() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.cnf", "1 -2 0\n-1 0\n");
    let b = write(&dir, "b.cnf", "-1 2 0\n1 0\n");

    let iso_a = gbd(dir.path(), &["isohash", a.to_str().unwrap()]);
    let iso_b = gbd(dir.path(), &["isohash", b.to_str().unwrap()]);
    assert!(iso_a.status.success());
    assert_eq!(stdout(&iso_a), stdout(&iso_b));

    let id_a = gbd(dir.path(), &["id", a.to_str().unwrap()]);
    let id_b = gbd(dir.path(), &["id", b.to_str().unwrap()]);
    assert_ne!(stdout(&id_a), stdout(&id_b));
}

#[test]
fn test_cnf2kis_writes_file_within_limits() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "a.cnf", "1 2 0\n-1 0\n");
    let out = dir.path().join("a.kis");

    let output = gbd(
        dir.path(),
        &["cnf2kis", "-o", out.to_str().unwrap(), path.to_str().unwrap()],
    );
    assert!(output.status.success());
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.lines().any(|l| l == "p kis 3 4 2"));

    let limited = dir.path().join("limited.kis");
    let output = gbd(
        dir.path(),
        &["cnf2kis", "--max-edges", "2", "-o", limited.to_str().unwrap(), path.to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr).unwrap().contains("Limit exceeded"));
    assert!(!limited.exists());
}

#[test]
fn test_extract_opb() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "a.opb", "min: +1 x1 ;\n+1 x1 +1 x2 >= 1 ;\n");

    let output = gbd(dir.path(), &["extract", path.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.lines().any(|l| l == "clauses=1"));
    assert_eq!(text.lines().count(), 17);
}
