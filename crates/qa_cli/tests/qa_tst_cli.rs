//! Drives the `quota` binary end to end: artifacts on disk, exit codes, logs.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};

fn write_json(dir: &Path, name: &str, v: &Value) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, serde_json::to_vec_pretty(v).unwrap()).unwrap();
    p
}

fn request(total: i64, mode: &str) -> Value {
    json!({
        "dimensions": [
            {"id": "gender", "selected": ["male", "female"], "weights": {"male": 49.2, "female": 50.8}},
            {"id": "age_ranges", "selected": ["18-24", "25-34"], "weights": {"18-24": 9.3, "25-34": 13.8}}
        ],
        "totalTarget": total,
        "mode": mode
    })
}

fn quota() -> Command {
    let mut cmd = Command::cargo_bin("quota").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn read(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

fn targets(doc: &Value) -> Vec<u64> {
    doc["cells"].as_array().unwrap().iter().map(|c| c["target"].as_u64().unwrap()).collect()
}

#[test]
fn generate_writes_allocation_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let req = write_json(dir.path(), "request.json", &request(101, "even"));
    let out = dir.path().join("out");

    quota()
        .args(["--input", req.to_str().unwrap(), "--out", out.to_str().unwrap(), "--render", "json", "text"])
        .assert()
        .success()
        .stderr(predicate::str::contains("artifacts written"));

    let doc = read(&out.join("allocation.json"));
    assert_eq!(targets(&doc), vec![26, 25, 25, 25]);
    assert_eq!(doc["operation"], "generate");
    assert_eq!(doc["summary"]["delta"], 0);

    let report = read(&out.join("report.json"));
    assert_eq!(report["totals"]["allocated"], 101);
    let text = fs::read_to_string(out.join("report.txt")).unwrap();
    assert!(text.contains("male / 18-24"));
}

#[test]
fn same_seed_same_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let req = write_json(dir.path(), "request.json", &request(100, "even"));
    let run = |sub: &str, seed: &str| {
        let out = dir.path().join(sub);
        quota()
            .args(["--input", req.to_str().unwrap(), "--out", out.to_str().unwrap(), "--seed", seed, "--quiet"])
            .assert()
            .success();
        fs::read(out.join("allocation.json")).unwrap()
    };
    let a = run("a", "7");
    let b = run("b", "0x7");
    let c = run("c", "8");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn overrides_switch_mode_and_total() {
    let dir = tempfile::tempdir().unwrap();
    let req = write_json(dir.path(), "request.json", &request(100, "even"));
    let out = dir.path().join("out");
    quota()
        .args([
            "--input", req.to_str().unwrap(),
            "--mode", "census",
            "--total", "1000",
            "--ids", "sequential",
            "--out", out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("census targets do not sum to total"));

    let doc = read(&out.join("allocation.json"));
    assert_eq!(targets(&doc), vec![46, 68, 47, 70]);
    assert_eq!(doc["cells"][0]["id"], "q_0001");
    assert_eq!(doc["request"]["mode"], "census");
}

#[test]
fn redistribute_existing_allocation() {
    let dir = tempfile::tempdir().unwrap();
    let req = write_json(dir.path(), "request.json", &request(100, "even"));
    let first = dir.path().join("first");
    quota()
        .args(["--input", req.to_str().unwrap(), "--out", first.to_str().unwrap(), "--quiet"])
        .assert()
        .success();

    let second = dir.path().join("second");
    let prev = first.join("allocation.json");
    quota()
        .args(["--cells", prev.to_str().unwrap(), "--total", "103", "--out", second.to_str().unwrap(), "--quiet"])
        .assert()
        .success();

    let before = read(&prev);
    let after = read(&second.join("allocation.json"));
    assert_eq!(after["operation"], "redistribute");
    assert_eq!(targets(&after), vec![26, 26, 26, 25]);
    let ids = |d: &Value| d["cells"].as_array().unwrap().iter().map(|c| c["id"].clone()).collect::<Vec<_>>();
    assert_eq!(ids(&before), ids(&after));
}

#[test]
fn duplicate_and_unknown_delete() {
    let dir = tempfile::tempdir().unwrap();
    let req = write_json(dir.path(), "request.json", &request(100, "even"));
    let first = dir.path().join("first");
    quota()
        .args(["--input", req.to_str().unwrap(), "--ids", "sequential", "--out", first.to_str().unwrap(), "--quiet"])
        .assert()
        .success();
    let prev = first.join("allocation.json");

    let copied = dir.path().join("copied");
    quota()
        .args([
            "--cells", prev.to_str().unwrap(),
            "--duplicate", "q_0002",
            "--ids", "sequential",
            "--out", copied.to_str().unwrap(),
            "--quiet",
        ])
        .assert()
        .success();
    let doc = read(&copied.join("allocation.json"));
    assert_eq!(doc["operation"], "duplicate");
    assert_eq!(doc["total_target"], 100);
    assert_eq!(targets(&doc), vec![25, 25, 25, 25, 25]);
    assert_eq!(doc["cells"][4]["name"], "male / 25-34 (Copy)");
    assert_eq!(doc["cells"][4]["id"], "q_0005");
    assert_eq!(doc["summary"]["delta"], 25);

    let untouched = dir.path().join("untouched");
    quota()
        .args(["--cells", prev.to_str().unwrap(), "--delete", "q_9999", "--out", untouched.to_str().unwrap()])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("q_9999"));
    assert!(!untouched.join("allocation.json").exists());
}

#[test]
fn validate_only_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let req = write_json(dir.path(), "request.json", &request(100, "census"));
    let out = dir.path().join("out");
    quota()
        .args(["--input", req.to_str().unwrap(), "--out", out.to_str().unwrap(), "--validate-only"])
        .assert()
        .success()
        .stderr(predicate::str::contains("validate-only: inputs OK"));
    assert!(!out.join("allocation.json").exists());
}

#[test]
fn non_positive_total_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let req = write_json(dir.path(), "request.json", &request(0, "even"));
    quota()
        .args(["--input", req.to_str().unwrap(), "--out", dir.path().to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("total target must be positive"));
}

#[test]
fn schema_violation_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let mut v = request(100, "even");
    v["mode"] = json!("random");
    let req = write_json(dir.path(), "request.json", &v);
    quota()
        .args(["--input", req.to_str().unwrap(), "--validate-only"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("/mode"));
}

#[test]
fn flag_errors_exit_2() {
    quota().assert().code(2).stderr(predicate::str::contains("exactly one of --input or --cells"));
    quota()
        .args(["--input", "https://example.com/request.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no scheme"));
}

#[test]
fn unwritable_out_dir_exits_4() {
    let dir = tempfile::tempdir().unwrap();
    let cells = dir.path().join("cells.json");
    fs::write(&cells, "[]").unwrap();
    // --out points at an existing regular file, so the directory cannot be created
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "x").unwrap();
    quota()
        .args(["--cells", cells.to_str().unwrap(), "--total", "10", "--out", blocker.join("sub").to_str().unwrap()])
        .assert()
        .code(4);
}
