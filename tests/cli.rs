use assert_cmd::prelude::*;
use std::{fs, process::Command};
use tempfile::TempDir;

fn write_env(dir: &TempDir) -> String {
    let env_path = dir.path().join("env");
    let content = format!(
        "STORE_ROOT={}\nBIND_HTTP=127.0.0.1:0\nAUTH_SECRET=cli-secret\n",
        dir.path().display()
    );
    fs::write(&env_path, content).unwrap();
    env_path.to_str().unwrap().to_string()
}

fn draft_json() -> serde_json::Value {
    serde_json::json!({
        "title": "Bus Route Change",
        "content": "Route 4 will start from the north gate from Monday.",
        "priority": "informational",
        "department": "All",
        "year": "All",
        "author": "Transport Office",
        "tags": ["transport"]
    })
}

#[test]
fn init_and_seed_cli_store_documents() {
    let dir = TempDir::new().unwrap();
    let env_path = write_env(&dir);

    Command::cargo_bin("circlr")
        .unwrap()
        .args(["--env", &env_path, "init"])
        .assert()
        .success();
    assert!(dir.path().join("circulars").exists());
    assert!(dir.path().join("index/by-department").exists());

    Command::cargo_bin("circlr")
        .unwrap()
        .args(["--env", &env_path, "seed"])
        .assert()
        .success();

    assert!(dir.path().join("log/circulars.ndjson").exists());
    let docs = walk_json_files(&dir.path().join("circulars"));
    assert!(!docs.is_empty());
}

#[test]
fn ingest_cli_stores_draft_and_reindex_rebuilds() {
    let dir = TempDir::new().unwrap();
    let env_path = write_env(&dir);

    Command::cargo_bin("circlr")
        .unwrap()
        .args(["--env", &env_path, "init"])
        .assert()
        .success();

    let draft_path = dir.path().join("draft.json");
    fs::write(&draft_path, draft_json().to_string()).unwrap();
    Command::cargo_bin("circlr")
        .unwrap()
        .args(["--env", &env_path, "ingest", draft_path.to_str().unwrap()])
        .assert()
        .success();

    let docs = walk_json_files(&dir.path().join("circulars"));
    assert_eq!(docs.len(), 1);

    fs::remove_dir_all(dir.path().join("index")).unwrap();
    Command::cargo_bin("circlr")
        .unwrap()
        .args(["--env", &env_path, "reindex"])
        .assert()
        .success();

    assert!(dir
        .path()
        .join("index/by-department")
        .read_dir()
        .unwrap()
        .next()
        .is_some());
    assert!(dir.path().join("index/by-tag/transport.txt").exists());
}

#[test]
fn ingest_cli_rejects_invalid_draft() {
    let dir = TempDir::new().unwrap();
    let env_path = write_env(&dir);

    Command::cargo_bin("circlr")
        .unwrap()
        .args(["--env", &env_path, "init"])
        .assert()
        .success();

    let mut bad = draft_json();
    bad["priority"] = serde_json::Value::String("critical".into());
    let bad_path = dir.path().join("bad.json");
    fs::write(&bad_path, bad.to_string()).unwrap();

    Command::cargo_bin("circlr")
        .unwrap()
        .args(["--env", &env_path, "ingest", bad_path.to_str().unwrap()])
        .assert()
        .failure();

    assert!(walk_json_files(&dir.path().join("circulars")).is_empty());
}

#[test]
fn compose_cli_writes_prefilled_draft() {
    let dir = TempDir::new().unwrap();
    let env_path = write_env(&dir);
    let out = dir.path().join("exam.json");

    Command::cargo_bin("circlr")
        .unwrap()
        .args([
            "--env",
            &env_path,
            "compose",
            "--template",
            "exam-notice",
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let draft: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(draft["title"], "End Semester Examination Schedule");
    assert_eq!(draft["priority"], "urgent");
    assert_eq!(draft["template"], "Exam Notice");
}

#[test]
fn token_cli_mints_role_bearing_credential() {
    let dir = TempDir::new().unwrap();
    let env_path = write_env(&dir);

    let output = Command::cargo_bin("circlr")
        .unwrap()
        .args([
            "--env",
            &env_path,
            "token",
            "--name",
            "Priya Sharma",
            "--role",
            "student",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let token = String::from_utf8(output).unwrap();
    let token = token.trim();
    assert!(token.starts_with("Priya Sharma:student:"));
    // the MAC segment is a 32-byte digest in hex
    let mac = token.rsplit(':').next().unwrap();
    assert_eq!(mac.len(), 64);
    assert!(mac.chars().all(|c| c.is_ascii_hexdigit()));

    Command::cargo_bin("circlr")
        .unwrap()
        .args(["--env", &env_path, "token", "--name", "x", "--role", "dean"])
        .assert()
        .failure();
}

#[test]
fn cli_help_lists_commands() {
    let output = Command::cargo_bin("circlr")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    for cmd in [
        "init", "seed", "ingest", "reindex", "compose", "token", "serve", "feed",
    ] {
        assert!(text.contains(cmd), "missing {cmd} in help output");
    }
}

fn walk_json_files(root: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut out = vec![];
    if !root.exists() {
        return out;
    }
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("json") {
                out.push(path);
            }
        }
    }
    out
}
