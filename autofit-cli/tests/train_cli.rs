//! Train, predict and list models through the built binaries.

use pretty_assertions::assert_eq;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const REQUEST: &str = r#"{
    "data": [{"a":1},{"a":2},{"a":1},{"a":2},{"a":1},{"a":2}],
    "labels": ["x","y","x","y","x","y"],
    "name": "demo"
}"#;

const CONFIG: &str = r#"
[gradient_boosting]
n_estimators = 10

[random_forest]
n_estimators = 10
"#;

fn run(bin: &str, args: &[&Path]) -> Output {
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn train(tmp: &TempDir, out: &Path) -> Output {
    let input = tmp.path().join("input.json");
    let config = tmp.path().join("config.toml");
    std::fs::write(&input, REQUEST).unwrap();
    std::fs::write(&config, CONFIG).unwrap();
    Command::new(env!("CARGO_BIN_EXE_train"))
        .arg(out)
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

#[test]
fn train_writes_artifact_and_metadata() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out").join("demo");
    let result = train(&tmp, &out);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    assert!(result.stdout.is_empty());

    assert!(out.join("demo.pkl").exists());
    let meta: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("demo.json")).unwrap()).unwrap();
    assert_eq!(meta["model_id"], "demo");
    assert_eq!(meta["metadata"]["name"], "demo");
}

#[test]
fn predict_prints_probability_maps() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("demo");
    assert!(train(&tmp, &out).status.success());

    let input = tmp.path().join("predict.json");
    std::fs::write(&input, r#"{"data": [{"a": 1}, {"a": 2}]}"#).unwrap();
    let result = run(env!("CARGO_BIN_EXE_predict"), &[out.as_path(), input.as_path()]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let rows: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_slice(&result.stdout).unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["x", "y"]);
    }
}

#[test]
fn models_lists_trained_models() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("models");
    assert!(train(&tmp, &root.join("b")).status.success());
    assert!(train(&tmp, &root.join("a")).status.success());

    let result = run(env!("CARGO_BIN_EXE_models"), &[root.as_path()]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    let records: Vec<serde_json::Value> = serde_json::from_slice(&result.stdout).unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r["model_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn train_fails_on_missing_input() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("demo");
    let result = run(
        env!("CARGO_BIN_EXE_train"),
        &[out.as_path(), tmp.path().join("absent.json").as_path()],
    );
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("absent.json"));
}
