//! Integration tests for the CLI binary.
//!
//! Drives the `fedtrust` binary through key generation, trust mark
//! issuance and verification, and trust path resolution.
//!
//! This test is registered as a [[test]] in the fedtrust-cli crate so that
//! CARGO_BIN_EXE_fedtrust is available.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const TMI: &str = "https://tmi.example.org";
const RP: &str = "https://rp.example.org";
const SIRTFI: &str = "https://refeds.org/sirtfi";

/// Get a Command pointing to the `fedtrust` binary.
fn fedtrust_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fedtrust"))
}

fn run(config: &Path, args: &[&str]) -> Output {
    fedtrust_binary()
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("failed to execute fedtrust")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Generate a key and write an issuer configuration with a file store.
fn setup_issuer(dir: &Path) -> PathBuf {
    let config = dir.join("tmi.json");
    let key_file = dir.join("tmi.jwks");
    let out = run(&config, &["keygen", "--output", key_file.to_str().unwrap()]);
    assert_success(&out, "keygen");

    let doc = serde_json::json!({
        "entity_id": TMI,
        "key_file": key_file,
        "trust_mark_issuer": {
            "trust_mark_specification": {
                SIRTFI: { "ref": "https://refeds.org/sirtfi", "lifetime": 3600 }
            },
            "trust_mark_db": {
                "backend": "file",
                "files": { SIRTFI: dir.join("sirtfi.jsonl") }
            }
        }
    });
    std::fs::write(&config, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
    config
}

#[test]
fn cli_responds_to_help() {
    let output = fedtrust_binary()
        .arg("--help")
        .output()
        .expect("failed to execute fedtrust --help");

    assert_success(&output, "fedtrust --help");
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(
        text.contains("fedtrust") || text.contains("Usage"),
        "fedtrust --help output should contain usage information, got: {text}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = fedtrust_binary()
        .arg("--version")
        .output()
        .expect("failed to execute fedtrust --version");

    assert_success(&output, "fedtrust --version");
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(
        text.contains("0.3") || text.contains("fedtrust"),
        "fedtrust --version should contain version info, got: {text}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = fedtrust_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute fedtrust");

    assert!(
        !output.status.success(),
        "fedtrust with unknown flag should exit with error"
    );
}

#[test]
fn cli_keygen_refuses_to_overwrite() {
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("unused.json");
    let key_file = tmp.path().join("k.jwks");
    let key_arg = key_file.to_str().unwrap();

    assert_success(&run(&config, &["keygen", "--output", key_arg]), "keygen");
    assert!(!run(&config, &["keygen", "--output", key_arg]).status.success());
    assert_success(&run(&config, &["keygen", "--output", key_arg, "--force"]), "keygen --force");
}

#[test]
fn cli_issue_verify_find_roundtrip() {
    let tmp = tempfile::tempdir().unwrap();
    let config = setup_issuer(tmp.path());

    let issued = run(&config, &["mark", "issue", "--id", SIRTFI, "--sub", RP]);
    assert_success(&issued, "mark issue");
    let token = stdout(&issued);
    assert_eq!(token.split('.').count(), 3, "expected a compact token, got {token}");

    let verified = run(&config, &["mark", "verify", &token, "--issuer", TMI]);
    assert_success(&verified, "mark verify");
    assert!(stdout(&verified).contains("valid"));

    let wrong_issuer = run(&config, &["mark", "verify", &token, "--issuer", RP]);
    assert!(!wrong_issuer.status.success());

    // The file store survives between invocations.
    assert_success(
        &run(&config, &["mark", "find", "--id", SIRTFI, "--sub", RP]),
        "mark find",
    );
    assert_success(
        &run(&config, &["mark", "find", "--id", SIRTFI, "--sub", RP, "--iat", "0"]),
        "mark find --iat 0",
    );
    assert!(!run(&config, &["mark", "find", "--id", SIRTFI, "--sub", RP, "--iat", "1"])
        .status
        .success());
    assert!(!run(&config, &["mark", "find", "--id", SIRTFI, "--sub", TMI])
        .status
        .success());
}

#[test]
fn cli_unknown_mark_id_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let config = setup_issuer(tmp.path());
    let out = run(&config, &["mark", "issue", "--id", "https://unknown", "--sub", RP]);
    assert!(!out.status.success());
    assert_eq!(std::fs::read_to_string(tmp.path().join("sirtfi.jsonl")).unwrap(), "");
}

#[test]
fn cli_dump_and_load() {
    let tmp = tempfile::tempdir().unwrap();
    let config = setup_issuer(tmp.path());
    assert_success(
        &run(&config, &["mark", "issue", "--id", SIRTFI, "--sub", RP]),
        "mark issue",
    );

    let dump_file = tmp.path().join("dump.json");
    assert_success(
        &run(&config, &["mark", "dump", "--output", dump_file.to_str().unwrap()]),
        "mark dump",
    );
    assert_success(
        &run(&config, &["mark", "load", dump_file.to_str().unwrap()]),
        "mark load",
    );
    let lines = std::fs::read_to_string(tmp.path().join("sirtfi.jsonl")).unwrap();
    assert_eq!(lines.lines().count(), 2, "file store load appends");
}

#[test]
fn cli_statement_and_jwks() {
    let tmp = tempfile::tempdir().unwrap();
    let config = setup_issuer(tmp.path());

    let jwks = run(&config, &["jwks"]);
    assert_success(&jwks, "jwks");
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&jwks)).unwrap();
    assert_eq!(parsed["keys"].as_array().unwrap().len(), 1);
    assert!(parsed["keys"][0].get("d").is_none(), "public JWKS must not leak d");

    let statement = run(
        &config,
        &["statement", "--metadata", r#"{"federation_entity": {}}"#, "--lifetime", "1h"],
    );
    assert_success(&statement, "statement");
    assert_eq!(stdout(&statement).split('.').count(), 3);
}

#[test]
fn cli_resolve_with_collection() {
    let tmp = tempfile::tempdir().unwrap();
    let config = setup_issuer(tmp.path());
    let collection = tmp.path().join("collected.json");
    let doc = serde_json::json!({
        "paths": {
            RP: {
                "https://ta-b.example.org": [ { "metadata": { "tag": "b" } } ],
                "https://ta-a.example.org": [ { "metadata": { "tag": "a" }, "exp": 1_900_000_000u64 } ]
            }
        }
    });
    std::fs::write(&collection, serde_json::to_vec(&doc).unwrap()).unwrap();

    let out = run(
        &config,
        &["resolve", RP, "--collection", collection.to_str().unwrap()],
    );
    assert_success(&out, "resolve");
    let selection: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(selection["anchor"], "https://ta-a.example.org");
    assert_eq!(selection["basis"], "fallback");
    assert_eq!(selection["exp"], 1_900_000_000);

    let missing = run(
        &config,
        &["resolve", "https://op.example.org", "--collection", collection.to_str().unwrap()],
    );
    assert!(!missing.status.success());
}
