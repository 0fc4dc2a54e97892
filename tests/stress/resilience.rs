//! Resilience tests: corrupted store files, damaged key files, tampered tokens.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use fedtrust::storage::{load_private_jwks, save_private_jwks};
use fedtrust::{
    AttestationStore, Claims, EntityIdentity, FederationEntityConfig, FederationError,
    FileAttestationStore, KeyJar, StoreConfig, TrustMarkIssuer, TrustMarkIssuerConfig,
    TrustMarkSpec,
};

const TMI: &str = "https://tmi.example.org";
const RP: &str = "https://rp.example.org";
const SIRTFI: &str = "https://refeds.org/sirtfi";

fn file_issuer(path: PathBuf) -> TrustMarkIssuer {
    let mut specification = BTreeMap::new();
    specification.insert(SIRTFI.to_string(), TrustMarkSpec::default().with_lifetime(600));
    let mut files = BTreeMap::new();
    files.insert(SIRTFI.to_string(), path);
    let config = TrustMarkIssuerConfig {
        trust_mark_specification: specification,
        trust_mark_db: StoreConfig::File { files },
    };
    let identity = EntityIdentity::new(TMI, Arc::new(KeyJar::with_generated_key(TMI)));
    TrustMarkIssuer::new(config, identity).unwrap()
}

#[test]
fn resilience_corrupted_store_line_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("sirtfi.jsonl");
    let mut issuer = file_issuer(path.clone());
    issuer.create_trust_mark(SIRTFI, RP, Claims::new()).unwrap();

    // Flip bytes in the middle of the recorded line
    {
        let mut data = std::fs::read(&path).unwrap();
        for item in data.iter_mut().take(20).skip(10) {
            *item ^= 0xFF;
        }
        std::fs::write(&path, data).unwrap();
    }

    let err = issuer.find(SIRTFI, RP, None).unwrap_err();
    assert!(
        matches!(err, FederationError::InvalidFileFormat(_) | FederationError::Storage(_)),
        "corrupted store should be reported, got {err:?}"
    );
}

#[test]
fn resilience_truncated_store_line_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("sirtfi.jsonl");
    let mut issuer = file_issuer(path.clone());
    issuer.create_trust_mark(SIRTFI, RP, Claims::new()).unwrap();
    issuer.create_trust_mark(SIRTFI, RP, Claims::new()).unwrap();

    let data = std::fs::read(&path).unwrap();
    std::fs::write(&path, &data[..data.len() - 10]).unwrap();

    match issuer.find(SIRTFI, RP, None) {
        Err(FederationError::InvalidFileFormat(msg)) => assert!(msg.contains(":2:"), "{msg}"),
        other => panic!("expected InvalidFileFormat, got {other:?}"),
    }
}

#[test]
fn resilience_blank_lines_are_tolerated() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("sirtfi.jsonl");
    let mut issuer = file_issuer(path.clone());
    issuer.create_trust_mark(SIRTFI, RP, Claims::new()).unwrap();

    let mut content = std::fs::read_to_string(&path).unwrap();
    content.insert_str(0, "\n   \n");
    content.push('\n');
    std::fs::write(&path, content).unwrap();

    assert!(issuer.find(SIRTFI, RP, None).unwrap());
}

#[test]
fn resilience_store_file_removed_after_open() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("sirtfi.jsonl");
    let mut issuer = file_issuer(path.clone());
    std::fs::remove_file(&path).unwrap();

    let err = issuer.create_trust_mark(SIRTFI, RP, Claims::new()).unwrap_err();
    assert!(matches!(err, FederationError::Storage(_)), "got {err:?}");
}

#[test]
fn resilience_store_path_is_a_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let mut files = BTreeMap::new();
    files.insert(SIRTFI.to_string(), tmp.path().to_path_buf());
    assert!(matches!(
        FileAttestationStore::open(files),
        Err(FederationError::Storage(_))
    ));
}

#[test]
fn resilience_bad_snapshot_rejected_without_writes() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("sirtfi.jsonl");
    let mut issuer = file_issuer(path.clone());

    assert!(issuer.load_trust_marks("not json").is_err());
    let unknown = r#"{"https://unknown.example.org": [{"id": "https://unknown.example.org", "sub": "x", "iat": 1}]}"#;
    assert!(issuer.load_trust_marks(unknown).unwrap_err().is_configuration());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn resilience_corrupted_key_file_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tmi.jwks");
    let jar = KeyJar::with_generated_key(TMI);
    save_private_jwks(&path, &jar.export_private_jwks(TMI)).unwrap();

    let data = std::fs::read(&path).unwrap();
    std::fs::write(&path, &data[..data.len() / 2]).unwrap();
    assert!(matches!(
        load_private_jwks(&path),
        Err(FederationError::InvalidFileFormat(_))
    ));
}

#[test]
fn resilience_mismatched_private_key_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tmi.jwks");
    let a = KeyJar::with_generated_key(TMI).export_private_jwks(TMI);
    let b = KeyJar::with_generated_key(TMI).export_private_jwks(TMI);

    let mut spliced = a.clone();
    spliced.keys[0].d = b.keys[0].d.clone();
    save_private_jwks(&path, &spliced).unwrap();

    let loaded = load_private_jwks(&path).unwrap();
    let mut jar = KeyJar::new();
    assert!(matches!(
        jar.import_jwks(&loaded, TMI),
        Err(FederationError::InvalidKey(_))
    ));
}

#[test]
fn resilience_tampered_token_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let mut issuer = file_issuer(tmp.path().join("sirtfi.jsonl"));
    let token = issuer.create_trust_mark(SIRTFI, RP, Claims::new()).unwrap();

    // Flip one character in the signature part
    let (signing_input, signature) = token.rsplit_once('.').unwrap();
    let mut sig: Vec<char> = signature.chars().collect();
    sig[5] = if sig[5] == 'A' { 'B' } else { 'A' };
    let tampered = format!("{signing_input}.{}", sig.into_iter().collect::<String>());

    let err = issuer.unpack_trust_mark(&tampered, None).unwrap_err();
    assert!(
        matches!(err, FederationError::SignatureInvalid | FederationError::Verification(_)),
        "got {err:?}"
    );
}

#[test]
fn resilience_config_with_garbage_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("entity.json");
    std::fs::write(&path, b"\x00\x01 definitely not json").unwrap();
    assert!(matches!(
        FederationEntityConfig::from_file(&path),
        Err(FederationError::InvalidFileFormat(_))
    ));

    assert!(matches!(
        FederationEntityConfig::from_file(&tmp.path().join("missing.json")),
        Err(FederationError::Io(_))
    ));
}
