//! Scale test: many issued trust marks across both store backends.
//!
//! Validates that find, dump and load stay correct as the number of
//! recorded marks grows.

use std::collections::BTreeMap;
use std::sync::Arc;

use fedtrust::{
    AttestationStore, Claims, EntityIdentity, FileAttestationStore, KeyJar,
    MemoryAttestationStore, TrustMarkIssuer, TrustMarkRecord, TrustMarkSpec,
};

const TMI: &str = "https://tmi.example.org";
const MARKS: [&str; 4] = [
    "https://refeds.org/sirtfi",
    "https://refeds.org/mfa",
    "https://example.org/gold",
    "https://example.org/silver",
];

fn record(mark: &str, i: usize, iat: i64) -> TrustMarkRecord {
    TrustMarkRecord {
        id: mark.to_string(),
        sub: format!("https://rp{i}.example.org"),
        iat,
        exp: Some(iat + 3600),
        claims: Claims::new().with("serial", i as u64),
    }
}

#[test]
fn stress_10k_records_memory_store() {
    let mut store = MemoryAttestationStore::new(MARKS);
    for i in 0..10_000 {
        let mark = MARKS[i % MARKS.len()];
        store.add(&record(mark, i, 1_000 + i as i64)).unwrap();
    }

    for i in (0..10_000).step_by(7) {
        let mark = MARKS[i % MARKS.len()];
        let sub = format!("https://rp{i}.example.org");
        assert!(store.find(mark, &sub, Some(1_000 + i as i64)).unwrap(), "record {i} missing");
        let other = MARKS[(i + 1) % MARKS.len()];
        assert!(!store.find(other, &sub, None).unwrap());
    }

    let snapshot = store.dump().unwrap();
    assert_eq!(snapshot.values().map(Vec::len).sum::<usize>(), 10_000);
}

#[test]
fn stress_memory_store_reissue_keeps_latest_only() {
    let mut store = MemoryAttestationStore::new(MARKS);
    for round in 0..50 {
        for i in 0..100 {
            store.add(&record(MARKS[0], i, round)).unwrap();
        }
    }
    let snapshot = store.dump().unwrap();
    assert_eq!(snapshot[MARKS[0]].len(), 100);
    assert!(snapshot[MARKS[0]].iter().all(|r| r.iat == 49));
}

#[test]
fn stress_2k_records_file_store_history() {
    let tmp = tempfile::tempdir().unwrap();
    let files: BTreeMap<String, _> = MARKS
        .iter()
        .map(|m| (m.to_string(), tmp.path().join(format!("{}.jsonl", m.replace(['/', ':'], "_")))))
        .collect();
    let mut store = FileAttestationStore::open(files.clone()).unwrap();

    // Every subject gets two records per mark; both stay findable.
    for i in 0..250 {
        for mark in MARKS {
            store.add(&record(mark, i, 10)).unwrap();
            store.add(&record(mark, i, 20)).unwrap();
        }
    }
    for mark in MARKS {
        assert_eq!(store.records(mark).unwrap().len(), 500);
    }

    let reopened = FileAttestationStore::open(files).unwrap();
    for i in (0..250).step_by(25) {
        let sub = format!("https://rp{i}.example.org");
        for mark in MARKS {
            assert!(reopened.find(mark, &sub, Some(10)).unwrap());
            assert!(reopened.find(mark, &sub, Some(20)).unwrap());
            assert!(!reopened.find(mark, &sub, Some(30)).unwrap());
        }
    }
}

#[test]
fn stress_file_dump_into_memory_store() {
    let tmp = tempfile::tempdir().unwrap();
    let files: BTreeMap<String, _> = MARKS
        .iter()
        .enumerate()
        .map(|(n, m)| (m.to_string(), tmp.path().join(format!("mark{n}.jsonl"))))
        .collect();
    let mut file_store = FileAttestationStore::open(files).unwrap();
    for i in 0..1_000 {
        file_store.add(&record(MARKS[i % MARKS.len()], i, 1)).unwrap();
    }

    let mut memory = MemoryAttestationStore::new(MARKS);
    memory.loads(&file_store.dumps().unwrap()).unwrap();
    for i in (0..1_000).step_by(13) {
        let sub = format!("https://rp{i}.example.org");
        assert!(memory.find(MARKS[i % MARKS.len()], &sub, Some(1)).unwrap());
    }
}

#[test]
fn stress_1k_trust_marks_issue_and_verify() {
    let identity = EntityIdentity::new(TMI, Arc::new(KeyJar::with_generated_key(TMI)));
    let specification = MARKS
        .iter()
        .map(|m| (m.to_string(), TrustMarkSpec::default().with_lifetime(86_400)))
        .collect();
    let mut issuer = TrustMarkIssuer::with_store(
        specification,
        identity,
        Box::new(MemoryAttestationStore::new(MARKS)),
    )
    .unwrap();

    let mut tokens = Vec::with_capacity(1_000);
    for i in 0..1_000 {
        let mark = MARKS[i % MARKS.len()];
        let sub = format!("https://rp{i}.example.org");
        tokens.push(issuer.create_trust_mark(mark, &sub, Claims::new()).unwrap());
    }

    for (i, token) in tokens.iter().enumerate() {
        let mark = issuer
            .unpack_trust_mark(token, Some(TMI))
            .unwrap_or_else(|e| panic!("trust mark {i} failed verification: {e}"));
        assert!(issuer.find(&mark.id, &mark.sub, Some(mark.iat)).unwrap());
    }
}
