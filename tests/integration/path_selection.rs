//! Integration test: resolving peers across several trust anchors.
//!
//! Covers the selection rules end to end through `FederationEntity`:
//! single path, configured priority, default priority, fallback, and
//! collection failures.

use fedtrust::{
    select, Claims, Collector, FederationEntity, FederationEntityConfig, FederationError, KeyJar,
    PathBundle, PriorityList, SelectionBasis, StatementQuery, StaticCollector, TokenSigner, TrustChain,
};

const RP: &str = "https://rp.example.org";
const OP: &str = "https://op.example.org";
const EDUGAIN: &str = "https://edugain.example.org";
const SWAMID: &str = "https://swamid.example.org";
const INCOMMON: &str = "https://incommon.example.org";

fn chain(anchor: &str, name: &str) -> TrustChain {
    TrustChain::new(
        vec![format!("{OP}->{anchor}")],
        Claims::new().with(
            "openid_provider",
            serde_json::json!({"issuer": OP, "organization_name": name}),
        ),
    )
}

fn org_name(metadata: &Claims) -> String {
    metadata
        .get("openid_provider")
        .and_then(|op| op.get("organization_name"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn bundle(anchors: &[&str]) -> PathBundle {
    let mut paths = PathBundle::new();
    for anchor in anchors {
        paths.push(*anchor, chain(anchor, &format!("via {anchor}")));
    }
    paths
}

fn rp(anchors: &[&str], priority: Option<Vec<&str>>, collector: StaticCollector) -> FederationEntity {
    let mut config = FederationEntityConfig::new(RP);
    for anchor in anchors {
        config.trust_anchors.insert(
            anchor.to_string(),
            KeyJar::with_generated_key(anchor).export_jwks(anchor),
        );
    }
    config.priority = priority.map(|p| p.into_iter().map(String::from).collect());
    FederationEntity::new(config, KeyJar::with_generated_key(RP), Box::new(collector)).unwrap()
}

#[test]
fn single_anchor_needs_no_priority() {
    let entity = rp(
        &[EDUGAIN, SWAMID],
        Some(vec![SWAMID]),
        StaticCollector::new().with_paths(OP, bundle(&[EDUGAIN])),
    );
    let selection = entity.resolve(OP).unwrap();
    assert_eq!(selection.anchor, EDUGAIN);
    assert_eq!(selection.basis, SelectionBasis::SinglePath);
    assert_eq!(org_name(&selection.metadata), format!("via {EDUGAIN}"));
}

#[test]
fn configured_priority_beats_collector_and_name_order() {
    let entity = rp(
        &[EDUGAIN, SWAMID, INCOMMON],
        Some(vec![SWAMID, EDUGAIN]),
        StaticCollector::new().with_paths(OP, bundle(&[EDUGAIN, SWAMID, INCOMMON])),
    );
    let selection = entity.resolve(OP).unwrap();
    assert_eq!(selection.anchor, SWAMID);
    assert_eq!(selection.basis, SelectionBasis::Priority);
}

#[test]
fn default_priority_is_sorted_trust_anchors() {
    let entity = rp(
        &[SWAMID, INCOMMON, EDUGAIN],
        None,
        StaticCollector::new().with_paths(OP, bundle(&[SWAMID, INCOMMON])),
    );
    assert_eq!(
        entity.priority().iter().collect::<Vec<_>>(),
        vec![EDUGAIN, INCOMMON, SWAMID]
    );
    let selection = entity.resolve(OP).unwrap();
    assert_eq!(selection.anchor, INCOMMON);
    assert_eq!(selection.basis, SelectionBasis::Priority);
}

#[test]
fn unprioritised_anchors_fall_back_deterministically() {
    let mut entity = rp(
        &[EDUGAIN],
        Some(vec![EDUGAIN]),
        StaticCollector::new().with_paths(OP, bundle(&[SWAMID, INCOMMON])),
    );
    entity
        .import_trust_anchor(SWAMID, &KeyJar::with_generated_key(SWAMID).export_jwks(SWAMID))
        .unwrap();
    entity
        .import_trust_anchor(INCOMMON, &KeyJar::with_generated_key(INCOMMON).export_jwks(INCOMMON))
        .unwrap();

    for _ in 0..5 {
        let selection = entity.resolve(OP).unwrap();
        assert_eq!(selection.anchor, INCOMMON);
        assert_eq!(selection.basis, SelectionBasis::Fallback);
    }
}

#[test]
fn collector_preference_within_anchor_is_kept() {
    let mut paths = PathBundle::new();
    paths.push(EDUGAIN, chain(EDUGAIN, "fresh"));
    paths.push(EDUGAIN, chain(EDUGAIN, "stale"));
    let entity = rp(&[EDUGAIN], None, StaticCollector::new());
    let selection = entity.pick_metadata(&paths).unwrap();
    assert_eq!(org_name(&selection.metadata), "fresh");
}

#[test]
fn collection_failure_propagates() {
    let entity = rp(&[EDUGAIN], None, StaticCollector::new());
    assert!(matches!(
        entity.resolve(OP),
        Err(FederationError::Collection(_))
    ));
    assert!(matches!(
        entity.load_entity_statements(EDUGAIN, OP, &StatementQuery::default()),
        Err(FederationError::Collection(_))
    ));
}

#[test]
fn empty_bundle_is_no_trust_path() {
    let entity = rp(&[EDUGAIN], None, StaticCollector::new());
    assert!(matches!(
        entity.pick_metadata(&PathBundle::new()),
        Err(FederationError::NoTrustPath)
    ));
}

struct ChainOfStatements {
    anchor: KeyJar,
}

impl Collector for ChainOfStatements {
    fn collect(&self, peer: &str) -> fedtrust::Result<PathBundle> {
        let token = fedtrust::JwsSigner::entity_statement().sign(
            &Claims::new().with("sub", peer).with("exp", i64::MAX / 2),
            &self.anchor,
            EDUGAIN,
        )?;
        let mut paths = PathBundle::new();
        paths.push(EDUGAIN, TrustChain::new(vec![token], Claims::new()));
        Ok(paths)
    }

    fn load_statement(
        &self,
        _issuer: &str,
        _subject: &str,
        _query: &StatementQuery,
    ) -> fedtrust::Result<fedtrust::StatementSet> {
        Ok(fedtrust::StatementSet::default())
    }
}

#[test]
fn custom_collector_statements_verify_with_imported_anchor_keys() {
    let anchor_keys = KeyJar::with_generated_key(EDUGAIN);
    let mut config = FederationEntityConfig::new(RP);
    config
        .trust_anchors
        .insert(EDUGAIN.to_string(), anchor_keys.export_jwks(EDUGAIN));
    let entity = FederationEntity::new(
        config,
        KeyJar::with_generated_key(RP),
        Box::new(ChainOfStatements {
            anchor: anchor_keys,
        }),
    )
    .unwrap();

    let paths = entity.collect_entity_statements(OP).unwrap();
    let token = &paths.get(EDUGAIN).unwrap()[0].statements[0];
    let statement = entity.verify_statement(token).unwrap();
    assert_eq!(statement.iss, EDUGAIN);
    assert_eq!(statement.sub, OP);
}

#[test]
fn select_is_pure() {
    let paths = bundle(&[SWAMID, EDUGAIN]);
    let priority = PriorityList::new([SWAMID]);
    let first = select(&paths, &priority).unwrap();
    let second = select(&paths, &priority).unwrap();
    assert_eq!(first, second);
    assert_eq!(paths, bundle(&[SWAMID, EDUGAIN]));
}
