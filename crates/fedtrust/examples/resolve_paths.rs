//! Resolve Paths — pick the governing trust anchor for a peer reachable
//! through several federations.
//!
//! Run with:
//!   cargo run --example resolve_paths -p fedtrust

use fedtrust::{
    Claims, FederationEntity, FederationEntityConfig, KeyJar, PathBundle, StaticCollector,
    TrustChain,
};

const RP: &str = "https://rp.example.org";
const OP: &str = "https://op.example.org";
const EDUGAIN: &str = "https://edugain.example.org";
const SWAMID: &str = "https://swamid.example.org";
const UNLISTED: &str = "https://unlisted.example.org";

fn chain(anchor: &str) -> TrustChain {
    TrustChain::new(
        vec![],
        Claims::new().with(
            "openid_provider",
            serde_json::json!({ "issuer": OP, "via": anchor }),
        ),
    )
}

fn main() {
    // ── 1. The relying party trusts two anchors, preferring SWAMID ──────────
    let mut config = FederationEntityConfig::new(RP);
    for anchor in [EDUGAIN, SWAMID] {
        config.trust_anchors.insert(
            anchor.to_string(),
            KeyJar::with_generated_key(anchor).export_jwks(anchor),
        );
    }
    config.priority = Some(vec![SWAMID.to_string(), EDUGAIN.to_string()]);

    // ── 2. Pretend the collector found chains through both ──────────────────
    let mut paths = PathBundle::new();
    paths.push(EDUGAIN, chain(EDUGAIN));
    paths.push(SWAMID, chain(SWAMID));
    let collector = StaticCollector::new().with_paths(OP, paths);

    let rp = FederationEntity::new(config, KeyJar::with_generated_key(RP), Box::new(collector))
        .expect("relying party should build");

    // ── 3. Resolve ──────────────────────────────────────────────────────────
    let selection = rp.resolve(OP).expect("a path should be selected");
    println!("Resolved {OP}");
    println!("  Anchor:   {}", selection.anchor);
    println!("  Basis:    {:?}", selection.basis);
    println!("  Metadata: {}", selection.metadata.to_json().expect("json"));
    println!();

    // ── 4. Fallback when no prioritised anchor is present ───────────────────
    //
    // Only an anchor outside the priority list is reachable. Some trusted
    // path is still chosen, and the basis says it was a fallback.
    let mut unlisted = PathBundle::new();
    unlisted.push(UNLISTED, chain(UNLISTED));
    unlisted.push("https://zz.example.org", chain("https://zz.example.org"));
    let fallback = rp.pick_metadata(&unlisted).expect("fallback selection");
    println!("Fallback selection");
    println!("  Anchor: {}", fallback.anchor);
    println!("  Basis:  {:?}", fallback.basis);
}
