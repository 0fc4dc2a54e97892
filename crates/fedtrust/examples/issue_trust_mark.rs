//! Issue Trust Mark — configure an issuer, issue a mark, verify it as a
//! relying party, and move the issuance record between stores.
//!
//! Run with:
//!   cargo run --example issue_trust_mark -p fedtrust

use fedtrust::{
    Claims, FederationEntity, FederationEntityConfig, KeyJar, StaticCollector,
    TrustMarkIssuerConfig,
};

const TMI: &str = "https://tmi.example.org";
const RP: &str = "https://rp.example.org";
const SIRTFI: &str = "https://refeds.org/sirtfi";

fn main() {
    // ── 1. Configure a trust mark issuer ────────────────────────────────────
    //
    // Each trust mark id has a claim template. A `lifetime` in the template
    // becomes the `exp` of every mark issued from it.
    let issuer_config: TrustMarkIssuerConfig = serde_json::from_value(serde_json::json!({
        "trust_mark_specification": {
            SIRTFI: { "ref": "https://refeds.org/sirtfi", "lifetime": 2_592_000 }
        },
        "trust_mark_db": { "backend": "memory" }
    }))
    .expect("issuer configuration should parse");

    let mut config = FederationEntityConfig::new(TMI);
    config.trust_mark_issuer = Some(issuer_config);

    let tmi = FederationEntity::new(
        config,
        KeyJar::with_generated_key(TMI),
        Box::new(StaticCollector::new()),
    )
    .expect("issuer entity should build");
    let mut issuer = tmi.trust_mark_issuer().expect("issuer section is configured");

    println!("Trust mark issuer {}", tmi.entity_id());
    for id in issuer.trust_mark_ids() {
        println!("  {id} (lifetime {:?}s)", issuer.lifetime(&id));
    }
    println!();

    // ── 2. Issue a trust mark ───────────────────────────────────────────────
    //
    // The mark is recorded in the attestation store, then signed.
    let token = issuer
        .create_trust_mark(SIRTFI, RP, Claims::new().with("level", "full"))
        .expect("issuance should succeed");
    println!("Issued {SIRTFI} to {RP}");
    println!("  Token: {}...", &token[..48.min(token.len())]);
    println!(
        "  Recorded: {}",
        issuer.find(SIRTFI, RP, None).expect("store lookup")
    );
    println!();

    // ── 3. Verify as a relying party ────────────────────────────────────────
    //
    // The relying party trusts the issuer as an anchor, so the issuer's
    // public keys are in its key jar.
    let mut rp_config = FederationEntityConfig::new(RP);
    rp_config
        .trust_anchors
        .insert(TMI.to_string(), tmi.keyjar().export_jwks(TMI));
    rp_config.trust_mark_issuer = Some(TrustMarkIssuerConfig::default());
    let rp = FederationEntity::new(
        rp_config,
        KeyJar::with_generated_key(RP),
        Box::new(StaticCollector::new()),
    )
    .expect("relying party should build");

    let mark = rp
        .trust_mark_issuer()
        .expect("verifier")
        .unpack_trust_mark(&token, Some(TMI))
        .expect("trust mark should verify");
    println!("Relying party verified the mark");
    println!("  id:    {}", mark.id);
    println!("  sub:   {}", mark.sub);
    println!("  iat:   {}", fedtrust::time::secs_to_rfc3339(mark.iat));
    if let Some(exp) = mark.exp {
        println!("  exp:   {}", fedtrust::time::secs_to_rfc3339(exp));
    }
    println!("  level: {:?}", mark.extra.get_str("level"));
    println!();

    // ── 4. Dump the issuance record ─────────────────────────────────────────
    let dump = issuer.dump_trust_marks().expect("dump");
    println!("Store snapshot: {dump}");
}
