//! fedtrust CLI — `fedtrust` command.
//!
//! Provides a command-line interface for federation entities: key
//! generation, trust mark issuance and verification, entity statements,
//! and trust path resolution against pre-collected chains.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use fedtrust::storage::save_private_jwks;
use fedtrust::time::secs_to_rfc3339;
use fedtrust::{Claims, FederationEntity, KeyJar, SelectionBasis, StaticCollector};

// ── Parsing helpers ───────────────────────────────────────────────────────────

/// Parse a duration string like "24h", "7d", "1h30m", or plain seconds.
/// Returns the duration in seconds.
fn parse_duration_secs(s: &str) -> Result<u64> {
    let s = s.trim();

    if let Ok(n) = s.parse::<u64>() {
        if n == 0 {
            return Err(anyhow!("duration must be > 0"));
        }
        return Ok(n);
    }

    let mut total: u64 = 0;
    let mut current = String::new();

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            current.push(ch);
        } else {
            let val: u64 = current
                .parse()
                .map_err(|_| anyhow!("invalid duration: {s}"))?;
            current.clear();
            let unit = match ch {
                'd' => 86_400,
                'h' => 3_600,
                'm' => 60,
                's' => 1,
                _ => return Err(anyhow!("unknown duration unit '{ch}' in '{s}'")),
            };
            total = val
                .checked_mul(unit)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(|| anyhow!("duration '{s}' is too large"))?;
        }
    }

    if !current.is_empty() {
        return Err(anyhow!("duration '{s}' is missing a unit (d/h/m/s)"));
    }

    if total == 0 {
        return Err(anyhow!("duration must be > 0"));
    }

    Ok(total)
}

/// Parse an optional JSON object argument into claims.
fn parse_claims(json: Option<&str>, flag: &str) -> Result<Claims> {
    match json {
        Some(text) => {
            Claims::from_json(text).with_context(|| format!("{flag} must be a JSON object"))
        }
        None => Ok(Claims::new()),
    }
}

fn load_entity(config: &Path, collection: Option<&Path>) -> Result<FederationEntity> {
    let collector = match collection {
        Some(path) => StaticCollector::from_file(path)
            .with_context(|| format!("failed to load collected chains from {}", path.display()))?,
        None => StaticCollector::new(),
    };
    log::debug!("loading entity from {}", config.display());
    FederationEntity::from_config_file(config, Box::new(collector))
        .with_context(|| format!("failed to load entity from {}", config.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// fedtrust CLI — issue and verify trust marks, sign entity statements and
/// resolve trust paths for a federation entity.
#[derive(Parser, Debug)]
#[command(
    name = "fedtrust",
    about = "Federation trust CLI",
    version,
    long_about = "fedtrust — federation trust CLI\n\nIssue and verify trust marks, sign entity statements,\nand resolve trust paths for a federation entity."
)]
struct Cli {
    /// Entity configuration file
    #[arg(long, short, global = true, default_value = "fedtrust.json")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a signing key and write it as a private JWKS file
    Keygen {
        /// Output key file
        #[arg(long, short)]
        output: PathBuf,

        /// Overwrite an existing key file
        #[arg(long)]
        force: bool,
    },

    /// Print the entity's public key set
    Jwks,

    /// Issue, verify and look up trust marks
    Mark {
        #[command(subcommand)]
        subcommand: MarkCommands,
    },

    /// Sign an entity statement about a subject
    Statement {
        /// Subject entity id (default: this entity)
        #[arg(long)]
        sub: Option<String>,

        /// Metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,

        /// Statement lifetime, e.g. "24h", "7d" or seconds (default: from config)
        #[arg(long)]
        lifetime: Option<String>,
    },

    /// Select the governing trust path for a peer from collected chains
    Resolve {
        /// Peer entity id
        peer: String,

        /// JSON file of collected chains and statements
        #[arg(long)]
        collection: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum MarkCommands {
    /// Issue a configured trust mark to a subject
    Issue {
        /// Trust mark id
        #[arg(long)]
        id: String,

        /// Subject entity id
        #[arg(long)]
        sub: String,

        /// Extra claims as a JSON object
        #[arg(long)]
        claims: Option<String>,
    },

    /// Sign a trust mark about this entity itself
    SelfSigned {
        /// Claims as a JSON object (`sub` defaults to this entity)
        #[arg(long)]
        claims: Option<String>,
    },

    /// Verify a trust mark token
    Verify {
        /// Trust mark token
        token: String,

        /// Require the mark to be issued by this entity id
        #[arg(long)]
        issuer: Option<String>,
    },

    /// Check whether a trust mark was issued to a subject
    Find {
        /// Trust mark id
        #[arg(long)]
        id: String,

        /// Subject entity id
        #[arg(long)]
        sub: String,

        /// Only match a mark issued at exactly this time (epoch seconds, 0 matches any)
        #[arg(long)]
        iat: Option<i64>,
    },

    /// Write every issued trust mark as JSON
    Dump {
        /// Output file path (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Load trust marks written by `dump`
    Load {
        /// Dump file
        file: PathBuf,
    },
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;
    let config = cli.config;

    let result = match cli.command {
        Commands::Keygen { output, force } => cmd_keygen(&config, &output, force, verbose),
        Commands::Jwks => cmd_jwks(&config),
        Commands::Mark { subcommand } => match subcommand {
            MarkCommands::Issue { id, sub, claims } => {
                cmd_mark_issue(&config, &id, &sub, claims.as_deref(), verbose)
            }
            MarkCommands::SelfSigned { claims } => cmd_mark_self_signed(&config, claims.as_deref()),
            MarkCommands::Verify { token, issuer } => {
                cmd_mark_verify(&config, &token, issuer.as_deref(), verbose)
            }
            MarkCommands::Find { id, sub, iat } => cmd_mark_find(&config, &id, &sub, iat),
            MarkCommands::Dump { output } => cmd_mark_dump(&config, output.as_deref()),
            MarkCommands::Load { file } => cmd_mark_load(&config, &file),
        },
        Commands::Statement {
            sub,
            metadata,
            lifetime,
        } => cmd_statement(
            &config,
            sub.as_deref(),
            metadata.as_deref(),
            lifetime.as_deref(),
        ),
        Commands::Resolve { peer, collection } => cmd_resolve(&config, &peer, &collection, verbose),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `fedtrust keygen --output FILE [--force]`
///
/// The key file does not name its owner; the entity whose `key_file` it
/// is signs with it.
fn cmd_keygen(config: &Path, output: &Path, force: bool, verbose: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(anyhow!(
            "key file {} already exists (use --force to replace it)",
            output.display()
        ));
    }

    const OWNER: &str = "self";
    let jar = KeyJar::with_generated_key(OWNER);
    save_private_jwks(output, &jar.export_private_jwks(OWNER))
        .with_context(|| format!("failed to write key file {}", output.display()))?;

    let kid = jar
        .signing_key(OWNER)
        .map(|k| k.kid().to_string())
        .unwrap_or_default();
    println!("Created signing key {kid}");
    println!("  File: {}", output.display());
    if verbose {
        println!("  Reference it as \"key_file\" in {}", config.display());
    }
    Ok(())
}

/// `fedtrust jwks`
fn cmd_jwks(config: &Path) -> Result<()> {
    let entity = load_entity(config, None)?;
    print_json(&entity.keyjar().export_jwks(entity.entity_id()))
}

/// `fedtrust mark issue --id ID --sub SUB [--claims JSON]`
fn cmd_mark_issue(
    config: &Path,
    id: &str,
    sub: &str,
    claims: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let extra = parse_claims(claims, "--claims")?;
    let entity = load_entity(config, None)?;
    let mut issuer = entity.trust_mark_issuer()?;

    let token = issuer
        .create_trust_mark(id, sub, extra)
        .with_context(|| format!("failed to issue trust mark {id} to {sub}"))?;
    println!("{token}");

    if verbose {
        match issuer.lifetime(id) {
            Some(secs) => eprintln!("issued {id} to {sub}, valid for {secs}s"),
            None => eprintln!("issued {id} to {sub}, no expiry"),
        }
    }
    Ok(())
}

/// `fedtrust mark self-signed [--claims JSON]`
fn cmd_mark_self_signed(config: &Path, claims: Option<&str>) -> Result<()> {
    let claims = parse_claims(claims, "--claims")?;
    let entity = load_entity(config, None)?;
    let issuer = entity.trust_mark_issuer()?;
    let token = issuer
        .self_signed_trust_mark(claims)
        .context("failed to sign trust mark")?;
    println!("{token}");
    Ok(())
}

/// `fedtrust mark verify TOKEN [--issuer ID]`
fn cmd_mark_verify(config: &Path, token: &str, issuer: Option<&str>, verbose: bool) -> Result<()> {
    let entity = load_entity(config, None)?;
    let tmi = entity.trust_mark_issuer()?;
    let mark = tmi
        .unpack_trust_mark(token.trim(), issuer)
        .context("trust mark is not valid")?;

    println!("Trust mark: valid");
    println!("  ID:      {}", mark.id);
    println!("  Issuer:  {}", mark.iss);
    println!("  Subject: {}", mark.sub);
    println!("  Issued:  {}", secs_to_rfc3339(mark.iat));
    match mark.exp {
        Some(exp) => println!("  Expires: {}", secs_to_rfc3339(exp)),
        None => println!("  Expires: never"),
    }
    if verbose {
        print_json(&mark)?;
    }
    Ok(())
}

/// `fedtrust mark find --id ID --sub SUB [--iat SECS]`
///
/// Exits with status 1 when no matching mark was issued.
fn cmd_mark_find(config: &Path, id: &str, sub: &str, iat: Option<i64>) -> Result<()> {
    let entity = load_entity(config, None)?;
    let issuer = entity.trust_mark_issuer()?;
    if issuer.find(id, sub, iat)? {
        println!("found");
        Ok(())
    } else {
        Err(anyhow!("trust mark {id} has not been issued to {sub}"))
    }
}

/// `fedtrust mark dump [--output FILE]`
fn cmd_mark_dump(config: &Path, output: Option<&Path>) -> Result<()> {
    let entity = load_entity(config, None)?;
    let issuer = entity.trust_mark_issuer()?;
    let dump = issuer.dump_trust_marks()?;

    match output {
        Some(path) => {
            std::fs::write(path, &dump)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote trust marks to {}", path.display());
        }
        None => println!("{dump}"),
    }
    Ok(())
}

/// `fedtrust mark load FILE`
fn cmd_mark_load(config: &Path, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let entity = load_entity(config, None)?;
    let mut issuer = entity.trust_mark_issuer()?;
    issuer
        .load_trust_marks(&text)
        .with_context(|| format!("failed to load trust marks from {}", file.display()))?;
    println!("Loaded trust marks from {}", file.display());
    Ok(())
}

/// `fedtrust statement [--sub SUB] [--metadata JSON] [--lifetime DURATION]`
fn cmd_statement(
    config: &Path,
    sub: Option<&str>,
    metadata: Option<&str>,
    lifetime: Option<&str>,
) -> Result<()> {
    let metadata = parse_claims(metadata, "--metadata")?;
    let lifetime = lifetime
        .map(|s| parse_duration_secs(s).with_context(|| format!("invalid --lifetime value: '{s}'")))
        .transpose()?;

    let entity = load_entity(config, None)?;
    let subject = sub.unwrap_or(entity.entity_id()).to_string();
    let token = entity
        .issue_statement_about(&subject, metadata, lifetime, Claims::new())
        .with_context(|| format!("failed to sign statement about {subject}"))?;
    println!("{token}");
    Ok(())
}

/// `fedtrust resolve PEER --collection FILE`
fn cmd_resolve(config: &Path, peer: &str, collection: &Path, verbose: bool) -> Result<()> {
    let entity = load_entity(config, Some(collection))?;
    let selection = entity
        .resolve(peer)
        .with_context(|| format!("failed to resolve {peer}"))?;

    if selection.basis == SelectionBasis::Fallback {
        eprintln!(
            "warning: no prioritised trust anchor reachable for {peer}; using {}",
            selection.anchor
        );
    }
    if verbose {
        eprintln!("trust anchor: {} ({:?})", selection.anchor, selection.basis);
    }
    print_json(&selection)
}
