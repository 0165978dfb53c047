//! uefi-sigdb CLI: the `sigdb` command.
//!
//! Provides a command-line interface for inspecting and editing the
//! Secure-Boot signature databases kept by the signature store.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use uefi_sigdb::digest::{can_digest, digest_content, validate_content, DIGEST_FORMATS};
use uefi_sigdb::{
    Guid, NewSignature, SignatureDatabase, SignatureFormat, SignatureRecord, SignatureStore,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_root() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set; pass --root")?;
    Ok(PathBuf::from(home).join(".sigdb"))
}

fn open_store(root: Option<&Path>, database: SignatureDatabase) -> Result<SignatureStore> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => default_root()?,
    };
    let path = database.install_path(&root);
    SignatureStore::open(&path)
        .with_context(|| format!("failed to open {database} store at {}", path.display()))
}

// ── Argument parsers ──────────────────────────────────────────────────────────

fn parse_format(s: &str) -> Result<SignatureFormat> {
    s.parse().map_err(|e| anyhow!("{e}"))
}

fn parse_owner(s: &str) -> Result<Guid> {
    s.parse().map_err(|e| anyhow!("{e}"))
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// sigdb: manage UEFI Secure-Boot signature databases.
#[derive(Parser, Debug)]
#[command(
    name = "sigdb",
    about = "UEFI Secure-Boot signature database CLI",
    version,
    long_about = "sigdb: UEFI Secure-Boot signature database CLI\n\nAdd, list, update, and delete the signature entries (hashes, certificates,\nkeys) kept for each Secure-Boot database."
)]
struct Cli {
    /// Root directory holding one sub-directory per database (default: ~/.sigdb)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Database to operate on (pk, kek, db, dbx, dbt, dbr)
    #[arg(long, global = true, default_value = "db")]
    db: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a signature entry
    Add {
        /// Signature content (hex digest or certificate blob)
        #[arg(long)]
        content: String,

        /// Signature format (e.g. sha256, x509, EFI_CERT_SHA256_GUID)
        #[arg(long, default_value = "unspecified")]
        format: String,

        /// Owner GUID
        #[arg(long)]
        owner: Option<String>,
    },

    /// Hash a file and add the digest as a signature entry
    AddDigest {
        /// File to hash
        #[arg(long)]
        file: PathBuf,

        /// Hash format (sha224, sha256, sha384, sha512)
        #[arg(long, default_value = "sha256")]
        format: String,

        /// Owner GUID
        #[arg(long)]
        owner: Option<String>,
    },

    /// List signature entries
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one signature entry
    Show {
        /// Signature id
        id: u64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update fields of a signature entry
    Set {
        /// Signature id
        id: u64,

        /// New content
        #[arg(long)]
        content: Option<String>,

        /// New format
        #[arg(long)]
        format: Option<String>,

        /// New owner GUID
        #[arg(long)]
        owner: Option<String>,
    },

    /// Delete a signature entry
    Delete {
        /// Signature id
        id: u64,
    },

    /// Delete every signature entry of the database
    DeleteAll,

    /// List the known signature formats
    Formats,
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = match cli.command {
        Commands::Formats => cmd_formats(verbose),
        command => cli
            .db
            .parse::<SignatureDatabase>()
            .map_err(|e| anyhow!("{e}"))
            .and_then(|database| run(command, cli.root.as_deref(), database, verbose)),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(
    command: Commands,
    root: Option<&Path>,
    database: SignatureDatabase,
    verbose: bool,
) -> Result<()> {
    let mut store = open_store(root, database)?;

    if verbose {
        let summary = store.restore_summary();
        eprintln!(
            "{database}: restored {} signature(s), {} unreadable",
            summary.restored,
            summary.failed.len()
        );
    }

    match command {
        Commands::Add {
            content,
            format,
            owner,
        } => cmd_add(&mut store, content, &format, owner.as_deref()),
        Commands::AddDigest {
            file,
            format,
            owner,
        } => cmd_add_digest(&mut store, &file, &format, owner.as_deref()),
        Commands::List { json } => cmd_list(&store, json, verbose),
        Commands::Show { id, json } => cmd_show(&store, id, json),
        Commands::Set {
            id,
            content,
            format,
            owner,
        } => cmd_set(
            &mut store,
            id,
            content,
            format.as_deref(),
            owner.as_deref(),
        ),
        Commands::Delete { id } => cmd_delete(&mut store, id),
        Commands::DeleteAll => cmd_delete_all(&mut store, database),
        Commands::Formats => cmd_formats(verbose),
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `sigdb add --content C [--format F] [--owner G]`
fn cmd_add(
    store: &mut SignatureStore,
    content: String,
    format: &str,
    owner: Option<&str>,
) -> Result<()> {
    let format = parse_format(format)?;
    validate_content(format, &content)?;

    let mut init = NewSignature::new(content).format(format);
    if let Some(owner) = owner {
        init = init.owner(parse_owner(owner)?);
    }

    let id = store.add_signature(init).context("failed to add signature")?;
    println!("Added signature {id}");
    Ok(())
}

/// `sigdb add-digest --file PATH [--format F] [--owner G]`
fn cmd_add_digest(
    store: &mut SignatureStore,
    file: &Path,
    format: &str,
    owner: Option<&str>,
) -> Result<()> {
    let format = parse_format(format)?;
    if !can_digest(format) {
        let supported: Vec<&str> = DIGEST_FORMATS.iter().map(|f| f.as_tag()).collect();
        return Err(anyhow!(
            "add-digest cannot compute {format}; supported: {}",
            supported.join(", ")
        ));
    }
    let data = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let content = digest_content(format, &data)?;

    let mut init = NewSignature::new(content.clone()).format(format);
    if let Some(owner) = owner {
        init = init.owner(parse_owner(owner)?);
    }

    let id = store.add_signature(init).context("failed to add signature")?;
    println!("Added signature {id}");
    println!("  Format:  {format}");
    println!("  Content: {content}");
    Ok(())
}

/// `sigdb list [--json]`
fn cmd_list(store: &SignatureStore, json: bool, verbose: bool) -> Result<()> {
    let mut views = store.views();
    views.sort_by_key(|v| v.id);

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if views.is_empty() {
        println!("No signatures.");
        return Ok(());
    }

    for view in &views {
        println!("{:>4}  {:<30}  {}", view.id, view.format, abbreviate(&view.content));
        if verbose && !view.owner.is_nil() {
            println!("      owner {}", view.owner);
        }
    }
    println!("{} signature(s)", views.len());
    Ok(())
}

/// `sigdb show ID [--json]`
fn cmd_show(store: &SignatureStore, id: u64, json: bool) -> Result<()> {
    let record = find(store, id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record.view())?);
        return Ok(());
    }

    println!("Signature {id}");
    println!("  Format:  {}", record.format());
    if let Some(guid) = record.format().type_guid() {
        println!("  Type:    {guid}");
    }
    println!("  Owner:   {}", record.owner());
    println!("  Content: {}", record.content());
    Ok(())
}

/// `sigdb set ID [--content C] [--format F] [--owner G]`
fn cmd_set(
    store: &mut SignatureStore,
    id: u64,
    content: Option<String>,
    format: Option<&str>,
    owner: Option<&str>,
) -> Result<()> {
    if content.is_none() && format.is_none() && owner.is_none() {
        return Err(anyhow!("nothing to update; pass --content, --format, or --owner"));
    }

    let format = format.map(parse_format).transpose()?;
    let owner = owner.map(parse_owner).transpose()?;

    if let Some(ref content) = content {
        if content.is_empty() {
            return Err(anyhow!("content must not be empty"));
        }
        if !store.is_unique(content) && !find(store, id)?.matches_content(content) {
            return Err(anyhow!("another signature already holds this content"));
        }
    }

    let record = store
        .get_mut(id)
        .ok_or_else(|| anyhow!("signature {id} not found"))?;

    if let Some(content) = content {
        let previous = record.set_content(content).context("failed to update content")?;
        log::info!("updated signature content; id={id} previous={previous}");
    }
    if let Some(format) = format {
        let previous = record.set_format(format).context("failed to update format")?;
        log::info!("updated signature format; id={id} previous={previous}");
    }
    if let Some(owner) = owner {
        let previous = record.set_owner(owner).context("failed to update owner")?;
        log::info!("updated signature owner; id={id} previous={previous}");
    }

    println!("Updated signature {id}");
    Ok(())
}

/// `sigdb delete ID`
fn cmd_delete(store: &mut SignatureStore, id: u64) -> Result<()> {
    find(store, id)?;
    store.delete(id).context("failed to delete signature")?;
    println!("Deleted signature {id}");
    Ok(())
}

/// `sigdb delete-all`
fn cmd_delete_all(store: &mut SignatureStore, database: SignatureDatabase) -> Result<()> {
    let count = store.len();
    store
        .delete_all()
        .context("failed to delete signatures")?;
    println!("Deleted {count} signature(s) from {database}");
    Ok(())
}

/// `sigdb formats`
fn cmd_formats(verbose: bool) -> Result<()> {
    for format in SignatureFormat::ALL {
        match (format.type_guid(), verbose) {
            (Some(guid), true) => println!("{:<30}  {guid}", format.as_tag()),
            _ => println!("{}", format.as_tag()),
        }
    }
    Ok(())
}

// ── Output helpers ────────────────────────────────────────────────────────────

fn find(store: &SignatureStore, id: u64) -> Result<&SignatureRecord> {
    store
        .get(id)
        .ok_or_else(|| anyhow!("signature {id} not found"))
}

/// Shorten long content (certificates) for tabular output.
fn abbreviate(content: &str) -> String {
    const MAX: usize = 64;
    if content.chars().count() <= MAX {
        return content.to_string();
    }
    let head: String = content.chars().take(MAX - 3).collect();
    format!("{head}...")
}
