//! Tessera command-line interface
//!
//! Publisher and operator tooling for the bundle registry: key generation,
//! manifest signing and checks, and offline resolution over a local catalog.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tessera_cli::handlers::{keys, manifest, resolve};
use tessera_core::RegistryConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Tessera - signed bundle registry tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Registry config file (TOML); TESSERA_* variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an Ed25519 signing key
    Keygen {
        /// Write the hex secret here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sign a manifest
    Sign {
        /// Manifest JSON file
        manifest: PathBuf,

        /// Hex secret key file
        #[arg(short, long)]
        key: PathBuf,

        /// Value recorded in `signature.signed_at`
        #[arg(long)]
        signed_at: Option<String>,

        /// Write the signed manifest here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify a manifest signature
    Verify {
        /// Manifest JSON file
        manifest: PathBuf,
    },

    /// Validate a manifest against the schema
    Validate {
        /// Manifest JSON file
        manifest: PathBuf,
    },

    /// Print the canonical signing payload of a manifest
    Canonicalize {
        /// Manifest JSON file
        manifest: PathBuf,

        /// Print the sha256 digest instead of the bytes
        #[arg(long)]
        digest: bool,
    },

    /// Resolve an install plan from a local catalog
    Resolve {
        /// Directory of manifest files, or a JSON file holding an array
        #[arg(long)]
        catalog: PathBuf,

        /// Root package as id@version
        #[arg(long)]
        root: String,

        /// Already installed package as id@version (repeatable)
        #[arg(long)]
        installed: Vec<String>,

        /// Override the configured depth bound
        #[arg(long)]
        max_depth: Option<usize>,

        /// Accept unsigned manifests
        #[arg(long)]
        allow_unsigned: bool,

        /// Skip signature checks
        #[arg(long)]
        skip_signatures: bool,

        /// Fail when a required interface is not provided
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let output = match cli.command {
        Commands::Keygen { output } => keys::keygen(output.as_deref())?,
        Commands::Sign {
            manifest: path,
            key,
            signed_at,
            output,
        } => manifest::sign_file(&path, &key, signed_at, output.as_deref())?,
        Commands::Verify { manifest: path } => manifest::verify_file(&path)?,
        Commands::Validate { manifest: path } => manifest::validate_file(&path)?,
        Commands::Canonicalize {
            manifest: path,
            digest,
        } => manifest::canonicalize_file(&path, digest)?,
        Commands::Resolve {
            catalog,
            root,
            installed,
            max_depth,
            allow_unsigned,
            skip_signatures,
            strict,
        } => {
            let config = RegistryConfig::load(cli.config.as_deref())
                .context("failed to load registry config")?;
            let args = resolve::ResolveArgs {
                root,
                installed,
                max_depth,
                allow_unsigned,
                skip_signatures,
                strict,
            };
            resolve::resolve_catalog(&catalog, &args, &config)?
        }
    };

    println!("{output}");
    Ok(())
}
