//! declsurface CLI - thin driver over the composition core.
//!
//! All file I/O lives here: reading the manifest and fragment files,
//! writing one artifact per version. The merge/validate/emit pipeline
//! itself never touches the filesystem.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use declsurface::ops::{build_all, BuildOptions, ComposeError};
use declsurface::util::diagnostic::{self, suggestions, Diagnostic};
use declsurface::SurfaceManifest;

#[derive(Parser)]
#[command(name = "declsurface", version, about = "Compose scripting-host declaration surfaces")]
struct Cli {
    /// Path to the surface manifest
    #[arg(long, default_value = "surface.toml")]
    manifest: PathBuf,

    /// Directory holding `<layer>.json` fragment files
    #[arg(long, default_value = "fragments")]
    fragments: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose, validate, and write artifacts for the selected versions
    Build {
        /// Output directory (artifacts land at `<out>/<host>/<version>/index.d.ts`)
        #[arg(long, default_value = "out")]
        out: PathBuf,

        /// Versions to build; default is every version in the manifest
        versions: Vec<String>,
    },
    /// Compose and validate without writing anything
    Check {
        /// Versions to check; default is every version in the manifest
        versions: Vec<String>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("declsurface=debug")
    } else {
        EnvFilter::new("declsurface=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let manifest = SurfaceManifest::load(&cli.manifest)
        .with_context(|| suggestions::BAD_MANIFEST.to_string())?;
    let fragments = load_fragment_files(&cli.fragments)?;

    match cli.command {
        Commands::Build { out, versions } => {
            let report = build_all(&manifest, &fragments, &BuildOptions { versions });
            for surface in &report.surfaces {
                let dir = out.join(&manifest.host).join(&surface.version);
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                let path = dir.join("index.d.ts");
                std::fs::write(&path, &surface.artifact)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!(
                    "{}: {} entities, {} members, {} free types, {} globals (sha256 {})",
                    surface.version,
                    surface.entities,
                    surface.members,
                    surface.free_types,
                    surface.globals,
                    &surface.checksum[..12]
                );
            }
            finish(report.failures)
        }
        Commands::Check { versions } => {
            let report = build_all(&manifest, &fragments, &BuildOptions { versions });
            for surface in &report.surfaces {
                println!("{}: ok (sha256 {})", surface.version, &surface.checksum[..12]);
            }
            finish(report.failures)
        }
    }
}

/// Collect `<layer>.json` files anywhere under the fragments directory.
/// The file stem is the layer id.
fn load_fragment_files(dir: &Path) -> Result<HashMap<String, String>> {
    let mut fragments = HashMap::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to scan {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        fragments.insert(stem.to_string(), text);
    }
    if fragments.is_empty() {
        anyhow::bail!(
            "no fragment files found under {}\n{}",
            dir.display(),
            suggestions::MISSING_LAYER
        );
    }
    Ok(fragments)
}

/// Print every failed version's diagnostics and set the exit status.
fn finish(failures: Vec<(String, ComposeError)>) -> Result<()> {
    if failures.is_empty() {
        return Ok(());
    }
    for (version, error) in &failures {
        match error {
            ComposeError::Invalid { issues, .. } => {
                let header = Diagnostic::error(format!(
                    "version `{}`: surface is invalid ({} issue(s))",
                    version,
                    issues.len()
                ))
                .with_suggestion(suggestions::INVALID_SURFACE);
                diagnostic::emit(&header, false);
                for issue in issues {
                    diagnostic::emit(&issue.to_diagnostic(), false);
                }
            }
            other => {
                diagnostic::emit(
                    &Diagnostic::error(format!("version `{}`: {}", version, other)),
                    false,
                );
            }
        }
    }
    anyhow::bail!("{} version build(s) failed", failures.len());
}
