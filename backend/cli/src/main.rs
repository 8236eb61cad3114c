mod config;
mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tokio::fs;
use tokio::sync::watch;
use tracing::info;

use blockwarden_config::{
    apply_merge_patch, default_config, detect_version, export_string, import_with_metadata,
    import_with_report, load_settings, migrate, write_settings, Config, ImportError, Imported,
    StaticFilterMetadata,
};
use blockwarden_logging::init_logger;
use blockwarden_scheduler::UpdateScheduler;

use config::CliConfig;
use sync::SettingsSync;

#[derive(Parser)]
#[command(name = "blockwarden")]
#[command(about = "Blockwarden: import, export and validate ad blocker settings")]
#[command(version)]
struct Cli {
    /// Settings directory (overrides BLOCKWARDEN_SETTINGS_DIR)
    #[arg(long, global = true)]
    settings_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a settings file into the store
    Import {
        file: PathBuf,
        /// Validate and report without writing the store
        #[arg(long)]
        dry_run: bool,
        /// Filter metadata JSON (`{"filters": [..], "groups": [..]}`) to check IDs against
        #[arg(long)]
        metadata: Option<PathBuf>,
    },
    /// Export the stored settings
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a settings file without importing it
    Validate {
        file: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a settings file migrated to the current protocol version
    Migrate { file: PathBuf },
    /// Change stored settings with a JSON merge patch (RFC 7396)
    Patch {
        /// Inline patch, e.g. '{"stealth": {"stealth-block-webrtc": true}}'
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        patch: Option<String>,
        /// Read the patch from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Print the built-in default settings
    Defaults,
    /// Periodically re-import a settings file into the store
    Watch {
        source: PathBuf,
        /// Force one update shortly after start
        #[arg(long)]
        first_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::from_env().with_settings_dir(cli.settings_dir.as_deref());

    init_logger(&config.log_level, config.log_dir.as_deref());

    match cli.command {
        Commands::Import { file, dry_run, metadata } => {
            run_import(&file, dry_run, metadata.as_deref(), &config.settings_path()).await?;
        }
        Commands::Export { output } => {
            let settings = load_settings(&config.settings_path()).await?;
            let text = export_string(&settings);
            match output {
                Some(path) => {
                    fs::write(&path, text.as_bytes())
                        .await
                        .with_context(|| format!("Failed to write export: {}", path.display()))?;
                    info!(path = %path.display(), "Exported settings");
                }
                None => println!("{text}"),
            }
        }
        Commands::Validate { file, json } => {
            let raw = read_document(&file).await?;
            run_validate(&raw, json)?;
        }
        Commands::Migrate { file } => {
            let raw = read_document(&file).await?;
            let version = detect_version(&raw)?;
            let migrated = migrate(raw, version)?;
            println!("{migrated:#}");
        }
        Commands::Patch { patch, file } => {
            let patch = match (patch, file) {
                (Some(text), _) => {
                    serde_json::from_str(&text).context("Failed to parse patch JSON")?
                }
                (None, Some(path)) => read_document(&path).await?,
                (None, None) => bail!("a patch or --file is required"),
            };
            run_patch(&patch, &config.settings_path()).await?;
        }
        Commands::Defaults => {
            println!("{}", export_string(&default_config()));
        }
        Commands::Watch { source, first_run } => {
            run_watch(source, first_run, &config).await?;
        }
    }

    Ok(())
}

async fn read_document(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse settings JSON at: {}", path.display()))
}

async fn run_import(
    file: &Path,
    dry_run: bool,
    metadata: Option<&Path>,
    store: &Path,
) -> Result<()> {
    let raw = read_document(file).await?;
    let result = match metadata {
        Some(path) => {
            let text = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read filter metadata: {}", path.display()))?;
            let source: StaticFilterMetadata = serde_json::from_str(&text).with_context(|| {
                format!("Failed to parse filter metadata at: {}", path.display())
            })?;
            import_with_metadata(&raw, &source)
        }
        None => import_with_report(&raw),
    };
    let imported = print_outcome(result)?;

    if dry_run {
        info!(file = %file.display(), "Dry run; settings store left untouched");
        return Ok(());
    }
    write_settings(&imported.config, store).await
}

/// Apply `patch` to the stored settings. The store is only rewritten when the
/// patched document imports cleanly.
async fn run_patch(patch: &Value, store: &Path) -> Result<Config> {
    let current = load_settings(store).await?;
    let patched = apply_merge_patch(&current, patch)?;
    write_settings(&patched, store).await?;
    info!(path = %store.display(), "Patched settings");
    Ok(patched)
}

fn print_outcome(result: Result<Imported, ImportError>) -> Result<Imported> {
    match result {
        Ok(imported) => {
            for warning in &imported.warnings {
                eprintln!("warning: {warning}");
            }
            if let Some(from) = imported.migrated_from {
                eprintln!("migrated from protocol version {from}");
            }
            Ok(imported)
        }
        Err(err) => {
            for error in err.errors() {
                eprintln!("error: {error}");
            }
            Err(err.into())
        }
    }
}

fn run_validate(raw: &Value, as_json: bool) -> Result<()> {
    let result = import_with_report(raw);
    if !as_json {
        print_outcome(result)?;
        println!("settings are valid");
        return Ok(());
    }

    let (report, valid) = match &result {
        Ok(imported) => (
            json!({
                "valid": true,
                "migrated_from": imported.migrated_from.map(|v| v.to_string()),
                "warnings": serde_json::to_value(&imported.warnings)?,
            }),
            true,
        ),
        Err(err) => (
            json!({
                "valid": false,
                "errors": serde_json::to_value(err.errors())?,
            }),
            false,
        ),
    };
    println!("{report:#}");
    if !valid {
        bail!("settings are invalid");
    }
    Ok(())
}

async fn run_watch(source: PathBuf, first_run: bool, config: &CliConfig) -> Result<()> {
    let task = Arc::new(SettingsSync::new(source, config.settings_path()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = UpdateScheduler::new(task)
        .with_init_delay(config.init_delay)
        .with_check_period(config.check_period)
        .spawn(first_run, shutdown_rx);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Received shutdown signal");
    let _ = shutdown_tx.send(true);
    handle.await.context("Update scheduler task failed")?;
    Ok(())
}
