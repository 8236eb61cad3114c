//! Settings file read/write with atomic backup rotation.

use crate::defaults::default_config;
use crate::export::{export, export_string};
use crate::import::{import, import_str};
use crate::schema::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Settings file name within the settings directory.
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Number of rolling backups to keep.
const MAX_BACKUPS: usize = 5;

/// Resolve the settings directory.
/// Priority: `BLOCKWARDEN_SETTINGS_DIR` env > `~/.blockwarden/`
pub fn settings_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BLOCKWARDEN_SETTINGS_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".blockwarden"),
        None => PathBuf::from(".blockwarden"),
    }
}

/// Resolve the full path to the settings file.
pub fn settings_file_path(settings_dir: &Path) -> PathBuf {
    settings_dir.join(SETTINGS_FILE_NAME)
}

/// Load and import the stored settings.
///
/// Returns the default config if the file doesn't exist (first run).
pub async fn load_settings(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!(path = %path.display(), "Settings file does not exist; using defaults");
        return Ok(default_config());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    let imported = import_str(&raw)
        .with_context(|| format!("Failed to import settings at: {}", path.display()))?;
    for warning in &imported.warnings {
        warn!(path = %warning.path, "Stored settings contain an unknown field");
    }

    info!(path = %path.display(), "Loaded settings");
    Ok(imported.config)
}

/// Write settings to disk atomically (write to temp file, rename).
///
/// Creates a rolling backup of the previous file before overwriting.
pub async fn write_settings(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create settings directory: {}", parent.display())
        })?;
    }

    if path.exists() {
        rotate_backups(path).await?;
    }

    let json = export_string(config);

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp settings: {}", tmp_path.display()))?;

    fs::rename(&tmp_path, path).await.with_context(|| {
        format!("Failed to rename temp settings to: {}", path.display())
    })?;

    info!(path = %path.display(), "Wrote settings");
    Ok(())
}

/// Rotate backup files: settings.json.bak.1 → .bak.2 → ... → .bak.N
async fn rotate_backups(path: &Path) -> Result<()> {
    for i in (1..MAX_BACKUPS).rev() {
        let old = path.with_extension(format!("json.bak.{}", i));
        let new = path.with_extension(format!("json.bak.{}", i + 1));
        if old.exists() {
            if let Err(e) = fs::rename(&old, &new).await {
                warn!("Failed to rotate backup {}: {}", old.display(), e);
            }
        }
    }

    let bak = path.with_extension("json.bak.1");
    if let Err(e) = fs::copy(path, &bak).await {
        warn!("Failed to create backup {}: {}", bak.display(), e);
    }

    Ok(())
}

/// Patch settings with a JSON Merge Patch (RFC 7396).
///
/// The patch is applied to the exported document, which is then imported
/// again, so a patch can never yield an invalid config.
pub fn apply_merge_patch(config: &Config, patch: &Value) -> Result<Config> {
    let mut doc = export(config);
    json_merge_patch(&mut doc, patch);
    let updated = import(&doc).context("Settings are invalid after merge patch")?;
    Ok(updated)
}

/// RFC 7396 JSON Merge Patch algorithm.
fn json_merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Default::default());
    }
    if let Value::Object(target_map) = target {
        for (key, patch_val) in patch_map {
            if patch_val.is_null() {
                target_map.remove(key);
            } else {
                let entry = target_map.entry(key.clone()).or_insert(Value::Null);
                json_merge_patch(entry, patch_val);
            }
        }
    }
}
