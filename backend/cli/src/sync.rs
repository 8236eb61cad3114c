//! Scheduled re-import of a settings source into the store.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use blockwarden_config::{import_str, load_settings, write_settings};
use blockwarden_scheduler::{is_update_due, UpdateTask};
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, info, warn};

/// Re-imports `source` into `store` whenever the stored
/// `filters-update-period` says an update is due.
pub struct SettingsSync {
    source: PathBuf,
    store: PathBuf,
    last_sync: Mutex<Option<DateTime<Utc>>>,
}

impl SettingsSync {
    pub fn new(source: PathBuf, store: PathBuf) -> Self {
        Self { source, store, last_sync: Mutex::new(None) }
    }

    fn last_sync(&self) -> Option<DateTime<Utc>> {
        match self.last_sync.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn mark_synced(&self, at: DateTime<Utc>) {
        match self.last_sync.lock() {
            Ok(mut guard) => *guard = Some(at),
            Err(poisoned) => *poisoned.into_inner() = Some(at),
        }
    }

    async fn sync_at(&self, forced: bool, now: DateTime<Utc>) -> Result<()> {
        let stored = load_settings(&self.store).await?;
        let period = stored.general_settings.filters_update_period;
        if !forced && !is_update_due(period, self.last_sync(), now) {
            debug!(?period, "Settings update not due");
            return Ok(());
        }

        let text = fs::read_to_string(&self.source).await.with_context(|| {
            format!("Failed to read settings source: {}", self.source.display())
        })?;
        let imported = import_str(&text)
            .with_context(|| format!("Rejected settings source: {}", self.source.display()))?;
        for warning in &imported.warnings {
            warn!(path = %warning.path, "Settings source contains an unknown field");
        }

        if !forced && stored == imported.config {
            info!(source = %self.source.display(), "Settings unchanged");
        } else {
            write_settings(&imported.config, &self.store).await?;
            info!(source = %self.source.display(), forced, "Synchronized settings");
        }
        self.mark_synced(now);
        Ok(())
    }
}

#[async_trait]
impl UpdateTask for SettingsSync {
    async fn run(&self, forced: bool) -> Result<()> {
        self.sync_at(forced, Utc::now()).await
    }
}
