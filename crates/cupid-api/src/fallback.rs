use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use cupid_flow::gateway::FallbackStore;
use cupid_flow::slug::is_valid_slug;
use cupid_types::models::ProposalDefinition;
use tokio::fs;
use tracing::{info, warn};

/// Proposal definitions kept as `proposal-{slug}.json` files.
///
/// Only written when the database refused a new proposal.
pub struct JsonFallback {
    dir: PathBuf,
}

impl JsonFallback {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Fallback proposal directory: {}", dir.display());
        Ok(Self { dir })
    }

    fn path_for(&self, slug: &str) -> Result<PathBuf> {
        if !is_valid_slug(slug) {
            bail!("invalid slug '{}'", slug);
        }
        Ok(self.dir.join(format!("proposal-{}.json", slug)))
    }

    /// Stored definitions past their retention deadline. Files that cannot
    /// be parsed are logged and skipped.
    pub async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<ProposalDefinition>> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut expired = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !(name.starts_with("proposal-") && name.ends_with(".json")) {
                continue;
            }
            let raw = match fs::read_to_string(entry.path()).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Could not read fallback file {}: {}", name, e);
                    continue;
                }
            };
            match serde_json::from_str::<ProposalDefinition>(&raw) {
                Ok(definition) if definition.is_expired(now) => expired.push(definition),
                Ok(_) => {}
                Err(e) => warn!("Unreadable fallback file {}: {}", name, e),
            }
        }
        Ok(expired)
    }

    /// Delete a stored definition. A missing file is not an error.
    pub async fn remove(&self, slug: &str) -> Result<()> {
        let path = self.path_for(slug)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Removed proposal {} from fallback store", slug);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl FallbackStore for JsonFallback {
    async fn read(&self, slug: &str) -> Result<Option<ProposalDefinition>> {
        let path = self.path_for(slug)?;
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn write(&self, definition: &ProposalDefinition) -> Result<()> {
        let path = self.path_for(&definition.slug)?;
        let json = serde_json::to_string_pretty(definition)?;
        fs::write(&path, json).await?;
        info!("Saved proposal {} to fallback store", definition.slug);
        Ok(())
    }
}
