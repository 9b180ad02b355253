use anyhow::Result;
use chrono::{DateTime, Utc};
use cupid_types::models::Photo;
use tracing::{info, warn};

use crate::state::AppStateInner;
use crate::storage::relative_path_for;

#[derive(Debug, Default)]
pub struct SweepReport {
    /// Proposals removed, from the database and the fallback store.
    pub cleaned: usize,
    pub files_deleted: usize,
    /// What could not be cleaned, as `(slug or file path, error)`.
    pub failures: Vec<(String, String)>,
}

impl SweepReport {
    fn fail(&mut self, item: &str, error: impl std::fmt::Display) {
        warn!("Sweep could not clean {}: {}", item, error);
        self.failures.push((item.to_string(), error.to_string()));
    }
}

/// Remove expired non-premium proposals along with their responses and files.
///
/// Everything past listing is best-effort: a proposal whose files or
/// response lookups fail is reported and the sweep carries on. Database
/// records go in one transaction at the end, so a repeat sweep picks up
/// anything left behind. Definitions that only live in the fallback store
/// are swept the same way.
pub async fn sweep_expired(state: &AppStateInner, now: DateTime<Utc>) -> Result<SweepReport> {
    let expired = {
        let db = state.db.clone();
        tokio::task::spawn_blocking(move || db.list_expired(&now)).await??
    };

    let mut report = SweepReport::default();

    for row in &expired {
        let urls = match serde_json::from_str::<Vec<Photo>>(&row.photos) {
            Ok(photos) => remote_urls(&photos),
            Err(e) => {
                report.fail(&row.slug, format!("unreadable photos: {}", e));
                Vec::new()
            }
        };
        remove_files(state, &row.slug, urls, &mut report).await;
    }

    if !expired.is_empty() {
        let db = state.db.clone();
        report.cleaned = tokio::task::spawn_blocking(move || db.delete_expired(&now)).await??;
    }

    match state.fallback.list_expired(now).await {
        Ok(definitions) => {
            for definition in definitions {
                let slug = definition.slug.as_str();
                remove_files(state, slug, remote_urls(&definition.photos), &mut report).await;

                let db = state.db.clone();
                let target = slug.to_string();
                match tokio::task::spawn_blocking(move || db.delete_responses(&target)).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => {
                        report.fail(slug, e);
                        continue;
                    }
                    Err(e) => {
                        report.fail(slug, e);
                        continue;
                    }
                }

                match state.fallback.remove(slug).await {
                    Ok(()) => report.cleaned += 1,
                    Err(e) => report.fail(slug, e),
                }
            }
        }
        Err(e) => report.fail("fallback store", e),
    }

    if report.cleaned > 0 || !report.failures.is_empty() {
        info!(
            "Sweep removed {} proposals and {} files ({} failures)",
            report.cleaned,
            report.files_deleted,
            report.failures.len()
        );
    }
    Ok(report)
}

fn remote_urls(photos: &[Photo]) -> Vec<String> {
    photos
        .iter()
        .filter_map(|p| p.source.remote_url().map(str::to_string))
        .collect()
}

/// Delete a proposal's own photos plus every photo attached to its responses.
async fn remove_files(state: &AppStateInner, slug: &str, mut urls: Vec<String>, report: &mut SweepReport) {
    let db = state.db.clone();
    let target = slug.to_string();
    match tokio::task::spawn_blocking(move || db.response_photo_urls(&target)).await {
        Ok(Ok(more)) => urls.extend(more),
        Ok(Err(e)) => report.fail(slug, format!("response photos: {:#}", e)),
        Err(e) => report.fail(slug, format!("response photos: {}", e)),
    }

    let public_url = state.settings.public_url.as_str();
    for url in &urls {
        let Some(path) = relative_path_for(public_url, url) else {
            warn!("Skipping foreign photo URL {}", url);
            continue;
        };
        match state.storage.delete_file(path).await {
            Ok(()) => report.files_deleted += 1,
            Err(e) => report.fail(path, e),
        }
    }
}
