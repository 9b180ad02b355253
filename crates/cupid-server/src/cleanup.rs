use std::time::Duration;

use chrono::Utc;
use cupid_api::state::AppState;
use cupid_api::sweeper::sweep_expired;
use tracing::{debug, warn};

/// Background task: retention sweep plus idle-session pruning.
pub async fn run_sweep_loop(state: AppState, interval_secs: u64, session_ttl: Duration) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        interval.tick().await;

        match sweep_expired(&state, Utc::now()).await {
            Ok(report) => {
                if !report.failures.is_empty() {
                    debug!("Cleanup left {} items for the next pass", report.failures.len());
                }
            }
            Err(e) => {
                warn!("Cleanup error: {:#}", e);
            }
        }

        let pruned = state.sessions.prune_idle(session_ttl).await;
        if pruned > 0 {
            debug!("Pruned {} idle sessions", pruned);
        }
    }
}
