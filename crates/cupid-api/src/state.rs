use std::sync::Arc;

use cupid_db::Database;

use crate::fallback::JsonFallback;
use crate::gateway::StoreGateway;
use crate::registry::SessionRegistry;
use crate::storage::Storage;

/// Values the handlers need from configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub public_url: String,
    pub retention_days: i64,
    /// When set, maintenance routes require `Authorization: Bearer <token>`.
    pub admin_token: Option<String>,
    pub max_upload_bytes: usize,
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub storage: Arc<Storage>,
    pub gateway: StoreGateway,
    pub fallback: JsonFallback,
    pub sessions: SessionRegistry,
    pub settings: Settings,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, storage: Arc<Storage>, fallback: JsonFallback, settings: Settings) -> Self {
        let gateway = StoreGateway::new(db.clone(), storage.clone(), settings.public_url.clone());
        Self {
            db,
            storage,
            gateway,
            fallback,
            sessions: SessionRegistry::default(),
            settings,
        }
    }
}
