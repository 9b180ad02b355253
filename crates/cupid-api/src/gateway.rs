use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use cupid_db::Database;
use cupid_db::models::{ProposalRow, ResponseRow};
use cupid_flow::gateway::PersistenceGateway;
use cupid_types::models::{NewResponse, ProposalDefinition, ProposalResponse};
use uuid::Uuid;

use crate::storage::{Storage, public_url_for};

/// The hosted store: SQLite for records, [`Storage`] for files.
///
/// Blocking database calls run on the blocking pool so handlers never
/// hold the connection mutex on a runtime thread.
#[derive(Clone)]
pub struct StoreGateway {
    db: Arc<Database>,
    storage: Arc<Storage>,
    public_url: String,
}

impl StoreGateway {
    pub fn new(db: Arc<Database>, storage: Arc<Storage>, public_url: String) -> Self {
        Self { db, storage, public_url }
    }

    /// Responses for one proposal, newest first.
    pub async fn list_responses_for(&self, slug: &str) -> Result<Vec<ProposalResponse>> {
        self.query_responses(Some(slug.to_string())).await
    }

    async fn query_responses(&self, slug: Option<String>) -> Result<Vec<ProposalResponse>> {
        let db = self.db.clone();
        let rows = tokio::task::spawn_blocking(move || db.list_responses(slug.as_deref())).await??;
        rows.into_iter().map(ResponseRow::into_response).collect()
    }
}

impl PersistenceGateway for StoreGateway {
    async fn get_proposal(&self, slug: &str) -> Result<Option<ProposalDefinition>> {
        let db = self.db.clone();
        let slug = slug.to_string();
        let row = tokio::task::spawn_blocking(move || db.get_proposal(&slug)).await??;
        row.map(ProposalRow::into_definition).transpose()
    }

    async fn create_proposal(&self, definition: &ProposalDefinition) -> Result<String> {
        let row = ProposalRow::from_definition(definition)?;
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.insert_proposal(&row)).await??;
        Ok(definition.slug.clone())
    }

    async fn upload_file(&self, bytes: &[u8], path: &str) -> Result<String> {
        self.storage.write_file(path, bytes).await?;
        Ok(public_url_for(&self.public_url, path))
    }

    async fn create_response(&self, response: &NewResponse) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let row = ResponseRow::new(id, response, &Utc::now());
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.insert_response(&row)).await??;
        Ok(id)
    }

    async fn list_responses(&self) -> Result<Vec<ProposalResponse>> {
        self.query_responses(None).await
    }
}
