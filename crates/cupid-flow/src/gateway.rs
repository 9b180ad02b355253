use std::future::Future;

use anyhow::Result;
use cupid_types::models::{NewResponse, ProposalDefinition, ProposalResponse};
use uuid::Uuid;

/// The hosted store for proposals, responses and uploaded files.
///
/// This is the canonical source of truth. Implementations report transport
/// or storage problems as `Err`; a slug that does not exist is `Ok(None)`.
pub trait PersistenceGateway: Send + Sync {
    fn get_proposal(&self, slug: &str) -> impl Future<Output = Result<Option<ProposalDefinition>>> + Send;

    /// Store a new definition and return its slug.
    fn create_proposal(&self, definition: &ProposalDefinition) -> impl Future<Output = Result<String>> + Send;

    /// Store `bytes` under `path` and return a durable public URL.
    fn upload_file(&self, bytes: &[u8], path: &str) -> impl Future<Output = Result<String>> + Send;

    fn create_response(&self, response: &NewResponse) -> impl Future<Output = Result<Uuid>> + Send;

    /// All responses, newest first.
    fn list_responses(&self) -> impl Future<Output = Result<Vec<ProposalResponse>>> + Send;
}

/// Degraded-mode copy of proposal definitions, used only when the gateway
/// could not take a write. Never consulted ahead of the gateway.
pub trait FallbackStore: Send + Sync {
    fn read(&self, slug: &str) -> impl Future<Output = Result<Option<ProposalDefinition>>> + Send;

    fn write(&self, definition: &ProposalDefinition) -> impl Future<Output = Result<()>> + Send;
}
