use cupid_types::models::ProposalDefinition;
use tracing::{debug, warn};

use crate::gateway::{FallbackStore, PersistenceGateway};

/// Which store answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Gateway,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found {
        definition: Box<ProposalDefinition>,
        source: Source,
    },
    NotFound,
}

impl Lookup {
    pub fn into_definition(self) -> Option<ProposalDefinition> {
        match self {
            Self::Found { definition, .. } => Some(*definition),
            Self::NotFound => None,
        }
    }
}

/// Resolve a slug to its definition.
///
/// The gateway is asked first. The fallback store is read only when the
/// gateway has no such slug or could not be reached, and its answer is
/// taken as-is. Errors from either side are logged and end in `NotFound`.
pub async fn load_proposal<G, F>(gateway: &G, fallback: &F, slug: &str) -> Lookup
where
    G: PersistenceGateway,
    F: FallbackStore,
{
    match gateway.get_proposal(slug).await {
        Ok(Some(definition)) => {
            return Lookup::Found {
                definition: Box::new(definition),
                source: Source::Gateway,
            };
        }
        Ok(None) => debug!("Proposal {} not in gateway, trying fallback", slug),
        Err(e) => warn!("Gateway lookup for {} failed: {:#}", slug, e),
    }

    match fallback.read(slug).await {
        Ok(Some(definition)) => Lookup::Found {
            definition: Box::new(definition),
            source: Source::Fallback,
        },
        Ok(None) => Lookup::NotFound,
        Err(e) => {
            warn!("Fallback lookup for {} failed: {:#}", slug, e);
            Lookup::NotFound
        }
    }
}
