//! Viewing-session logic for a proposal microsite.
//!
//! Everything here is independent of HTTP and storage: persistence is reached
//! through the [`gateway::PersistenceGateway`] and [`gateway::FallbackStore`]
//! traits, and randomness is injected so sessions can be replayed in tests.

pub mod countdown;
pub mod evasive;
pub mod gateway;
pub mod lookup;
pub mod machine;
pub mod questions;
pub mod slug;
pub mod submission;
