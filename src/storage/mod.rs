//! Storage seam for service-token records
//!
//! Service tokens verify statelessly; the record behind each one exists
//! for explicit revocation and audit, not per-request lookup. Backends
//! implement [`TokenStore`]; the core ships an in-memory implementation
//! and treats anything durable as a deployment concern.

mod memory;

pub use memory::MemoryTokenStore;

use async_trait::async_trait;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The request-scoped context was cancelled mid-call
    #[error("operation cancelled")]
    Cancelled,
}

/// Revocation/audit record persisted for each minted service token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTokenRecord {
    pub id: String,
    pub owner_id: String,
    pub created_at: i64,
}

/// Trait for service-token record storage
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Produce a fresh record id for a token about to be minted
    fn generate_token_id(&self) -> String;

    /// Persist the record for a newly minted service token
    async fn create_service_token(
        &self,
        id: &str,
        owner_id: &str,
        created_at: i64,
    ) -> Result<ServiceTokenRecord, StoreError>;

    /// Delete a record, revoking the token it backs
    async fn delete_service_token(&self, id: &str) -> Result<(), StoreError>;

    /// Fetch a record by id
    async fn get_service_token(&self, id: &str) -> Result<ServiceTokenRecord, StoreError>;
}
