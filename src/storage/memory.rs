//! In-memory token store
//!
//! Good enough for tests and single-process deployments; records do not
//! survive a restart.

use crate::storage::{ServiceTokenRecord, StoreError, TokenStore};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use parking_lot::RwLock;
use rand::Rng;
use std::collections::HashMap;

/// Concurrency-safe map of service-token records
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    records: RwLock<HashMap<String, ServiceTokenRecord>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous record lookup for tests and CLI output
    pub fn service_token_record(&self, id: &str) -> Option<ServiceTokenRecord> {
        self.records.read().get(id).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    fn generate_token_id(&self) -> String {
        let mut rng = rand::rng();
        let mut bytes = [0u8; 16];
        rng.fill(&mut bytes);

        URL_SAFE_NO_PAD.encode(bytes)
    }

    async fn create_service_token(
        &self,
        id: &str,
        owner_id: &str,
        created_at: i64,
    ) -> Result<ServiceTokenRecord, StoreError> {
        let record = ServiceTokenRecord {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            created_at,
        };

        self.records
            .write()
            .insert(id.to_string(), record.clone());

        Ok(record)
    }

    async fn delete_service_token(&self, id: &str) -> Result<(), StoreError> {
        self.records
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("service token not found: {id}")))
    }

    async fn get_service_token(&self, id: &str) -> Result<ServiceTokenRecord, StoreError> {
        self.service_token_record(id)
            .ok_or_else(|| StoreError::NotFound(format!("service token not found: {id}")))
    }
}
