use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::models::Client;

use super::error::{StoreError, StoreResult};

/// Contract for persisting Client registrations (§4.3/§6). `client_id` is
/// the primary key.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn create(&self, client: Client) -> StoreResult<()>;
    async fn get_by_client_id(&self, client_id: &str) -> StoreResult<Option<Client>>;
    async fn update(&self, client: Client) -> StoreResult<()>;
    async fn delete(&self, client_id: &str) -> StoreResult<()>;
}

/// In-memory `ClientStore`, the shipped backend in place of the external
/// MongoDB collaborator.
#[derive(Default)]
pub struct InMemoryClientStore {
    by_id: DashMap<String, Client>,
}

impl InMemoryClientStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ClientStore for InMemoryClientStore {
    async fn create(&self, client: Client) -> StoreResult<()> {
        if self.by_id.contains_key(&client.client_id) {
            return Err(StoreError::Conflict);
        }
        self.by_id.insert(client.client_id.clone(), client);
        Ok(())
    }

    async fn get_by_client_id(&self, client_id: &str) -> StoreResult<Option<Client>> {
        Ok(self.by_id.get(client_id).map(|r| r.clone()))
    }

    async fn update(&self, client: Client) -> StoreResult<()> {
        if !self.by_id.contains_key(&client.client_id) {
            return Err(StoreError::NotFound);
        }
        self.by_id.insert(client.client_id.clone(), client);
        Ok(())
    }

    async fn delete(&self, client_id: &str) -> StoreResult<()> {
        match self.by_id.remove(client_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}
