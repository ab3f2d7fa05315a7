use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::models::Session;

use super::error::{StoreError, StoreResult};

/// Outcome of an atomic `MarkCodeAsUsed` call (§5 critical ordering invariant).
///
/// The conditional-update strategy the design notes prefer: a zero-match
/// result (`AlreadyUsed`) is itself the authoritative "reject this exchange"
/// signal, so callers never need to re-derive the flag from a possibly-stale
/// in-memory session copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkCodeOutcome {
    Marked,
    AlreadyUsed,
}

/// Contract for persisting Session records (§4.2/§6).
///
/// `session_id`, `authorization_code`, and `access_token` each uniquely
/// identify at most one session. `MarkCodeAsUsed` is intentionally decoupled
/// from `Update` so it can be implemented as a single atomic conditional
/// write regardless of backend.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: Session) -> StoreResult<()>;
    async fn get_by_id(&self, session_id: &str) -> StoreResult<Option<Session>>;
    async fn get_by_authorization_code(&self, code: &str) -> StoreResult<Option<Session>>;
    async fn get_by_access_token(&self, token: &str) -> StoreResult<Option<Session>>;
    async fn update(&self, session: Session) -> StoreResult<()>;
    async fn delete(&self, session_id: &str) -> StoreResult<()>;
    async fn mark_code_as_used(&self, session_id: &str) -> StoreResult<MarkCodeOutcome>;
}

/// In-memory `SessionStore`, the shipped backend in place of the external
/// MongoDB collaborator (§1 non-goal). Holds the primary map plus two
/// secondary index maps kept consistent under the same write.
#[derive(Default)]
pub struct InMemorySessionStore {
    by_id: DashMap<String, Session>,
    code_index: DashMap<String, String>,
    token_index: DashMap<String, String>,
}

impl InMemorySessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn reindex(&self, session: &Session) {
        if let Some(code) = &session.tokens.authorization_code {
            self.code_index
                .insert(code.clone(), session.session_id.clone());
        }
        if let Some(token) = &session.tokens.access_token {
            self.token_index
                .insert(token.clone(), session.session_id.clone());
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: Session) -> StoreResult<()> {
        if self.by_id.contains_key(&session.session_id) {
            return Err(StoreError::Conflict);
        }
        self.reindex(&session);
        self.by_id.insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn get_by_id(&self, session_id: &str) -> StoreResult<Option<Session>> {
        Ok(self.by_id.get(session_id).map(|r| r.clone()))
    }

    async fn get_by_authorization_code(&self, code: &str) -> StoreResult<Option<Session>> {
        let Some(session_id) = self.code_index.get(code).map(|r| r.clone()) else {
            return Ok(None);
        };
        self.get_by_id(&session_id).await
    }

    async fn get_by_access_token(&self, token: &str) -> StoreResult<Option<Session>> {
        let Some(session_id) = self.token_index.get(token).map(|r| r.clone()) else {
            return Ok(None);
        };
        self.get_by_id(&session_id).await
    }

    async fn update(&self, session: Session) -> StoreResult<()> {
        if !self.by_id.contains_key(&session.session_id) {
            return Err(StoreError::NotFound);
        }
        self.reindex(&session);
        self.by_id.insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> StoreResult<()> {
        match self.by_id.remove(session_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn mark_code_as_used(&self, session_id: &str) -> StoreResult<MarkCodeOutcome> {
        let mut entry = self
            .by_id
            .get_mut(session_id)
            .ok_or(StoreError::NotFound)?;
        if entry.tokens.authorization_code_used {
            return Ok(MarkCodeOutcome::AlreadyUsed);
        }
        entry.tokens.authorization_code_used = true;
        Ok(MarkCodeOutcome::Marked)
    }
}
