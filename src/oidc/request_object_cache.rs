use chrono::{DateTime, Utc};
use dashmap::DashMap;

const TTL_SECS: i64 = 300;

struct Entry {
    jwt: String,
    expires_at: DateTime<Utc>,
}

/// In-memory cache of signed request-object JWTs, keyed by session_id, with
/// a short TTL (§4.1 GetRequestObject) so repeated wallet polls of the same
/// session don't re-sign on every call.
#[derive(Default)]
pub struct RequestObjectCache {
    entries: DashMap<String, Entry>,
}

impl RequestObjectCache {
    pub fn get(&self, session_id: &str, now: DateTime<Utc>) -> Option<String> {
        let entry = self.entries.get(session_id)?;
        if now >= entry.expires_at {
            drop(entry);
            self.entries.remove(session_id);
            return None;
        }
        Some(entry.jwt.clone())
    }

    pub fn insert(&self, session_id: &str, jwt: String, now: DateTime<Utc>) {
        self.entries.insert(
            session_id.to_string(),
            Entry {
                jwt,
                expires_at: now + chrono::Duration::seconds(TTL_SECS),
            },
        );
    }
}
