use std::sync::Arc;

use crate::config::Config;
use crate::keys::SigningKey;
use crate::presentation::{ClaimsExtractor, PresentationBuilder, SdJwtShapedParser};
use crate::ratelimit::RateLimiter;
use crate::store::{ClientStore, SessionStore};

use super::request_object_cache::RequestObjectCache;

/// Shared state reachable from every handler. The signing key and the
/// config are read-mostly and set once at startup; the stores and caches
/// are internally synchronized (§5).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<dyn SessionStore>,
    pub clients: Arc<dyn ClientStore>,
    pub signing_key: Arc<SigningKey>,
    pub presentation_builder: Arc<PresentationBuilder>,
    pub claims_extractor: Arc<ClaimsExtractor<SdJwtShapedParser>>,
    pub request_object_cache: Arc<RequestObjectCache>,
    pub rate_limiter: Arc<RateLimiter>,
}
