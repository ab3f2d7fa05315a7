mod authorize;
mod direct_post;
mod discovery;
mod error;
mod qr;
mod request_object;
mod request_object_cache;
mod state;
mod token;
mod userinfo;

pub use authorize::authorize;
pub use direct_post::direct_post;
pub use discovery::{discovery, jwks};
pub use error::OidcError;
pub use qr::{poll_status, qr_code, verification_callback};
pub use request_object::request_object;
pub use request_object_cache::RequestObjectCache;
pub use state::AppState;
pub use token::token;
pub use userinfo::userinfo;
