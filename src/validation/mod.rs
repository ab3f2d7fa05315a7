mod https_uri;
mod pkce;
mod redirect;
mod scope;
mod url;

pub use https_uri::validate_https_uri;
pub use pkce::{create_code_challenge, parse_code_challenge_method, validate_pkce};
pub use redirect::validate_redirect_uri;
pub use scope::validate_scopes;
pub use url::{validate_uri, UrlValidationError};
