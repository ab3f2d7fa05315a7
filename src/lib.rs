//! An OIDC Provider facade that verifies credentials over OpenID4VP and
//! translates the result into `id_token`/UserInfo claims.

pub mod config;
pub mod keys;
pub mod models;
pub mod observability;
pub mod oidc;
pub mod presentation;
pub mod ratelimit;
pub mod registration;
pub mod routes;
pub mod store;
pub mod subject;
pub mod validation;
