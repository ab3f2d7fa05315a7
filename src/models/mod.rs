mod client;
mod session;
mod template;

pub use client::{
    Client, ClientDisplayMetadata, CodeChallengeMethod, GrantType, ResponseType,
    SubjectType, TokenEndpointAuthMethod,
};
pub use session::{
    OidcRequest, Openid4vpRecord, PresentationQuery, Session, SessionStatus, TokenSet,
};
pub use template::{ClaimTransformSpec, PresentationRequestTemplate};
