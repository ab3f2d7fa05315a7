//! Route assembly: wires every HTTP-surface endpoint onto a shared
//! `AppState`, with per-endpoint-family rate limiting (C2) and the usual
//! tracing/body-limit layers (§6, §10).

use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::oidc::{
    authorize, direct_post, discovery, jwks, poll_status, qr_code, request_object, token,
    userinfo, verification_callback, AppState,
};
use crate::ratelimit::{authorize_rate_limit, register_rate_limit, token_rate_limit};
use crate::registration::{delete_client, get_client, register, update_client};

pub mod health;

pub fn build_router(state: AppState) -> Router {
    let authorize_routes = Router::new()
        .route("/authorize", get(authorize))
        .layer(axum::middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            authorize_rate_limit,
        ));

    let token_routes = Router::new()
        .route("/token", post(token))
        .layer(axum::middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            token_rate_limit,
        ));

    let register_routes = Router::new()
        .route("/register", post(register))
        .route(
            "/register/{client_id}",
            get(get_client).put(update_client).delete(delete_client),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            register_rate_limit,
        ));

    let body_limit = state.config.server.body_limit_bytes;

    Router::new()
        .route("/health", get(health::health))
        .route("/.well-known/openid-configuration", get(discovery))
        .route("/jwks", get(jwks))
        .route("/userinfo", get(userinfo))
        .route(
            "/verification/request-object/{session_id}",
            get(request_object),
        )
        .route("/verification/direct_post", post(direct_post))
        .route("/verification/callback", get(verification_callback))
        .route("/qr/{session_id}", get(qr_code))
        .route("/poll/{session_id}", get(poll_status))
        .merge(authorize_routes)
        .merge(token_routes)
        .merge(register_routes)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}
