use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use jsonwebtoken::Algorithm;

use verifier_proxy::config::Config;
use verifier_proxy::keys::{parse_signing_alg, SigningKey};
use verifier_proxy::observability::init_tracing;
use verifier_proxy::oidc::{AppState, RequestObjectCache};
use verifier_proxy::presentation::{load_templates, ClaimsExtractor, PresentationBuilder, SdJwtShapedParser};
use verifier_proxy::ratelimit::RateLimiter;
use verifier_proxy::routes::build_router;
use verifier_proxy::store::{InMemoryClientStore, InMemorySessionStore};

/// CLI arguments for the verifier proxy.
#[derive(Parser, Debug)]
#[command(version, about = "OIDC verifier proxy", long_about = None)]
struct Args {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = "verifier-proxy.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = Config::from_file(&args.config).unwrap_or_else(|error| {
        eprintln!("failed to load config from {}: {error}", args.config.display());
        std::process::exit(1);
    });

    init_tracing(&config.logging);

    let alg = parse_signing_alg(&config.oidc.signing_alg.to_string())
        .expect("config validation should reject an unsupported signing_alg");
    let signing_key = SigningKey::load(
        config
            .oidc
            .signing_key_path
            .to_str()
            .expect("signing_key_path must be valid UTF-8"),
        alg,
    )
    .expect("failed to load OIDC signing key");

    let templates = match &config.openid4vp.presentation_requests_dir {
        Some(dir) => load_templates(dir),
        None => Vec::new(),
    };
    let presentation_builder = PresentationBuilder::new(
        templates,
        config.openid4vp.supported_credentials.clone(),
    );

    let rate_limiter = RateLimiter::spawn(&config.limits, config.server.trusted_proxies.clone());

    let state = AppState {
        config: Arc::new(config.clone()),
        sessions: InMemorySessionStore::new(),
        clients: InMemoryClientStore::new(),
        signing_key: Arc::new(signing_key),
        presentation_builder: Arc::new(presentation_builder),
        claims_extractor: Arc::new(ClaimsExtractor::new(SdJwtShapedParser)),
        request_object_cache: Arc::new(RequestObjectCache::default()),
        rate_limiter,
    };

    let app = build_router(state);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|error| panic!("failed to bind to {bind_addr}: {error}"));

    tracing::info!(address = %bind_addr, "verifier proxy listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
