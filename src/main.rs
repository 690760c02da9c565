use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use axum_session_gate::api::create_router;
use axum_session_gate::config::Config;
use axum_session_gate::oidc::introspection::cache::in_memory::InMemoryIntrospectionCache;
use axum_session_gate::{IntrospectionVerifier, SessionGate};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,axum_session_gate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = Config::from_env().context("loading configuration")?;

    let mut builder = IntrospectionVerifier::builder(&config.auth_server_url)
        .with_basic_auth(&config.client_id, &config.client_secret)
        .with_introspection_cache(InMemoryIntrospectionCache::new())
        .with_cookie_names(&config.access_token_cookie, &config.refresh_token_cookie)
        .with_cookie_options(config.cookie_options());

    if let Some(url) = &config.introspection_url {
        builder = builder.with_introspection_url(url);
    }
    if let Some(url) = &config.token_url {
        builder = builder.with_token_url(url);
    }
    if let Some(timeout) = config.verification_timeout {
        builder = builder.with_timeout(timeout);
    }

    let verifier = builder
        .build()
        .await
        .context("building introspection verifier")?;

    let gate = SessionGate::new(
        config.route_table().context("building route table")?,
        config.redirect_targets(),
        verifier,
    );
    let app = create_router(Arc::new(gate));

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("binding {}", config.bind_address()))?;
    tracing::info!(address = %config.bind_address(), "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
