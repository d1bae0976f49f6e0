use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use axum::{Router, routing::post};
use hookgate_config::Config;
use hookgate_core::{SignatureVerifier, TokenExtractor, WebhookGate};
use tracing::level_filters::LevelFilter;

use crate::errors::StartupError;

mod capture;
mod errors;
mod handlers;

pub(crate) type SharedState = Arc<AppState>;

/// Immutable per-process state, built once from the config.
pub(crate) struct AppState {
    pub(crate) gate: WebhookGate,
    pub(crate) echo_token: bool,
    pub(crate) body_limit: usize,
    pub(crate) read_timeout: Duration,
}

impl AppState {
    pub(crate) fn from_config(config: &Config) -> Result<Self, StartupError> {
        let token_headers = config
            .token_headers
            .iter()
            .map(|name| header_name(name))
            .collect::<Result<Vec<_>, _>>()?;

        let gate = WebhookGate::new(
            TokenExtractor::new(token_headers),
            SignatureVerifier::new(config.signing_secret.clone()),
        )
        .with_signature_header(header_name(&config.signature_header)?);

        Ok(Self {
            gate,
            echo_token: config.echo_token,
            body_limit: config.body_limit,
            read_timeout: config.read_timeout(),
        })
    }
}

fn header_name(name: &str) -> Result<HeaderName, StartupError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| StartupError::InvalidHeaderName(name.to_string(), e))
}

pub(crate) fn app(path: &str, state: SharedState) -> Router {
    Router::new()
        .route(path, post(handlers::webhook_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("hookgate: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = hookgate_config::get_config()?;

    let level = config.log_level.parse().unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_file(true)
        .with_line_number(true)
        .init();

    if config.signing_secret.is_none() {
        tracing::warn!(
            "No signing secret configured; only verification handshakes will be accepted"
        );
    }

    let state = Arc::new(AppState::from_config(&config)?);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .map_err(StartupError::Bind)?;

    tracing::info!(
        "listening on {} at {}",
        listener.local_addr().map_err(StartupError::Bind)?,
        config.path
    );

    axum::serve(listener, app(&config.path, state))
        .await
        .map_err(StartupError::Bind)
}
