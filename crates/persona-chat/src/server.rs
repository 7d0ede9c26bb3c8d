//! Server startup: credentials, spreadsheet backend, app state and router.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::{
    app::App,
    config::{Config, SheetsBackendKind},
    credentials::load_service_account,
    shared_state::AppState,
    sheets::{GoogleSheetsBackend, InMemorySheets, SheetsBackend, SpreadsheetGateway},
};

/// Pick the spreadsheet implementation. Credential problems abort startup.
pub fn build_backend(cfg: &Config) -> anyhow::Result<Arc<dyn SheetsBackend>> {
    match cfg.sheets_backend {
        SheetsBackendKind::Memory => {
            info!("Using in-memory spreadsheet; nothing will be persisted");
            Ok(Arc::new(InMemorySheets::new()))
        }
        SheetsBackendKind::Google => {
            let secret = cfg
                .service_account_json
                .as_deref()
                .context("Service account secret is required for the Google backend")?;

            let http_client = reqwest::Client::builder()
                .timeout(Duration::from_secs(cfg.sheets_timeout_seconds))
                .build()
                .context("Failed to build HTTP client")?;

            let tokens = load_service_account(secret, http_client)
                .context("Failed to load service account credentials")?;

            Ok(Arc::new(GoogleSheetsBackend::new(
                cfg.sheets_api_base.clone(),
                cfg.spreadsheet_key.clone(),
                Arc::new(tokens),
                Duration::from_secs(cfg.sheets_timeout_seconds),
            )))
        }
    }
}

pub async fn build_state(cfg: &Config, backend: Arc<dyn SheetsBackend>) -> anyhow::Result<AppState> {
    let gateway = SpreadsheetGateway::new(backend);
    let app = App::open(
        gateway,
        Duration::from_secs(cfg.profile_cache_ttl_seconds),
        Duration::from_secs(cfg.session_idle_seconds),
    )
    .await
    .context("Failed to open the profile worksheet")?;
    Ok(AppState::new(app))
}

pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    crate::telemetry::init_tracing();
    crate::metrics::init_metrics();
    cfg.print_config();

    let backend = build_backend(&cfg)?;
    let state = build_state(&cfg, backend).await?;

    let addr = cfg.api_addr()?;
    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let app = build_router(state, Duration::from_secs(cfg.request_timeout_seconds));
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_router(state: AppState, request_timeout: Duration) -> axum::Router {
    use axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    };
    use tower::ServiceBuilder;
    use tower_http::{
        timeout::TimeoutLayer,
        trace::TraceLayer,
    };

    Router::new()
        .route("/", get(crate::api::page_api::new_session))
        .route("/s/:id", get(crate::api::page_api::show_page))
        .route("/s/:id/login", post(crate::api::page_api::login))
        .route("/s/:id/survey", post(crate::api::survey_api::submit_survey))
        .route("/s/:id/survey/continue", post(crate::api::survey_api::continue_to_chat))
        .route("/s/:id/chat", post(crate::api::chat_api::send_message))
        .route("/s/:id/chat/clear", post(crate::api::chat_api::clear_chat))
        .route("/healthz", get(|| async { "OK" }))
        .route("/metrics", get(crate::metrics::get_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(DefaultBodyLimit::max(64 * 1024)),
        )
        .with_state(state)
}
