use crate::{
    access::Grants,
    api::handlers::{environments, health, root},
    photos::LocalPhotoStorage,
    store::PostgresStore,
};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    routing::{get, options, post},
};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, services::ServeDir, set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, error, info, info_span};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;

pub(crate) mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;
mod state;

pub use openapi::openapi;
pub use state::{AppState, DEFAULT_ROLE_HEADER};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Full application router: documented routes, legacy aliases and the
/// static photo directory, with `state` attached.
///
/// Infrastructure layers (request ids, tracing, database pool) are added by
/// `new` so tests can drive this router directly.
#[must_use]
pub fn app(state: Arc<AppState>, public_dir: &Path, max_upload_bytes: usize) -> Router {
    let (router, _openapi) = router().split_for_parts();
    router
        .route("/", get(root::root))
        .route("/health", options(health::health))
        .route(
            "/environments/update",
            post(environments::update::update_environment),
        )
        .route(
            "/environments/delete",
            post(environments::delete::delete_environment),
        )
        .nest_service("/img", ServeDir::new(public_dir.join("img")))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(Extension(state))
}

/// Server settings resolved from the CLI.
#[derive(Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub dsn: SecretString,
    pub public_dir: PathBuf,
    pub grants: Grants,
    pub role_header: HeaderName,
    pub max_upload_bytes: usize,
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(config: ServerConfig) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(config.dsn.expose_secret())
        .await
        .context("Failed to connect to database")?;

    let store = Arc::new(PostgresStore::new(pool.clone()));
    store
        .apply_schema()
        .await
        .context("Failed to apply environment schema")?;

    let photos = Arc::new(LocalPhotoStorage::new(config.public_dir.clone()));
    let state = AppState::new(store.clone(), store, photos, Arc::new(config.grants))
        .with_role_header(config.role_header);

    let app = app(
        Arc::new(state),
        &config.public_dir,
        config.max_upload_bytes,
    )
    .layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(Extension(pool)),
    );

    let listener = TcpListener::bind(format!("::0:{}", config.port)).await?;

    info!(
        public_dir = %config.public_dir.display(),
        "Listening on [::]:{}", config.port
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
