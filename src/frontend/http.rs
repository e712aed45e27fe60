use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use warp::{Filter, Reply};

use super::http_utils::{into_response, ApiError};
use crate::{config::schema::HttpFrontend, dbml, upstream::SchemaSource};

// Request bodies only carry a URL
const MAX_BODY_BYTES: u64 = 16 * 1024;

#[derive(Debug, Deserialize)]
struct AugmentBody {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct AugmentResponse {
    dbml: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Error parsing the listen address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),

    #[error("Error binding the HTTP frontend: {0}")]
    Bind(#[from] warp::Error),
}

/// Pull the target URL out of a request body. Anything that isn't a JSON object with a
/// non-blank `url` string counts as missing input.
fn target_url(body: &[u8]) -> Result<String, ApiError> {
    let body: AugmentBody =
        serde_json::from_slice(body).map_err(|_| ApiError::MissingInput)?;

    match body.url {
        Some(url) if !url.trim().is_empty() => Ok(url.trim().to_string()),
        _ => Err(ApiError::MissingInput),
    }
}

/// Fetch the schema behind the URL in the body and return it with inferred relationships
pub async fn augment(
    source: Arc<dyn SchemaSource>,
    body: Bytes,
) -> Result<impl Reply, ApiError> {
    let start = Instant::now();
    let url = target_url(&body)?;

    let raw = source.fetch(&url).await.map_err(|e| {
        warn!("Couldn't fetch the schema for {url}: {e}");
        ApiError::from(e)
    })?;

    if raw.trim().is_empty() {
        warn!("Schema source {url} returned an empty document");
        return Err(ApiError::EmptyOrInvalidSchema);
    }

    // Regex scanning over a large document shouldn't stall the reactor
    let augmentation = tokio::task::spawn_blocking(move || dbml::augment(&raw))
        .await
        .map_err(|e| ApiError::InternalFailure(e.to_string()))?;

    if augmentation.tables.is_empty() {
        warn!("Schema source {url} returned a document without tables");
        return Err(ApiError::EmptyOrInvalidSchema);
    }

    info!(
        "Inferred {} relationship(s) across {} table(s) for {url} in {:?}",
        augmentation.generated.len(),
        augmentation.tables.len(),
        start.elapsed()
    );

    Ok(warp::reply::json(&AugmentResponse {
        dbml: augmentation.dbml,
    }))
}

// POST /dbml
pub fn augment_route(
    source: Arc<dyn SchemaSource>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    warp::path!("dbml")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .then(move |body: Bytes| augment(source.clone(), body))
        .map(into_response)
}

// GET /readyz
pub fn readiness_route(
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    warp::path!("readyz").and(warp::get()).map(|| "ready")
}

pub fn filters(
    source: Arc<dyn SchemaSource>,
    config: &HttpFrontend,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    let cors = warp::cors()
        .allow_headers(vec!["Content-Type"])
        .allow_methods(vec!["GET", "POST"]);

    // Origins are checked by `validate_config`; warp panics on malformed ones
    let cors = match config.cors_origins() {
        None => cors.allow_any_origin(),
        Some(origins) => cors.allow_origins(origins),
    };

    augment_route(source)
        .or(readiness_route())
        .with(cors)
        .with(warp::log::custom(|request| {
            info!(
                "{} {} {} {:?}",
                request.method(),
                request.path(),
                request.status().as_u16(),
                request.elapsed()
            )
        }))
}

/// Serve until `shutdown` resolves
pub async fn run_server(
    source: Arc<dyn SchemaSource>,
    config: HttpFrontend,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let filters = filters(source, &config);

    let socket_addr = config.socket_addr()?;
    let (addr, server) =
        warp::serve(filters).try_bind_with_graceful_shutdown(socket_addr, shutdown)?;

    info!("Starting the HTTP frontend on {addr}");
    server.await;
    Ok(())
}
