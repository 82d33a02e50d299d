//! HTTP surface
//!
//! | Route          | Purpose                                        |
//! |----------------|------------------------------------------------|
//! | `GET /`        | question form page (`index.html`)              |
//! | `POST /api/`   | `question` + optional `file`, multipart or urlencoded |
//! | `GET /health`  | catalog status, 503 while the table is empty   |
//! | `GET /metrics` | request counters                               |
//!
//! CORS is open to any origin.

pub mod handlers;

use crate::answer::AnswerService;
use crate::uploads::UploadStore;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use warp::path::Tail;
use warp::Filter;

/// Extra room for non-file form fields and multipart framing
const FORM_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Shared state for all handlers
pub struct AppState {
    pub service: Arc<AnswerService>,
    pub uploads: UploadStore,
    pub index_html: PathBuf,
    pub resolver_name: String,
    /// Upper bound for a whole multipart request
    pub max_form_bytes: u64,
}

impl AppState {
    pub fn new(
        service: Arc<AnswerService>,
        uploads: UploadStore,
        index_html: PathBuf,
        resolver_name: impl Into<String>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            service,
            uploads,
            index_html,
            resolver_name: resolver_name.into(),
            max_form_bytes: max_upload_bytes as u64 + FORM_OVERHEAD_BYTES,
        }
    }
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Matches `/api` and `/api/`
fn api_path() -> impl Filter<Extract = (), Error = warp::Rejection> + Clone {
    warp::path("api")
        .and(warp::path::tail())
        .and_then(|tail: Tail| async move {
            if tail.as_str().is_empty() {
                Ok(())
            } else {
                Err(warp::reject::not_found())
            }
        })
        .untuple_one()
}

/// All routes, with CORS and JSON rejection handling applied
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    let index_route = warp::path::end()
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::index);

    let question_route = api_path()
        .and(warp::post())
        .and(warp::multipart::form().max_length(state.max_form_bytes))
        .and(with_state(state.clone()))
        .and_then(handlers::question);

    let urlencoded_route = api_path()
        .and(warp::post())
        .and(warp::body::content_length_limit(state.max_form_bytes))
        .and(warp::body::form::<HashMap<String, String>>())
        .and(with_state(state.clone()))
        .and_then(handlers::question_urlencoded);

    let health_route = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::health);

    let metrics_route = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handlers::metrics_snapshot);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type", "accept", "origin", "authorization"]);

    index_route
        .or(question_route)
        .unify()
        .or(urlencoded_route)
        .unify()
        .or(health_route)
        .unify()
        .or(metrics_route)
        .unify()
        .with(cors)
        .recover(handlers::handle_rejection)
}

/// Bind and serve until `shutdown` resolves
pub async fn serve<F>(
    state: Arc<AppState>,
    addr: SocketAddr,
    shutdown: F,
) -> Result<(), warp::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (bound, server) =
        warp::serve(routes(state)).try_bind_with_graceful_shutdown(addr, shutdown)?;

    info!(addr = %bound, "Answer desk listening");
    server.await;
    info!("HTTP server stopped");
    Ok(())
}
