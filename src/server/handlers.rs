//! Request handlers

use super::AppState;
use crate::answer::AnswerSource;
use crate::error::{DeskError, DeskResult, ErrorBody};
use crate::observability::metrics;
use crate::observability::metrics::current_timestamp;
use crate::request_span;
use bytes::BufMut;
use futures::TryStreamExt;
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, Instrument};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::reply::{self, Reply, Response};

pub const NO_FILE_UPLOADED: &str = "No file uploaded";
const INDEX_NOT_FOUND: &str = "<h1>index.html not found</h1>";

/// Successful answer payload
#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub question: String,
    pub task: String,
    pub answer: String,
    pub file_received: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: u64,
    resolver: String,
    catalog: crate::catalog::CatalogStatus,
}

/// Parsed multipart submission
#[derive(Debug, Default)]
pub(crate) struct QuestionForm {
    pub question: Option<String>,
    pub file: Option<UploadedFile>,
}

#[derive(Debug)]
pub(crate) struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// GET /
pub async fn index(state: Arc<AppState>) -> Result<Response, Infallible> {
    match tokio::fs::read_to_string(&state.index_html).await {
        Ok(html) => Ok(reply::html(html).into_response()),
        Err(e) => {
            debug!(path = %state.index_html.display(), error = %e, "Index page unavailable");
            Ok(reply::with_status(reply::html(INDEX_NOT_FOUND), StatusCode::NOT_FOUND).into_response())
        }
    }
}

/// POST /api/ with a multipart body
pub async fn question(form: FormData, state: Arc<AppState>) -> Result<Response, Infallible> {
    respond(read_form(form), state).await
}

/// POST /api/ with an urlencoded body; such requests carry no file
pub async fn question_urlencoded(
    fields: HashMap<String, String>,
    state: Arc<AppState>,
) -> Result<Response, Infallible> {
    let form = QuestionForm {
        question: fields.get("question").cloned(),
        file: None,
    };
    respond(async { Ok::<_, DeskError>(form) }, state).await
}

async fn respond<F>(form: F, state: Arc<AppState>) -> Result<Response, Infallible>
where
    F: Future<Output = DeskResult<QuestionForm>>,
{
    let request_id = Uuid::new_v4();
    let span = request_span!(request_id = %request_id);

    let result = async {
        let result = answer_form(form, &state).await;
        if let Err(e) = &result {
            metrics().request_error();
            error!(error = %e, "Question request failed");
        }
        result
    }
    .instrument(span)
    .await;

    match result {
        Ok(body) => Ok(reply::json(&body).into_response()),
        Err(e) => Ok(error_reply(&e)),
    }
}

async fn answer_form<F>(form: F, state: &AppState) -> DeskResult<QuestionResponse>
where
    F: Future<Output = DeskResult<QuestionForm>>,
{
    metrics().question_received();

    let form = form.await?;
    let question = form.question.unwrap_or_default();

    let (file_path, file_received) = match &form.file {
        Some(file) => {
            let saved = state.uploads.save(&file.filename, &file.bytes).await;
            metrics().upload(saved.is_ok());
            let path = saved?;
            (Some(path.display().to_string()), file.filename.clone())
        }
        None => (None, NO_FILE_UPLOADED.to_string()),
    };

    let outcome = state
        .service
        .answer(&question, file_path.as_deref())
        .await?;

    info!(
        task_id = %outcome.task_id,
        from_resolver = outcome.source == AnswerSource::Resolver,
        file = %file_received,
        "Answered question"
    );

    Ok(QuestionResponse {
        question,
        task: outcome.task_id,
        answer: outcome.answer,
        file_received,
    })
}

/// Collect the `question` and `file` fields; other fields are ignored.
///
/// A `file` part without a file name counts as no upload.
pub(crate) async fn read_form(form: FormData) -> DeskResult<QuestionForm> {
    let parts: Vec<Part> = form
        .try_collect()
        .await
        .map_err(|e| DeskError::invalid_request(format!("malformed multipart form: {e}")))?;

    let mut parsed = QuestionForm::default();

    for part in parts {
        let name = part.name().to_string();
        let filename = part.filename().map(str::to_string);
        let bytes = read_part(part).await?;

        match name.as_str() {
            "question" => parsed.question = Some(String::from_utf8_lossy(&bytes).into_owned()),
            "file" => match filename.filter(|f| !f.trim().is_empty()) {
                Some(filename) => parsed.file = Some(UploadedFile { filename, bytes }),
                None => debug!("Ignoring file field without a file name"),
            },
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(parsed)
}

async fn read_part(part: Part) -> DeskResult<Vec<u8>> {
    part.stream()
        .try_fold(Vec::new(), |mut acc, buf| async move {
            acc.put(buf);
            Ok(acc)
        })
        .await
        .map_err(|e| DeskError::invalid_request(format!("failed to read form field: {e}")))
}

/// GET /health
pub async fn health(state: Arc<AppState>) -> Result<Response, Infallible> {
    let catalog = state.service.catalog().status();
    let healthy = catalog.entries > 0;

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        timestamp: current_timestamp(),
        resolver: state.resolver_name.clone(),
        catalog,
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok(reply::with_status(reply::json(&response), status).into_response())
}

/// GET /metrics
pub async fn metrics_snapshot() -> Result<Response, Infallible> {
    Ok(reply::json(&metrics().get_metrics()).into_response())
}

pub(crate) fn error_reply(error: &DeskError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    reply::with_status(reply::json(&error.to_error_body()), status).into_response()
}

/// Map warp rejections to JSON bodies with a fixed message per kind
pub async fn handle_rejection(rejection: warp::Rejection) -> Result<Response, Infallible> {
    let (status, error, details) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found", "No route matches the request")
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "Payload Too Large",
            "Request body exceeds the upload limit",
        )
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed",
            "Method not supported on this route",
        )
    } else if rejection.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported Media Type",
            "Send the question as multipart/form-data or a urlencoded form",
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            "Bad Request",
            "Malformed request; send the question as multipart/form-data or a urlencoded form",
        )
    };

    debug!(rejection = ?rejection, status = status.as_u16(), "Request rejected");

    let body = ErrorBody {
        error: error.to_string(),
        details: details.to_string(),
    };
    Ok(reply::with_status(reply::json(&body), status).into_response())
}
