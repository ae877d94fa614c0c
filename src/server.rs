use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, Multipart, Path as AxumPath, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cli::ServeArgs;
use crate::pipeline::clean_file;
use crate::storage::{StoragePaths, TempUpload};
use crate::transform::Metrics;

const LANDING_PAGE: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    paths: Arc<StoragePaths>,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(paths: StoragePaths, max_upload_bytes: usize) -> Self {
        Self {
            paths: Arc::new(paths),
            max_upload_bytes,
        }
    }
}

pub async fn run(opts: ServeArgs) -> anyhow::Result<()> {
    let paths = StoragePaths::new(&opts.data_dir);
    paths.ensure_dirs().context("create data directories")?;
    tracing::info!(
        "Uploads in {}, cleaned files in {}",
        paths.upload_dir.display(),
        paths.cleaned_dir.display()
    );

    let state = AppState::new(paths, opts.max_upload_mb.saturating_mul(1024 * 1024));
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", opts.host, opts.port)
        .parse()
        .context("parse host:port")?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(landing_page))
        .route("/health", get(health))
        .route("/upload-and-clean", post(upload_and_clean))
        .route("/static_data/:filename", get(serve_cleaned_data))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// JSON error body: `{"error": ..., "details": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn processing(err: &anyhow::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Processing failed")
            .with_details(err.root_cause().to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

async fn landing_page() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    success: bool,
    cleaned_data_url: String,
    metrics: Metrics,
}

struct Upload {
    filename: String,
    bytes: axum::body::Bytes,
}

/// First `file` part that carries a filename. Plain form fields named
/// `file` do not count as an upload.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>, ApiError> {
    let invalid = |e: axum::extract::multipart::MultipartError| {
        ApiError::new(StatusCode::BAD_REQUEST, "Invalid upload").with_details(e.body_text())
    };

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        if field.name() != Some("file") {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await.map_err(invalid)?;
        return Ok(Some(Upload { filename, bytes }));
    }
    Ok(None)
}

async fn upload_and_clean(
    State(st): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let Some(upload) = read_upload(&mut multipart).await? else {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "No file part"));
    };
    if upload.filename.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "No selected file"));
    }

    let files = st.paths.request_files(&upload.filename);
    let raw = TempUpload::new(files.raw_path.clone());

    let result = async {
        tokio::fs::write(raw.path(), &upload.bytes)
            .await
            .with_context(|| format!("save upload {}", raw.path().display()))?;

        let raw_path = raw.path().to_path_buf();
        let cleaned_path = files.cleaned_path.clone();
        tokio::task::spawn_blocking(move || clean_file(&raw_path, &cleaned_path))
            .await
            .context("cleaning task panicked")?
    }
    .await;
    drop(raw);

    match result {
        Ok(metrics) => {
            tracing::info!(
                upload = %upload.filename,
                cleaned = %files.cleaned_name,
                records = metrics.total_records,
                "Upload cleaned"
            );
            Ok(Json(UploadResponse {
                success: true,
                cleaned_data_url: format!("/static_data/{}", files.cleaned_name),
                metrics,
            }))
        }
        Err(e) => {
            tracing::error!(upload = %upload.filename, "Processing failed: {e:#}");
            Err(ApiError::processing(&e))
        }
    }
}

async fn serve_cleaned_data(
    State(st): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, ApiError> {
    let not_found = || ApiError::new(StatusCode::NOT_FOUND, "Not found");

    let path = st.paths.resolve_cleaned(&filename).ok_or_else(not_found)?;
    let body = tokio::fs::read(&path).await.map_err(|e| {
        tracing::warn!("read {}: {e}", path.display());
        not_found()
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}
