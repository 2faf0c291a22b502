use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cados_naming::{
    ModelFormat, ParamSet, base_filename, compute_identifier, extract_model_type,
    parse_params_from_filename, with_extension,
};
use cados_upstream::{CadService, UpstreamError};
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderValue};
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

pub fn app(upstream: CadService) -> Router {
    Router::new()
        .route("/api", get(health))
        .route("/api/models/types", get(model_types))
        .route("/api/models/schemas", get(all_schemas))
        .route("/api/models/schema/{model_type}", get(model_schema))
        .route("/api/generate/{model_type}", post(generate))
        .route("/api/models/{filename}", get(download_model))
        .route("/api/models/{filename}/{format}", get(download_model_format))
        .route("/api/render/{filename}", get(render_model))
        .layer(cors_layer())
        .with_state(upstream)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    message: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
struct TypesResponse {
    model_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RenderQuery {
    view: Option<String>,
    model_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum ErrorCategory {
    ClientError,
    ValidationError,
    ResourceError,
    ExternalServiceError,
    ServerError,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    category: ErrorCategory,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<Value>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    category: ErrorCategory,
    message: String,
    detail: Option<Value>,
}

impl ApiError {
    fn new(status: StatusCode, category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            status,
            category,
            message: message.into(),
            detail: None,
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCategory::ClientError, message)
    }

    fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCategory::ValidationError,
            message,
        )
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCategory::ResourceError, message)
    }

    fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            ErrorCategory::ExternalServiceError,
            message,
        )
    }

    fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCategory::ExternalServiceError,
            message,
        )
    }

    fn server(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCategory::ServerError,
            message,
        )
    }

    fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status, body } if status < 500 => {
                let message = if body.is_empty() {
                    format!("CAD service rejected the request with status {status}")
                } else {
                    body
                };
                Self {
                    status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST),
                    category: ErrorCategory::ClientError,
                    message,
                    detail: None,
                }
            }
            err @ UpstreamError::Status { .. } => Self::bad_gateway(err.to_string()),
            err @ UpstreamError::Transport(_) => Self::service_unavailable(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            category: self.category,
            message: self.message,
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

async fn health() -> Json<HealthResponse> {
    info!("health check");
    Json(HealthResponse {
        message: "CAD-OS API Gateway is running",
    })
}

async fn model_types(State(upstream): State<CadService>) -> Json<TypesResponse> {
    Json(TypesResponse {
        model_types: upstream.model_types().await,
    })
}

async fn all_schemas(State(upstream): State<CadService>) -> Json<Value> {
    Json(upstream.all_schemas().await)
}

async fn model_schema(
    State(upstream): State<CadService>,
    Path(model_type): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match upstream.schema(&model_type).await {
        Some(schema) => Ok(Json(schema)),
        None => {
            warn!(%model_type, "schema not found");
            Err(
                ApiError::not_found(format!("Unknown model type: {model_type}"))
                    .with_detail(json!({ "model_type": model_type })),
            )
        }
    }
}

async fn generate(
    State(upstream): State<CadService>,
    Path(model_type): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let params: ParamSet = parse_json(&body)?;
    info!(%model_type, "generation request received");

    let mut data = match upstream.generate(&model_type, &params).await {
        Ok(data) => data,
        Err(err) => {
            warn!(%model_type, error = %err, "generation failed");
            return Err(ApiError::from(err)
                .with_detail(json!({ "model_type": model_type, "params": params })));
        }
    };

    let filename = compute_identifier(&model_type, &params);
    if let Value::Object(object) = &mut data {
        object.insert("filename".to_string(), Value::String(filename));
    }
    Ok(Json(data))
}

async fn download_model(
    State(upstream): State<CadService>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    info!(%filename, "model download requested");
    let base = resolve_base_name(&filename);

    let bytes = upstream
        .fetch_model(&base, None)
        .await
        .map_err(|err| download_error(err, &filename, None))?;

    attachment_response(
        bytes,
        "application/octet-stream",
        &with_extension(&base, ModelFormat::Obj),
    )
}

async fn download_model_format(
    State(upstream): State<CadService>,
    Path((filename, format_name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    info!(%filename, format = %format_name, "model download requested");

    let Some(format) = ModelFormat::from_name(&format_name) else {
        let valid: Vec<&str> = ModelFormat::ALL.iter().map(|f| f.as_str()).collect();
        warn!(format = %format_name, "invalid format requested");
        return Err(ApiError::bad_request(format!(
            "Invalid format: {format_name}. Valid formats are: {}",
            valid.join(", ")
        ))
        .with_detail(json!({
            "filename": filename,
            "format": format_name,
            "valid_formats": valid,
        })));
    };

    let base = resolve_base_name(&filename);
    let bytes = upstream
        .fetch_model(&base, Some(format))
        .await
        .map_err(|err| download_error(err, &filename, Some(format)))?;

    attachment_response(
        bytes,
        "application/octet-stream",
        &with_extension(&base, format),
    )
}

async fn render_model(
    State(upstream): State<CadService>,
    Path(filename): Path<String>,
    Query(query): Query<RenderQuery>,
) -> Result<Response, ApiError> {
    let view = query.view.unwrap_or_else(|| "front".to_string());
    info!(%filename, %view, "render requested");

    let result = upstream
        .render(&filename, query.model_type.as_deref(), &view)
        .await;
    let bytes = match result {
        Ok(bytes) => bytes,
        Err(err @ UpstreamError::Transport(_)) => return Err(ApiError::from(err)),
        Err(err) => {
            warn!(%filename, error = %err, "render failed");
            return Err(
                ApiError::bad_gateway(format!("Failed to render model: {err}"))
                    .with_detail(json!({ "filename": filename, "view": view })),
            );
        }
    };

    let image_name = format!("{}_{view}.png", base_filename(&filename));
    attachment_response(bytes, "image/png", &image_name)
}

/// Base name a requested filename resolves to before hitting the upstream.
/// Old-style names that still embed `key=value` parameters are mapped onto
/// the hash identifier the artifact is stored under today; hash-style and
/// plain names pass through unchanged.
fn resolve_base_name(filename: &str) -> String {
    let base = base_filename(filename);
    let params = parse_params_from_filename(base);
    if params.is_empty() {
        return base.to_string();
    }

    let resolved = compute_identifier(extract_model_type(base), &params);
    info!(%filename, %resolved, "resolved legacy filename");
    resolved
}

fn download_error(err: UpstreamError, filename: &str, format: Option<ModelFormat>) -> ApiError {
    match err {
        UpstreamError::Status { .. } => {
            warn!(%filename, "model file not found");
            let message = match format {
                Some(format) => {
                    format!("Model not found: {filename} in format {}", format.as_str())
                }
                None => format!("Model not found: {filename}"),
            };
            ApiError::not_found(message).with_detail(json!({ "filename": filename }))
        }
        err @ UpstreamError::Transport(_) => ApiError::from(err),
    }
}

fn attachment_response(
    bytes: Vec<u8>,
    content_type: &'static str,
    filename: &str,
) -> Result<Response, ApiError> {
    let disposition = format!("attachment; filename=\"{filename}\"")
        .parse::<HeaderValue>()
        .map_err(|_| ApiError::server(format!("unusable download filename: {filename}")))?;

    let mut response = Response::new(Body::from(bytes));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response.headers_mut().insert(CONTENT_DISPOSITION, disposition);
    Ok(response)
}

fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.is_empty() {
        return Err(ApiError::validation("request body is required"));
    }

    serde_json::from_slice(body)
        .map_err(|err| ApiError::validation(format!("invalid JSON body: {err}")))
}
