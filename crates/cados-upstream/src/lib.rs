pub mod config;

use std::fmt;
use std::time::Duration;

use cados_naming::{ModelFormat, ParamSet, base_filename, extract_model_type};
use serde_json::Value;
use tracing::{debug, info, warn};

pub use config::{DEFAULT_MODEL_TYPES, DEFAULT_SERVICE_URL, UpstreamConfig};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum UpstreamError {
    Transport(reqwest::Error),
    Status { status: u16, body: String },
}

impl UpstreamError {
    /// HTTP status reported by the remote service, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Transport(_) => None,
            UpstreamError::Status { status, .. } => Some(*status),
        }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::Transport(err) => {
                write!(f, "error communicating with CAD service: {err}")
            }
            UpstreamError::Status { status, body } => {
                write!(f, "CAD service responded with status {status}: {body}")
            }
        }
    }
}

impl std::error::Error for UpstreamError {}

impl From<reqwest::Error> for UpstreamError {
    fn from(value: reqwest::Error) -> Self {
        UpstreamError::Transport(value)
    }
}

/// Async client for the remote CAD-generation service.
#[derive(Debug, Clone)]
pub struct CadService {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl CadService {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok(CadService { http, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// List the model types the service can generate. Never fails: any
    /// transport error, bad status, or malformed body degrades to the
    /// configured fallback types.
    pub async fn model_types(&self) -> Vec<String> {
        let url = format!("{}/models/types", self.config.base_url);
        debug!(%url, "requesting model types");

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "model type request failed, using fallback types");
                return self.config.fallback_model_types.clone();
            }
        };

        if !response.status().is_success() {
            warn!(
                status = response.status().as_u16(),
                "model type request rejected, using fallback types"
            );
            return self.config.fallback_model_types.clone();
        }

        match response.json::<Value>().await {
            Ok(body) => parse_model_types(&body)
                .unwrap_or_else(|| self.config.fallback_model_types.clone()),
            Err(err) => {
                warn!(error = %err, "model type response was not valid JSON, using fallback types");
                self.config.fallback_model_types.clone()
            }
        }
    }

    /// All model schemas in one call. Degrades to `{"schemas": {}}`.
    pub async fn all_schemas(&self) -> Value {
        let url = format!("{}/models/schemas", self.config.base_url);
        debug!(%url, "requesting all model schemas");

        match self.get_json(&url).await {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "schema listing failed, returning empty set");
                serde_json::json!({ "schemas": {} })
            }
        }
    }

    /// Schema for one model type, `None` when the service has no answer.
    pub async fn schema(&self, model_type: &str) -> Option<Value> {
        let url = format!("{}/models/schema/{model_type}", self.config.base_url);
        debug!(%url, "requesting model schema");

        match self.get_json(&url).await {
            Ok(body) => Some(body),
            Err(err) => {
                warn!(model_type, error = %err, "schema lookup failed");
                None
            }
        }
    }

    /// Ask the service to generate a model. Parameter keys are rewritten
    /// from `snake_case` to the service's hyphenated convention.
    pub async fn generate(
        &self,
        model_type: &str,
        params: &ParamSet,
    ) -> Result<Value, UpstreamError> {
        let url = format!("{}/generate/{model_type}", self.config.base_url);
        let body = hyphenated_params(params);
        info!(model_type, "forwarding generation request");
        debug!(%url, ?body, "generation payload");

        let response = self
            .http
            .post(&url)
            .timeout(self.config.slow_request_timeout)
            .json(&body)
            .send()
            .await?;

        let result = read_json(response).await?;
        info!(model_type, "model generated");
        Ok(result)
    }

    /// Fetch a generated artifact by base filename, defaulting to OBJ.
    pub async fn fetch_model(
        &self,
        filename: &str,
        format: Option<ModelFormat>,
    ) -> Result<Vec<u8>, UpstreamError> {
        let base = base_filename(filename);
        let format = format.unwrap_or(ModelFormat::Obj).as_str();
        let url = format!("{}/models/{base}/{format}", self.config.base_url);
        info!(%url, "requesting model file");

        let response = self.http.get(&url).send().await?;
        read_bytes(response).await
    }

    /// Render a model to PNG. When no model type is given it is extracted
    /// from the filename.
    pub async fn render(
        &self,
        filename: &str,
        model_type: Option<&str>,
        view: &str,
    ) -> Result<Vec<u8>, UpstreamError> {
        let base = base_filename(filename);
        let extracted;
        let model_type = match model_type {
            Some(model_type) => model_type,
            None => {
                extracted = extract_model_type(base);
                info!(model_type = extracted, "using model type extracted from filename");
                extracted
            }
        };

        let url = format!("{}/render/{base}/{view}", self.config.base_url);
        info!(%url, model_type, "requesting render");

        let response = self
            .http
            .get(&url)
            .timeout(self.config.slow_request_timeout)
            .query(&[
                ("model_type", model_type),
                ("size", "800"),
                ("white_background", "true"),
            ])
            .send()
            .await?;
        read_bytes(response).await
    }

    async fn get_json(&self, url: &str) -> Result<Value, UpstreamError> {
        let response = self.http.get(url).send().await?;
        read_json(response).await
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, UpstreamError> {
    let response = check_status(response).await?;
    Ok(response.json::<Value>().await?)
}

async fn read_bytes(response: reqwest::Response) -> Result<Vec<u8>, UpstreamError> {
    let response = check_status(response).await?;
    Ok(response.bytes().await?.to_vec())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        status: status.as_u16(),
        body,
    })
}

fn parse_model_types(body: &Value) -> Option<Vec<String>> {
    let types = body.get("model_types")?.as_array()?;
    Some(
        types
            .iter()
            .filter_map(|value| value.as_str().map(str::to_string))
            .collect(),
    )
}

fn hyphenated_params(params: &ParamSet) -> serde_json::Map<String, Value> {
    params
        .iter()
        .map(|(key, value)| {
            let converted = key.replace('_', "-");
            let json = serde_json::to_value(value).unwrap_or(Value::Null);
            (converted, json)
        })
        .collect()
}
