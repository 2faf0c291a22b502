use std::env;
use std::time::Duration;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:3000";

/// Model types offered when the remote service is unreachable, so the
/// frontend can still render its picker.
pub const DEFAULT_MODEL_TYPES: [&str; 2] = ["washer", "cylinder"];

const GENERATE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub fallback_model_types: Vec<String>,
    /// Generation and rendering can take a while on complex models.
    pub slow_request_timeout: Duration,
}

impl UpstreamConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        UpstreamConfig {
            base_url: trim_trailing_slash(base_url.into()),
            fallback_model_types: DEFAULT_MODEL_TYPES.iter().map(|s| s.to_string()).collect(),
            slow_request_timeout: GENERATE_TIMEOUT,
        }
    }

    /// Read `CAD_SERVICE_URL` from the environment, defaulting to the local
    /// development address.
    pub fn from_env() -> Self {
        let base_url =
            env::var("CAD_SERVICE_URL").unwrap_or_else(|_| DEFAULT_SERVICE_URL.to_string());
        UpstreamConfig::new(base_url)
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::UpstreamConfig;

    #[test]
    fn trailing_slashes_are_trimmed() {
        let config = UpstreamConfig::new("http://cad:3000/");
        assert_eq!(config.base_url, "http://cad:3000");
    }

    #[test]
    fn fallback_types_cover_the_basic_catalog() {
        let config = UpstreamConfig::new("http://cad:3000");
        assert_eq!(config.fallback_model_types, ["washer", "cylinder"]);
    }
}
