use crate::error::EvaluationError;

/// Path appended to the server URL for definition evaluation.
pub const GRASSHOPPER_ROUTE: &str = "grasshopper";

/// Header carrying the optional server API key.
pub const API_KEY_HEADER: &str = "RhinoComputeKey";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputeConfig {
    pub endpoint_url: String,
    pub api_key: Option<String>,
}

impl ComputeConfig {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    /// Trimmed server URL without a trailing slash.
    pub fn validate(&self) -> Result<String, EvaluationError> {
        let url = self.endpoint_url.trim();
        if url.is_empty() {
            return Err(EvaluationError::Configuration(
                "Compute server URL required".to_string(),
            ));
        }
        let lower = url.to_ascii_lowercase();
        let Some(rest) = lower
            .strip_prefix("http://")
            .or_else(|| lower.strip_prefix("https://"))
        else {
            return Err(EvaluationError::Configuration(format!(
                "Compute server URL must start with http:// or https://: {url}"
            )));
        };
        if rest.trim_matches('/').is_empty() {
            return Err(EvaluationError::Configuration(format!(
                "Compute server URL has no host: {url}"
            )));
        }
        Ok(url.trim_end_matches('/').to_string())
    }

    pub fn grasshopper_url(&self) -> Result<String, EvaluationError> {
        Ok(format!("{}/{GRASSHOPPER_ROUTE}", self.validate()?))
    }
}
