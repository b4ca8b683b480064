use serde::Deserialize;

/// Coordinator settings that can be loaded from a config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URL for HTTP requests made through the session client.
    #[serde(alias = "baseURL")]
    pub base_url: Option<String>,
    /// Renew and retry once when a request answers 401.
    pub retry_on_unauthorized: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { base_url: None, retry_on_unauthorized: true }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn retry_on_unauthorized(mut self, enabled: bool) -> Self {
        self.retry_on_unauthorized = enabled;
        self
    }
}
