use std::time::Duration;

use serde::Deserialize;

use crate::auth_core::error::{AuthError, Result};

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Provider error code meaning a silent request needs user interaction.
pub const INTERACTION_REQUIRED_CODE: &str = "AADSTS50058";

pub const DEFAULT_SILENT_RENEWAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for [`RedirectOidcDriver`](super::RedirectOidcDriver).
///
/// Deserializes from config files using either snake case or the upper-case
/// names (`TENANT`, `CLIENT_ID`, `REDIRECT_URI`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RedirectOidcOptions {
    #[serde(alias = "TENANT")]
    pub tenant: Option<String>,
    #[serde(alias = "CLIENT_ID")]
    pub client_id: Option<String>,
    #[serde(alias = "REDIRECT_URI")]
    pub redirect_uri: Option<String>,
    /// Identity provider host, without a trailing slash.
    pub authority: Option<String>,
    pub interaction_required_code: Option<String>,
    pub silent_renewal_timeout_ms: Option<u64>,
}

impl RedirectOidcOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    pub fn interaction_required_code(mut self, code: impl Into<String>) -> Self {
        self.interaction_required_code = Some(code.into());
        self
    }

    pub fn silent_renewal_timeout(mut self, timeout: Duration) -> Self {
        self.silent_renewal_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub(crate) fn resolve(self) -> Result<ResolvedOptions> {
        Ok(ResolvedOptions {
            tenant: required(self.tenant, "TENANT")?,
            client_id: required(self.client_id, "CLIENT_ID")?,
            redirect_uri: required(self.redirect_uri, "REDIRECT_URI")?,
            authority: self
                .authority
                .filter(|authority| !authority.is_empty())
                .map(|authority| authority.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_AUTHORITY.to_string()),
            interaction_required_code: self
                .interaction_required_code
                .filter(|code| !code.is_empty())
                .unwrap_or_else(|| INTERACTION_REQUIRED_CODE.to_string()),
            silent_renewal_timeout: self
                .silent_renewal_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_SILENT_RENEWAL_TIMEOUT),
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingOption(name))
}

/// Validated driver settings.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedOptions {
    pub tenant: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub authority: String,
    pub interaction_required_code: String,
    pub silent_renewal_timeout: Duration,
}
