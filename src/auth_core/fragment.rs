use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// Parameters an identity provider returned in the URL fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectFragment {
    params: HashMap<String, String>,
}

impl RedirectFragment {
    /// Parses `#key=value&...`. Returns `None` when no redirect occurred.
    pub fn parse(hash: &str) -> Option<Self> {
        let body = hash.strip_prefix('#').unwrap_or(hash);
        if body.is_empty() {
            return None;
        }
        let params = body
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                let value = percent_decode_str(value).decode_utf8_lossy().into_owned();
                (key.to_string(), value)
            })
            .collect();
        Some(Self { params })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn id_token(&self) -> Option<&str> {
        self.get("id_token").filter(|token| !token.is_empty())
    }

    pub fn error(&self) -> Option<&str> {
        self.get("error")
    }

    pub fn error_description(&self) -> Option<&str> {
        self.get("error_description")
    }

    /// True when the provider reported any failure.
    pub fn is_error(&self) -> bool {
        self.error().is_some() || self.error_description().is_some()
    }
}
