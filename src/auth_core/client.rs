//! The session's HTTP client: base URL, default headers and one response interceptor.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use super::error::{AuthError, Result};
use super::http_client::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, find_header};

pub const AUTHORIZATION: &str = "Authorization";

/// Hook run when a request fails, with the chance to recover it.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync + 'static {
    /// Returns a replacement response or the (possibly different) error to surface.
    async fn on_failure(&self, client: &HttpClient, error: AuthError) -> Result<HttpResponse>;
}

struct ClientInner {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    default_headers: RwLock<Vec<(String, String)>>,
    interceptor: RwLock<Option<Arc<dyn ResponseInterceptor>>>,
}

/// Cheaply cloneable client bound to a base URL.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        HttpClient {
            inner: Arc::new(ClientInner {
                base_url: base_url.into(),
                transport,
                default_headers: RwLock::new(Vec::new()),
                interceptor: RwLock::new(None),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn set_default_header(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let mut headers = self.inner.default_headers.write();
        headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        headers.push((name, value.into()));
    }

    pub fn remove_default_header(&self, name: &str) {
        self.inner
            .default_headers
            .write()
            .retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn default_header(&self, name: &str) -> Option<String> {
        find_header(&self.inner.default_headers.read(), name).map(str::to_string)
    }

    /// Installs the response interceptor, replacing any previous one.
    pub fn set_interceptor(&self, interceptor: Arc<dyn ResponseInterceptor>) {
        *self.inner.interceptor.write() = Some(interceptor);
    }

    /// Absolute URLs pass through, anything else is joined onto the base URL.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        let base = self.inner.base_url.trim_end_matches('/');
        let path = url.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else if base.is_empty() {
            format!("/{}", path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Sends `request`, letting the interceptor handle a failure.
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse> {
        match self.dispatch(request).await {
            Ok(response) => Ok(response),
            Err(error) => {
                let interceptor = self.inner.interceptor.read().clone();
                match interceptor {
                    Some(interceptor) => interceptor.on_failure(self, error).await,
                    None => Err(error),
                }
            }
        }
    }

    /// Sends `request` without interception. Non-2xx statuses become [`AuthError::HttpStatus`].
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url), level = "debug")]
    pub async fn dispatch(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        request.url = self.resolve_url(&request.url);
        let defaults = self.inner.default_headers.read().clone();
        for (name, value) in defaults {
            if request.header_value(&name).is_none() {
                request.headers.push((name, value));
            }
        }
        let response = self
            .inner
            .transport
            .execute(request.clone())
            .await
            .map_err(AuthError::Transport)?;
        debug!(status = response.status, "Response received");
        if response.is_success() {
            Ok(response)
        } else {
            Err(AuthError::HttpStatus { request: Box::new(request), response })
        }
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.request(HttpRequest::new(HttpMethod::GET, url)).await
    }

    pub async fn delete(&self, url: &str) -> Result<HttpResponse> {
        self.request(HttpRequest::new(HttpMethod::DELETE, url)).await
    }

    pub async fn post(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<HttpResponse> {
        self.request(HttpRequest::new(HttpMethod::POST, url).body(body)).await
    }

    pub async fn put(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<HttpResponse> {
        self.request(HttpRequest::new(HttpMethod::PUT, url).body(body)).await
    }
}

/// `Bearer <token>` header value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
