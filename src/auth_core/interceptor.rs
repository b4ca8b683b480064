//! Renew-and-retry handling for requests rejected with 401.

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use super::client::{AUTHORIZATION, HttpClient, ResponseInterceptor, bearer};
use super::coordinator::SessionHandle;
use super::error::{AuthError, Result};
use super::http_client::{HttpRequest, HttpResponse};

/// Headers carried over from a failed request to its retry.
pub const RETRY_HEADERS: [&str; 3] = ["Accept", AUTHORIZATION, "Content-Type"];

/// On 401, renews through the active driver and retries the request exactly once.
pub struct RenewOnUnauthorized {
    session: SessionHandle,
}

impl RenewOnUnauthorized {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }
}

/// Rebuilds `failed` with only the retry headers, carrying `token` as bearer.
pub fn retry_request(failed: &HttpRequest, token: &str) -> HttpRequest {
    let mut retry = HttpRequest::new(failed.method, failed.url.clone());
    retry.body = failed.body.clone();
    retry.timeout = failed.timeout;
    for name in RETRY_HEADERS {
        if name == AUTHORIZATION {
            retry.set_header(name, bearer(token));
        } else if let Some(value) = failed.header_value(name) {
            retry.set_header(name, value);
        }
    }
    retry
}

#[async_trait]
impl ResponseInterceptor for RenewOnUnauthorized {
    #[instrument(skip_all, level = "debug")]
    async fn on_failure(&self, client: &HttpClient, error: AuthError) -> Result<HttpResponse> {
        let AuthError::HttpStatus { request, response } = error else {
            return Err(error);
        };
        if response.status != 401 {
            return Err(AuthError::HttpStatus { request, response });
        }
        let Some(driver) = self.session.current_auth_driver() else {
            warn!(url = %request.url, "Request unauthorized with no active driver");
            return Err(AuthError::HttpStatus { request, response });
        };
        info!(url = %request.url, "Request unauthorized, renewing token");
        let token = driver.background_login().await?;
        client.set_default_header(AUTHORIZATION, bearer(&token));
        client.dispatch(retry_request(&request, &token)).await
    }
}
