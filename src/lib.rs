//! Client-side authentication sessions for Starberry applications.
//!
//! A [`SessionCoordinator`] selects one of several registered [`AuthDriver`]s,
//! persists the resulting id token, and hands out an [`HttpClient`] that renews
//! the token silently and retries once when a request is rejected with 401.

pub mod auth_core;
pub mod oidc;

pub use auth_core::client::{HttpClient, ResponseInterceptor};
pub use auth_core::codec::{decode_segment, decode_token};
pub use auth_core::config::SessionConfig;
pub use auth_core::coordinator::{DriverRegistry, SessionCoordinator, SessionCoordinatorBuilder, SessionHandle};
pub use auth_core::driver::AuthDriver;
pub use auth_core::error::{AuthError, Result, StorageError};
pub use auth_core::fragment::RedirectFragment;
pub use auth_core::http_client::{HttpClientError, HttpMethod, HttpRequest, HttpResponse, HttpTransport, InMemoryTransport};
#[cfg(feature = "reqwest")]
pub use auth_core::http_client::ReqwestTransport;
pub use auth_core::navigation::{FrameLocation, InMemoryNavigator, NavigationEnvironment, SilentFrame};
pub use auth_core::observer::{SessionChange, SessionObserver, SessionSnapshot, WatchObserver};
pub use auth_core::storage::{InMemoryKeyValueStore, JsonFileStore, KeyValueStore, SessionField, SessionStore};
pub use auth_core::types::{DecodedToken, MalformedToken, Segment};
pub use oidc::{RedirectOidcDriver, RedirectOidcOptions};
