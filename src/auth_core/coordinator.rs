//! Driver selection and the unified session view.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::client::{AUTHORIZATION, HttpClient, bearer};
use super::config::SessionConfig;
use super::driver::AuthDriver;
use super::error::{AuthError, Result};
use super::http_client::HttpTransport;
use super::interceptor::RenewOnUnauthorized;
use super::observer::{SessionChange, SessionObserver};
use super::storage::{SessionField, SessionStore};
use super::types::DecodedToken;

/// Registered drivers keyed by style name, in registration order.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    entries: Vec<(String, Arc<dyn AuthDriver>)>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `driver` under `style`. Re-registering a style replaces it in place.
    pub fn register(mut self, style: impl Into<String>, driver: Arc<dyn AuthDriver>) -> Self {
        let style = style.into();
        match self.entries.iter_mut().find(|(name, _)| *name == style) {
            Some(entry) => entry.1 = driver,
            None => self.entries.push((style, driver)),
        }
        self
    }

    pub fn get(&self, style: &str) -> Option<Arc<dyn AuthDriver>> {
        self.entries
            .iter()
            .find(|(name, _)| name == style)
            .map(|(_, driver)| driver.clone())
    }

    pub fn styles(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct Shared {
    registry: DriverRegistry,
    base_url: String,
    store: SessionStore,
    transport: Arc<dyn HttpTransport>,
    observer: Option<Arc<dyn SessionObserver>>,
    retry_on_unauthorized: bool,
    http: RwLock<Option<HttpClient>>,
}

impl Shared {
    fn current_auth_style(&self) -> Option<String> {
        self.store.get(SessionField::AuthStyle)
    }

    fn current_auth_driver(&self) -> Option<Arc<dyn AuthDriver>> {
        let style = self.current_auth_style()?;
        self.registry.get(&style)
    }

    fn notify(&self, change: SessionChange) {
        if let Some(observer) = &self.observer {
            debug!(property = change.property_name(), "Session property changed");
            observer.on_change(change);
        }
    }

    fn configure_http_client(self: &Arc<Self>) -> HttpClient {
        let client = HttpClient::new(self.base_url.clone(), self.transport.clone());
        let token = self.current_auth_driver().and_then(|driver| driver.id_token());
        match &token {
            Some(token) => client.set_default_header(AUTHORIZATION, bearer(token)),
            None => debug!("No id token held, Authorization header omitted"),
        }
        if self.retry_on_unauthorized {
            let handle = SessionHandle { shared: Arc::downgrade(self) };
            client.set_interceptor(Arc::new(RenewOnUnauthorized::new(handle)));
        }
        *self.http.write() = Some(client.clone());
        info!(base_url = %self.base_url, authorized = token.is_some(), "HTTP client configured");
        client
    }
}

/// Back-reference handed to a driver on `init`.
///
/// Holds the coordinator weakly so drivers never keep it alive.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Weak<Shared>,
}

impl SessionHandle {
    /// A handle attached to no coordinator. Notifications and configuration are dropped.
    pub fn detached() -> Self {
        Self { shared: Weak::new() }
    }

    pub fn is_attached(&self) -> bool {
        self.shared.strong_count() > 0
    }

    pub fn notify(&self, change: SessionChange) {
        if let Some(shared) = self.shared.upgrade() {
            shared.notify(change);
        }
    }

    /// Rebuilds the coordinator's HTTP client from the current token state.
    pub fn configure_http_client(&self) -> Option<HttpClient> {
        self.shared.upgrade().map(|shared| shared.configure_http_client())
    }

    pub(crate) fn current_auth_driver(&self) -> Option<Arc<dyn AuthDriver>> {
        self.shared.upgrade()?.current_auth_driver()
    }
}

/// Owns the driver registry and ties the active driver to the HTTP client.
#[derive(Clone)]
pub struct SessionCoordinator {
    shared: Arc<Shared>,
}

impl SessionCoordinator {
    pub fn builder() -> SessionCoordinatorBuilder {
        SessionCoordinatorBuilder::default()
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle { shared: Arc::downgrade(&self.shared) }
    }

    /// Registered style names in registration order.
    pub fn styles(&self) -> Vec<String> {
        self.shared.registry.styles()
    }

    pub fn base_url(&self) -> &str {
        &self.shared.base_url
    }

    pub fn current_auth_style(&self) -> Option<String> {
        self.shared.current_auth_style()
    }

    pub fn set_current_auth_style(&self, style: &str) -> Result<()> {
        self.shared.store.set(SessionField::AuthStyle, style)?;
        self.shared.notify(SessionChange::CurrentAuthStyle(Some(style.to_string())));
        Ok(())
    }

    /// The driver for the current style. `None` means logged out.
    pub fn current_auth_driver(&self) -> Option<Arc<dyn AuthDriver>> {
        self.shared.current_auth_driver()
    }

    pub fn id_token(&self) -> Option<String> {
        self.current_auth_driver().and_then(|driver| driver.id_token())
    }

    /// `Ok(None)` without an active driver; an active driver holding no token is an error.
    pub fn decoded_token(&self) -> Result<Option<DecodedToken>> {
        self.current_auth_driver()
            .map(|driver| driver.decoded_token())
            .transpose()
    }

    /// Selects `style` and starts its interactive login.
    ///
    /// An unregistered style is still persisted, but no login happens.
    pub fn login(&self, style: &str) -> Result<()> {
        self.set_current_auth_style(style)?;
        match self.current_auth_driver() {
            Some(driver) => driver.login(false),
            None => {
                debug!(style, "No driver registered for style, login skipped");
                Ok(())
            }
        }
    }

    pub fn logout(&self) -> Result<()> {
        let Some(driver) = self.current_auth_driver() else {
            return Ok(());
        };
        driver.logout()?;
        if let Some(client) = self.http() {
            client.remove_default_header(AUTHORIZATION);
        }
        self.shared.notify(SessionChange::CurrentAuthStyle(None));
        Ok(())
    }

    pub fn configure_http_client(&self) -> HttpClient {
        self.shared.configure_http_client()
    }

    /// The client built by the last [`configure_http_client`](Self::configure_http_client).
    pub fn http(&self) -> Option<HttpClient> {
        self.shared.http.read().clone()
    }
}

/// Builder for [`SessionCoordinator`], configured the way middleware layers are.
#[derive(Default)]
pub struct SessionCoordinatorBuilder {
    registry: DriverRegistry,
    base_url: Option<String>,
    store: Option<SessionStore>,
    transport: Option<Arc<dyn HttpTransport>>,
    observer: Option<Arc<dyn SessionObserver>>,
    config: SessionConfig,
}

impl SessionCoordinatorBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn driver(mut self, style: impl Into<String>, driver: Arc<dyn AuthDriver>) -> Self {
        self.registry = self.registry.register(style, driver);
        self
    }

    pub fn registry(mut self, registry: DriverRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Settings from a config file. An explicit `base_url` call takes precedence.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the options, then initializes the driver of a previously selected style.
    pub fn build(self) -> Result<SessionCoordinator> {
        if self.registry.is_empty() {
            return Err(AuthError::MissingOption("auth_styles"));
        }
        let base_url = self
            .base_url
            .or(self.config.base_url)
            .ok_or(AuthError::MissingOption("base_url"))?;
        let store = self.store.ok_or(AuthError::MissingOption("store"))?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };
        let coordinator = SessionCoordinator {
            shared: Arc::new(Shared {
                registry: self.registry,
                base_url,
                store,
                transport,
                observer: self.observer,
                retry_on_unauthorized: self.config.retry_on_unauthorized,
                http: RwLock::new(None),
            }),
        };
        let style = coordinator.current_auth_style();
        coordinator
            .shared
            .notify(SessionChange::CurrentAuthStyle(style.clone()));
        if let Some(driver) = coordinator.current_auth_driver() {
            debug!(style = style.as_deref().unwrap_or_default(), "Initializing persisted auth style");
            if let Err(err) = driver.init(coordinator.handle()) {
                if !err.is_token_rejection() {
                    return Err(err);
                }
                warn!(error = %err, "Discarded token during init, session stays logged out");
            }
        }
        Ok(coordinator)
    }
}

#[cfg(feature = "reqwest")]
fn default_transport() -> Result<Arc<dyn HttpTransport>> {
    Ok(Arc::new(super::http_client::ReqwestTransport::default()))
}

#[cfg(not(feature = "reqwest"))]
fn default_transport() -> Result<Arc<dyn HttpTransport>> {
    Err(AuthError::MissingOption("transport"))
}
