//! Implicit-flow OIDC driver: full-page redirects for login and logout,
//! a hidden frame for silent renewal.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use super::options::{RedirectOidcOptions, ResolvedOptions};
use super::{renewal, uri};
use crate::auth_core::codec::decode_token;
use crate::auth_core::coordinator::SessionHandle;
use crate::auth_core::crypto::{generate_nonce, nonce_matches};
use crate::auth_core::driver::AuthDriver;
use crate::auth_core::error::{AuthError, Result};
use crate::auth_core::fragment::RedirectFragment;
use crate::auth_core::navigation::NavigationEnvironment;
use crate::auth_core::observer::SessionChange;
use crate::auth_core::storage::{SessionField, SessionStore};

pub struct RedirectOidcDriver {
    options: ResolvedOptions,
    store: SessionStore,
    navigator: Arc<dyn NavigationEnvironment>,
    id_token: RwLock<Option<String>>,
    session: RwLock<SessionHandle>,
    // Serializes renewals; the counter lets waiters see that one finished meanwhile.
    renewal_gate: tokio::sync::Mutex<()>,
    renewals: AtomicU64,
    // Token of the last finished renewal, `None` if it failed.
    last_renewal: RwLock<Option<String>>,
}

impl RedirectOidcDriver {
    /// Validates `options`; tenant, client id and redirect URI are required.
    pub fn new(
        options: RedirectOidcOptions,
        store: SessionStore,
        navigator: Arc<dyn NavigationEnvironment>,
    ) -> Result<Self> {
        let options = options.resolve()?;
        debug!(tenant = %options.tenant, client_id = %options.client_id, "Created redirect OIDC driver");
        Ok(Self {
            options,
            store,
            navigator,
            id_token: RwLock::new(None),
            session: RwLock::new(SessionHandle::detached()),
            renewal_gate: tokio::sync::Mutex::new(()),
            renewals: AtomicU64::new(0),
            last_renewal: RwLock::new(None),
        })
    }

    pub fn tenant(&self) -> &str {
        &self.options.tenant
    }

    pub fn client_id(&self) -> &str {
        &self.options.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.options.redirect_uri
    }

    /// The pending nonce of the latest login attempt.
    pub fn nonce(&self) -> Option<String> {
        self.store.get(SessionField::Nonce)
    }

    /// Generates and persists a fresh nonce, then returns the authorize URI carrying it.
    pub fn make_login_uri(&self, silent: bool) -> Result<String> {
        let nonce = generate_nonce()?;
        self.store.set(SessionField::Nonce, &nonce)?;
        Ok(uri::login_uri(&self.options, &nonce, silent))
    }

    pub fn logout_uri(&self) -> String {
        uri::logout_uri(&self.options)
    }

    fn session(&self) -> SessionHandle {
        self.session.read().clone()
    }

    fn resolve_initial_token(&self) -> Result<()> {
        let Some(fragment) = RedirectFragment::parse(&self.navigator.current_fragment()) else {
            if let Some(token) = self.store.get(SessionField::IdToken) {
                debug!("Restoring persisted id token");
                self.set_id_token(&token)?;
            }
            return Ok(());
        };
        let code = self.options.interaction_required_code.as_str();
        if fragment
            .error_description()
            .is_some_and(|description| description.contains(code))
        {
            info!(code, "Silent login needs interaction, retrying interactively");
            self.login(false)?;
        } else if fragment.is_error() {
            warn!(
                error = fragment.error().unwrap_or_default(),
                description = fragment.error_description().unwrap_or_default(),
                "Identity provider returned an error"
            );
        }
        if let Some(token) = fragment.id_token() {
            self.set_id_token(token)?;
        }
        Ok(())
    }

    async fn renew_silently(&self) -> Result<String> {
        let login_uri = self.make_login_uri(true)?;
        let mut frame = self.navigator.open_silent_frame().await?;
        let timeout = self.options.silent_renewal_timeout;
        let outcome = tokio::time::timeout(timeout, renewal::run(frame.as_mut(), &login_uri)).await;
        frame.detach();

        let Ok(result) = outcome else {
            warn!(?timeout, "Silent renewal timed out, falling back to interactive login");
            self.login(false)?;
            return Err(AuthError::RenewalTimedOut(timeout));
        };
        let fragment = result?;
        let token = fragment
            .as_ref()
            .filter(|fragment| !fragment.is_error())
            .and_then(RedirectFragment::id_token);
        match token {
            Some(token) => {
                self.set_id_token(token)?;
                info!("Silent renewal succeeded");
                Ok(token.to_string())
            }
            None => {
                warn!(
                    error = fragment
                        .as_ref()
                        .and_then(RedirectFragment::error_description)
                        .unwrap_or("no response"),
                    "Silent renewal failed, falling back to interactive login"
                );
                self.login(false)?;
                Err(AuthError::InteractiveLoginRequired)
            }
        }
    }
}

#[async_trait]
impl AuthDriver for RedirectOidcDriver {
    fn id_token(&self) -> Option<String> {
        self.id_token.read().clone()
    }

    fn set_id_token(&self, token: &str) -> Result<()> {
        let decoded = decode_token(token)?;
        let pending = self.store.get(SessionField::Nonce);
        if !nonce_matches(decoded.nonce(), pending.as_deref()) {
            warn!(has_pending = pending.is_some(), "Rejected id token with mismatched nonce");
            return Err(AuthError::NonceMismatch);
        }
        self.store.set(SessionField::IdToken, token)?;
        *self.id_token.write() = Some(token.to_string());
        let session = self.session();
        session.notify(SessionChange::IdToken(Some(token.to_string())));
        session.notify(SessionChange::DecodedToken(Some(decoded)));
        debug!("Adopted id token");
        Ok(())
    }

    fn init(&self, session: SessionHandle) -> Result<()> {
        *self.session.write() = session.clone();
        let outcome = self.resolve_initial_token();
        // The client must reflect whatever state was resolved, even none.
        session.configure_http_client();
        outcome
    }

    fn login(&self, silent: bool) -> Result<()> {
        let uri = self.make_login_uri(silent)?;
        info!(silent, "Redirecting to identity provider login");
        self.navigator.navigate_to(&uri)
    }

    #[instrument(skip(self), level = "debug")]
    async fn background_login(&self) -> Result<String> {
        let observed = self.renewals.load(Ordering::Acquire);
        let _gate = self.renewal_gate.lock().await;
        if self.renewals.load(Ordering::Acquire) != observed {
            let last = self.last_renewal.read().clone();
            return match last {
                Some(token) => {
                    debug!("Reusing token from a renewal that finished while waiting");
                    Ok(token)
                }
                None => {
                    debug!("Renewal that finished while waiting failed, not retrying");
                    Err(AuthError::InteractiveLoginRequired)
                }
            };
        }
        let outcome = self.renew_silently().await;
        *self.last_renewal.write() = outcome.as_ref().ok().cloned();
        self.renewals.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    fn logout(&self) -> Result<()> {
        self.store.clear_all()?;
        *self.id_token.write() = None;
        let session = self.session();
        session.notify(SessionChange::IdToken(None));
        session.notify(SessionChange::DecodedToken(None));
        info!("Logging out at identity provider");
        self.navigator.navigate_to(&self.logout_uri())
    }
}
