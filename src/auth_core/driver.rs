use async_trait::async_trait;

use super::codec::decode_token;
use super::coordinator::SessionHandle;
use super::error::{AuthError, Result};
use super::types::DecodedToken;

/// One identity provider's login, renewal and logout flow.
#[async_trait]
pub trait AuthDriver: Send + Sync + 'static {
    /// The token currently held, if any.
    fn id_token(&self) -> Option<String>;

    /// Adopts `token` after checking its nonce against the pending nonce.
    ///
    /// Fails with [`AuthError::NonceMismatch`] without touching any state when they differ.
    fn set_id_token(&self, token: &str) -> Result<()>;

    /// Header and payload of the held token. Calling this while logged out is an error.
    fn decoded_token(&self) -> Result<DecodedToken> {
        let token = self.id_token().ok_or(AuthError::NotLoggedIn)?;
        decode_token(&token)
    }

    /// Activates the driver: resolves a returning redirect or a persisted token,
    /// then configures the session's HTTP client.
    fn init(&self, session: SessionHandle) -> Result<()>;

    /// Starts an interactive login by navigating away.
    fn login(&self, silent: bool) -> Result<()>;

    /// Renews the token without leaving the page.
    async fn background_login(&self) -> Result<String>;

    /// Forgets the session and navigates to the provider's logout page.
    fn logout(&self) -> Result<()>;
}
