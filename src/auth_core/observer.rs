//! Change notifications for reactive consumers of the session.

use tokio::sync::watch;

use super::types::DecodedToken;

/// A reactive property changed value.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    IdToken(Option<String>),
    DecodedToken(Option<DecodedToken>),
    CurrentAuthStyle(Option<String>),
}

impl SessionChange {
    pub fn property_name(&self) -> &'static str {
        match self {
            Self::IdToken(_) => "idToken",
            Self::DecodedToken(_) => "decodedToken",
            Self::CurrentAuthStyle(_) => "currentAuthStyle",
        }
    }
}

/// Receives every [`SessionChange`]. Called synchronously; implementations must not block.
pub trait SessionObserver: Send + Sync + 'static {
    fn on_change(&self, change: SessionChange);
}

/// The reactive view of a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub id_token: Option<String>,
    pub decoded_token: Option<DecodedToken>,
    pub current_auth_style: Option<String>,
}

impl SessionSnapshot {
    pub fn apply(&mut self, change: SessionChange) {
        match change {
            SessionChange::IdToken(token) => self.id_token = token,
            SessionChange::DecodedToken(decoded) => self.decoded_token = decoded,
            SessionChange::CurrentAuthStyle(style) => self.current_auth_style = style,
        }
    }
}

/// Observer publishing a [`SessionSnapshot`] through a `watch` channel.
pub struct WatchObserver {
    tx: watch::Sender<SessionSnapshot>,
}

impl WatchObserver {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }
}

impl Default for WatchObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionObserver for WatchObserver {
    fn on_change(&self, change: SessionChange) {
        self.tx.send_modify(|snapshot| snapshot.apply(change));
    }
}
