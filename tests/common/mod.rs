#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use parking_lot::Mutex;
use serde_json::{Value, json};
use starberry_auth::{AuthDriver, Result, SessionChange, SessionHandle};

/// Unsigned token whose payload carries `nonce`.
pub fn make_token(nonce: &str) -> String {
    make_token_with(json!({ "nonce": nonce, "sub": "user-1", "exp": 4102444800u64 }))
}

pub fn make_token_with(payload: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
    format!("{}.{}.signature", header, payload)
}

pub fn query_param(uri: &str, key: &str) -> Option<String> {
    let (_, query) = uri.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}

/// Driver double that counts calls and renews to a fixed token.
pub struct TestDriver {
    token: Mutex<Option<String>>,
    renewed: String,
    pub inits: AtomicUsize,
    pub logins: AtomicUsize,
    pub logouts: AtomicUsize,
    pub background_logins: AtomicUsize,
}

impl TestDriver {
    pub fn new(token: Option<&str>, renewed: &str) -> Self {
        Self {
            token: Mutex::new(token.map(str::to_string)),
            renewed: renewed.to_string(),
            inits: AtomicUsize::new(0),
            logins: AtomicUsize::new(0),
            logouts: AtomicUsize::new(0),
            background_logins: AtomicUsize::new(0),
        }
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthDriver for TestDriver {
    fn id_token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn set_id_token(&self, token: &str) -> Result<()> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn init(&self, session: SessionHandle) -> Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        session.notify(SessionChange::IdToken(self.id_token()));
        session.configure_http_client();
        Ok(())
    }

    fn login(&self, _silent: bool) -> Result<()> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn background_login(&self) -> Result<String> {
        self.background_logins.fetch_add(1, Ordering::SeqCst);
        self.set_id_token(&self.renewed)?;
        Ok(self.renewed.clone())
    }

    fn logout(&self) -> Result<()> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        *self.token.lock() = None;
        Ok(())
    }
}
