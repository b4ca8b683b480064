//! Navigation capabilities standing in for the browser window and hidden frames.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::Result;

/// Neutral page a silent frame is reset to before each renewal.
pub const RESET_URL: &str = "about:blank";

/// Where a frame ended up after a navigation settled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameLocation {
    pub url: String,
    /// Fragment including the leading `#`, or empty.
    pub fragment: String,
}

impl FrameLocation {
    pub fn new(url: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self { url: url.into(), fragment: fragment.into() }
    }
}

/// An off-screen navigable surface.
#[async_trait]
pub trait SilentFrame: Send {
    /// Navigates and resolves once the target has loaded.
    async fn navigate(&mut self, url: &str) -> Result<FrameLocation>;

    /// Removes the frame. Called exactly once per opened frame.
    fn detach(&mut self);
}

/// The page the session lives in.
#[async_trait]
pub trait NavigationEnvironment: Send + Sync + 'static {
    /// Fragment of the current location including `#`, or empty.
    fn current_fragment(&self) -> String;

    /// Full-page navigation replacing the current entry. In a browser control leaves the page.
    fn navigate_to(&self, uri: &str) -> Result<()>;

    /// Attaches a hidden frame for silent renewal.
    async fn open_silent_frame(&self) -> Result<Box<dyn SilentFrame>>;
}

type Responder = dyn Fn(&str) -> FrameLocation + Send + Sync;

#[derive(Default)]
struct NavigatorState {
    fragment: Mutex<String>,
    navigations: Mutex<Vec<String>>,
    frame_navigations: Mutex<Vec<String>>,
    frames_opened: AtomicUsize,
    frames_detached: AtomicUsize,
}

/// Scriptable environment for tests and headless use.
///
/// Page navigations are recorded. Silent frames answer `about:blank` directly and
/// every other URL through the configured responder, which plays the identity provider.
#[derive(Clone, Default)]
pub struct InMemoryNavigator {
    state: Arc<NavigatorState>,
    responder: Option<Arc<Responder>>,
    hang: bool,
}

impl InMemoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts on a page whose location carries `fragment`.
    pub fn with_fragment(fragment: impl Into<String>) -> Self {
        let navigator = Self::default();
        navigator.set_fragment(fragment);
        navigator
    }

    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str) -> FrameLocation + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    /// Silent frames never finish loading the provider page.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn set_fragment(&self, fragment: impl Into<String>) {
        *self.state.fragment.lock() = fragment.into();
    }

    /// Full-page navigations, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.state.navigations.lock().clone()
    }

    /// Navigations performed inside silent frames, in order.
    pub fn frame_navigations(&self) -> Vec<String> {
        self.state.frame_navigations.lock().clone()
    }

    pub fn frames_opened(&self) -> usize {
        self.state.frames_opened.load(Ordering::SeqCst)
    }

    pub fn frames_detached(&self) -> usize {
        self.state.frames_detached.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NavigationEnvironment for InMemoryNavigator {
    fn current_fragment(&self) -> String {
        self.state.fragment.lock().clone()
    }

    fn navigate_to(&self, uri: &str) -> Result<()> {
        self.state.navigations.lock().push(uri.to_string());
        Ok(())
    }

    async fn open_silent_frame(&self) -> Result<Box<dyn SilentFrame>> {
        self.state.frames_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryFrame {
            state: self.state.clone(),
            responder: self.responder.clone(),
            hang: self.hang,
            detached: false,
        }))
    }
}

struct InMemoryFrame {
    state: Arc<NavigatorState>,
    responder: Option<Arc<Responder>>,
    hang: bool,
    detached: bool,
}

#[async_trait]
impl SilentFrame for InMemoryFrame {
    async fn navigate(&mut self, url: &str) -> Result<FrameLocation> {
        self.state.frame_navigations.lock().push(url.to_string());
        // Loads complete asynchronously, as they would in a real frame.
        tokio::task::yield_now().await;
        if url == RESET_URL {
            return Ok(FrameLocation::new(RESET_URL, ""));
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(match &self.responder {
            Some(responder) => responder(url),
            None => FrameLocation::new(url, ""),
        })
    }

    fn detach(&mut self) {
        if !self.detached {
            self.detached = true;
            self.state.frames_detached.fetch_add(1, Ordering::SeqCst);
        }
    }
}
