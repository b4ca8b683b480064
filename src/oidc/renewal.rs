//! The silent renewal frame flow as an explicit state machine.

use tracing::debug;

use crate::auth_core::error::Result;
use crate::auth_core::fragment::RedirectFragment;
use crate::auth_core::navigation::{FrameLocation, RESET_URL, SilentFrame};

#[derive(Debug)]
enum RenewalStep {
    /// Park the frame on a neutral page so the next load is observable.
    ResetNavigation,
    SilentNavigation,
    ParseResult(FrameLocation),
}

/// Drives `frame` through reset, silent login and parsing, strictly in that order.
///
/// Returns the provider's fragment, or `None` if the frame came back without one.
pub(crate) async fn run(frame: &mut dyn SilentFrame, login_uri: &str) -> Result<Option<RedirectFragment>> {
    let mut step = RenewalStep::ResetNavigation;
    loop {
        step = match step {
            RenewalStep::ResetNavigation => {
                frame.navigate(RESET_URL).await?;
                debug!("Silent frame reset");
                RenewalStep::SilentNavigation
            }
            RenewalStep::SilentNavigation => {
                let location = frame.navigate(login_uri).await?;
                debug!(has_fragment = !location.fragment.is_empty(), "Silent login page loaded");
                RenewalStep::ParseResult(location)
            }
            RenewalStep::ParseResult(location) => {
                return Ok(RedirectFragment::parse(&location.fragment));
            }
        };
    }
}
