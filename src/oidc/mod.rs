//! Redirect-based OpenID Connect driver.

pub mod options;
pub mod redirect_driver;
mod renewal;
mod uri;

pub use options::RedirectOidcOptions;
pub use redirect_driver::RedirectOidcDriver;
