//! Session core: storage, token codec, driver abstraction, coordinator and HTTP retry.

pub mod client;
pub mod codec;
pub mod config;
pub mod coordinator;
pub mod crypto;
pub mod driver;
pub mod error;
pub mod fragment;
pub mod http_client;
pub mod interceptor;
pub mod navigation;
pub mod observer;
pub mod storage;
pub mod types;
