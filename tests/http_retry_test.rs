mod common;

use std::sync::Arc;

use starberry_auth::{
    AuthDriver, AuthError, FrameLocation, HttpMethod, HttpRequest, HttpResponse, InMemoryNavigator,
    InMemoryTransport, RedirectOidcDriver, RedirectOidcOptions, SessionConfig, SessionCoordinator, SessionField,
    SessionStore,
};

use common::{TestDriver, make_token, query_param};

fn coordinator_with(driver: Arc<dyn AuthDriver>, transport: &InMemoryTransport, config: SessionConfig) -> SessionCoordinator {
    let store = SessionStore::in_memory();
    store.set(SessionField::AuthStyle, "TEST").unwrap();
    SessionCoordinator::builder()
        .base_url("https://api.local")
        .config(config)
        .driver("TEST", driver)
        .store(store)
        .transport(Arc::new(transport.clone()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_unauthorized_renews_and_retries_once() {
    let driver = Arc::new(TestDriver::new(Some("stale"), "fresh"));
    let transport = InMemoryTransport::new();
    transport.push_response(HttpResponse::new(401));
    transport.push_response(HttpResponse::new(200).with_body("ok"));
    let coordinator = coordinator_with(driver.clone(), &transport, SessionConfig::default());
    let http = coordinator.http().unwrap();

    let response = http.get("/items").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"ok");
    assert_eq!(TestDriver::count(&driver.background_logins), 1);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header_value("Authorization"), Some("Bearer stale"));
    assert_eq!(requests[1].header_value("Authorization"), Some("Bearer fresh"));
    assert_eq!(requests[1].url, "https://api.local/items");
    assert_eq!(http.default_header("Authorization").as_deref(), Some("Bearer fresh"));
}

#[tokio::test]
async fn test_other_errors_propagate_without_renewal() {
    let driver = Arc::new(TestDriver::new(Some("stale"), "fresh"));
    let transport = InMemoryTransport::new();
    transport.push_response(HttpResponse::new(500));
    let coordinator = coordinator_with(driver.clone(), &transport, SessionConfig::default());

    let err = coordinator.http().unwrap().get("/items").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(!err.is_unauthorized());
    assert_eq!(TestDriver::count(&driver.background_logins), 0);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_transport_errors_propagate() {
    let driver = Arc::new(TestDriver::new(Some("stale"), "fresh"));
    let transport = InMemoryTransport::new();
    let coordinator = coordinator_with(driver.clone(), &transport, SessionConfig::default());

    let err = coordinator.http().unwrap().get("/items").await.unwrap_err();

    assert!(matches!(err, AuthError::Transport(_)));
    assert_eq!(TestDriver::count(&driver.background_logins), 0);
}

#[tokio::test]
async fn test_second_unauthorized_is_not_retried_again() {
    let driver = Arc::new(TestDriver::new(Some("stale"), "fresh"));
    let transport = InMemoryTransport::new();
    transport.push_response(HttpResponse::new(401));
    transport.push_response(HttpResponse::new(401));
    transport.push_response(HttpResponse::new(200));
    let coordinator = coordinator_with(driver.clone(), &transport, SessionConfig::default());

    let err = coordinator.http().unwrap().get("/items").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(TestDriver::count(&driver.background_logins), 1);
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_retry_keeps_only_allowed_headers() {
    let driver = Arc::new(TestDriver::new(Some("stale"), "fresh"));
    let transport = InMemoryTransport::new();
    transport.push_response(HttpResponse::new(401));
    transport.push_response(HttpResponse::new(201));
    let coordinator = coordinator_with(driver, &transport, SessionConfig::default());

    let request = HttpRequest::new(HttpMethod::POST, "/items")
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
        .header("X-Trace", "abc")
        .body(r#"{"name":"widget"}"#);
    let response = coordinator.http().unwrap().request(request).await.unwrap();
    assert_eq!(response.status, 201);

    let requests = transport.requests();
    let retry = &requests[1];
    assert_eq!(retry.method, HttpMethod::POST);
    assert_eq!(retry.header_value("Accept"), Some("application/json"));
    assert_eq!(retry.header_value("Content-Type"), Some("application/json"));
    assert_eq!(retry.header_value("Authorization"), Some("Bearer fresh"));
    assert!(retry.header_value("X-Trace").is_none());
    assert_eq!(retry.body.as_deref(), Some(br#"{"name":"widget"}"#.as_slice()));
}

#[tokio::test]
async fn test_retry_disabled_by_config() {
    let driver = Arc::new(TestDriver::new(Some("stale"), "fresh"));
    let transport = InMemoryTransport::new();
    transport.push_response(HttpResponse::new(401));
    let config = SessionConfig::default().retry_on_unauthorized(false);
    let coordinator = coordinator_with(driver.clone(), &transport, config);

    let err = coordinator.http().unwrap().get("/items").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(TestDriver::count(&driver.background_logins), 0);
}

#[tokio::test]
async fn test_unauthorized_after_logout_propagates() {
    let driver = Arc::new(TestDriver::new(Some("stale"), "fresh"));
    let transport = InMemoryTransport::new();
    transport.push_response(HttpResponse::new(401));
    let coordinator = coordinator_with(driver.clone(), &transport, SessionConfig::default());
    let http = coordinator.http().unwrap();
    coordinator.set_current_auth_style("unknown").unwrap();

    let err = http.get("/items").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(TestDriver::count(&driver.background_logins), 0);
}

#[tokio::test]
async fn test_redirect_driver_renews_through_silent_frame() {
    let store = SessionStore::in_memory();
    store.set(SessionField::AuthStyle, "AAD").unwrap();
    store.set(SessionField::Nonce, "n0").unwrap();
    store.set(SessionField::IdToken, &make_token("n0")).unwrap();
    let navigator = InMemoryNavigator::new().with_responder(|url| {
        let nonce = query_param(url, "nonce").unwrap_or_default();
        FrameLocation::new("https://app.local/", format!("#id_token={}", make_token(&nonce)))
    });
    let options = RedirectOidcOptions::new()
        .tenant("contoso")
        .client_id("client")
        .redirect_uri("https://app.local/");
    let driver = Arc::new(RedirectOidcDriver::new(options, store.clone(), Arc::new(navigator.clone())).unwrap());
    let transport = InMemoryTransport::new();
    transport.push_response(HttpResponse::new(401));
    transport.push_response(HttpResponse::new(200));
    let coordinator = SessionCoordinator::builder()
        .base_url("https://api.local")
        .driver("AAD", driver.clone())
        .store(store.clone())
        .transport(Arc::new(transport.clone()))
        .build()
        .unwrap();

    coordinator.http().unwrap().get("/items").await.unwrap();

    let renewed = driver.id_token().unwrap();
    assert_ne!(renewed, make_token("n0"));
    assert_eq!(store.get(SessionField::IdToken), Some(renewed.clone()));
    assert_eq!(navigator.frames_opened(), 1);
    assert_eq!(navigator.frames_detached(), 1);
    let requests = transport.requests();
    assert_eq!(requests[1].header_value("Authorization"), Some(format!("Bearer {}", renewed).as_str()));
}

#[tokio::test]
async fn test_failed_renewal_surfaces_driver_error() {
    let store = SessionStore::in_memory();
    store.set(SessionField::AuthStyle, "AAD").unwrap();
    let navigator = InMemoryNavigator::new()
        .with_responder(|_| FrameLocation::new("https://app.local/", "#error=login_required"));
    let options = RedirectOidcOptions::new()
        .tenant("contoso")
        .client_id("client")
        .redirect_uri("https://app.local/");
    let driver = Arc::new(RedirectOidcDriver::new(options, store.clone(), Arc::new(navigator.clone())).unwrap());
    let transport = InMemoryTransport::new();
    transport.push_response(HttpResponse::new(401));
    let coordinator = SessionCoordinator::builder()
        .base_url("https://api.local")
        .driver("AAD", driver)
        .store(store)
        .transport(Arc::new(transport.clone()))
        .build()
        .unwrap();

    let err = coordinator.http().unwrap().get("/items").await.unwrap_err();

    assert!(matches!(err, AuthError::InteractiveLoginRequired));
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(navigator.navigations().len(), 1);
}
