//! End-to-end pipeline tests: scan admission through the validation client
//! into the offline queue and history.

use std::net::TcpListener;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zatix_core::FormatError;
use zatix_validation::{
    Config, MemoryStore, StoredTokenProvider, ValidationDisposition, ValidationError,
    ValidationService,
};

fn test_config(base_url: String) -> Config {
    Config {
        api_base_url: base_url,
        api_timeout: Duration::from_secs(2),
        ..Config::default()
    }
}

async fn service_for(
    base_url: String,
    store: MemoryStore,
) -> ValidationService<MemoryStore> {
    StoredTokenProvider::new(store.clone())
        .store_token("tok-1")
        .await
        .unwrap();
    ValidationService::new(&test_config(base_url), store).await
}

fn success_body(ticket: &str) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "message": "Ticket validated successfully",
        "data": { "ticket_code": ticket, "event_name": "Music Fest" }
    })
}

#[tokio::test]
async fn duplicate_scan_reaches_the_client_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/e-tickets/validate"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ZTX-AB12")))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(server.uri(), MemoryStore::new()).await;

    let first = service.handle_scan("ZTX-AB12", true, false).await.unwrap();
    assert!(matches!(
        first,
        Some(ValidationDisposition::Validated(_))
    ));

    // Same code inside the cooldown window: dropped before any I/O.
    let second = service.handle_scan("ZTX-AB12", true, false).await.unwrap();
    assert!(second.is_none());

    assert_eq!(service.history().len(), 1);
    assert_eq!(service.validation_stats().total_validations, 1);
}

#[tokio::test]
async fn inactive_or_loading_scanner_accepts_nothing() {
    // No server: an admitted scan would fail loudly.
    let service = service_for("http://127.0.0.1:1".into(), MemoryStore::new()).await;

    assert!(service
        .handle_scan("ZTX-AB12", false, false)
        .await
        .unwrap()
        .is_none());
    assert!(service
        .handle_scan("ZTX-AB12", true, true)
        .await
        .unwrap()
        .is_none());
    assert_eq!(service.queue_stats().total, 0);
}

#[tokio::test]
async fn unrecognized_scan_is_reported_every_time() {
    let service = service_for("http://127.0.0.1:1".into(), MemoryStore::new()).await;

    for _ in 0..2 {
        let err = service
            .handle_scan("not a ticket", true, false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Format(FormatError::Unrecognized)
        ));
    }
    // Format failures are never queued.
    assert_eq!(service.queue_stats().total, 0);
}

#[tokio::test]
async fn manual_entry_enforces_the_strict_grammar() {
    let service = service_for("http://127.0.0.1:1".into(), MemoryStore::new()).await;

    let err = service.handle_manual_entry("ZTX-AB12").await.unwrap_err();
    assert!(matches!(
        err,
        ValidationError::Format(FormatError::InvalidManualCode)
    ));
}

#[tokio::test]
async fn transport_failure_becomes_a_queued_disposition() {
    let service = service_for("http://127.0.0.1:1".into(), MemoryStore::new()).await;

    let disposition = service
        .handle_scan(r#"{"ticket_code":"ztx-abc123"}"#, true, false)
        .await
        .unwrap()
        .expect("scan admitted");

    match disposition {
        ValidationDisposition::Queued { queue_len } => assert_eq!(queue_len, 1),
        other => panic!("expected Queued, got {other:?}"),
    }

    let stats = service.queue_stats();
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.total, 1);
    // Nothing reached history: the server never answered.
    assert!(service.history().is_empty());
}

#[tokio::test]
async fn queued_attempt_drains_once_the_server_is_back() {
    // Reserve a port, then release it so the first call gets refused.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = MemoryStore::new();
    let service = service_for(format!("http://{addr}"), store).await;

    let disposition = service
        .handle_manual_entry("ZTX-LIRGSH9MMA")
        .await
        .unwrap();
    assert!(matches!(disposition, ValidationDisposition::Queued { .. }));

    // Server comes back on the same port.
    let listener = TcpListener::bind(addr).unwrap();
    let server = MockServer::builder().listener(listener).start().await;
    Mock::given(method("POST"))
        .and(path("/e-tickets/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ZTX-LIRGSH9MMA")))
        .expect(1)
        .mount(&server)
        .await;

    let report = service.drain_queue().await;
    assert_eq!(report.successes.len(), 1);
    assert_eq!(report.failed, 0);

    // Drained successes land in history like live ones.
    assert_eq!(service.history().len(), 1);
    assert_eq!(
        service.history()[0].ticket_code.as_str(),
        "ZTX-LIRGSH9MMA"
    );
    assert_eq!(service.queue_stats().pending, 0);
}

#[tokio::test]
async fn application_rejection_surfaces_to_the_caller() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/e-tickets/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "message": "Ticket already validated",
            "data": null
        })))
        .mount(&server)
        .await;

    let service = service_for(server.uri(), MemoryStore::new()).await;
    let err = service
        .handle_manual_entry("ZTX-LIRGSH9MMA")
        .await
        .unwrap_err();

    assert!(matches!(err, ValidationError::Client(_)));
    // Application failures are never queued.
    assert_eq!(service.queue_stats().total, 0);
}

#[tokio::test]
async fn login_persists_the_session_and_logout_clears_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "ok",
            "data": {
                "access_token": "tok-fresh",
                "token_type": "Bearer",
                "user": { "id": 9, "name": "Crew Keren", "email": "crew.keren@zatix.id", "roles": ["crew"] }
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/e-tickets/validate"))
        .and(header("authorization", "Bearer tok-fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ZTX-AB12")))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let service = ValidationService::new(&test_config(server.uri()), store).await;

    let user = service.login("crew.keren@zatix.id", "password123").await.unwrap();
    assert_eq!(user.name, "Crew Keren");
    assert_eq!(service.current_user().await.unwrap().id, 9);

    // The fresh token is attached to subsequent validations.
    let outcome = service.handle_scan("ZTX-AB12", true, false).await.unwrap();
    assert!(matches!(
        outcome,
        Some(ValidationDisposition::Validated(_))
    ));

    service.logout().await;
    assert!(service.current_user().await.is_none());
}

#[tokio::test]
async fn scanner_deactivation_resets_the_gate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/e-tickets/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ZTX-AB12")))
        .expect(2)
        .mount(&server)
        .await;

    let service = service_for(server.uri(), MemoryStore::new()).await;

    assert!(service.handle_scan("ZTX-AB12", true, false).await.unwrap().is_some());

    // Deactivation cancels the cooldown; the same code is admitted afresh.
    service.deactivate_scanner();
    assert!(service.handle_scan("ZTX-AB12", true, false).await.unwrap().is_some());
}
