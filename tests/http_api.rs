//! HTTP surface end to end: mock signer, mock identity service, fake chain.

mod common;

use alloy::primitives::keccak256;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use tower::ServiceExt;

use common::{TestApp, ALICE, ALICE_TOKEN, CHAIN_ID, CUSTODIAL_ADDRESS};

async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_garbage_body_returns_failure_envelope() {
    let app = TestApp::start().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/execute")
        .body(Body::from("not json at all"))
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let envelope: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(envelope["status"], "failure");
    assert_eq!(envelope["payload"]["errorKind"], "InvalidArguments");
    assert!(envelope["payload"].get("transactionHash").is_none());
}

#[tokio::test]
async fn test_execute_end_to_end() {
    let app = TestApp::start().await;
    let (status, envelope) = send(
        app.router(),
        Method::POST,
        "/api/v1/execute",
        Some(json!({
            "actionKey": "3_transfer_0",
            "args": {
                "to": "0x2222222222222222222222222222222222222222",
                "amount": "1000"
            },
            "identityToken": ALICE_TOKEN,
            "pin": "1234"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["status"], "success", "{envelope}");
    let expected_hash = keccak256([0x02, 0xf8, 0x6b, 0x01, 0x02]);
    assert_eq!(envelope["payload"]["transactionHash"], expected_hash.to_string());
    assert_eq!(envelope["payload"]["blockNumber"], 42);
    assert_eq!(
        envelope["message"],
        format!("Successfully added transaction {expected_hash}")
    );
    assert_eq!(app.chain.sent_count(), 1);

    // wallet created once, with the PIN-derived context
    let created = app.signer.recorded("wallet");
    assert_eq!(created.len(), 1);
    let context = created[0].body["encryption_context"].as_str().unwrap().to_string();
    assert_eq!(context.len(), 128);

    let signed = app.signer.recorded("sign_transaction");
    assert_eq!(signed[0].body["encryption_context"], context.as_str());
    assert_eq!(signed[0].body["payload"]["nonce"], 7);
    assert_eq!(signed[0].body["payload"]["gas"], 48_000);
    assert_eq!(signed[0].body["payload"]["chainId"], CHAIN_ID);
    assert!(app.ctx.wallets.cached(ALICE).unwrap().is_some());
}

#[tokio::test]
async fn test_execute_without_token() {
    let app = TestApp::start().await;
    let (status, envelope) = send(
        app.router(),
        Method::POST,
        "/api/v1/execute",
        Some(json!({
            "actionKey": "3_transfer_0",
            "args": {
                "to": "0x2222222222222222222222222222222222222222",
                "amount": "1"
            }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["status"], "failure");
    assert_eq!(envelope["message"], "No identity token");
    assert!(app.signer.recorded("wallet").is_empty());
}

#[tokio::test]
async fn test_signing_failure_has_no_hash() {
    let app = TestApp::start().await;
    app.signer.sign_status.store(500, Ordering::SeqCst);

    let (_, envelope) = send(
        app.router(),
        Method::POST,
        "/api/v1/execute",
        Some(json!({
            "actionKey": "3_transfer_0",
            "args": {
                "to": "0x2222222222222222222222222222222222222222",
                "amount": "1"
            },
            "identityToken": ALICE_TOKEN,
            "encryptionContext": "ctx-1"
        })),
    )
    .await;

    assert_eq!(envelope["status"], "failure");
    assert_eq!(envelope["payload"]["errorKind"], "SigningError");
    assert!(envelope["payload"].get("transactionHash").is_none());
    assert_eq!(app.chain.sent_count(), 0);
}

fn transfer_request() -> Value {
    json!({
        "actionKey": "3_transfer_0",
        "args": {
            "to": "0x2222222222222222222222222222222222222222",
            "amount": "1"
        },
        "identityToken": ALICE_TOKEN,
        "encryptionContext": "ctx-1"
    })
}

#[tokio::test]
async fn test_slow_confirmation_outlives_request_timeout() {
    let app = TestApp::start_with(|config| config.listener.request_timeout_secs = 1).await;
    app.chain.inclusion_delay_ms.store(2_500, Ordering::SeqCst);

    let (status, envelope) = send(
        app.router(),
        Method::POST,
        "/api/v1/execute",
        Some(transfer_request()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["status"], "success", "{envelope}");
    assert_eq!(envelope["payload"]["blockNumber"], 42);
}

#[tokio::test]
async fn test_broadcast_timeout_reports_hash() {
    let app = TestApp::start().await;
    app.chain.broadcast_times_out.store(true, Ordering::SeqCst);

    let (status, envelope) = send(
        app.router(),
        Method::POST,
        "/api/v1/execute",
        Some(transfer_request()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["status"], "failure");
    assert_eq!(envelope["payload"]["errorKind"], "NetworkError");
    let expected_hash = keccak256([0x02, 0xf8, 0x6b, 0x01, 0x02]);
    assert_eq!(envelope["payload"]["transactionHash"], expected_hash.to_string());
}

#[tokio::test]
async fn test_unknown_action() {
    let app = TestApp::start().await;
    let (_, envelope) = send(
        app.router(),
        Method::POST,
        "/api/v1/execute",
        Some(json!({ "actionKey": "99_nothing_0", "identityToken": ALICE_TOKEN })),
    )
    .await;
    assert_eq!(envelope["payload"]["errorKind"], "UnknownAction");
}

#[tokio::test]
async fn test_wallet_endpoint() {
    let app = TestApp::start().await;

    let (status, body) = send(
        app.router(),
        Method::POST,
        "/api/v1/wallet",
        Some(json!({ "identityToken": ALICE_TOKEN })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Wallet not found and missing encryption context");

    let (status, body) = send(
        app.router(),
        Method::POST,
        "/api/v1/wallet",
        Some(json!({ "identityToken": ALICE_TOKEN, "pin": "1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["walletAddress"].as_str().unwrap().to_lowercase(),
        CUSTODIAL_ADDRESS
    );

    let (status, _) = send(
        app.router(),
        Method::POST,
        "/api/v1/wallet",
        Some(json!({ "identityToken": "forged" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_actions_and_status() {
    let app = TestApp::start().await;

    let (status, actions) = send(app.router(), Method::GET, "/api/v1/contracts/3/actions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(actions[0]["actionKey"], "3_transfer_0");
    assert_eq!(actions[0]["signature"], "transfer(address,uint256)");
    assert_eq!(actions[0]["schema"]["fields"][1]["name"], "amount");

    let (status, _) = send(app.router(), Method::GET, "/api/v1/contracts/404/actions", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(app.router(), Method::GET, "/api/v1/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loadedContracts"], 1);
    assert_eq!(body["cachedWallets"], 0);
    assert_eq!(body["chainIds"], json!([CHAIN_ID]));
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let (status, body) = send(app.router(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
