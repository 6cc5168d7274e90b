//! End-to-end API tests over an in-memory record store and content store.

use axum::body::Body;
use axum::Router;
use http::{Request, StatusCode};
use serde_json::{json, Value};
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use common::crypto::{unwrap_key, wrap_key, ContentSecret, Iv, Salt};

use sealdrop_daemon::database::NewToken;
use sealdrop_daemon::http_server;
use sealdrop_daemon::{ServiceConfig, ServiceState};

async fn test_state(configure: impl FnOnce(&mut ServiceConfig)) -> ServiceState {
    let mut config = ServiceConfig::ephemeral(b"integration-test-secret");
    configure(&mut config);
    ServiceState::from_config(&config).await.unwrap()
}

async fn test_app(configure: impl FnOnce(&mut ServiceConfig)) -> (Router, ServiceState) {
    let state = test_state(configure).await;
    (http_server::router(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

fn json_request(
    method: &str,
    path: &str,
    body: Option<&Value>,
    session: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json");
    if let Some(session) = session {
        builder = builder.header("authorization", format!("Bearer {}", session));
    }
    let body = match body {
        Some(value) => Body::from(serde_json::to_vec(value).unwrap()),
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

async fn post_json(
    app: &Router,
    path: &str,
    body: Value,
    session: Option<&str>,
) -> (StatusCode, Value) {
    let (status, bytes) = send(app, json_request("POST", path, Some(&body), session)).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get_json(app: &Router, path: &str, session: Option<&str>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, json_request("GET", path, None, session)).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

const MULTIPART_BOUNDARY: &str = "sealdrop-test-boundary";

fn upload_request(session: &str, payload: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"blob\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v0/storage")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .header("authorization", format!("Bearer {}", session))
        .body(Body::from(body))
        .unwrap()
}

/// Run the full challenge/response dance for a wallet and return a session.
async fn login(app: &Router, signer: &PrivateKeySigner) -> String {
    let (status, start) = post_json(app, "/api/v0/auth/start", json!({}), None).await;
    assert_eq!(status, StatusCode::OK);

    let message = start["message"].as_str().unwrap();
    assert!(message.starts_with("Sign this nonce to login: "));

    let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
    let (status, verify) = post_json(
        app,
        "/api/v0/auth/verify",
        json!({
            "context": start["context"],
            // mixed-case claim exercises the case-insensitive compare
            "address": signer.address().to_string().to_lowercase(),
            "signature": hex::encode(signature.as_bytes()),
        }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verify["ok"], json!(true));

    verify["session"].as_str().unwrap().to_string()
}

fn wrapped_material_fields() -> Value {
    json!({
        "salt": BASE64.encode([1u8; 16]),
        "wrap_iv": BASE64.encode([2u8; 12]),
        "wrapped_key": BASE64.encode([3u8; 48]),
    })
}

fn create_body(cid: &str, extra: Value) -> Value {
    let mut body = json!({
        "title": "shared file",
        "cid": cid,
        "iv": BASE64.encode([9u8; 12]),
    });
    if let (Some(base), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    body
}

/// Publish a wrapped-mode record through the API, returning (file_id, token).
async fn publish_fixture(app: &Router, session: &str) -> (String, String) {
    let (status, upload) = {
        let (status, bytes) = send(app, upload_request(session, b"ciphertext bytes")).await;
        (status, serde_json::from_slice::<Value>(&bytes).unwrap())
    };
    assert_eq!(status, StatusCode::OK);
    let cid = upload["cid"].as_str().unwrap().to_string();

    let (status, created) = post_json(
        app,
        "/api/v0/files",
        create_body(&cid, wrapped_material_fields()),
        Some(session),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    (
        created["file_id"].as_str().unwrap().to_string(),
        created["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn full_publish_and_redeem_round_trip() {
    let (app, _state) = test_app(|_| {}).await;
    let signer = PrivateKeySigner::random();

    // uploader signs in
    let session = login(&app, &signer).await;

    // uploader encrypts locally
    let plaintext = b"Hello secure world";
    let passphrase = "pass1234-Strong";

    let secret = ContentSecret::generate();
    let iv = Iv::generate();
    let ciphertext = secret.encrypt(&iv, plaintext).unwrap();

    let salt = Salt::generate();
    let wrap_iv = Iv::generate();
    let wrapped_key = wrap_key(&secret, passphrase, &salt, &wrap_iv).unwrap();

    // ciphertext goes to storage
    let (status, bytes) = send(&app, upload_request(&session, &ciphertext)).await;
    assert_eq!(status, StatusCode::OK);
    let upload: Value = serde_json::from_slice(&bytes).unwrap();
    let cid = upload["cid"].as_str().unwrap().to_string();

    // metadata + wrapped key material become a record with a default token
    let (status, created) = post_json(
        &app,
        "/api/v0/files",
        json!({
            "title": "greeting",
            "cid": cid,
            "file_name": "hello.txt",
            "mime": "text/plain",
            "size_bytes": plaintext.len(),
            "iv": BASE64.encode(iv.bytes()),
            "salt": BASE64.encode(salt.bytes()),
            "wrap_iv": BASE64.encode(wrap_iv.bytes()),
            "wrapped_key": BASE64.encode(&wrapped_key),
        }),
        Some(&session),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = created["token"].as_str().unwrap();

    // anonymous redeemer validates the token
    let (status, validated) =
        post_json(&app, "/api/v0/tokens/validate", json!({"token": token}), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validated["ok"], json!(true));
    assert_eq!(validated["name"], json!("hello.txt"));
    assert_eq!(validated["mime"], json!("text/plain"));

    // fetches ciphertext by content id
    let fetch_path = format!("/api/v0/storage/{}", validated["cid"].as_str().unwrap());
    let (status, fetched) = send(&app, json_request("GET", &fetch_path, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, ciphertext);

    // re-derives the wrapping key, unwraps, decrypts
    let salt = Salt::from_slice(
        &BASE64
            .decode(validated["salt"].as_str().unwrap())
            .unwrap(),
    )
    .unwrap();
    let wrap_iv = Iv::from_slice(
        &BASE64
            .decode(validated["wrap_iv"].as_str().unwrap())
            .unwrap(),
    )
    .unwrap();
    let wrapped = BASE64
        .decode(validated["wrapped_key"].as_str().unwrap())
        .unwrap();
    let content_iv =
        Iv::from_slice(&BASE64.decode(validated["iv"].as_str().unwrap()).unwrap()).unwrap();

    let recovered_key = unwrap_key(&wrapped, passphrase, &salt, &wrap_iv).unwrap();
    let recovered = recovered_key.decrypt(&content_iv, &fetched).unwrap();

    assert_eq!(recovered, plaintext);
}

#[tokio::test]
async fn nonce_is_single_use_and_replay_fails() {
    let (app, _state) = test_app(|_| {}).await;
    let signer = PrivateKeySigner::random();

    let (_, start) = post_json(&app, "/api/v0/auth/start", json!({}), None).await;
    let message = start["message"].as_str().unwrap();
    let signature = signer.sign_message_sync(message.as_bytes()).unwrap();

    let body = json!({
        "context": start["context"],
        "address": signer.address().to_string(),
        "signature": hex::encode(signature.as_bytes()),
    });

    let (status, _) = post_json(&app, "/api/v0/auth/verify", body.clone(), None).await;
    assert_eq!(status, StatusCode::OK);

    // replaying the same valid signature finds no challenge left
    let (status, _) = post_json(&app, "/api/v0/auth/verify", body, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn failed_verification_still_burns_the_nonce() {
    let (app, _state) = test_app(|_| {}).await;
    let signer = PrivateKeySigner::random();
    let other = PrivateKeySigner::random();

    let (_, start) = post_json(&app, "/api/v0/auth/start", json!({}), None).await;
    let message = start["message"].as_str().unwrap();

    // signature by the wrong wallet: recovery succeeds but mismatches
    let signature = other.sign_message_sync(message.as_bytes()).unwrap();
    let (status, _) = post_json(
        &app,
        "/api/v0/auth/verify",
        json!({
            "context": start["context"],
            "address": signer.address().to_string(),
            "signature": hex::encode(signature.as_bytes()),
        }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // a correct signature now fails too: the attempt consumed the nonce
    let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
    let (status, _) = post_json(
        &app,
        "/api/v0/auth/verify",
        json!({
            "context": start["context"],
            "address": signer.address().to_string(),
            "signature": hex::encode(signature.as_bytes()),
        }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_presence_check() {
    let (app, _state) = test_app(|_| {}).await;

    let (status, body) = get_json(&app, "/api/v0/auth/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(false));

    let signer = PrivateKeySigner::random();
    let session = login(&app, &signer).await;

    let (status, body) = get_json(&app, "/api/v0/auth/me", Some(&session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["address"], json!(signer.address().to_string()));
}

#[tokio::test]
async fn validate_after_revoke_reports_revoked() {
    let (app, _state) = test_app(|_| {}).await;
    let signer = PrivateKeySigner::random();
    let session = login(&app, &signer).await;

    let (_file_id, token) = publish_fixture(&app, &session).await;

    let (status, _) = post_json(
        &app,
        "/api/v0/tokens/revoke",
        json!({"token": token}),
        Some(&session),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // deterministic regardless of remaining TTL, and revoking again is fine
    let (status, body) =
        post_json(&app, "/api/v0/tokens/validate", json!({"token": token}), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], json!("Revoked"));

    let (status, _) = post_json(
        &app,
        "/api/v0/tokens/revoke",
        json!({"token": token}),
        Some(&session),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn validate_after_expiry_reports_expired() {
    let (app, state) = test_app(|_| {}).await;
    let signer = PrivateKeySigner::random();
    let session = login(&app, &signer).await;

    let (file_id, _) = publish_fixture(&app, &session).await;

    // a token whose clock has already run out, never revoked
    let expired = NewToken {
        token: Uuid::new_v4().to_string(),
        file_id: file_id.parse().unwrap(),
        issued_to_address: None,
        expires_at: OffsetDateTime::now_utc() - time::Duration::minutes(1),
        created_at: OffsetDateTime::now_utc() - time::Duration::hours(1),
    };
    state.database().insert_token(&expired).await.unwrap();

    let (status, body) = post_json(
        &app,
        "/api/v0/tokens/validate",
        json!({"token": expired.token}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], json!("Expired"));
}

#[tokio::test]
async fn unknown_token_reports_not_found() {
    let (app, _state) = test_app(|_| {}).await;

    let (status, body) = post_json(
        &app,
        "/api/v0/tokens/validate",
        json!({"token": Uuid::new_v4().to_string()}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Not found"));
}

#[tokio::test]
async fn cross_owner_revoke_is_concealed_and_harmless() {
    let (app, _state) = test_app(|_| {}).await;

    let owner = PrivateKeySigner::random();
    let owner_session = login(&app, &owner).await;
    let (_file_id, token) = publish_fixture(&app, &owner_session).await;

    let stranger = PrivateKeySigner::random();
    let stranger_session = login(&app, &stranger).await;

    // someone else's revoke looks like the token doesn't exist
    let (status, _) = post_json(
        &app,
        "/api/v0/tokens/revoke",
        json!({"token": token}),
        Some(&stranger_session),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // and the token still validates
    let (status, body) =
        post_json(&app, "/api/v0/tokens/validate", json!({"token": token}), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn cross_owner_token_issue_is_concealed() {
    let (app, _state) = test_app(|_| {}).await;

    let owner = PrivateKeySigner::random();
    let owner_session = login(&app, &owner).await;
    let (file_id, _) = publish_fixture(&app, &owner_session).await;

    let stranger = PrivateKeySigner::random();
    let stranger_session = login(&app, &stranger).await;

    let (status, _) = post_json(
        &app,
        "/api/v0/tokens",
        json!({"file_id": file_id}),
        Some(&stranger_session),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn issued_token_gets_default_ttl_when_non_positive() {
    let (app, _state) = test_app(|_| {}).await;
    let signer = PrivateKeySigner::random();
    let session = login(&app, &signer).await;
    let (file_id, _) = publish_fixture(&app, &session).await;

    let (status, body) = post_json(
        &app,
        "/api/v0/tokens",
        json!({"file_id": file_id, "ttl_minutes": -5}),
        Some(&session),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let expires_at = OffsetDateTime::parse(
        body["expires_at"].as_str().unwrap(),
        &time::format_description::well_known::Rfc3339,
    )
    .unwrap();
    let delta = expires_at - OffsetDateTime::now_utc();
    assert!(delta > time::Duration::hours(23) && delta <= time::Duration::hours(24));
}

#[tokio::test]
async fn record_creation_requires_a_session() {
    let (app, _state) = test_app(|_| {}).await;

    let (status, _) = post_json(
        &app,
        "/api/v0/files",
        create_body(&"ab".repeat(32), wrapped_material_fields()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn oversized_declared_size_is_rejected() {
    let (app, _state) = test_app(|cfg| cfg.max_content_bytes = 1024).await;
    let signer = PrivateKeySigner::random();
    let session = login(&app, &signer).await;

    // declared size alone trips the ceiling; no bytes were uploaded at all
    let mut body = create_body(&"ab".repeat(32), wrapped_material_fields());
    body["size_bytes"] = json!(4096);

    let (status, _) = post_json(&app, "/api/v0/files", body, Some(&session)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn overlong_title_is_rejected() {
    let (app, _state) = test_app(|_| {}).await;
    let signer = PrivateKeySigner::random();
    let session = login(&app, &signer).await;

    let mut body = create_body(&"ab".repeat(32), wrapped_material_fields());
    body["title"] = json!("t".repeat(201));

    let (status, _) = post_json(&app, "/api/v0/files", body, Some(&session)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn partial_wrapped_material_is_rejected() {
    let (app, _state) = test_app(|_| {}).await;
    let signer = PrivateKeySigner::random();
    let session = login(&app, &signer).await;

    let body = create_body(
        &"ab".repeat(32),
        json!({
            "salt": BASE64.encode([1u8; 16]),
            "wrap_iv": BASE64.encode([2u8; 12]),
            // wrapped_key missing
        }),
    );

    let (status, _) = post_json(&app, "/api/v0/files", body, Some(&session)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn raw_key_material_is_gated_by_policy() {
    // default policy: refused even when well-formed
    let (app, _state) = test_app(|_| {}).await;
    let signer = PrivateKeySigner::random();
    let session = login(&app, &signer).await;

    let body = create_body(
        &"ab".repeat(32),
        json!({"raw_key": BASE64.encode([7u8; 32])}),
    );
    let (status, _) = post_json(&app, "/api/v0/files", body.clone(), Some(&session)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // with the allow flag the same request goes through
    let (app, _state) = test_app(|cfg| cfg.allow_raw_keys = true).await;
    let session = login(&app, &signer).await;
    let (status, _) = post_json(&app, "/api/v0/files", body, Some(&session)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn csrf_guard_blocks_unpaired_mutations_when_required() {
    let (app, _state) = test_app(|cfg| cfg.require_csrf = true).await;
    let signer = PrivateKeySigner::random();
    let session = login(&app, &signer).await;

    // no guard token at all
    let (status, _) = post_json(
        &app,
        "/api/v0/files",
        create_body(&"ab".repeat(32), wrapped_material_fields()),
        Some(&session),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // a matching header/cookie pair passes
    let (status, issued) = get_json(&app, "/api/v0/csrf", None).await;
    assert_eq!(status, StatusCode::OK);
    let guard = issued["csrf"].as_str().unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v0/files")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", session))
        .header("x-csrf", guard)
        .header("cookie", format!("csrf={}", guard))
        .body(Body::from(
            serde_json::to_vec(&create_body(&"ab".repeat(32), wrapped_material_fields())).unwrap(),
        ))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn storage_put_is_idempotent_and_get_misses_cleanly() {
    let (app, _state) = test_app(|_| {}).await;
    let signer = PrivateKeySigner::random();
    let session = login(&app, &signer).await;

    let (status, bytes) = send(&app, upload_request(&session, b"same bytes")).await;
    assert_eq!(status, StatusCode::OK);
    let first: Value = serde_json::from_slice(&bytes).unwrap();

    let (status, bytes) = send(&app, upload_request(&session, b"same bytes")).await;
    assert_eq!(status, StatusCode::OK);
    let second: Value = serde_json::from_slice(&bytes).unwrap();

    // same bytes, same id
    assert_eq!(first["cid"], second["cid"]);

    let missing = format!("/api/v0/storage/{}", "00".repeat(32));
    let (status, _) = send(&app, json_request("GET", &missing, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn storage_upload_requires_session_and_rejects_empty() {
    let (app, _state) = test_app(|_| {}).await;

    let mut request = upload_request("irrelevant", b"data");
    request.headers_mut().remove("authorization");
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let signer = PrivateKeySigner::random();
    let session = login(&app, &signer).await;
    let (status, _) = send(&app, upload_request(&session, b"")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn owner_listings_are_scoped_and_ordered() {
    let (app, _state) = test_app(|_| {}).await;

    let alice = PrivateKeySigner::random();
    let alice_session = login(&app, &alice).await;
    publish_fixture(&app, &alice_session).await;
    publish_fixture(&app, &alice_session).await;

    let bob = PrivateKeySigner::random();
    let bob_session = login(&app, &bob).await;

    let (status, body) = get_json(&app, "/api/v0/files/list", Some(&alice_session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"].as_array().unwrap().len(), 2);

    let (status, body) = get_json(&app, "/api/v0/files/list", Some(&bob_session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"].as_array().unwrap().len(), 0);

    let (status, body) = get_json(&app, "/api/v0/tokens/list", Some(&alice_session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokens"].as_array().unwrap().len(), 2);
}
