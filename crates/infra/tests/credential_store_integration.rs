//! Integration tests for the persistent credential stores driven by the
//! API client.

use std::collections::BTreeMap;
use std::sync::Arc;

use agrm_core::auth::CredentialStore;
use agrm_domain::{ClientConfig, CredentialKey};
use agrm_infra::credentials::StoredEntry;
use agrm_infra::{ApiClient, ApiError, ApiRequest, FileCredentialStore};
use chrono::{Duration, Utc};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn read_jar(path: &std::path::Path) -> BTreeMap<String, StoredEntry> {
    serde_json::from_slice(&std::fs::read(path).expect("jar file")).expect("jar json")
}

#[tokio::test]
async fn refreshed_token_is_written_with_one_day_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer expired.tok.en"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer new.tok.en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "new.tok.en" })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let jar = dir.path().join("cookies.json");
    let store = FileCredentialStore::new(&jar);
    store.set(CredentialKey::AccessToken, "expired.tok.en", None).await.unwrap();

    let client = ApiClient::new(ClientConfig::new(server.uri()), Arc::new(store)).unwrap();
    client.execute(ApiRequest::get("/members")).await.unwrap();

    let entries = read_jar(&jar);
    let token = &entries["token"];
    assert_eq!(token.value, "new.tok.en");

    let expires_at = token.expires_at.expect("refreshed token expires");
    let remaining = expires_at - Utc::now();
    assert!(remaining > Duration::hours(23) && remaining <= Duration::hours(24));
}

#[tokio::test]
async fn malformed_token_in_jar_is_purged() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let jar = dir.path().join("cookies.json");
    std::fs::write(
        &jar,
        r#"{
            "token": { "value": "undefined", "expires_at": null },
            "appUser": { "value": "{}", "expires_at": null },
            "XSRF-TOKEN": { "value": "csrf", "expires_at": null },
            "lang": { "value": "fr", "expires_at": null }
        }"#,
    )
    .unwrap();

    let client =
        ApiClient::new(ClientConfig::new(server.uri()), Arc::new(FileCredentialStore::new(&jar)))
            .unwrap();
    let result = client.execute(ApiRequest::get("/members")).await;

    assert_eq!(result, Err(ApiError::InvalidCredentialFormat));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(read_jar(&jar).keys().collect::<Vec<_>>(), vec!["lang"]);
}

#[tokio::test]
async fn expired_token_in_jar_is_treated_as_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let jar = dir.path().join("cookies.json");
    let expired = StoredEntry { value: "h.p.s".into(), expires_at: Some(Utc::now() - Duration::hours(1)) };
    std::fs::write(&jar, serde_json::to_vec(&json!({ "token": expired })).unwrap()).unwrap();

    let client =
        ApiClient::new(ClientConfig::new(server.uri()), Arc::new(FileCredentialStore::new(&jar)))
            .unwrap();
    client.execute(ApiRequest::get("/members")).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}
