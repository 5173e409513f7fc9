#![allow(clippy::unwrap_used)]
// Integration tests for `SaseClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fortisase_api::{Credentials, Error, InputModel, JsonMap, ResourceApi, SaseClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, SaseClient) {
    let server = MockServer::start().await;
    let client = SaseClient::from_reqwest(
        &server.uri(),
        reqwest::Client::new(),
        Credentials::AccessToken(SecretString::from("test-token")),
    )
    .unwrap();
    (server, client)
}

fn api_path(suffix: &str) -> String {
    format!("/resource-api/v2/{suffix}")
}

fn body(value: serde_json::Value) -> JsonMap {
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!("test bodies are objects"),
    }
}

// ── Verbs ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_posts_body_with_bearer() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(api_path("auth/ldap-servers")))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({ "primaryKey": "corp", "server": "10.0.0.1" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "primaryKey": "corp" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let input = InputModel::new().with_body(body(json!({
        "primaryKey": "corp",
        "server": "10.0.0.1",
    })));
    let resp = client.create("auth/ldap-servers", &input).await.unwrap();

    assert_eq!(resp.get("primaryKey"), Some(&json!("corp")));
}

#[tokio::test]
async fn test_read_unwraps_data_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("network/hosts/web01")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "primaryKey": "web01", "type": "ipmask", "subnet": "10.1.1.1/32" }
        })))
        .mount(&server)
        .await;

    let resp = client
        .read("network/hosts", &InputModel::keyed("web01"))
        .await
        .unwrap();

    assert_eq!(resp.get("type"), Some(&json!("ipmask")));
    assert_eq!(resp.get("subnet"), Some(&json!("10.1.1.1/32")));
}

#[tokio::test]
async fn test_update_substitutes_direction() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path(api_path(
            "security/outbound-profiles/web-filter-profile/default",
        )))
        .and(query_param("scope", "global"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(1)
        .mount(&server)
        .await;

    let input = InputModel::keyed("default")
        .with_path_param("direction", "outbound-profiles")
        .with_query("scope", "global");
    let resp = client
        .update("security/{direction}/web-filter-profile", &input)
        .await
        .unwrap();

    assert!(resp.is_empty());
}

#[tokio::test]
async fn test_delete() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(api_path("auth/user-groups/staff")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .delete("auth/user-groups", &InputModel::keyed("staff"))
        .await
        .unwrap();
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn test_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("auth/ldap-servers/gone")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client
        .read("auth/ldap-servers", &InputModel::keyed("gone"))
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "expected not-found, got {err:?}");
}

#[tokio::test]
async fn test_api_error_keeps_raw_body() {
    let (server, client) = setup().await;

    let raw = json!({ "message": "name already exists", "code": -5 });
    Mock::given(method("POST"))
        .and(path(api_path("auth/user-groups")))
        .respond_with(ResponseTemplate::new(400).set_body_json(&raw))
        .mount(&server)
        .await;

    let err = client
        .create("auth/user-groups", &InputModel::new())
        .await
        .unwrap_err();

    match err {
        Error::Api {
            status,
            message,
            body,
        } => {
            assert_eq!(status, 400);
            assert_eq!(message, "name already exists");
            assert!(body.contains("\"code\":-5"), "body was {body}");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("network/hosts/web01")))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "token expired" })),
        )
        .mount(&server)
        .await;

    let err = client
        .read("network/hosts", &InputModel::keyed("web01"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::Authentication { ref message } if message == "token expired"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_non_object_body_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("network/hosts/web01")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["web01"])))
        .mount(&server)
        .await;

    let err = client
        .read("network/hosts", &InputModel::keyed("web01"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnexpectedShape { .. }), "got {err:?}");
}

// ── Token exchange ──────────────────────────────────────────────────

#[tokio::test]
async fn test_password_credentials_exchange_token_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/oauth/token/"))
        .and(body_json(json!({
            "username": "api-user",
            "password": "s3cret",
            "client_id": "FortiSASE",
            "grant_type": "password",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "issued-token",
            "expires_in": 3600,
            "token_type": "Bearer",
            "status": "success",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api_path("network/hosts/web01")))
        .and(header("authorization", "Bearer issued-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "primaryKey": "web01" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = SaseClient::from_reqwest(
        &server.uri(),
        reqwest::Client::new(),
        Credentials::password("api-user", SecretString::from("s3cret")),
    )
    .unwrap()
    .with_auth_url(&format!("{}/api/v1/oauth/token/", server.uri()))
    .unwrap();

    let input = InputModel::keyed("web01");
    client.read("network/hosts", &input).await.unwrap();
    client.read("network/hosts", &input).await.unwrap();
}

#[tokio::test]
async fn test_token_endpoint_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/oauth/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "",
            "status": "error",
            "message": "invalid credentials",
        })))
        .mount(&server)
        .await;

    let client = SaseClient::from_reqwest(
        &server.uri(),
        reqwest::Client::new(),
        Credentials::password("api-user", SecretString::from("wrong")),
    )
    .unwrap()
    .with_auth_url(&format!("{}/api/v1/oauth/token/", server.uri()))
    .unwrap();

    let err = client
        .read("network/hosts", &InputModel::keyed("web01"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::Authentication { ref message } if message == "invalid credentials"),
        "got {err:?}"
    );
}
