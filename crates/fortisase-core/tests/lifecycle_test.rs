#![allow(clippy::unwrap_used)]
// End-to-end lifecycle tests: registry → resource → SaseClient → wiremock.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fortisase_api::{Credentials, SaseClient, TransportConfig};
use fortisase_core::{ProviderContext, ResourceRegistry};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ProviderContext) {
    let server = MockServer::start().await;
    let client = SaseClient::new(
        &server.uri(),
        Credentials::AccessToken(SecretString::from("test-token")),
        &TransportConfig::default(),
    )
    .unwrap();
    (server, ProviderContext::new(Arc::new(client)))
}

fn api_path(suffix: &str) -> String {
    format!("/resource-api/v2/{suffix}")
}

async fn bodies(server: &MockServer, verb: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|req| req.method.as_str() == verb)
        .map(|req| req.body_json::<Value>().unwrap())
        .collect()
}

// ── Collections ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_uses_assigned_key_and_reads_back() {
    let (server, ctx) = setup().await;

    Mock::given(method("POST"))
        .and(path(api_path("network/hosts")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "primaryKey": "web01" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("network/hosts/web01")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "primaryKey": "web01",
                "type": "ipmask",
                "subnet": "10.1.1.1/32",
                "location": "internal",
            }
        })))
        .mount(&server)
        .await;

    let hosts = ResourceRegistry::builtin().get("fortisase_network_hosts").unwrap();
    let resp = hosts
        .create(
            &ctx,
            &json!({ "primary_key": "web01", "type": "ipmask", "subnet": "10.1.1.1/32" }),
        )
        .await;

    assert!(!resp.has_errors(), "{:?}", resp.diagnostics);
    let state = resp.state.unwrap();
    assert_eq!(state["id"], json!("web01"));
    // Server default surfaces as a computed value.
    assert_eq!(state["location"], json!("internal"));
}

#[tokio::test]
async fn test_update_keeps_id_and_puts_to_key() {
    let (server, ctx) = setup().await;

    Mock::given(method("PUT"))
        .and(path(api_path("network/hosts/web01")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("network/hosts/web01")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "primaryKey": "web01",
            "type": "ipmask",
            "subnet": "10.1.1.2/32",
            "location": "internal",
        })))
        .mount(&server)
        .await;

    let hosts = ResourceRegistry::builtin().get("fortisase_network_hosts").unwrap();
    let prior = json!({
        "id": "web01",
        "primary_key": "web01",
        "type": "ipmask",
        "subnet": "10.1.1.1/32",
        "location": "internal",
    });
    let resp = hosts
        .update(
            &ctx,
            &prior,
            &json!({ "primary_key": "web01", "type": "ipmask", "subnet": "10.1.1.2/32" }),
        )
        .await;

    assert!(!resp.has_errors(), "{:?}", resp.diagnostics);
    let state = resp.state.unwrap();
    assert_eq!(state["id"], json!("web01"));
    assert_eq!(state["subnet"], json!("10.1.1.2/32"));
    assert_eq!(bodies(&server, "PUT").await[0]["subnet"], json!("10.1.1.2/32"));
}

#[tokio::test]
async fn test_read_of_missing_object_clears_state() {
    let (server, ctx) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("network/hosts/gone")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "not found" })))
        .mount(&server)
        .await;

    let hosts = ResourceRegistry::builtin().get("fortisase_network_hosts").unwrap();
    let resp = hosts
        .read(&ctx, &json!({ "id": "gone", "primary_key": "gone", "type": "fqdn" }))
        .await;

    assert!(!resp.has_errors());
    assert_eq!(resp.state, None);
}

#[tokio::test]
async fn test_delete_tolerates_missing_object() {
    let (server, ctx) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(api_path("network/hosts/gone")))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let hosts = ResourceRegistry::builtin().get("fortisase_network_hosts").unwrap();
    let diags = hosts
        .delete(&ctx, &json!({ "id": "gone", "primary_key": "gone", "type": "fqdn" }))
        .await;

    assert!(diags.is_empty(), "{diags:?}");
}

#[tokio::test]
async fn test_api_error_keeps_response_body() {
    let (server, ctx) = setup().await;

    Mock::given(method("POST"))
        .and(path(api_path("network/hosts")))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "message": "subnet is invalid", "code": -651 })),
        )
        .mount(&server)
        .await;

    let hosts = ResourceRegistry::builtin().get("fortisase_network_hosts").unwrap();
    let resp = hosts
        .create(
            &ctx,
            &json!({ "primary_key": "bad", "type": "ipmask", "subnet": "10.1.1.1/33" }),
        )
        .await;

    assert!(resp.has_errors());
    assert_eq!(resp.state, None);
    let detail = &resp.diagnostics.iter().next().unwrap().detail;
    assert!(detail.contains("HTTP status: 400"), "{detail}");
    assert!(detail.contains("-651"), "{detail}");
}

#[tokio::test]
async fn test_invalid_config_never_reaches_the_api() {
    let (server, ctx) = setup().await;

    let hosts = ResourceRegistry::builtin().get("fortisase_network_hosts").unwrap();
    let resp = hosts
        .create(&ctx, &json!({ "primary_key": "x", "type": "subnet" }))
        .await;

    assert!(resp.has_errors());
    assert_eq!(
        resp.diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect::<Vec<_>>(),
        vec!["type"]
    );
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

// ── Secrets ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unchanged_ldap_password_is_not_resent() {
    let (server, ctx) = setup().await;

    Mock::given(method("PUT"))
        .and(path(api_path("auth/ldap-servers/corp")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("auth/ldap-servers/corp")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "primaryKey": "corp",
            "server": "10.0.0.2",
            "dn": "dc=corp,dc=example",
        })))
        .mount(&server)
        .await;

    let ldap = ResourceRegistry::builtin().get("fortisase_auth_ldap_servers").unwrap();
    let prior = json!({
        "id": "corp",
        "primary_key": "corp",
        "server": "10.0.0.1",
        "dn": "dc=corp,dc=example",
        "password": "hunter2",
    });
    let config = json!({
        "primary_key": "corp",
        "server": "10.0.0.2",
        "dn": "dc=corp,dc=example",
        "password": "hunter2",
    });
    let resp = ldap.update(&ctx, &prior, &config).await;

    assert!(!resp.has_errors(), "{:?}", resp.diagnostics);
    let sent = bodies(&server, "PUT").await;
    assert_eq!(sent[0].get("password"), None);
    assert_eq!(sent[0]["server"], json!("10.0.0.2"));
    // The API never echoes the password; state keeps the configured one.
    assert_eq!(resp.state.unwrap()["password"], json!("hunter2"));
}

// ── Singletons and compound identity ───────────────────────────────

#[tokio::test]
async fn test_web_filter_profile_import_then_read() {
    let (server, ctx) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("security/outbound-profiles/web-filter-profile/default")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "primaryKey": "default",
            "blockInvalidUrl": true,
            "youtubeRestrict": "strict",
        })))
        .mount(&server)
        .await;

    let profile = ResourceRegistry::builtin()
        .get("fortisase_security_web_filter_profile")
        .unwrap();
    let imported = profile.import_state("outbound-profiles/default");
    assert!(!imported.has_errors());

    let resp = profile.read(&ctx, &imported.state.unwrap()).await;
    let state = resp.state.unwrap();
    assert_eq!(state["direction"], json!("outbound-profiles"));
    assert_eq!(state["primary_key"], json!("default"));
    assert_eq!(state["youtube_restrict"], json!("strict"));
}

#[tokio::test]
async fn test_singleton_create_is_a_put_and_delete_is_local() {
    let (server, ctx) = setup().await;

    Mock::given(method("PUT"))
        .and(path(api_path("network/dns-rules/default")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("network/dns-rules/default")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "primaryKey": "default",
            "primaryDns": "1.1.1.1",
        })))
        .mount(&server)
        .await;

    let rules = ResourceRegistry::builtin().get("fortisase_network_dns_rules").unwrap();
    let resp = rules
        .create(&ctx, &json!({ "primary_key": "default", "primary_dns": "1.1.1.1" }))
        .await;
    assert!(!resp.has_errors(), "{:?}", resp.diagnostics);

    let diags = rules.delete(&ctx, &resp.state.unwrap()).await;
    assert!(diags.is_empty());
    assert!(bodies(&server, "DELETE").await.is_empty());
}

#[tokio::test]
async fn test_replacing_change_is_refused_by_update() {
    let (_server, ctx) = setup().await;

    let hosts = ResourceRegistry::builtin().get("fortisase_network_hosts").unwrap();
    let prior = json!({ "id": "web01", "primary_key": "web01", "type": "ipmask" });
    let config = json!({ "primary_key": "web01", "type": "fqdn", "fqdn": "example.com" });

    let plan = hosts.plan(Some(&prior), &config);
    assert_eq!(plan.replace_paths, vec!["type"]);

    let resp = hosts.update(&ctx, &prior, &config).await;
    assert!(resp.has_errors());
}
