//! Shared helpers for FreeIPA target integration tests.

#![allow(dead_code)]

use idsync_connector::traits::Collaborator;
use idsync_connector_freeipa::{FreeIpaConfig, FreeIpaTarget};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Successful JSON-RPC envelope.
pub fn rpc_result(result: Value) -> Value {
    json!({
        "result": result,
        "error": null,
        "id": 0,
        "principal": "admin@EXAMPLE.COM",
        "version": "4.9.8"
    })
}

/// Failed JSON-RPC envelope.
pub fn rpc_error(code: i64, name: &str, message: &str) -> Value {
    json!({
        "result": null,
        "error": {"code": code, "name": name, "message": message, "data": {}},
        "id": 0,
        "principal": "admin@EXAMPLE.COM",
        "version": "4.9.8"
    })
}

pub fn user_entry(login: &str, locked: bool) -> Value {
    json!({
        "result": {
            "uid": [login],
            "givenname": ["Test"],
            "sn": ["User"],
            "cn": [format!("Test User {login}")],
            "mail": [format!("{login}@example.com")],
            "uidnumber": ["201105"],
            "nsaccountlock": locked,
            "dn": {"__dn__": format!("uid={login},cn=users,cn=accounts,dc=example,dc=com")}
        },
        "value": login,
        "summary": null
    })
}

pub fn group_entry(name: &str, users: &[&str], groups: &[&str]) -> Value {
    json!({
        "result": {
            "cn": [name],
            "description": [format!("{name} group")],
            "gidnumber": ["200513"],
            "member_user": users,
            "member_group": groups
        },
        "value": name,
        "summary": null
    })
}

pub struct MockIpaServer {
    pub server: MockServer,
}

impl MockIpaServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn target(&self) -> FreeIpaTarget {
        FreeIpaTarget::new(FreeIpaConfig::new(self.server.uri(), "Secret123"))
            .expect("valid test config")
    }

    /// Target that has already logged in.
    pub async fn connected_target(&self) -> FreeIpaTarget {
        self.mock_login().await;
        let target = self.target();
        target.connect().await.expect("login succeeds");
        target
    }

    pub async fn mock_login(&self) {
        Mock::given(method("POST"))
            .and(path("/ipa/session/login_password"))
            .and(header_exists("referer"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", "ipa_session=MagBearerToken=abc; Path=/ipa; HttpOnly"),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer calls to `rpc_method` with `body`.
    pub async fn mock_call(&self, rpc_method: &str, body: Value) {
        Mock::given(method("POST"))
            .and(path("/ipa/session/json"))
            .and(body_partial_json(json!({"method": rpc_method})))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Like [`Self::mock_call`], asserting the number of calls on drop.
    pub async fn expect_call(&self, rpc_method: &str, body: Value, times: u64) {
        Mock::given(method("POST"))
            .and(path("/ipa/session/json"))
            .and(body_partial_json(json!({"method": rpc_method})))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Bodies of every JSON-RPC call received so far.
    pub async fn rpc_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == "/ipa/session/json")
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }
}
