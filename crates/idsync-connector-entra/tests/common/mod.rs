//! Shared helpers for Entra source integration tests.

#![allow(dead_code)]

use idsync_connector_entra::{EntraConfig, EntraSource};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT: &str = "test-tenant";

/// Graph user with the properties the source requests.
pub fn create_test_user(id: &str, login: &str) -> Value {
    json!({
        "id": id,
        "userPrincipalName": format!("{login}@test.onmicrosoft.com"),
        "displayName": format!("Test User {login}"),
        "givenName": "Test",
        "surname": "User",
        "mail": format!("{login}@example.com"),
        "accountEnabled": true,
        "jobTitle": "Test Engineer",
        "department": "Testing",
        "businessPhones": []
    })
}

pub fn create_disabled_user(id: &str, login: &str) -> Value {
    let mut user = create_test_user(id, login);
    user["accountEnabled"] = json!(false);
    user
}

pub fn create_test_group(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "displayName": name,
        "description": format!("Test group: {name}")
    })
}

/// Member entry as returned by `/groups/{id}/members`.
pub fn create_user_member(id: &str, login: &str) -> Value {
    json!({
        "@odata.type": "#microsoft.graph.user",
        "id": id,
        "userPrincipalName": format!("{login}@test.onmicrosoft.com")
    })
}

pub fn create_group_member(id: &str, name: &str) -> Value {
    json!({
        "@odata.type": "#microsoft.graph.group",
        "id": id,
        "displayName": name
    })
}

pub fn create_device_member(id: &str) -> Value {
    json!({
        "@odata.type": "#microsoft.graph.device",
        "id": id,
        "displayName": "build-agent-01"
    })
}

/// Wraps items in an `OData` collection response.
pub fn create_odata_response(items: Vec<Value>, next_link: Option<&str>) -> Value {
    let mut response = json!({ "value": items });
    if let Some(link) = next_link {
        response["@odata.nextLink"] = json!(link);
    }
    response
}

pub fn create_odata_error(code: &str, message: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message
        }
    })
}

pub fn create_token_response(access_token: &str, expires_in: u64) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": expires_in
    })
}

/// Mock server standing in for both the login endpoint and Graph.
pub struct MockGraphServer {
    pub server: MockServer,
}

impl MockGraphServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Source configured against this server with no page delay.
    pub fn source(&self) -> EntraSource {
        self.source_with(|_| {})
    }

    pub fn source_with(&self, customize: impl FnOnce(&mut EntraConfig)) -> EntraSource {
        let mut config =
            EntraConfig::new(TENANT, "client-id", "client-secret").with_endpoints(&self.url());
        config.page_delay_ms = 0;
        config.max_retries = 0;
        customize(&mut config);
        EntraSource::new(config).expect("valid test config")
    }

    pub async fn mock_token_endpoint(&self) {
        Mock::given(method("POST"))
            .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(create_token_response("mock-access-token", 3600)),
            )
            .mount(&self.server)
            .await;
    }

    /// Serve `items` from `resource` in pages of `page_size`.
    pub async fn mock_paged(&self, resource: &str, items: Vec<Value>, page_size: usize) {
        let pages: Vec<Vec<Value>> = items.chunks(page_size).map(<[Value]>::to_vec).collect();
        let total_pages = pages.len().max(1);
        let pages = if pages.is_empty() { vec![Vec::new()] } else { pages };

        for (i, page) in pages.into_iter().enumerate() {
            let next_link = (i + 1 < total_pages)
                .then(|| format!("{}/v1.0/{resource}?$skiptoken=page{}", self.url(), i + 1));
            let body = create_odata_response(page, next_link.as_deref());

            let mock = Mock::given(method("GET")).and(path(format!("/v1.0/{resource}")));
            if i == 0 {
                mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
                    .with_priority(10)
                    .mount(&self.server)
                    .await;
            } else {
                mock.and(query_param("$skiptoken", format!("page{i}")))
                    .respond_with(ResponseTemplate::new(200).set_body_json(body))
                    .with_priority(1)
                    .mount(&self.server)
                    .await;
            }
        }
    }

    pub async fn mock_members(&self, group_id: &str, members: Vec<Value>) {
        self.mock_paged(&format!("groups/{group_id}/members"), members, 100)
            .await;
    }
}
