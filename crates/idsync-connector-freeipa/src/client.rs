//! FreeIPA JSON-RPC client.

use reqwest::{header, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::config::FreeIpaConfig;
use crate::error::{FreeIpaError, FreeIpaResult};

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    method: &'a str,
    params: (Vec<Value>, Map<String, Value>),
    id: u32,
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
}

/// Session-based client for `/ipa/session/json`.
pub struct FreeIpaClient {
    http: Client,
    base_url: String,
    username: String,
    password: SecretString,
    api_version: String,
    logged_in: RwLock<bool>,
}

impl FreeIpaClient {
    pub fn new(config: &FreeIpaConfig) -> FreeIpaResult<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.connection.request_timeout_secs))
            .connect_timeout(Duration::from_secs(
                config.connection.connection_timeout_secs,
            ));
        if !config.verify_ssl {
            warn!(server = %config.server, "TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|e| FreeIpaError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            api_version: config.api_version.clone(),
            logged_in: RwLock::new(false),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn is_logged_in(&self) -> bool {
        *self.logged_in.read().await
    }

    fn referer(&self) -> String {
        format!("{}/ipa", self.base_url)
    }

    /// Password login; the session cookie lands in the client's cookie store.
    #[instrument(skip(self), fields(user = %self.username))]
    pub async fn login(&self) -> FreeIpaResult<()> {
        let response = self
            .http
            .post(format!("{}/ipa/session/login_password", self.base_url))
            .header(header::REFERER, self.referer())
            .header(header::ACCEPT, "text/plain")
            .form(&[
                ("user", self.username.as_str()),
                ("password", self.password.expose_secret().as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let reason = response
                .headers()
                .get("X-IPA-Rejection-Reason")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("invalid credentials")
                .to_string();
            return Err(FreeIpaError::Authentication(reason));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FreeIpaError::Authentication(format!(
                "login returned {status}: {body}"
            )));
        }

        *self.logged_in.write().await = true;
        debug!("FreeIPA session established");
        Ok(())
    }

    /// Drop the session.
    pub async fn logout(&self) -> FreeIpaResult<()> {
        if !self.is_logged_in().await {
            return Ok(());
        }
        let result = self.call("session_logout", vec![], Map::new()).await;
        *self.logged_in.write().await = false;
        result.map(|_| ())
    }

    /// Invoke a JSON-RPC method and return its `result` member.
    ///
    /// An expired session is renewed once before the call is retried.
    pub async fn call(
        &self,
        method: &str,
        args: Vec<Value>,
        options: Map<String, Value>,
    ) -> FreeIpaResult<Value> {
        let result = self.send(method, &args, &options).await;
        if matches!(result, Err(FreeIpaError::Authentication(_))) && self.is_logged_in().await {
            debug!(method, "Session expired, logging in again");
            self.login().await?;
            return self.send(method, &args, &options).await;
        }
        result
    }

    async fn send(
        &self,
        method: &str,
        args: &[Value],
        options: &Map<String, Value>,
    ) -> FreeIpaResult<Value> {
        let mut options = options.clone();
        options.insert("version".to_string(), json!(self.api_version));
        let request = RpcRequest {
            method,
            params: (args.to_vec(), options),
            id: 0,
        };

        debug!(method, "FreeIPA call");
        let response = self
            .http
            .post(format!("{}/ipa/session/json", self.base_url))
            .header(header::REFERER, self.referer())
            .header(header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(FreeIpaError::Authentication(format!(
                "{method} rejected: session not authenticated"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FreeIpaError::UnexpectedResponse {
                method: method.to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let body: RpcResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(FreeIpaError::Rpc {
                method: method.to_string(),
                code: error.code,
                name: error.name,
                message: error.message,
            });
        }
        body.result.ok_or_else(|| FreeIpaError::UnexpectedResponse {
            method: method.to_string(),
            message: "response has neither result nor error".to_string(),
        })
    }
}

impl std::fmt::Debug for FreeIpaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreeIpaClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope() {
        let mut options = Map::new();
        options.insert("all".into(), json!(true));
        options.insert("version".into(), json!("2.251"));
        let request = RpcRequest {
            method: "user_show",
            params: (vec![json!("jdoe")], options),
            id: 0,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "method": "user_show",
                "params": [["jdoe"], {"all": true, "version": "2.251"}],
                "id": 0
            })
        );
    }

    #[test]
    fn test_error_envelope() {
        let body: RpcResponse = serde_json::from_value(json!({
            "result": null,
            "error": {"code": 4001, "name": "NotFound", "message": "jdoe: user not found"},
            "id": 0,
            "principal": "admin@EXAMPLE.COM",
            "version": "4.9.8"
        }))
        .unwrap();
        assert!(body.result.is_none());
        assert_eq!(body.error.unwrap().code, 4001);
    }
}
