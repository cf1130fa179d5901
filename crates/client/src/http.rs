//! HTTP plumbing for the SwiftBot API
//!
//! Every endpoint answers JSON. Failures come back either as a non-2xx status
//! or as a 2xx body with `"success": false`; both carry `error` or `message`
//! text and sometimes a structured `code`.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use swiftbot_billing::FailureCode;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Error fields the API puts in failed responses
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<FailureCode>,
}

/// Body of endpoints that only acknowledge
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Ack {
    #[serde(default)]
    #[allow(dead_code)] // Checked generically in `decode`
    pub success: Option<bool>,
}

/// Authenticated client for the SwiftBot API
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl ApiClient {
    /// Create a client from config
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self::with_http(
            http,
            config.api_url.clone(),
            config.access_token.clone(),
        ))
    }

    pub fn with_http(http: Client, base_url: String, access_token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(Method::GET, path, self.request(Method::GET, path))
            .await
    }

    pub(crate) async fn get_query<T, Q>(&self, path: &str, query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path).query(query);
        self.send(Method::GET, path, builder).await
    }

    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path).json(body);
        self.send(Method::POST, path, builder).await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(Method::POST, path, self.request(Method::POST, path))
            .await
    }

    pub(crate) async fn patch<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::PATCH, path).json(body);
        self.send(Method::PATCH, path, builder).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(Method::DELETE, path, self.request(Method::DELETE, path))
            .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> ClientResult<T> {
        debug!(method = %method, path = %path, "Calling SwiftBot API");

        let response = builder.send().await.map_err(|e| {
            warn!(method = %method, path = %path, error = %e, "SwiftBot API request failed");
            ClientError::Http(e)
        })?;

        decode(&method, path, response).await
    }
}

/// Turn a response into `T`, mapping error statuses and `success: false` bodies
pub(crate) async fn decode<T: DeserializeOwned>(
    method: &Method,
    path: &str,
    response: Response,
) -> ClientResult<T> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = body
            .error
            .or(body.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

        warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            error = %message,
            "SwiftBot API returned an error"
        );

        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
            code: body.code,
        });
    }

    let value: serde_json::Value = if text.trim().is_empty() {
        serde_json::Value::Object(Default::default())
    } else {
        serde_json::from_str(&text)
            .map_err(|e| ClientError::InvalidResponse(format!("{} {}: {}", method, path, e)))?
    };

    if let Ok(body) = ErrorBody::deserialize(&value) {
        if body.success == Some(false) {
            let message = body
                .error
                .or(body.message)
                .unwrap_or_else(|| "Request was not successful".to_string());
            warn!(method = %method, path = %path, error = %message, "SwiftBot API reported failure");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
                code: body.code,
            });
        }
    }

    serde_json::from_value(value)
        .map_err(|e| ClientError::InvalidResponse(format!("{} {}: {}", method, path, e)))
}
