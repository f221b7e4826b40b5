use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::{ApiError, ApiResponse, FieldErrors};
use crate::core::session::SessionStore;

/// HTTP client for the guide backend.
///
/// Every call resolves to an [`ApiResponse`] whatever the status; only
/// transport and decoding failures become [`ApiError`]. Timeouts are set
/// here, on the underlying `reqwest::Client`.
///
/// # Example
/// ```no_run
/// # async fn demo() -> Result<(), trailguide::api::types::ApiError> {
/// use std::time::Duration;
/// use trailguide::api::client::ApiClient;
///
/// let client = ApiClient::new("https://api.example.com/v1", Duration::from_secs(15))?;
/// let response = client.get::<serde_json::Value>("places/nearby?lat=41.15&lng=-8.61").await?;
/// if response.is_success() {
///     println!("{:?}", response.data);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    session: Option<SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::Config(format!("base URL must be http(s): {base_url}")));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            base_url,
            client,
            session: None,
        })
    }

    /// Attach a session so requests carry `Authorization: Bearer <token>`
    /// whenever one is stored.
    pub fn with_session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.request::<(), T>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.request::<(), T>(Method::DELETE, path, None).await
    }

    pub async fn request<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, ApiError> {
        let url = self.url(path);
        let mut builder = self.client.request(method.clone(), &url);

        if let Some(session) = &self.session
            && let Some(token) = session.get_auth_token().await
        {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        info!("API request: {} {}", method, url);
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        debug!("API response status: {}", status);

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            warn!("API error: {} - {}", status, text);
        }
        parse_body(status, &text)
    }
}

/// Maps a response body onto [`ApiResponse`].
///
/// Accepts the envelope `{ "data": .., "message": .., "errors": .., "code": .. }`
/// or, on success, a bare JSON payload. Error bodies that aren't JSON
/// become the message.
pub fn parse_body<T: DeserializeOwned>(status: u16, text: &str) -> Result<ApiResponse<T>, ApiError> {
    let success = (200..300).contains(&status);
    let trimmed = text.trim();

    let value: Value = if trimmed.is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) if success => return Err(ApiError::Parse(e.to_string())),
            Err(_) => return Ok(ApiResponse::failure(status, Some(trimmed))),
        }
    };

    let envelope = value.as_object().filter(|obj| obj.contains_key("data"));
    let message = ["message", "error"]
        .into_iter()
        .find_map(|key| value.get(key).and_then(message_text));
    let code = value.get("code").and_then(Value::as_str).map(str::to_string);
    let errors = value
        .get("errors")
        .and_then(|e| serde_json::from_value::<FieldErrors>(e.clone()).ok());

    if !success {
        return Ok(ApiResponse {
            data: None,
            message,
            status,
            errors,
            code,
        });
    }

    let payload = match envelope {
        Some(obj) => obj.get("data").cloned().unwrap_or(Value::Null),
        None => value.clone(),
    };
    let data = serde_json::from_value(payload).map_err(|e| ApiError::Parse(e.to_string()))?;

    Ok(ApiResponse {
        data: Some(data),
        message: if envelope.is_some() { message } else { None },
        status,
        errors: None,
        code: None,
    })
}

/// A message field as text. Lists of strings (one per validation failure)
/// are joined with ", ".
fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
            parts.filter(|p| !p.is_empty()).map(|p| p.join(", "))
        }
        _ => None,
    }
}
