use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AgentloomConfig;
use crate::error::{AgentloomError, AgentloomResult};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Thin wrapper over `reqwest` that prefixes the API base URL, attaches the
/// bearer token and turns non-success responses into [`AgentloomError`].
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
    timezone: String,
    request_timeout: Duration,
    create_timeout: Duration,
    stream_idle_timeout: Option<Duration>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
            timezone: "UTC".to_string(),
            request_timeout: Duration::from_secs(60),
            create_timeout: Duration::from_secs(30),
            stream_idle_timeout: None,
        }
    }

    pub fn from_config(config: &AgentloomConfig) -> AgentloomResult<Self> {
        config.validate()?;
        // No client-wide timeout: it would also cut long chat streams.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AgentloomError::Internal(e.to_string()))?;
        let idle = config.api.stream_idle_timeout_secs;
        Ok(Self {
            http,
            base_url: config.api_base().to_string(),
            token: Arc::new(RwLock::new(None)),
            timezone: config.timezone().to_string(),
            request_timeout: Duration::from_secs(config.api.request_timeout_secs),
            create_timeout: Duration::from_secs(config.api.create_timeout_secs),
            stream_idle_timeout: (idle > 0).then(|| Duration::from_secs(idle)),
        })
    }

    /// Builder-style token. The client gets its own token slot, so clones made
    /// before this call keep theirs; use [`ApiClient::set_token`] to share.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Arc::new(RwLock::new(Some(token.into())));
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_create_timeout(mut self, timeout: Duration) -> Self {
        self.create_timeout = timeout;
        self
    }

    pub fn with_stream_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stream_idle_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn create_timeout(&self) -> Duration {
        self.create_timeout
    }

    pub fn stream_idle_timeout(&self) -> Option<Duration> {
        self.stream_idle_timeout
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Headers every authenticated request carries.
    pub async fn auth_headers(&self) -> AgentloomResult<HeaderMap> {
        let token = self
            .token
            .read()
            .await
            .clone()
            .ok_or(AgentloomError::NotAuthenticated)?;
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AgentloomError::TokenStorage("Token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    async fn authed(&self, method: Method, path: &str) -> AgentloomResult<RequestBuilder> {
        let headers = self.auth_headers().await?;
        Ok(self.public(method, path).headers(headers))
    }

    fn public(&self, method: Method, path: &str) -> RequestBuilder {
        self.request(method, path).timeout(self.request_timeout)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        debug!(%method, path, request_id = %request_id, "API request");
        self.http
            .request(method, self.url(path))
            .header(REQUEST_ID_HEADER, request_id)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AgentloomResult<T> {
        let req = self.authed(Method::GET, path).await?;
        decode(send_checked(req).await?).await
    }

    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AgentloomResult<T> {
        let req = self.authed(Method::GET, path).await?.query(query);
        decode(send_checked(req).await?).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AgentloomResult<T> {
        let req = self.authed(Method::POST, path).await?.json(body);
        decode(send_checked(req).await?).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> AgentloomResult<T> {
        let req = self.authed(Method::POST, path).await?;
        decode(send_checked(req).await?).await
    }

    /// POST with an explicit deadline; exceeding it yields [`AgentloomError::Timeout`].
    pub async fn post_with_timeout<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> AgentloomResult<T> {
        let req = self.authed(Method::POST, path).await?.json(body);
        match tokio::time::timeout(timeout, async { decode(send_checked(req).await?).await }).await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(path, "Request aborted after {:?}", timeout);
                Err(AgentloomError::Timeout(timeout.as_secs()))
            }
        }
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AgentloomResult<T> {
        let req = self.authed(Method::PUT, path).await?.json(body);
        decode(send_checked(req).await?).await
    }

    pub async fn delete(&self, path: &str) -> AgentloomResult<()> {
        let req = self.authed(Method::DELETE, path).await?;
        send_checked(req).await?;
        Ok(())
    }

    /// POST to one of the endpoints that work without a token (login, register...).
    pub async fn post_public<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AgentloomResult<T> {
        let req = self.public(Method::POST, path).json(body);
        decode(send_checked(req).await?).await
    }

    pub async fn get_public<T: DeserializeOwned>(&self, path: &str) -> AgentloomResult<T> {
        let req = self.public(Method::GET, path);
        decode(send_checked(req).await?).await
    }

    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        path: &str,
        file: &Path,
    ) -> AgentloomResult<T> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let req = self.authed(Method::POST, path).await?.multipart(form);
        decode(send_checked(req).await?).await
    }

    /// Open a streaming POST and hand back the raw response once the status is OK.
    pub async fn open_stream<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> AgentloomResult<Response> {
        let headers = self.auth_headers().await?;
        let req = self
            .request(Method::POST, path)
            .headers(headers)
            .header("accept", "text/event-stream")
            .json(body);
        send_checked(req).await
    }
}

async fn send_checked(req: RequestBuilder) -> AgentloomResult<Response> {
    let response = req.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let err = AgentloomError::from_response(status.as_u16(), &body);
    debug!(status = status.as_u16(), "API error: {}", err);
    Err(err)
}

async fn decode<T: DeserializeOwned>(response: Response) -> AgentloomResult<T> {
    let text = response.text().await?;
    let body = if text.trim().is_empty() { "null" } else { &text };
    serde_json::from_str(body).map_err(|e| AgentloomError::ApiParseError(e.to_string()))
}

/// Accept either a bare JSON array or an object wrapping it under `field`.
pub fn unwrap_list<T: DeserializeOwned>(value: Value, field: &str) -> AgentloomResult<Vec<T>> {
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map.remove(field).unwrap_or(Value::Array(Vec::new())),
        Value::Null => Value::Array(Vec::new()),
        other => {
            return Err(AgentloomError::ApiParseError(format!(
                "Expected a list of {}, got {}",
                field, other
            )))
        }
    };
    serde_json::from_value(list).map_err(|e| AgentloomError::ApiParseError(e.to_string()))
}

/// Accept either the bare object or one wrapped under `field`.
pub fn unwrap_object<T: DeserializeOwned>(value: Value, field: &str) -> AgentloomResult<T> {
    let inner = match value {
        Value::Object(ref map) if map.contains_key(field) && map.len() == 1 => {
            map.get(field).cloned().unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(inner).map_err(|e| AgentloomError::ApiParseError(e.to_string()))
}

/// Pull the new resource id out of a create response.
///
/// Servers answer with `{"id": ..}`, `{"<kind>_id": ..}` or `{"<kind>": {"id": ..}}`.
pub fn created_id(value: &Value, kind: &str) -> AgentloomResult<String> {
    let candidates = [
        value.get("id"),
        value.get(format!("{}_id", kind).as_str()),
        value.get(kind).and_then(|inner| inner.get("id")),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| {
            AgentloomError::ApiParseError(format!("Create response carried no {} id", kind))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_created_id_shapes() {
        use serde_json::json;
        assert_eq!(created_id(&json!({"id": "t1"}), "tool").unwrap(), "t1");
        assert_eq!(created_id(&json!({"tool_id": 7}), "tool").unwrap(), "7");
        assert_eq!(
            created_id(&json!({"tool": {"id": "t2"}, "message": "ok"}), "tool").unwrap(),
            "t2"
        );
        assert!(created_id(&json!({"message": "ok"}), "tool").is_err());
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    #[test]
    fn test_unwrap_list_shapes() {
        let bare: Vec<Item> = unwrap_list(serde_json::json!([{"id": "a"}]), "items").unwrap();
        assert_eq!(bare.len(), 1);

        let wrapped: Vec<Item> =
            unwrap_list(serde_json::json!({"items": [{"id": "a"}, {"id": "b"}]}), "items")
                .unwrap();
        assert_eq!(wrapped.len(), 2);

        let missing: Vec<Item> = unwrap_list(serde_json::json!({"total": 0}), "items").unwrap();
        assert!(missing.is_empty());

        assert!(unwrap_list::<Item>(serde_json::json!("nope"), "items").is_err());
    }

    #[test]
    fn test_unwrap_object_shapes() {
        let bare: Item = unwrap_object(serde_json::json!({"id": "a"}), "tool").unwrap();
        assert_eq!(bare.id, "a");

        let wrapped: Item = unwrap_object(serde_json::json!({"tool": {"id": "b"}}), "tool").unwrap();
        assert_eq!(wrapped.id, "b");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/api/agents"), "http://localhost:8000/api/agents");
    }

    #[tokio::test]
    async fn test_auth_headers_require_token() {
        let client = ApiClient::new("http://localhost:8000");
        assert!(matches!(
            client.auth_headers().await,
            Err(AgentloomError::NotAuthenticated)
        ));

        client.set_token(Some("secret".to_string())).await;
        let headers = client.auth_headers().await.unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer secret");
    }

    #[tokio::test]
    async fn test_with_token_builder() {
        let client = ApiClient::new("http://localhost:8000").with_token("t-1");
        assert!(client.is_authenticated().await);
        assert_eq!(client.token().await.as_deref(), Some("t-1"));
    }

    #[tokio::test]
    async fn test_with_token_while_slot_is_locked() {
        let client = ApiClient::new("http://localhost:8000");
        let earlier = client.clone();
        let guard = earlier.token.read().await;

        let client = client.with_token("t-2");
        drop(guard);

        assert_eq!(client.token().await.as_deref(), Some("t-2"));
        assert!(!earlier.is_authenticated().await);

        client.set_token(Some("t-3".to_string())).await;
        let shared = client.clone();
        assert_eq!(shared.token().await.as_deref(), Some("t-3"));
    }
}
