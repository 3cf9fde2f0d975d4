//! API client for the assistant backend.
//!
//! `ApiClient::request` is the single egress point: it builds the default
//! headers (JSON content type, bearer token from the session store), lets the
//! caller override them, and turns failed responses into an [`ApiError`]
//! carrying only a readable message. The typed endpoint methods below are thin
//! wrappers over it.

use std::time::Duration;

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::SessionStore;
use crate::config::Config;
use crate::models::{
    AuthResponse, ConversationSummary, LoginRequest, ProfileUpdate, RegisterRequest, WireMessage,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Multipart field carrying a new profile picture
const AVATAR_FIELD: &str = "foto";

/// Reply used when `/ai/chat` answers without a textual `reply`
pub const NO_REPLY_FALLBACK: &str = "Não consegui obter uma resposta agora. Tente novamente.";

/// Body of an outgoing request.
#[derive(Debug)]
pub enum RequestBody {
    Json(Value),
    /// Sent as `multipart/form-data`; never labelled as JSON.
    Multipart(Form),
}

/// Method, body and extra headers for [`ApiClient::request`].
#[derive(Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<RequestBody>,
    /// Caller headers; these win over the defaults on conflict.
    pub headers: HeaderMap,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: HeaderMap::new(),
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(RequestBody::Json(body)),
            ..Self::default()
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: Method::PUT,
            body: Some(RequestBody::Json(body)),
            ..Self::default()
        }
    }

    pub fn put_multipart(form: Form) -> Self {
        Self {
            method: Method::PUT,
            body: Some(RequestBody::Multipart(form)),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    fn is_multipart(&self) -> bool {
        matches!(self.body, Some(RequestBody::Multipart(_)))
    }
}

/// API client for the assistant backend.
/// Clone is cheap - reqwest::Client and SessionStore are both shared handles.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    /// Create a client for the configured backend.
    pub fn new(config: &Config, session: SessionStore) -> Result<Self> {
        let timeout = match config.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self::with_base_url(config.api_url(), session, timeout)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        session: SessionStore,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Headers for one request: JSON content type unless multipart, bearer
    /// token when a session exists, then the caller's headers on top.
    pub fn request_headers(&self, multipart: bool, overrides: &HeaderMap) -> Result<HeaderMap, ApiError> {
        build_headers(self.session.token().as_deref(), multipart, overrides)
    }

    /// Send one request and return the parsed JSON body.
    ///
    /// A 401 on a request that carried the session token means the backend
    /// no longer accepts it: the session is cleared before the error is
    /// returned, unless another session has been started meanwhile.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let url = self.url(path);
        let token = self.session.token();
        let headers = build_headers(token.as_deref(), options.is_multipart(), &options.headers)?;

        debug!(method = %options.method, url = %url, authenticated = token.is_some(), "Sending request");

        let mut builder = self.client.request(options.method, &url);
        builder = match options.body {
            Some(RequestBody::Json(body)) => builder.body(body.to_string()),
            Some(RequestBody::Multipart(form)) => builder.multipart(form),
            None => builder,
        };
        let response = builder.headers(headers).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let (StatusCode::UNAUTHORIZED, Some(sent)) = (status, token.as_deref()) {
                if self.session.clear_if_token(sent) {
                    warn!(url = %url, "Token rejected by backend, clearing session");
                } else {
                    debug!(url = %url, "Rejected token is no longer the current session");
                }
            }
            let error = ApiError::from_status(status, &body);
            debug!(status = status.as_u16(), error = %error, "Request failed");
            return Err(error);
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(url = %url, error = %e, "Response body is not valid JSON");
            ApiError::InvalidResponse(e.to_string())
        })
    }

    // ===== Account =====

    /// `POST /login`
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            senha: password.to_string(),
        })
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        let data = self.request("/login", RequestOptions::post(body)).await?;
        AuthResponse::from_value(&data)
            .ok_or_else(|| ApiError::InvalidResponse("resposta de login sem token".to_string()))
    }

    /// `POST /users`
    pub async fn register(&self, payload: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let body = serde_json::to_value(payload)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        let data = self.request("/users", RequestOptions::post(body)).await?;
        AuthResponse::from_value(&data)
            .ok_or_else(|| ApiError::InvalidResponse("resposta de cadastro sem token".to_string()))
    }

    /// `PUT /users/{slug}` with the changed fields. Goes multipart when a new
    /// avatar is attached. Returns the updated user object.
    pub async fn update_profile(&self, slug: &str, update: ProfileUpdate) -> Result<Value, ApiError> {
        let path = format!("/users/{}", slug);
        let options = match update.avatar {
            Some(avatar) => {
                let mut form = Form::new();
                for (key, value) in update.fields {
                    form = form.text(key, value);
                }
                let part = Part::bytes(avatar.bytes)
                    .file_name(avatar.file_name)
                    .mime_str(&avatar.mime)?;
                RequestOptions::put_multipart(form.part(AVATAR_FIELD, part))
            }
            None => RequestOptions::put(update.fields_json()),
        };
        let data = self.request(&path, options).await?;
        Ok(match data.get("usuario") {
            Some(user) if user.is_object() => user.clone(),
            _ => data,
        })
    }

    // ===== Assistant =====

    /// `GET /ai/history`. Accepts a bare list or `{items: [...]}`.
    pub async fn history(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        let data = self.request("/ai/history", RequestOptions::get()).await?;
        let items = match &data {
            Value::Array(items) => items.as_slice(),
            other => other
                .get("items")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        };
        Ok(items.iter().filter_map(ConversationSummary::from_value).collect())
    }

    /// `GET /ai/history/{id}`
    pub async fn conversation(&self, id: &str) -> Result<Vec<WireMessage>, ApiError> {
        let data = self
            .request(&format!("/ai/history/{}", id), RequestOptions::get())
            .await?;
        Ok(data
            .get("messages")
            .and_then(Value::as_array)
            .map(|msgs| msgs.iter().map(WireMessage::from_value).collect())
            .unwrap_or_default())
    }

    /// `POST /ai/chat` with the whole transcript; returns the assistant reply.
    pub async fn chat(&self, messages: &[WireMessage]) -> Result<String, ApiError> {
        let body = serde_json::json!({ "messages": messages });
        let data = self.request("/ai/chat", RequestOptions::post(body)).await?;
        Ok(match data.get("reply") {
            Some(Value::String(reply)) => reply.clone(),
            _ => NO_REPLY_FALLBACK.to_string(),
        })
    }
}

fn build_headers(token: Option<&str>, multipart: bool, overrides: &HeaderMap) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    if !multipart {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ApiError::InvalidHeader(e.to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    headers.extend(overrides.clone());
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionRecord;

    fn client(session: SessionStore) -> ApiClient {
        ApiClient::with_base_url("http://localhost:3000/", session, None).expect("client")
    }

    #[test]
    fn test_url_joining() {
        let api = client(SessionStore::in_memory());
        assert_eq!(api.base_url(), "http://localhost:3000");
        assert_eq!(api.url("/login"), "http://localhost:3000/login");
        assert_eq!(api.url("ai/history"), "http://localhost:3000/ai/history");
    }

    #[test]
    fn test_headers_without_session() {
        let api = client(SessionStore::in_memory());
        let headers = api.request_headers(false, &HeaderMap::new()).expect("headers");
        assert_eq!(headers.get(CONTENT_TYPE).map(|v| v.as_bytes()), Some(&b"application/json"[..]));
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_headers_with_session() {
        let session = SessionStore::in_memory();
        session.write(SessionRecord::new("tok123", None));
        let api = client(session);
        let headers = api.request_headers(false, &HeaderMap::new()).expect("headers");
        assert_eq!(
            headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer tok123")
        );
    }

    #[test]
    fn test_multipart_never_gets_json_content_type() {
        let session = SessionStore::in_memory();
        session.write(SessionRecord::new("tok123", None));
        let api = client(session);
        let headers = api.request_headers(true, &HeaderMap::new()).expect("headers");
        assert!(headers.get(CONTENT_TYPE).is_none());
        assert!(headers.get(AUTHORIZATION).is_some());
    }

    #[test]
    fn test_caller_headers_win() {
        let session = SessionStore::in_memory();
        session.write(SessionRecord::new("tok123", None));
        let api = client(session);

        let mut overrides = HeaderMap::new();
        overrides.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        overrides.insert(AUTHORIZATION, HeaderValue::from_static("Bearer other"));
        let headers = api.request_headers(false, &overrides).expect("headers");

        assert_eq!(headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()), Some("text/plain"));
        assert_eq!(headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()), Some("Bearer other"));
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn test_token_with_invalid_characters() {
        let session = SessionStore::in_memory();
        session.write(SessionRecord::new("bad\ntoken", None));
        let api = client(session);
        assert!(matches!(
            api.request_headers(false, &HeaderMap::new()),
            Err(ApiError::InvalidHeader(_))
        ));
    }
}
