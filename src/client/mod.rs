//! Authenticated request executor.
//!
//! One [`ApiClient`] per process or tenant. It attaches the bearer token,
//! encodes and decodes bodies, and on a 401 goes through the shared
//! [`SessionManager`] refresh before retrying the request exactly once.

pub mod api;
pub mod error;
pub mod session;
pub mod transport;

pub use api::CurrentUser;
pub use error::{ApiError, ApiErrorCode};
pub use session::{AuthState, SessionManager, TokenPair};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::FutureExt;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use session::RefreshFuture;

pub const REFRESH_PATH: &str = "/api/auth/refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    #[default]
    Json,
    Text,
    Binary,
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Text(String),
    /// Sent untouched, e.g. audio or a pre-encoded multipart payload.
    Raw { bytes: Bytes, content_type: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Binary(Bytes),
}

impl ResponseBody {
    pub fn into_json(self) -> Result<Value, ApiError> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Text(text) => serde_json::from_str(&text)
                .map_err(|err| ApiError::decode(format!("invalid JSON body: {err}"))),
            Self::Binary(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| ApiError::decode(format!("invalid JSON body: {err}"))),
        }
    }

    pub fn into_text(self) -> Result<String, ApiError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Json(value) => Ok(value.to_string()),
            Self::Binary(bytes) => String::from_utf8(bytes.to_vec())
                .map_err(|err| ApiError::decode(format!("body is not UTF-8: {err}"))),
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Binary(bytes) => bytes,
            Self::Text(text) => Bytes::from(text),
            Self::Json(value) => Bytes::from(value.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: RequestBody,
    pub auth_required: bool,
    pub response_kind: ResponseKind,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: RequestBody::Empty,
            auth_required: true,
            response_kind: ResponseKind::Json,
            timeout: None,
            cancel: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self::method(Method::POST)
    }

    pub fn put() -> Self {
        Self::method(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::method(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::method(Method::DELETE)
    }

    pub fn method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn json_body<T: Serialize>(self, value: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(value)
            .map_err(|err| ApiError::decode(format!("failed to encode request body: {err}")))?;
        Ok(self.json(value))
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = RequestBody::Text(text.into());
        self
    }

    pub fn raw(mut self, bytes: Bytes, content_type: impl Into<String>) -> Self {
        self.body = RequestBody::Raw {
            bytes,
            content_type: content_type.into(),
        };
        self
    }

    /// Skips the bearer token and the refresh path.
    pub fn public(mut self) -> Self {
        self.auth_required = false;
        self
    }

    pub fn response_kind(mut self, kind: ResponseKind) -> Self {
        self.response_kind = kind;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionManager>,
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        let transport = Arc::new(ReqwestTransport::new());
        Self::with_transport(config, transport, Arc::new(SessionManager::new()))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        session: Arc<SessionManager>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                session,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.inner.session
    }

    pub fn on_unauthenticated(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.inner.session.set_on_unauthenticated(hook);
    }

    /// Executes one logical request. A 401 on an authenticated request with a
    /// refresh token triggers (or joins) a refresh and one retry; the retry
    /// never refreshes again.
    pub async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ResponseBody, ApiError> {
        let url = self.inner.config.url(path);
        let session = &self.inner.session;
        let mut is_retry = false;

        loop {
            if options.auth_required && session.is_invalid() {
                return Err(ApiError::session_expired());
            }

            let sent_token = if options.auth_required {
                session.access_token()
            } else {
                None
            };
            let request = build_request(&url, &options, sent_token.as_deref())?;
            debug!(method = %options.method, %url, is_retry, "dispatching request");
            let response = self.dispatch(request, &options).await?;

            if response.status == 401
                && options.auth_required
                && !is_retry
                && session.has_refresh_token()
            {
                let refreshed = session
                    .refresh_after_unauthorized(sent_token.as_deref(), |refresh_token| {
                        self.refresh_future(refresh_token)
                    })
                    .await;
                match refreshed {
                    Ok(()) => {
                        is_retry = true;
                        continue;
                    }
                    Err(err) => {
                        warn!(%url, error = %err, "refresh did not recover request");
                        return Err(ApiError::from_response(&response));
                    }
                }
            }

            if !response.is_success() {
                let err = ApiError::from_response(&response);
                debug!(%url, status = response.status, code = %err.code, "request failed");
                return Err(err);
            }

            return decode_response(response, options.response_kind);
        }
    }

    /// JSON request decoded into `T`. A `{ "success": true, "data": ... }`
    /// envelope is unwrapped first.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let value = self
            .request(path, options.response_kind(ResponseKind::Json))
            .await?
            .into_json()?;
        serde_json::from_value(unwrap_envelope(value))
            .map_err(|err| ApiError::decode(format!("unexpected response shape: {err}")))
    }

    async fn dispatch(
        &self,
        request: HttpRequest,
        options: &RequestOptions,
    ) -> Result<HttpResponse, ApiError> {
        let timeout = options.timeout.unwrap_or(self.inner.config.request_timeout);
        send_with_timeout(
            self.inner.transport.as_ref(),
            request,
            timeout,
            options.cancel.as_ref(),
        )
        .await
    }

    fn refresh_future(&self, refresh_token: String) -> RefreshFuture {
        let transport = Arc::clone(&self.inner.transport);
        let url = self.inner.config.url(REFRESH_PATH);
        let timeout = self.inner.config.request_timeout;

        async move {
            let options = RequestOptions::post()
                .public()
                .json(serde_json::json!({ "refreshToken": refresh_token }));
            let request = build_request(&url, &options, None)?;
            let response = send_with_timeout(transport.as_ref(), request, timeout, None).await?;
            if !response.is_success() {
                return Err(ApiError::from_response(&response));
            }
            let value = decode_response(response, ResponseKind::Json)?.into_json()?;
            parse_token_pair(&value).ok_or_else(|| {
                ApiError::unauthorized("refresh response is missing accessToken or refreshToken")
            })
        }
        .boxed()
    }
}

async fn send_with_timeout(
    transport: &dyn HttpTransport,
    request: HttpRequest,
    timeout: Duration,
    cancel: Option<&CancellationToken>,
) -> Result<HttpResponse, ApiError> {
    let send = tokio::time::timeout(timeout, transport.send(request));
    let outcome = match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(ApiError::cancelled()),
                outcome = send => outcome,
            }
        }
        None => send.await,
    };

    match outcome {
        Err(_elapsed) => Err(ApiError::timeout()),
        Ok(Err(TransportError::Timeout)) => Err(ApiError::timeout()),
        Ok(Err(err)) => Err(ApiError::network(err.to_string())),
        Ok(Ok(response)) => Ok(response),
    }
}

fn build_request(
    url: &str,
    options: &RequestOptions,
    bearer: Option<&str>,
) -> Result<HttpRequest, ApiError> {
    let mut headers: Vec<(String, String)> = Vec::new();
    let accept = match options.response_kind {
        ResponseKind::Json => "application/json",
        ResponseKind::Text => "text/plain, */*",
        ResponseKind::Binary => "*/*",
    };
    headers.push(("accept".to_string(), accept.to_string()));
    if let Some(token) = bearer {
        headers.push(("authorization".to_string(), format!("Bearer {token}")));
    }

    let body = match &options.body {
        RequestBody::Empty => None,
        RequestBody::Json(value) => {
            headers.push(("content-type".to_string(), "application/json".to_string()));
            let encoded = serde_json::to_vec(value)
                .map_err(|err| ApiError::decode(format!("failed to encode request body: {err}")))?;
            Some(Bytes::from(encoded))
        }
        RequestBody::Text(text) => {
            headers.push((
                "content-type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            ));
            Some(Bytes::from(text.clone()))
        }
        RequestBody::Raw {
            bytes,
            content_type,
        } => {
            headers.push(("content-type".to_string(), content_type.clone()));
            Some(bytes.clone())
        }
    };

    Ok(HttpRequest {
        method: options.method.clone(),
        url: url.to_string(),
        headers,
        body,
    })
}

fn decode_response(response: HttpResponse, kind: ResponseKind) -> Result<ResponseBody, ApiError> {
    match kind {
        ResponseKind::Json => {
            if response.body.iter().all(u8::is_ascii_whitespace) {
                return Ok(ResponseBody::Json(Value::Null));
            }
            serde_json::from_slice(&response.body)
                .map(ResponseBody::Json)
                .map_err(|err| ApiError::decode(format!("invalid JSON body: {err}")))
        }
        ResponseKind::Text => String::from_utf8(response.body.to_vec())
            .map(ResponseBody::Text)
            .map_err(|err| ApiError::decode(format!("body is not UTF-8: {err}"))),
        ResponseKind::Binary => Ok(ResponseBody::Binary(response.body)),
    }
}

fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("success") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Reads `{ accessToken, refreshToken }`, bare or inside a `data` envelope.
/// Either field missing or empty yields `None`.
pub(crate) fn parse_token_pair(value: &Value) -> Option<TokenPair> {
    let body = value.get("data").filter(|data| data.is_object()).unwrap_or(value);
    let access = body.get("accessToken")?.as_str()?.trim();
    let refresh = body.get("refreshToken")?.as_str()?.trim();
    if access.is_empty() || refresh.is_empty() {
        return None;
    }
    Some(TokenPair::new(access, refresh))
}
