//! Outbound request envelope and the payload capability the builder injects
//! credentials through.

use std::time::{Duration, Instant};

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT},
    Method,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{MewsError, Result};

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub(crate) const JSON_ACCEPT: &str = "application/json";

/// Deadline and cancellation attached to a single logical call.
///
/// The default context has neither, so the client timeout applies and
/// timed-out attempts may be retried. Setting a deadline turns off timeout
/// retries for the call.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl RequestContext {
    /// Context with no deadline and no cancellation.
    pub fn background() -> Self {
        Self::default()
    }

    /// Sets an absolute deadline for the whole call.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Attaches a token that aborts the call when cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Envelope fields shared by every authenticated request body.
///
/// Embed with `#[serde(flatten)]` and implement [`Authenticatable`] to let the
/// client fill in credentials before the body is encoded.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BaseRequest {
    pub access_token: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_token: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub language_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub culture_code: String,
    /// Name of the integration, shown in the platform's audit log.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client: String,
    #[serde(skip)]
    context: RequestContext,
}

impl BaseRequest {
    pub fn set_context(&mut self, context: RequestContext) {
        self.context = context;
    }
}

/// Payloads that accept injected credentials and carry a request context.
///
/// Only the two accessors are required; the setters write into the embedded
/// [`BaseRequest`].
pub trait Authenticatable: Serialize {
    fn base_request(&self) -> &BaseRequest;

    fn base_request_mut(&mut self) -> &mut BaseRequest;

    fn set_access_token(&mut self, token: &str) {
        self.base_request_mut().access_token = token.to_owned();
    }

    fn set_client_token(&mut self, token: &str) {
        self.base_request_mut().client_token = token.to_owned();
    }

    fn set_language_code(&mut self, code: &str) {
        self.base_request_mut().language_code = code.to_owned();
    }

    fn set_culture_code(&mut self, code: &str) {
        self.base_request_mut().culture_code = code.to_owned();
    }

    fn context(&self) -> RequestContext {
        self.base_request().context.clone()
    }
}

impl Authenticatable for BaseRequest {
    fn base_request(&self) -> &BaseRequest {
        self
    }

    fn base_request_mut(&mut self) -> &mut BaseRequest {
        self
    }
}

/// A fully formed `POST` ready for the transport executor.
///
/// The encoded body is kept as bytes so every attempt of the same call sends
/// exactly the same payload.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    url: Url,
    headers: HeaderMap,
    body: Vec<u8>,
    context: RequestContext,
}

impl ApiRequest {
    pub(crate) fn new(
        url: Url,
        body: Vec<u8>,
        user_agent: &str,
        context: RequestContext,
    ) -> Result<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MewsError::Url(format!(
                "unsupported scheme '{}' in {url}",
                url.scheme()
            )));
        }

        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|err| MewsError::InvalidHeader(format!("user agent: {err}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_ACCEPT));
        headers.insert(USER_AGENT, user_agent);

        Ok(Self {
            url,
            headers,
            body,
            context,
        })
    }

    pub fn method(&self) -> Method {
        Method::POST
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Encoded JSON body. Empty when the request was built without a payload.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Materializes one attempt. Each call copies the saved body bytes.
    pub(crate) fn to_http(&self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method(), self.url.clone());
        *request.headers_mut() = self.headers.clone();
        if !self.body.is_empty() {
            *request.body_mut() = Some(self.body.clone().into());
        }
        request
    }
}
