use std::{fmt, sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::{header::HeaderMap, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::Instant;
use url::Url;

use crate::{
    decode::{classify_error, decode_json},
    request::{ApiRequest, Authenticatable, RequestContext},
    resources::{Bills, Configuration, Customers},
    throttle::{parse_retry_after, pause, RetryAfterGate},
    ClientOptions, MewsError, Result, DEMO_BASE_URL,
};

/// Called after every completed HTTP exchange with the request URL and the
/// response status, including responses that are retried or turned into errors.
pub type RequestCompletionCallback = Arc<dyn Fn(&Url, StatusCode) + Send + Sync>;

/// Raw response of a successful (2xx) call.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

enum Exchange {
    Completed(ApiResponse),
    TimedOut,
}

#[derive(Clone)]
/// HTTP client for the Mews Connector API.
///
/// Clones share the connection pool and the `Retry-After` throttle.
pub struct MewsClient {
    http: reqwest::Client,
    access_token: String,
    client_token: String,
    options: ClientOptions,
    retry_after: RetryAfterGate,
    on_request_completed: Option<RequestCompletionCallback>,
}

impl fmt::Debug for MewsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MewsClient")
            .field("access_token", &"<redacted>")
            .field("client_token", &"<redacted>")
            .field("options", &self.options)
            .field("retry_after", &self.retry_after.get())
            .finish()
    }
}

impl MewsClient {
    /// Creates a client for the production API.
    pub fn new(access_token: impl Into<String>, client_token: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), access_token, client_token)
    }

    /// Creates a client for the demo environment.
    pub fn demo(access_token: impl Into<String>, client_token: impl Into<String>) -> Self {
        let mut client = Self::new(access_token, client_token);
        client.set_base_url(DEMO_BASE_URL);
        client
    }

    /// Creates a client on top of a preconfigured `reqwest::Client`.
    pub fn with_http_client(
        http: reqwest::Client,
        access_token: impl Into<String>,
        client_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            access_token: access_token.into(),
            client_token: client_token.into(),
            options: ClientOptions::default(),
            retry_after: RetryAfterGate::default(),
            on_request_completed: None,
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `MEWS_ACCESS_TOKEN`: access token of the enterprise
    /// - `MEWS_CLIENT_TOKEN`: client token of the integration
    /// - `MEWS_BASE_URL`: optional, defaults to the production API
    ///
    /// Returns an error if either token is missing or empty.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mews_http::MewsClient;
    ///
    /// let client = MewsClient::from_env().expect("missing MEWS_* env vars");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        let access_token = std::env::var("MEWS_ACCESS_TOKEN")
            .map_err(|_| "missing MEWS_ACCESS_TOKEN environment variable".to_owned())?;
        let client_token = std::env::var("MEWS_CLIENT_TOKEN")
            .map_err(|_| "missing MEWS_CLIENT_TOKEN environment variable".to_owned())?;
        if access_token.trim().is_empty() {
            return Err("MEWS_ACCESS_TOKEN is set but empty".to_owned());
        }
        if client_token.trim().is_empty() {
            return Err("MEWS_CLIENT_TOKEN is set but empty".to_owned());
        }

        let mut client = Self::new(access_token.trim(), client_token.trim());
        if let Ok(base_url) = std::env::var("MEWS_BASE_URL") {
            if !base_url.trim().is_empty() {
                client.set_base_url(base_url.trim());
            }
        }
        Ok(client)
    }

    /// Applies client options such as base URL, timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Registers a hook run after every HTTP exchange.
    pub fn on_request_completed<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Url, StatusCode) + Send + Sync + 'static,
    {
        self.on_request_completed = Some(Arc::new(callback));
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    pub fn set_client_token(&mut self, token: impl Into<String>) {
        self.client_token = token.into();
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.options.base_url = base_url.into();
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.options.user_agent = user_agent.into();
    }

    pub fn set_language_code(&mut self, code: impl Into<String>) {
        self.options.language_code = code.into();
    }

    pub fn set_culture_code(&mut self, code: impl Into<String>) {
        self.options.culture_code = code.into();
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.options.debug = debug;
    }

    pub fn set_disallow_unknown_fields(&mut self, disallow: bool) {
        self.options.disallow_unknown_fields = disallow;
    }

    /// Sets the per-attempt timeout. `Duration::ZERO` disables it.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.options.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    }

    pub fn set_max_retries(&mut self, max_retries: usize) {
        self.options.max_retries = max_retries;
    }

    pub fn bills(&self) -> Bills<'_> {
        Bills::new(self)
    }

    pub fn configuration(&self) -> Configuration<'_> {
        Configuration::new(self)
    }

    pub fn customers(&self) -> Customers<'_> {
        Customers::new(self)
    }

    /// Fails when either token is empty; no request is made in that case.
    pub fn check_tokens(&self) -> Result<()> {
        if self.access_token.is_empty() {
            return Err(MewsError::MissingAccessToken);
        }
        if self.client_token.is_empty() {
            return Err(MewsError::MissingClientToken);
        }
        Ok(())
    }

    /// Resolves an operation path such as `bills/getAll` against the base URL.
    pub fn resolve(&self, operation: &str) -> Result<Url> {
        resolve_operation(&self.options.base_url, operation)
    }

    /// Builds a request for an authenticated payload.
    ///
    /// Injects the client's tokens and non-empty locale codes into `payload`
    /// and adopts the payload's request context.
    pub fn new_request<P: Authenticatable>(&self, url: Url, payload: &mut P) -> Result<ApiRequest> {
        payload.set_access_token(&self.access_token);
        payload.set_client_token(&self.client_token);
        if !self.options.language_code.is_empty() {
            payload.set_language_code(&self.options.language_code);
        }
        if !self.options.culture_code.is_empty() {
            payload.set_culture_code(&self.options.culture_code);
        }

        let body = serde_json::to_vec(payload).map_err(MewsError::Serialization)?;
        ApiRequest::new(url, body, &self.options.user_agent, payload.context())
    }

    /// Builds a request for a payload without credential fields.
    ///
    /// Uses a background context; `None` sends an empty body.
    pub fn new_plain_request<P: Serialize + ?Sized>(
        &self,
        url: Url,
        payload: Option<&P>,
    ) -> Result<ApiRequest> {
        let body = match payload {
            Some(payload) => serde_json::to_vec(payload).map_err(MewsError::Serialization)?,
            None => Vec::new(),
        };
        ApiRequest::new(
            url,
            body,
            &self.options.user_agent,
            RequestContext::background(),
        )
    }

    /// Runs one named operation end to end: token check, URL resolution,
    /// request building, sending and decoding.
    pub async fn call<P, T>(&self, operation: &str, payload: &mut P) -> Result<T>
    where
        P: Authenticatable,
        T: DeserializeOwned,
    {
        self.check_tokens()?;
        let url = self.resolve(operation)?;
        let request = self.new_request(url, payload)?;
        self.execute(request).await
    }

    /// Sends `request` and decodes the JSON body into `T`.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        decode_json(&response.body, self.options.disallow_unknown_fields)
    }

    /// Sends `request` and returns the body bytes verbatim.
    pub async fn execute_raw(&self, request: ApiRequest) -> Result<Vec<u8>> {
        Ok(self.send(request).await?.body)
    }

    /// Sends `request` and discards the body.
    pub async fn execute_unit(&self, request: ApiRequest) -> Result<()> {
        self.send(request).await.map(|_| ())
    }

    /// Sends `request`, handling timeout retries and `429` throttling.
    ///
    /// Non-2xx responses other than `429` become [`MewsError::Api`].
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let context = request.context().clone();
        let mut attempt = 0usize;
        let mut rate_limit_resends = 0usize;

        loop {
            self.retry_after.wait(&context).await?;
            if context.is_cancelled() {
                return Err(MewsError::Cancelled);
            }

            let (deadline, allow_retry) = match context.deadline() {
                Some(deadline) => (Some(Instant::from_std(deadline)), false),
                None if self.options.timeout_ms > 0 => (
                    Some(Instant::now() + Duration::from_millis(self.options.timeout_ms)),
                    attempt < self.options.max_retries,
                ),
                None => (None, false),
            };

            if self.options.debug {
                dump_request(&request, attempt);
            }

            let response = match self.send_once(&request, deadline, &context).await? {
                Exchange::Completed(response) => response,
                Exchange::TimedOut if allow_retry => {
                    tracing::warn!(
                        url = %request.url(),
                        attempt,
                        max_retries = self.options.max_retries,
                        "request timed out, retrying"
                    );
                    pause(Duration::from_millis(self.options.retry_backoff_ms), &context).await?;
                    attempt += 1;
                    continue;
                }
                Exchange::TimedOut => {
                    return Err(MewsError::Timeout {
                        attempts: attempt + 1,
                    })
                }
            };

            if let Some(callback) = &self.on_request_completed {
                callback(request.url(), response.status);
            }
            if self.options.debug {
                dump_response(request.url(), &response);
            }

            if response.status == StatusCode::TOO_MANY_REQUESTS {
                if self
                    .options
                    .max_rate_limit_resends
                    .is_some_and(|limit| rate_limit_resends >= limit)
                {
                    return Err(MewsError::RateLimitExhausted {
                        resends: rate_limit_resends,
                    });
                }
                rate_limit_resends += 1;
                self.throttle(&response.headers, &context).await?;
                continue;
            }

            if !response.status.is_success() {
                let error = classify_error(
                    response.status,
                    request.url(),
                    &response.headers,
                    &response.body,
                );
                return Err(error.into());
            }

            return Ok(response);
        }
    }

    /// Performs a single attempt bounded by `deadline` and the context's
    /// cancellation token.
    async fn send_once(
        &self,
        request: &ApiRequest,
        deadline: Option<Instant>,
        context: &RequestContext,
    ) -> Result<Exchange> {
        let exchange = async {
            let response = self
                .http
                .execute(request.to_http())
                .await
                .map_err(MewsError::Transport)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(MewsError::Transport)?;
            Ok::<_, MewsError>(ApiResponse {
                status,
                headers,
                body: body.to_vec(),
            })
        };

        let bounded = async {
            match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, exchange).await {
                    Ok(result) => result.map(Exchange::Completed),
                    Err(_) => Ok(Exchange::TimedOut),
                },
                None => exchange.await.map(Exchange::Completed),
            }
        };

        match context.cancellation() {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(MewsError::Cancelled),
                result = bounded => result,
            },
            None => bounded.await,
        }
    }

    /// Records the server's `Retry-After`, waits it out and releases the gate.
    /// Without the header the regular retry backoff is applied instead.
    async fn throttle(&self, headers: &HeaderMap, context: &RequestContext) -> Result<()> {
        match parse_retry_after(headers, Utc::now()) {
            Some(until) => {
                tracing::warn!(%until, "rate limited, waiting for retry-after");
                self.retry_after.set(until);
                let waited = self.retry_after.wait(context).await;
                self.retry_after.clear(until);
                waited
            }
            None => {
                tracing::warn!("rate limited without retry-after, backing off");
                pause(Duration::from_millis(self.options.retry_backoff_ms), context).await
            }
        }
    }
}

/// Appends `operation` to the base URL path with exactly one `/` between them.
pub(crate) fn resolve_operation(base_url: &str, operation: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|err| MewsError::Url(format!("invalid base url '{base_url}': {err}")))?;
    if url.cannot_be_a_base() {
        return Err(MewsError::Url(format!(
            "base url '{base_url}' cannot carry a path"
        )));
    }

    let path = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        operation.trim_start_matches('/')
    );
    url.set_path(&path);
    Ok(url)
}

fn dump_request(request: &ApiRequest, attempt: usize) {
    tracing::debug!(
        method = %request.method(),
        url = %request.url(),
        attempt,
        headers = ?request.headers(),
        body = %String::from_utf8_lossy(request.body()),
        "outbound request"
    );
}

fn dump_response(url: &Url, response: &ApiResponse) {
    tracing::debug!(
        url = %url,
        status = %response.status,
        headers = ?response.headers,
        body = %String::from_utf8_lossy(&response.body),
        "inbound response"
    );
}

#[cfg(test)]
mod tests {
    use super::{resolve_operation, MewsClient};
    use crate::{request::BaseRequest, MewsError, DEMO_BASE_URL};

    #[test]
    fn resolve_appends_operation_to_base_path() {
        let url = resolve_operation("https://api.mews.com/api/connector/v1/", "bills/getAll")
            .expect("must resolve");
        assert_eq!(url.as_str(), "https://api.mews.com/api/connector/v1/bills/getAll");
    }

    #[test]
    fn resolve_inserts_single_separator() {
        let url = resolve_operation("http://127.0.0.1:8080/api", "/customers/getAll")
            .expect("must resolve");
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/customers/getAll");
    }

    #[test]
    fn resolve_rejects_malformed_base() {
        let err = resolve_operation("not a url", "bills/getAll").expect_err("must fail");
        assert!(matches!(err, MewsError::Url(_)));

        let err = resolve_operation("mailto:ops@example.com", "bills/getAll")
            .expect_err("must fail");
        assert!(matches!(err, MewsError::Url(_)));
    }

    #[test]
    fn check_tokens_requires_both_tokens() {
        assert!(matches!(
            MewsClient::new("", "client").check_tokens(),
            Err(MewsError::MissingAccessToken)
        ));
        assert!(matches!(
            MewsClient::new("access", "").check_tokens(),
            Err(MewsError::MissingClientToken)
        ));
        assert!(MewsClient::new("access", "client").check_tokens().is_ok());
    }

    #[test]
    fn new_request_injects_credentials_and_locale() {
        let mut client = MewsClient::new("access", "client");
        client.set_language_code("nl-NL");
        let url = client.resolve("configuration/get").expect("must resolve");

        let mut payload = BaseRequest::default();
        let request = client.new_request(url, &mut payload).expect("must build");

        let body: serde_json::Value =
            serde_json::from_slice(request.body()).expect("body must be JSON");
        assert_eq!(body["AccessToken"], "access");
        assert_eq!(body["ClientToken"], "client");
        assert_eq!(body["LanguageCode"], "nl-NL");
        assert!(body.get("CultureCode").is_none());
        assert_eq!(payload.access_token, "access");
    }

    #[test]
    fn new_plain_request_without_payload_has_empty_body() {
        let client = MewsClient::new("access", "client");
        let url = client.resolve("configuration/get").expect("must resolve");
        let request = client
            .new_plain_request::<serde_json::Value>(url, None)
            .expect("must build");
        assert!(request.body().is_empty());
        assert!(request.context().deadline().is_none());
    }

    #[test]
    fn demo_client_targets_demo_environment() {
        let client = MewsClient::demo("a", "c");
        assert_eq!(client.options().base_url, DEMO_BASE_URL);
    }

    #[test]
    fn debug_redacts_tokens() {
        let client = MewsClient::new("secret-access", "secret-client");
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-client"));
    }
}
