/// Production Connector API address.
pub const PRODUCTION_BASE_URL: &str = "https://api.mews.com/api/connector/v1/";

/// Demo environment Connector API address.
pub const DEMO_BASE_URL: &str = "https://api.mews-demo.com/api/connector/v1/";

/// Configures addressing, locale, timeout and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Base address every operation path is appended to.
    pub base_url: String,
    /// Value sent in the `User-Agent` header.
    pub user_agent: String,
    /// Injected as `LanguageCode` into authenticated payloads when non-empty.
    pub language_code: String,
    /// Injected as `CultureCode` into authenticated payloads when non-empty.
    pub culture_code: String,
    /// Dumps raw requests and responses through `tracing` at debug level.
    pub debug: bool,
    /// Rejects response bodies carrying top-level fields the destination type lacks.
    pub disallow_unknown_fields: bool,
    /// Per-attempt timeout in milliseconds. Zero disables the client timeout.
    pub timeout_ms: u64,
    /// Maximum number of timeout retries after the initial attempt.
    pub max_retries: usize,
    /// Pause before replaying a timed-out request, in milliseconds.
    pub retry_backoff_ms: u64,
    /// Upper bound on resends after `429 Too Many Requests`. `None` keeps
    /// resending for as long as the server throttles.
    pub max_rate_limit_resends: Option<usize>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: PRODUCTION_BASE_URL.to_owned(),
            user_agent: concat!("mews-http/", env!("CARGO_PKG_VERSION")).to_owned(),
            language_code: String::new(),
            culture_code: String::new(),
            debug: false,
            disallow_unknown_fields: false,
            timeout_ms: 30_000,
            max_retries: 0,
            retry_backoff_ms: 500,
            max_rate_limit_resends: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientOptions, PRODUCTION_BASE_URL};

    #[test]
    fn defaults_target_production_without_retries() {
        let options = ClientOptions::default();
        assert_eq!(options.base_url, PRODUCTION_BASE_URL);
        assert_eq!(options.max_retries, 0);
        assert_eq!(options.retry_backoff_ms, 500);
        assert!(options.user_agent.starts_with("mews-http/"));
        assert!(options.max_rate_limit_resends.is_none());
    }
}
