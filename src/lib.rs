//! `mews-http` is an async HTTP client for the Mews Connector API.
//!
//! Every operation is a `POST` of a JSON body to `<base>/<operation>`.
//! [`MewsClient`] injects the access/client tokens into the body, binds a
//! per-attempt timeout, replays timed-out requests up to
//! [`ClientOptions::max_retries`] times, and holds back all calls while the
//! server's `Retry-After` is pending.
//!
//! - [`MewsClient::call`] runs any operation end to end
//! - [`MewsClient::bills`], [`MewsClient::customers`] and
//!   [`MewsClient::configuration`] are typed adapters

mod client;
mod decode;
mod error;
mod options;
mod request;
mod throttle;

pub mod resources;

pub use client::{ApiResponse, MewsClient, RequestCompletionCallback};
pub use error::{ApiError, MewsError};
pub use options::{ClientOptions, DEMO_BASE_URL, PRODUCTION_BASE_URL};
pub use request::{ApiRequest, Authenticatable, BaseRequest, RequestContext};
pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, MewsError>;
