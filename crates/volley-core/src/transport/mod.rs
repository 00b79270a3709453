//! Network transport boundary.
//!
//! A request goes through two phases: [`Transport::prepare`] builds it
//! synchronously (failures there abort the whole dispatch), then
//! [`Transport::send`] transmits it (failures there only fail one job).

mod classify;
mod encode;
mod libcurl;

pub use classify::classify_curl_error;
pub use encode::encode_uri;
pub use libcurl::{CurlTransport, PreparedCurl};

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Boxed `Send` future, the return type of every async seam in this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One outbound request, fully resolved from the dispatch options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// Already URI-encoded target.
    pub url: String,
    /// Upper-case HTTP method.
    pub method: String,
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
}

/// A received response with a success status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The URL that was requested (encoded form).
    pub url: String,
    pub status: u16,
    /// Header lines of the final response, in arrival order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// First header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `Content-Length` if the server sent a parseable one.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok())
    }
}

/// Request construction failed before anything was transmitted.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid request option {option}: {message}")]
    InvalidOption {
        option: &'static str,
        message: String,
    },
}

/// Why a transmitted request did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// No complete response within the per-request timeout.
    #[error("request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    /// DNS, connect, TLS or socket failure.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The final response had a non-2xx status.
    #[error("HTTP {0}")]
    Status(u16),

    /// The transport could not interpret the URL.
    #[error("malformed URL: {0}")]
    Malformed(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl RequestError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Timeout { .. })
    }

    /// HTTP status for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// The network client used by the dispatcher.
///
/// Implementations must be cheap to share: one instance serves every job of a
/// dispatch, concurrently.
pub trait Transport: Send + Sync + 'static {
    /// A request that passed construction and is ready to send.
    type Prepared: Send + 'static;

    /// Build the request. Errors here abort the dispatch.
    fn prepare(&self, request: &RequestSpec) -> Result<Self::Prepared, BuildError>;

    /// Transmit a prepared request and wait for the response.
    fn send(&self, prepared: Self::Prepared) -> BoxFuture<'_, Result<Response, RequestError>>;
}

/// Parse `Name: value` header lines, skipping status lines and blanks.
pub(crate) fn parse_header_lines(lines: &[String]) -> Vec<(String, String)> {
    lines
        .iter()
        .filter(|l| !l.starts_with("HTTP/"))
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}
