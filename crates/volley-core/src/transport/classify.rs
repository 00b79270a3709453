//! Classify curl errors and HTTP status codes into request failure kinds.

use std::time::Duration;

use super::RequestError;

/// Classify a final HTTP status: 2xx is success, anything else is a failure.
pub fn classify_http_status(code: u32) -> Result<u16, RequestError> {
    let code = u16::try_from(code).unwrap_or(u16::MAX);
    if (200..300).contains(&code) {
        Ok(code)
    } else {
        Err(RequestError::Status(code))
    }
}

/// Classify a curl error. `timeout` is the limit that was configured on the handle.
pub fn classify_curl_error(e: &curl::Error, timeout: Duration) -> RequestError {
    if e.is_operation_timedout() {
        return RequestError::Timeout { after: timeout };
    }
    if e.is_url_malformed() || e.is_unsupported_protocol() {
        return RequestError::Malformed(e.to_string());
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_ssl_connect_error()
        || e.is_peer_failed_verification()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return RequestError::Connection(e.to_string());
    }
    RequestError::Transport(e.to_string())
}
