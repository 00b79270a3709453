//! libcurl transport: one `Easy2` handle per request, performed on tokio's
//! blocking pool.

use curl::easy::{Easy2, Handler, List, WriteError};
use std::str;
use std::time::Duration;

use super::classify::{classify_curl_error, classify_http_status};
use super::{parse_header_lines, BoxFuture, BuildError, RequestError, RequestSpec, Response, Transport};

const MAX_REDIRECTS: u32 = 10;

/// Collects header lines and the body of one transfer.
#[derive(Debug, Default)]
pub struct Collector {
    header_lines: Vec<String>,
    body: Vec<u8>,
}

impl Handler for Collector {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            // A new status line starts a new response (redirect hop); keep only the last.
            if line.starts_with("HTTP/") {
                self.header_lines.clear();
            }
            if !line.is_empty() {
                self.header_lines.push(line.to_string());
            }
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        self.body.extend_from_slice(data);
        Ok(data.len())
    }
}

/// A configured handle waiting to be performed.
pub struct PreparedCurl {
    easy: Easy2<Collector>,
    url: String,
    timeout: Duration,
}

/// HTTP transport backed by libcurl.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Option<Duration>,
    follow_redirects: bool,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            follow_redirects: true,
        }
    }
}

impl CurlTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the connect phase separately from the whole-request timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }
}

fn opt(option: &'static str) -> impl Fn(curl::Error) -> BuildError {
    move |e| BuildError::InvalidOption {
        option,
        message: e.to_string(),
    }
}

impl Transport for CurlTransport {
    type Prepared = PreparedCurl;

    fn prepare(&self, request: &RequestSpec) -> Result<PreparedCurl, BuildError> {
        let mut easy = Easy2::new(Collector::default());
        easy.url(&request.url).map_err(opt("url"))?;
        match request.method.as_str() {
            "GET" => easy.get(true).map_err(opt("method"))?,
            "HEAD" => easy.nobody(true).map_err(opt("method"))?,
            other => easy.custom_request(other).map_err(opt("method"))?,
        }
        easy.follow_location(self.follow_redirects)
            .map_err(opt("follow_location"))?;
        easy.max_redirections(MAX_REDIRECTS)
            .map_err(opt("max_redirections"))?;
        easy.timeout(request.timeout).map_err(opt("timeout"))?;
        if let Some(ct) = self.connect_timeout {
            easy.connect_timeout(ct.min(request.timeout))
                .map_err(opt("connect_timeout"))?;
        }
        // Multi-threaded use; libcurl must not raise SIGALRM for timeouts.
        easy.signal(false).map_err(opt("signal"))?;

        if !request.headers.is_empty() {
            let mut list = List::new();
            for (k, v) in &request.headers {
                list.append(&format!("{}: {}", k.trim(), v.trim()))
                    .map_err(opt("headers"))?;
            }
            easy.http_headers(list).map_err(opt("headers"))?;
        }

        Ok(PreparedCurl {
            easy,
            url: request.url.clone(),
            timeout: request.timeout,
        })
    }

    fn send(&self, prepared: PreparedCurl) -> BoxFuture<'_, Result<Response, RequestError>> {
        Box::pin(async move {
            let PreparedCurl { easy, url, timeout } = prepared;
            let performed = tokio::task::spawn_blocking(move || {
                let result = easy.perform();
                (easy, result)
            })
            .await
            .map_err(|e| RequestError::Transport(format!("transfer task: {}", e)))?;

            let (mut easy, result) = performed;
            if let Err(e) = result {
                return Err(classify_curl_error(&e, timeout));
            }
            let code = easy
                .response_code()
                .map_err(|e| RequestError::Transport(e.to_string()))?;
            let status = classify_http_status(code)?;

            let collector = easy.get_mut();
            let headers = parse_header_lines(&collector.header_lines);
            let body = std::mem::take(&mut collector.body);
            tracing::trace!(%url, status, bytes = body.len(), "transfer complete");
            Ok(Response {
                url,
                status,
                headers,
                body,
            })
        })
    }
}
