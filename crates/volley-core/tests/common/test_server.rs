//! Minimal HTTP/1.1 server for dispatch integration tests.
//!
//! Routes:
//! - `/ok/<tag>`: 200 with body `<tag>`
//! - `/slow/<ms>/<tag>`: waits `<ms>` then 200 with body `<tag>`
//! - `/status/<code>`: responds with `<code>` and body `status <code>`
//!
//! Every request is recorded with its arrival time.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    /// Request target exactly as sent on the wire.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub at: Instant,
}

impl Hit {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub struct TestServer {
    /// Base URL without trailing slash, e.g. "http://127.0.0.1:12345".
    pub base: String,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    pub fn hit_for(&self, path: &str) -> Option<Hit> {
        self.hits().into_iter().find(|h| h.path == path)
    }
}

/// Starts the server in a background thread. It runs until the process exits.
pub fn start() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let recorder = Arc::clone(&recorder);
            thread::spawn(move || handle(stream, &recorder));
        }
    });
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

/// A URL on a port nothing listens on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/ok/nobody", port)
}

fn handle(mut stream: TcpStream, hits: &Mutex<Vec<Hit>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let at = Instant::now();
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let hit = parse_request(request, at);
    let method = hit.method.clone();
    let path = hit.path.clone();
    hits.lock().unwrap().push(hit);

    let (status, body) = route(&path);
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    if !method.eq_ignore_ascii_case("HEAD") {
        let _ = stream.write_all(body.as_bytes());
    }
    let _ = stream.flush();
}

fn route(path: &str) -> (u16, String) {
    let parts: Vec<&str> = path.trim_start_matches('/').splitn(3, '/').collect();
    match parts.as_slice() {
        ["ok", tag] => (200, tag.to_string()),
        ["slow", ms, tag] => {
            let ms = ms.parse::<u64>().unwrap_or(0);
            thread::sleep(Duration::from_millis(ms));
            (200, tag.to_string())
        }
        ["status", code] => {
            let code = code.parse::<u16>().unwrap_or(500);
            (code, format!("status {}", code))
        }
        _ => (404, "not found".to_string()),
    }
}

fn parse_request(request: &str, at: Instant) -> Hit {
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("").to_string();
    let path = first.next().unwrap_or("").to_string();
    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    Hit {
        method,
        path,
        headers,
        at,
    }
}
