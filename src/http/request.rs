//! Outgoing request.
//!
//! Example head, with the default platform headers:
//!
//! ```text
//! GET /path?query HTTP/1.1
//! Host: www.example.com
//! User-Agent: h1pipe/0.1.0
//! Accept: */*
//! X-Custom: value
//! ```
//!

use std::time::Instant;

use super::write_header;
use super::{HTTP_VERSION, HTTP_LINE_BREAK, HTTP_HEADER_SP};

use crate::handshake::static_headers::*;
use crate::platform::Platform;

/// Request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Binary(Vec<u8>),
}

impl Body {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Text(s) => s.as_bytes(),
            Body::Binary(b) => b,
        }
    }
}

/// Outgoing request descriptor.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub host: String,
    pub path: String,
    /// Query string including the leading `?`, or empty.
    pub query: String,
    /// Request headers in the order they are written.
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
    /// Reference point of the latency figures in a `HeadersEvent`.
    pub network_start: Instant,
}

impl Request {
    /// Create a request without headers or body, starting now.
    pub fn new(method: &str, host: &str, path: &str) -> Self {
        Self {
            method: method.to_owned(),
            host: host.to_owned(),
            path: path.to_owned(),
            query: String::new(),
            headers: Vec::new(),
            body: None,
            network_start: Instant::now(),
        }
    }

    #[inline]
    pub fn get(host: &str, path: &str) -> Self { Self::new("GET", host, path) }

    /// Websocket upgrade request carrying `sec_key`.
    pub fn websocket(host: &str, path: &str, sec_key: &str) -> Self {
        Self::get(host, path)
            .with_header(HEADER_UPGRADE_NAME, HEADER_UPGRADE_VALUE)
            .with_header(HEADER_CONNECTION_NAME, HEADER_CONNECTION_VALUE)
            .with_header(HEADER_SEC_WEBSOCKET_KEY_NAME, sec_key)
            .with_header(
                HEADER_SEC_WEBSOCKET_VERSION_NAME,
                HEADER_SEC_WEBSOCKET_VERSION_VALUE,
            )
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query.clear();
        if !query.is_empty() && !query.starts_with('?') {
            self.query.push('?');
        }
        self.query.push_str(query);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Check for a header, the name is matched case sensitively.
    #[inline]
    pub fn has_header(&self, name: &str) -> bool { self.headers.iter().any(|(n, _)| n == name) }

    /// Encode the request head.
    ///
    /// The request line and `Host` come first, then every platform default
    /// header the request does not set itself, then the request headers
    /// in order. The head ends with an empty line.
    pub fn encode_head(&self, platform: &Platform) -> Vec<u8> {
        let mut w = Vec::with_capacity(256);

        // {method} {path}{query} HTTP/1.1
        w.extend_from_slice(self.method.as_bytes());
        w.push(0x20);
        if self.path.is_empty() {
            w.push(b'/');
        } else {
            w.extend_from_slice(self.path.as_bytes());
        }
        w.extend_from_slice(self.query.as_bytes());
        w.push(0x20);
        w.extend_from_slice(HTTP_VERSION);
        w.extend_from_slice(HTTP_LINE_BREAK);

        // Host: {host}
        write_header!(w, b"Host", self.host.as_bytes());

        // request headers win
        for (name, value) in platform.default_headers() {
            if !self.has_header(name) {
                write_header!(w, name.as_bytes(), value.as_bytes());
            }
        }

        for (name, value) in self.headers.iter() {
            write_header!(w, name.as_bytes(), value.as_bytes());
        }

        // finish with CRLF
        w.extend_from_slice(HTTP_LINE_BREAK);
        w
    }
}
