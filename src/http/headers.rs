//! Response head.
//!
//! From [RFC-7230 Section 3](https://datatracker.ietf.org/doc/html/rfc7230#section-3):
//!
//! ```text
//! HTTP-message   = start-line
//!                  *( header-field CRLF )
//!                  CRLF
//!                  [ message-body ]
//! status-line    = HTTP-version SP status-code SP reason-phrase CRLF
//! ```
//!
//! Parsing is literal: the status line must begin with
//! `HTTP/1.`, header values are trimmed of SP only, and header names keep
//! their case and order.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use super::{TransferEncoding, HTTP_STATUS_PREFIX};
use crate::error::ParseError;

/// Protocol version found in a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
}

impl HttpVersion {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::Http10 => "1.0",
            HttpVersion::Http11 => "1.1",
        }
    }
}

impl Display for HttpVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Everything known about a response once its head is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadersEvent {
    pub status_code: u16,
    pub http_version: HttpVersion,
    pub content_length: Option<u64>,
    /// `Key: Value` lines, original case and order, duplicates kept.
    pub headers: Vec<String>,
    pub transfer_encoding: TransferEncoding,
    /// Size of the head including the terminating empty line.
    pub headers_size: usize,
    pub method: String,
    /// Bytes written to the pipe for the request.
    pub request_size: u64,
    pub time_to_first_byte_read: Option<Duration>,
    pub time_to_first_byte_written: Option<Duration>,
}

impl HeadersEvent {
    /// Value of the first header named `name`, case insensitive.
    pub fn header<'a>(&'a self, name: &'a str) -> Option<&'a str> { self.header_all(name).next() }

    /// Values of every header named `name`, case insensitive.
    pub fn header_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers.iter().filter_map(move |line| {
            let (key, value) = line.split_once(':')?;
            if key.eq_ignore_ascii_case(name) {
                Some(value.trim_start_matches(' '))
            } else {
                None
            }
        })
    }
}

/// Parsed status line and header block, before request bookkeeping
/// is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    pub status_code: u16,
    pub http_version: HttpVersion,
    pub content_length: Option<u64>,
    pub headers: Vec<String>,
    pub transfer_encoding: TransferEncoding,
    /// Value of the last `Connection` header.
    pub connection: Option<String>,
}

/// Parse a head without its terminating CRLF CRLF.
pub fn parse_head(text: &str) -> Result<Head, ParseError> {
    let mut lines = text.split("\r\n");

    // split always yields at least one item
    let status_line = lines.next().unwrap_or_default();
    let (http_version, status_code) = parse_status_line(status_line)?;

    let mut headers = Vec::new();
    let mut content_length: Option<&str> = None;
    let mut transfer_encoding: Option<&str> = None;
    let mut connection: Option<&str> = None;

    for line in lines {
        let (key, value) = match line.find(':') {
            Some(idx) if idx > 0 => (&line[..idx], line[idx + 1..].trim_matches(' ')),
            _ => return Err(ParseError::BadHeader(line.to_owned())),
        };

        // the last one wins
        if key.eq_ignore_ascii_case("content-length") {
            content_length = Some(value);
        } else if key.eq_ignore_ascii_case("transfer-encoding") {
            transfer_encoding = Some(value);
        } else if key.eq_ignore_ascii_case("connection") {
            connection = Some(value);
        }

        headers.push(format!("{}: {}", key, value));
    }

    let transfer_encoding =
        transfer_encoding.map_or(TransferEncoding::NONE, TransferEncoding::from_header_value);

    let content_length = match content_length {
        Some(value) => match parse_decimal(value) {
            Some(n) => Some(n),
            None => return Err(ParseError::BadContentLength(value.to_owned())),
        },
        None => None,
    };

    Ok(Head {
        status_code,
        http_version,
        content_length,
        headers,
        transfer_encoding,
        connection: connection.map(str::to_owned),
    })
}

/// `HTTP/1.<0|1> <code> <reason>`, the code runs from index 9
/// to the next SP or the end of line.
///
/// A line without a reason phrase (`HTTP/1.1 204`) is accepted.
/// Codes that do not fit in `u16` are rejected.
fn parse_status_line(line: &str) -> Result<(HttpVersion, u16), ParseError> {
    let bad = || ParseError::BadStatusLine(line.to_owned());

    if !line.starts_with(HTTP_STATUS_PREFIX) {
        return Err(bad());
    }

    let version = match line.as_bytes().get(7) {
        Some(b'1') => HttpVersion::Http11,
        Some(b'0') => HttpVersion::Http10,
        _ => return Err(bad()),
    };

    let rest = line.get(9..).ok_or_else(bad)?;
    let code = rest.split(' ').next().unwrap_or_default();
    let code = parse_decimal(code)
        .and_then(|n| u16::try_from(n).ok())
        .ok_or_else(bad)?;

    Ok((version, code))
}

/// Non-negative decimal integer, digits only.
fn parse_decimal(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
