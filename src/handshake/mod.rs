//! Websocket handshake.
//!
//! [RFC-6455 Section 1.3](https://datatracker.ietf.org/doc/html/rfc6455#section-1.3)
//!
//! The client sends a random `Sec-WebSocket-Key`; the server proves it read
//! the request by answering with
//! `base64(sha1(key + "258EAFA5-E914-47DA-95CA-C5AB0DC85B11"))`
//! in `Sec-WebSocket-Accept`.

pub mod key;
pub mod response;

pub use key::{new_sec_key, derive_accept_key, validate_accept_key, SAMPLE_SEC_KEY};
pub use response::UpgradeResponse;

use crate::error::HandshakeError;
use crate::http::HeadersEvent;
use static_headers::*;

/// 32
pub const MAX_ALLOW_HEADERS: usize = 32;

/// 258EAFA5-E914-47DA-95CA-C5AB0DC85B11
pub const GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// HTTP/1.1 101 Switching Protocols
pub const HTTP_STATUS_LINE: &str = "HTTP/1.1 101 Switching Protocols";

macro_rules! header {
    (   $(
            ($hdr_name: ident => $name: expr);
        )+
    ) => {
        $(
            pub const $hdr_name: &str = $name;
        )+
    };
}

macro_rules! handshake_check {
    ($value: expr, $e: expr) => {
        if $value.map_or(true, str::is_empty) {
            return Err($e);
        }
    };
    ($value: expr, $expect: expr, $e: expr) => {
        // header value here is case insensitive
        // ref: https://datatracker.ietf.org/doc/html/rfc6455#section-4.1
        if !$value.map_or(false, |v: &str| v.eq_ignore_ascii_case($expect)) {
            return Err($e);
        }
    };
}

pub(self) use handshake_check;

/// Static http headers
#[allow(unused)]
pub mod static_headers {
    // header name
    header! {
        (HEADER_UPGRADE_NAME => "Upgrade");

        (HEADER_CONNECTION_NAME => "Connection");

        (HEADER_SEC_WEBSOCKET_KEY_NAME => "Sec-WebSocket-Key");

        (HEADER_SEC_WEBSOCKET_ACCEPT_NAME => "Sec-WebSocket-Accept");

        (HEADER_SEC_WEBSOCKET_VERSION_NAME => "Sec-WebSocket-Version");
    }

    // header value
    header! {
        (HEADER_UPGRADE_VALUE => "websocket");

        (HEADER_CONNECTION_VALUE => "Upgrade");

        (HEADER_SEC_WEBSOCKET_VERSION_VALUE => "13");
    }
}

/// Head lines of a server's upgrade response, without line breaks.
pub fn switch_protocol_lines(sec_accept: &str) -> [String; 4] {
    [
        HTTP_STATUS_LINE.to_owned(),
        format!("{}: {}", HEADER_UPGRADE_NAME, HEADER_UPGRADE_VALUE),
        format!("{}: {}", HEADER_CONNECTION_NAME, HEADER_CONNECTION_VALUE),
        format!("{}: {}", HEADER_SEC_WEBSOCKET_ACCEPT_NAME, sec_accept),
    ]
}

/// Check a parsed response against the key the client sent.
///
/// Requires status `101`, `Upgrade: websocket`, `Connection: upgrade`
/// (values case insensitive) and a matching `Sec-WebSocket-Accept`.
pub fn validate_headers(event: &HeadersEvent, sec_key: &str) -> Result<(), HandshakeError> {
    if event.status_code != 101 {
        return Err(HandshakeError::HttpSatusCode);
    }

    handshake_check!(
        event.header(HEADER_UPGRADE_NAME),
        HEADER_UPGRADE_VALUE,
        HandshakeError::Upgrade
    );

    handshake_check!(
        event.header(HEADER_CONNECTION_NAME),
        HEADER_CONNECTION_VALUE,
        HandshakeError::Connection
    );

    let sec_accept = event.header(HEADER_SEC_WEBSOCKET_ACCEPT_NAME);
    handshake_check!(sec_accept, HandshakeError::SecWebSocketAccept);

    if !sec_accept.map_or(false, |accept| validate_accept_key(sec_key, accept)) {
        return Err(HandshakeError::SecWebSocketAccept);
    }

    Ok(())
}
