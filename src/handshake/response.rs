//! Server upgrade response.
//!
//! From [RFC-6455 Section 4.2](https://datatracker.ietf.org/doc/html/rfc6455#section-4.2):
//!
//! If the server chooses to accept the incoming connection, it MUST
//! reply with a valid HTTP response.
//!
//! Example:
//!
//! ```text
//! HTTP/1.1 101 Switching Protocols
//! Upgrade: websocket
//! Connection: Upgrade
//! Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=
//! ```
//!

use super::{handshake_check, switch_protocol_lines};
use super::{derive_accept_key, validate_accept_key};
use super::MAX_ALLOW_HEADERS;
use super::static_headers::*;

use crate::error::HandshakeError;
use crate::http::{HTTP_LINE_BREAK, HTTP_HEADER_SP};

/// Http upgrade response presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeResponse {
    pub sec_accept: String,
    pub other_headers: Vec<(String, String)>,
}

impl UpgradeResponse {
    /// Response answering the client's `sec_key`.
    #[inline]
    pub fn for_key(sec_key: &str) -> Self {
        Self {
            sec_accept: derive_accept_key(sec_key),
            other_headers: Vec::new(),
        }
    }

    /// Encode the whole head, other headers(if any) follow
    /// the required ones in order.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Vec::with_capacity(128);

        for line in switch_protocol_lines(&self.sec_accept).iter() {
            w.extend_from_slice(line.as_bytes());
            w.extend_from_slice(HTTP_LINE_BREAK);
        }

        for (name, value) in self.other_headers.iter() {
            w.extend_from_slice(name.as_bytes());
            w.extend_from_slice(HTTP_HEADER_SP);
            w.extend_from_slice(value.as_bytes());
            w.extend_from_slice(HTTP_LINE_BREAK);
        }

        // finish with CRLF
        w.extend_from_slice(HTTP_LINE_BREAK);
        w
    }

    /// Parse from a buffered head, return the response and
    /// the number of bytes parsed.
    ///
    /// `upgrade`, `connection` and `sec-websocket-accept` are checked
    /// (values are case insensitive), other headers are kept in order.
    /// If the buffer does not contain a complete head,
    /// a [`HandshakeError::NotEnoughData`] error will be returned.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), HandshakeError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_ALLOW_HEADERS];
        let mut response = httparse::Response::new(&mut headers);

        let decode_n = match response.parse(buf)? {
            httparse::Status::Complete(n) => n,
            httparse::Status::Partial => return Err(HandshakeError::NotEnoughData),
        };

        // check version, should be HTTP/1.1
        // ref: https://docs.rs/httparse/latest/src/httparse/lib.rs.html#581-596
        if response.version != Some(1_u8) {
            return Err(HandshakeError::HttpVersion);
        }

        // check status code, should be 101
        if response.code != Some(101_u16) {
            return Err(HandshakeError::HttpSatusCode);
        }

        let mut upgrade = None;
        let mut connection = None;
        let mut sec_accept = None;
        let mut other_headers = Vec::new();

        for hdr in response.headers.iter() {
            let value = String::from_utf8_lossy(hdr.value).into_owned();
            let slot = if hdr.name.eq_ignore_ascii_case(HEADER_UPGRADE_NAME) {
                &mut upgrade
            } else if hdr.name.eq_ignore_ascii_case(HEADER_CONNECTION_NAME) {
                &mut connection
            } else if hdr.name.eq_ignore_ascii_case(HEADER_SEC_WEBSOCKET_ACCEPT_NAME) {
                &mut sec_accept
            } else {
                other_headers.push((hdr.name.to_owned(), value));
                continue;
            };
            *slot = Some(value);
        }

        handshake_check!(upgrade.as_deref(), HEADER_UPGRADE_VALUE, HandshakeError::Upgrade);
        handshake_check!(
            connection.as_deref(),
            HEADER_CONNECTION_VALUE,
            HandshakeError::Connection
        );
        handshake_check!(sec_accept.as_deref(), HandshakeError::SecWebSocketAccept);

        let response = Self {
            sec_accept: sec_accept.unwrap_or_default(),
            other_headers,
        };
        Ok((response, decode_n))
    }

    /// Check `sec_accept` against the key the client sent.
    #[inline]
    pub fn verify(&self, sec_key: &str) -> Result<(), HandshakeError> {
        if validate_accept_key(sec_key, &self.sec_accept) {
            Ok(())
        } else {
            Err(HandshakeError::SecWebSocketAccept)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::handshake::SAMPLE_SEC_KEY;

    const RESPONSE: &[u8] = b"\
        HTTP/1.1 101 Switching Protocols\r\n\
        upgrade: websocket\r\n\
        connection: upgrade\r\n\
        sec-websocket-accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\
        sec-websocket-protocol: chat\r\n\r\n";

    #[test]
    fn encode_decode() {
        let mut response = UpgradeResponse::for_key(SAMPLE_SEC_KEY);
        response
            .other_headers
            .push(("Sec-WebSocket-Protocol".to_owned(), "chat".to_owned()));

        let buf = response.encode();
        assert_eq!(
            buf,
            b"HTTP/1.1 101 Switching Protocols\r\n\
            Upgrade: websocket\r\n\
            Connection: Upgrade\r\n\
            Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\
            Sec-WebSocket-Protocol: chat\r\n\r\n"
        );

        let (decoded, decode_n) = UpgradeResponse::decode(&buf).unwrap();
        assert_eq!(decode_n, buf.len());
        assert_eq!(decoded, response);
    }

    #[test]
    fn decode_lowercase() {
        let mut buf = RESPONSE.to_vec();
        buf.extend_from_slice(b"\x81\x05hello");

        let (response, decode_n) = UpgradeResponse::decode(&buf).unwrap();
        assert_eq!(decode_n, RESPONSE.len());
        assert_eq!(response.sec_accept, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
        assert_eq!(
            response.other_headers,
            vec![("sec-websocket-protocol".to_owned(), "chat".to_owned())]
        );
        assert_eq!(response.verify(SAMPLE_SEC_KEY), Ok(()));
        assert_eq!(
            response.verify("dGhlIHNhbXBsZSBub25jZA=="),
            Err(HandshakeError::SecWebSocketAccept)
        );
    }

    #[test]
    fn decode_partial() {
        for i in 0..RESPONSE.len() {
            assert_eq!(
                UpgradeResponse::decode(&RESPONSE[..i]),
                Err(HandshakeError::NotEnoughData)
            );
        }
    }

    #[test]
    fn catch_errors() {
        macro_rules! err {
            ($buf: expr, $e: expr) => {
                assert_eq!(UpgradeResponse::decode($buf), Err($e));
            };
        }

        err!(
            b"HTTP/1.0 101 Switching Protocols\r\n\r\n",
            HandshakeError::HttpVersion
        );
        err!(b"HTTP/1.1 200 OK\r\n\r\n", HandshakeError::HttpSatusCode);
        err!(
            b"HTTP/1.1 101 Switching Protocols\r\nConnection: Upgrade\r\n\r\n",
            HandshakeError::Upgrade
        );
        err!(
            b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: keep-alive\r\n\r\n",
            HandshakeError::Connection
        );
        err!(
            b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n",
            HandshakeError::SecWebSocketAccept
        );
    }
}
