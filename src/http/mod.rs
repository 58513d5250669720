//! HTTP/1.x client side.
//!
//! - [`request`]: outgoing request descriptor and head encoding.
//! - [`headers`]: response head parsing and the [`HeadersEvent`].
//! - [`parser`]: the [`ResponseParser`] state machine.

pub mod request;
pub mod headers;
pub mod parser;

pub use request::{Body, Request};
pub use headers::{HeadersEvent, HttpVersion};
pub use parser::{Finish, ResponseHandler, ResponseParser};

use std::ops::{BitOr, BitOrAssign};

/// HTTP/1.1
pub const HTTP_VERSION: &[u8] = b"HTTP/1.1";

/// Every status line starts with this.
pub const HTTP_STATUS_PREFIX: &str = "HTTP/1.";

/// CRLF
pub const HTTP_LINE_BREAK: &[u8] = b"\r\n";

/// CRLF CRLF, ends a head.
pub const HTTP_HEAD_END: &[u8] = b"\r\n\r\n";

/// A colon + one SP is prefered
pub const HTTP_HEADER_SP: &[u8] = b": ";

macro_rules! write_header {
    ($w: expr, $name: expr, $value: expr) => {{
        $w.extend_from_slice($name);
        $w.extend_from_slice(HTTP_HEADER_SP);
        $w.extend_from_slice($value);
        $w.extend_from_slice(HTTP_LINE_BREAK);
    }};
}

pub(crate) use write_header;

/// Set of transfer codings named by a `Transfer-Encoding` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TransferEncoding(u8);

impl TransferEncoding {
    pub const NONE: Self = Self(0x00);
    pub const CHUNKED: Self = Self(0x01);
    pub const COMPRESS: Self = Self(0x02);
    pub const DEFLATE: Self = Self(0x04);
    pub const GZIP: Self = Self(0x08);
    pub const IDENTITY: Self = Self(0x10);

    /// Match one coding token, case sensitive.
    #[inline]
    pub fn from_token(token: &str) -> Option<Self> {
        let coding = match token {
            "chunked" => Self::CHUNKED,
            "compress" => Self::COMPRESS,
            "deflate" => Self::DEFLATE,
            "gzip" => Self::GZIP,
            "identity" => Self::IDENTITY,
            _ => return None,
        };
        Some(coding)
    }

    /// Union of every recognized token in a comma separated list,
    /// unknown tokens are ignored.
    pub fn from_header_value(value: &str) -> Self {
        value
            .split(',')
            .filter_map(|token| Self::from_token(token.trim()))
            .fold(Self::NONE, |acc, x| acc | x)
    }

    #[inline]
    pub const fn bits(&self) -> u8 { self.0 }

    #[inline]
    pub const fn is_empty(&self) -> bool { self.0 == 0 }

    #[inline]
    pub const fn contains(&self, other: Self) -> bool { self.0 & other.0 == other.0 }
}

impl BitOr for TransferEncoding {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

impl BitOrAssign for TransferEncoding {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0 }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transfer_encoding_tokens() {
        macro_rules! te {
            ($value: expr, $bits: expr) => {
                assert_eq!(TransferEncoding::from_header_value($value).bits(), $bits);
            };
        }

        te!("chunked", 0x01);
        te!("gzip, chunked", 0x09);
        te!("chunked,gzip", 0x09);
        te!(" identity , deflate ,compress", 0x16);
        te!("gzip, br, chunked", 0x09);
        te!("Chunked", 0x00);
        te!("", 0x00);
        te!("gzip, gzip", 0x08);
        te!("chunked, compress, deflate, gzip, identity", 0x1f);
    }

    #[test]
    fn transfer_encoding_contains() {
        let te = TransferEncoding::GZIP | TransferEncoding::CHUNKED;
        assert!(te.contains(TransferEncoding::CHUNKED));
        assert!(te.contains(TransferEncoding::GZIP));
        assert!(!te.contains(TransferEncoding::DEFLATE));
        assert!(TransferEncoding::NONE.is_empty());
    }
}
