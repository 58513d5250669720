#![allow(missing_docs)]
//! Errors

mod chunk;
mod parse;
mod handshake;

pub use chunk::ChunkError;
pub use parse::ParseError;
pub use handshake::HandshakeError;

use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum Error {
    Parse(ParseError),

    Handshake(HandshakeError),

    Io(std::io::Error),
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self { Error::Parse(e) }
}

impl From<ChunkError> for Error {
    fn from(e: ChunkError) -> Self { Error::Parse(e.into()) }
}

impl From<HandshakeError> for Error {
    fn from(e: HandshakeError) -> Self { Error::Handshake(e) }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error { Error::Io(e) }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Error::*;
        match self {
            Parse(e) => write!(f, "Parse error: {}", e),
            Handshake(e) => write!(f, "Handshake error: {}", e),
            Io(e) => write!(f, "Io error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use Error::*;

        match self {
            Parse(e) => Some(e),
            Handshake(e) => Some(e),
            Io(e) => Some(e),
        }
    }
}
