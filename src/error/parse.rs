use std::fmt::{Display, Formatter};

use super::ChunkError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    BadStatusLine(String),

    BadHeader(String),

    BadContentLength(String),

    Chunked(ChunkError),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use ParseError::*;
        match self {
            BadStatusLine(line) => write!(f, "Bad status line {}", line),
            BadHeader(line) => write!(f, "Bad header {}", line),
            BadContentLength(value) => write!(f, "Bad content length {}", value),
            Chunked(e) => write!(f, "Chunked body error: {}", e),
        }
    }
}

impl From<ChunkError> for ParseError {
    fn from(e: ChunkError) -> Self { ParseError::Chunked(e) }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let ParseError::Chunked(e) = self {
            Some(e)
        } else {
            None
        }
    }
}
