use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkError {
    IllegalSize,

    SizeOverflow,

    MissingCrlf,

    IllegalTrailer,
}

impl Display for ChunkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use ChunkError::*;
        match self {
            IllegalSize => write!(f, "Illegal chunk size line"),
            SizeOverflow => write!(f, "Chunk size overflow"),
            MissingCrlf => write!(f, "Missing CRLF after chunk data"),
            IllegalTrailer => write!(f, "Illegal chunked trailer line"),
        }
    }
}

// use default impl
impl std::error::Error for ChunkError {}
