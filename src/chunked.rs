//! Chunked transfer coding.
//!
//! [RFC-7230 Section 4.1](https://datatracker.ietf.org/doc/html/rfc7230#section-4.1)
//!
//! ```text
//! chunked-body   = *chunk
//!                  last-chunk
//!                  trailer-part
//!                  CRLF
//!
//! chunk          = chunk-size [ chunk-ext ] CRLF
//!                  chunk-data CRLF
//! chunk-size     = 1*HEXDIG
//! last-chunk     = 1*("0") [ chunk-ext ] CRLF
//! ```
//!

use log::trace;

use crate::error::ChunkError;

/// Result of a [`ChunkedDecoder::feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// every byte was consumed, the body is not complete yet
    Partial,
    /// the body is complete after consuming this many bytes,
    /// the rest of the input belongs to the next stream
    Done(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Size { size: u64, digits: u8 },
    SizeExt { size: u64 },
    SizeLf { size: u64 },
    Data { remaining: u64 },
    DataCr,
    DataLf,
    TrailerStart,
    Trailer,
    TrailerLf { last: bool },
    Done,
}

impl State {
    #[inline]
    const fn new() -> Self { State::Size { size: 0, digits: 0 } }
}

/// Incremental decoder of a chunked body.
///
/// Input can be split at any byte. Each chunk payload is handed out once,
/// in one piece, when it is complete.
#[derive(Debug)]
pub struct ChunkedDecoder {
    state: State,
    payload: Vec<u8>,
    decoded: u64,
}

impl Default for ChunkedDecoder {
    fn default() -> Self { Self::new() }
}

impl ChunkedDecoder {
    #[inline]
    pub const fn new() -> Self {
        Self {
            state: State::new(),
            payload: Vec::new(),
            decoded: 0,
        }
    }

    /// Check if the terminating chunk and trailer have been read.
    #[inline]
    pub const fn is_done(&self) -> bool { matches!(self.state, State::Done) }

    /// Total payload bytes decoded so far.
    #[inline]
    pub const fn decoded(&self) -> u64 { self.decoded }

    /// Decode some bytes, calling `on_chunk` with every completed chunk payload.
    ///
    /// Once done, feeding more data consumes nothing and returns `Done(0)`.
    pub fn feed<F>(&mut self, data: &[u8], mut on_chunk: F) -> Result<Feed, ChunkError>
    where
        F: FnMut(&[u8]),
    {
        let mut pos = 0;

        while pos < data.len() {
            match self.state {
                State::Done => return Ok(Feed::Done(pos)),
                // copy as much payload as possible
                State::Data { remaining } => {
                    let n = std::cmp::min(remaining, (data.len() - pos) as u64) as usize;
                    let remaining = remaining - n as u64;

                    if remaining == 0 && self.payload.is_empty() {
                        // whole chunk is in this slice
                        self.emit(&data[pos..pos + n], &mut on_chunk);
                    } else {
                        self.payload.extend_from_slice(&data[pos..pos + n]);
                        if remaining == 0 {
                            let payload = std::mem::take(&mut self.payload);
                            self.emit(&payload, &mut on_chunk);
                        }
                    }

                    pos += n;
                    self.state = if remaining == 0 {
                        State::DataCr
                    } else {
                        State::Data { remaining }
                    };
                }
                state => {
                    self.state = Self::step(state, data[pos])?;
                    pos += 1;
                }
            }
        }

        if self.is_done() {
            Ok(Feed::Done(pos))
        } else {
            Ok(Feed::Partial)
        }
    }

    #[inline]
    fn emit<F: FnMut(&[u8])>(&mut self, chunk: &[u8], on_chunk: &mut F) {
        trace!("chunked: decoded a chunk of {} bytes", chunk.len());
        self.decoded += chunk.len() as u64;
        on_chunk(chunk);
    }

    /// Advance the framing grammar by one byte.
    fn step(state: State, b: u8) -> Result<State, ChunkError> {
        use State::*;

        let next = match state {
            Size { size, digits } => match hex_value(b) {
                Some(v) => {
                    let size = size
                        .checked_mul(16)
                        .and_then(|x| x.checked_add(v as u64))
                        .ok_or(ChunkError::SizeOverflow)?;
                    Size {
                        size,
                        digits: digits.saturating_add(1),
                    }
                }
                None if digits == 0 => return Err(ChunkError::IllegalSize),
                None => match b {
                    b'\r' => SizeLf { size },
                    b';' | b' ' | b'\t' => SizeExt { size },
                    _ => return Err(ChunkError::IllegalSize),
                },
            },
            // chunk extensions are ignored
            SizeExt { size } => match b {
                b'\r' => SizeLf { size },
                b'\n' => return Err(ChunkError::IllegalSize),
                _ => SizeExt { size },
            },
            SizeLf { size } => match b {
                b'\n' if size == 0 => TrailerStart,
                b'\n' => Data { remaining: size },
                _ => return Err(ChunkError::IllegalSize),
            },
            DataCr => match b {
                b'\r' => DataLf,
                _ => return Err(ChunkError::MissingCrlf),
            },
            DataLf => match b {
                b'\n' => State::new(),
                _ => return Err(ChunkError::MissingCrlf),
            },
            TrailerStart => match b {
                b'\r' => TrailerLf { last: true },
                b'\n' => return Err(ChunkError::IllegalTrailer),
                _ => Trailer,
            },
            Trailer => match b {
                b'\r' => TrailerLf { last: false },
                b'\n' => return Err(ChunkError::IllegalTrailer),
                _ => Trailer,
            },
            TrailerLf { last } => match b {
                b'\n' if last => Done,
                b'\n' => TrailerStart,
                _ => return Err(ChunkError::IllegalTrailer),
            },
            Data { .. } | Done => unreachable!(),
        };

        Ok(next)
    }
}

#[inline]
const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::prelude::*;

    fn decode_all(input: &[u8]) -> (Vec<Vec<u8>>, Result<Feed, ChunkError>) {
        let mut decoder = ChunkedDecoder::new();
        let mut chunks = Vec::new();
        let ret = decoder.feed(input, |c| chunks.push(c.to_vec()));
        (chunks, ret)
    }

    #[test]
    fn single_chunk() {
        let (chunks, ret) = decode_all(b"5\r\nHello\r\n0\r\n\r\n");
        assert_eq!(chunks, vec![b"Hello".to_vec()]);
        assert_eq!(ret, Ok(Feed::Done(15)));
    }

    #[test]
    fn leftover_after_done() {
        let input = b"3\r\nabc\r\n4\r\ndefg\r\n0\r\n\r\nHTTP/1.1";
        let (chunks, ret) = decode_all(input);
        assert_eq!(chunks, vec![b"abc".to_vec(), b"defg".to_vec()]);
        assert_eq!(ret, Ok(Feed::Done(input.len() - 8)));
    }

    #[test]
    fn extension_and_trailer() {
        let input = b"A;name=value\r\n0123456789\r\n0 ; last\r\nExpires: never\r\nX-A: b\r\n\r\n";
        let (chunks, ret) = decode_all(input);
        assert_eq!(chunks, vec![b"0123456789".to_vec()]);
        assert_eq!(ret, Ok(Feed::Done(input.len())));
    }

    #[test]
    fn split_everywhere() {
        let input = b"5\r\nHello\r\n1a\r\nabcdefghijklmnopqrstuvwxyz\r\n0\r\nA: b\r\n\r\nrest";

        for step in 1..input.len() {
            let mut decoder = ChunkedDecoder::new();
            let mut chunks = Vec::new();
            let mut leftover = None;

            for (i, piece) in input.chunks(step).enumerate() {
                match decoder.feed(piece, |c| chunks.push(c.to_vec())).unwrap() {
                    Feed::Partial => assert!(leftover.is_none()),
                    Feed::Done(n) => {
                        if leftover.is_none() {
                            leftover = Some(i * step + n);
                        }
                    }
                }
            }

            assert_eq!(
                chunks,
                vec![b"Hello".to_vec(), b"abcdefghijklmnopqrstuvwxyz".to_vec()]
            );
            assert_eq!(leftover, Some(input.len() - 4));
            assert_eq!(decoder.decoded(), 31);
        }
    }

    #[test]
    fn random_chunks() {
        for _ in 0..64 {
            let mut input = Vec::new();
            let mut expect = Vec::new();
            for _ in 0..thread_rng().gen_range(1..16) {
                let len: usize = thread_rng().gen_range(1..300);
                let data: Vec<u8> = (0..len).map(|_| random::<u8>()).collect();
                input.extend_from_slice(format!("{:x}\r\n", len).as_bytes());
                input.extend_from_slice(&data);
                input.extend_from_slice(b"\r\n");
                expect.push(data);
            }
            input.extend_from_slice(b"0\r\n\r\n");

            let mut decoder = ChunkedDecoder::new();
            let mut chunks = Vec::new();
            let mut beg = 0;
            while beg < input.len() {
                let end = thread_rng().gen_range(beg + 1..=input.len());
                let _ = decoder.feed(&input[beg..end], |c| chunks.push(c.to_vec())).unwrap();
                beg = end;
            }

            assert!(decoder.is_done());
            assert_eq!(chunks, expect);
        }
    }

    #[test]
    fn feed_after_done() {
        let mut decoder = ChunkedDecoder::new();
        assert_eq!(decoder.feed(b"0\r\n\r\n", |_| ()), Ok(Feed::Done(5)));
        assert_eq!(decoder.feed(b"more", |_| panic!()), Ok(Feed::Done(0)));
    }

    #[test]
    fn catch_errors() {
        macro_rules! err {
            ($input: expr, $e: expr) => {
                assert_eq!(decode_all($input).1, Err($e));
            };
        }

        err!(b"zz\r\n", ChunkError::IllegalSize);
        err!(b"\r\n", ChunkError::IllegalSize);
        err!(b"5\n", ChunkError::IllegalSize);
        err!(b"5\rx", ChunkError::IllegalSize);
        err!(b"5;ext\n", ChunkError::IllegalSize);
        err!(b"10000000000000000\r\n", ChunkError::SizeOverflow);
        err!(b"3\r\nabcd", ChunkError::MissingCrlf);
        err!(b"3\r\nabc\rx", ChunkError::MissingCrlf);
        err!(b"0\r\n\n", ChunkError::IllegalTrailer);
        err!(b"0\r\nA: b\n", ChunkError::IllegalTrailer);
        err!(b"0\r\n\rx", ChunkError::IllegalTrailer);
    }
}
