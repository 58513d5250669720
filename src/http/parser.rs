//! Response parser.
//!
//! One [`ResponseParser`] serves one request on one [`Pipe`]. It writes the
//! request, then turns the pipe's notifications into calls on a
//! [`ResponseHandler`]:
//!
//! ```text
//! AwaitingHeaders --+--> BodyByLength --+
//!                   +--> BodyByChunk ---+--> Finished
//!                   +--> BodyOpaque ----+
//!                   +--> (upgrade) -----+
//! ```
//!
//! Bytes that arrive past the end of this response (the tail of a chunked
//! body, bytes past `Content-Length`, or whatever came along with a head
//! that names no framing at all) are stashed back into the pipe for the
//! next layer.
//!
//! A body without framing runs until the pipe closes. Bytes read after
//! the head are body data, read from the transport so that the stash is
//! left alone.

use std::io::{Read, Write};
use std::time::Instant;

use log::{debug, trace, warn};

use super::headers::{parse_head, Head};
use super::{HeadersEvent, Request, TransferEncoding, HTTP_HEAD_END};

use crate::buffer::ByteBuffer;
use crate::chunked::{ChunkedDecoder, Feed};
use crate::error::Error;
use crate::pipe::{Pipe, PipeEvent};
use crate::platform::Platform;

/// What ended a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    /// `Content-Length` bytes were delivered
    Length,
    /// the terminating chunk was read
    Chunked,
    /// the server switched protocols
    Upgrade,
    /// the pipe was closed
    Closed,
}

/// Receiver of response events.
pub trait ResponseHandler {
    /// The head is parsed, called once before any body data.
    fn on_headers(&mut self, event: &HeadersEvent);

    /// Some body bytes, chunk framing already removed.
    /// The slice is only valid during the call.
    fn on_data(&mut self, data: &[u8]);

    /// A framing or transport error, nothing else is
    /// parsed afterwards.
    fn on_error(&mut self, error: Error);

    /// The response is complete, called exactly once.
    fn on_finished(&mut self, finish: Finish);
}

#[derive(Debug)]
enum State {
    AwaitingHeaders(ByteBuffer),
    BodyByLength { remaining: u64 },
    BodyByChunk(ChunkedDecoder),
    BodyOpaque,
    Finished(Finish),
    Failed,
}

/// HTTP/1.x response parser bound to a single pipe.
#[derive(Debug)]
pub struct ResponseParser {
    pipe_id: u64,
    method: String,
    network_start: Instant,
    request_size: u64,
    scratch: Vec<u8>,
    state: State,
    headers_finished: bool,
    connection: Option<String>,
    content_length: Option<u64>,
}

impl ResponseParser {
    /// Write `request` to `pipe` and return a parser waiting for
    /// the response head.
    ///
    /// The first-byte instants of the pipe are reset, so the latencies
    /// reported with the head belong to this request only.
    /// The parser allocates its own scratch buffer from `platform`.
    pub fn send<IO: Read + Write>(
        pipe: &mut Pipe<IO>,
        request: &Request,
        platform: &Platform,
    ) -> std::io::Result<Self> {
        pipe.reset_first_bytes();
        let written = pipe.bytes_written();

        let head = request.encode_head(platform);
        pipe.write(&head)?;

        if let Some(body) = request.body.as_ref() {
            pipe.write(body.as_bytes())?;
        }

        let request_size = pipe.bytes_written() - written;
        debug!(
            "pipe {}: sent {} {}{}, {} bytes",
            pipe.id(),
            request.method,
            request.path,
            request.query,
            request_size
        );

        Ok(Self {
            pipe_id: pipe.id(),
            method: request.method.clone(),
            network_start: request.network_start,
            request_size,
            scratch: platform.new_scratch(),
            state: State::AwaitingHeaders(ByteBuffer::new()),
            headers_finished: false,
            connection: None,
            content_length: None,
        })
    }

    /// Check if the response is complete.
    #[inline]
    pub const fn is_finished(&self) -> bool { matches!(self.state, State::Finished(..)) }

    /// What completed the response, if it is complete.
    #[inline]
    pub fn finish_reason(&self) -> Option<Finish> {
        match self.state {
            State::Finished(finish) => Some(finish),
            _ => None,
        }
    }

    /// Check if an error was reported.
    #[inline]
    pub const fn is_failed(&self) -> bool { matches!(self.state, State::Failed) }

    /// Check if the response was completed by switching protocols.
    #[inline]
    pub const fn is_upgraded(&self) -> bool {
        matches!(self.state, State::Finished(Finish::Upgrade))
    }

    /// Check if the head was parsed successfully.
    #[inline]
    pub const fn is_headers_finished(&self) -> bool { self.headers_finished }

    /// Parsed `Connection` header.
    #[inline]
    pub fn connection(&self) -> Option<&str> { self.connection.as_deref() }

    /// Parsed `Content-Length` header.
    #[inline]
    pub const fn content_length(&self) -> Option<u64> { self.content_length }

    /// Bytes written for the request, head and body.
    #[inline]
    pub const fn request_size(&self) -> u64 { self.request_size }

    /// Process one notification of the pipe this parser was sent on.
    pub fn handle<IO, H>(&mut self, pipe: &mut Pipe<IO>, event: PipeEvent, handler: &mut H)
    where
        IO: Read + Write,
        H: ResponseHandler + ?Sized,
    {
        assert_eq!(self.pipe_id, pipe.id(), "Parser driven by a foreign pipe");

        match event {
            PipeEvent::Data => self.on_readable(pipe, handler),
            PipeEvent::Closed => self.finish(pipe, Finish::Closed, handler),
        }
    }

    /// Process pending notifications until the response is complete
    /// or the pipe has nothing more to report. Later notifications stay
    /// queued for the next owner of the pipe.
    pub fn drive<IO, H>(&mut self, pipe: &mut Pipe<IO>, handler: &mut H)
    where
        IO: Read + Write,
        H: ResponseHandler + ?Sized,
    {
        while !self.is_finished() {
            match pipe.next_event() {
                Some(event) => self.handle(pipe, event, handler),
                None => break,
            }
        }
    }

    #[inline]
    const fn is_reading(&self) -> bool {
        matches!(
            self.state,
            State::AwaitingHeaders(..)
                | State::BodyByLength { .. }
                | State::BodyByChunk(..)
                | State::BodyOpaque
        )
    }

    fn on_readable<IO, H>(&mut self, pipe: &mut Pipe<IO>, handler: &mut H)
    where
        IO: Read + Write,
        H: ResponseHandler + ?Sized,
    {
        // the scratch content is only valid until the next read
        let mut scratch = std::mem::take(&mut self.scratch);

        while self.is_reading() {
            let read = match self.state {
                // the stash belongs to the next layer
                State::BodyOpaque => pipe.read_transport(&mut scratch),
                _ => pipe.read(&mut scratch),
            };
            let read_n = match read {
                Ok(n) => n,
                Err(e) => {
                    self.fail(pipe, e.into(), handler);
                    break;
                }
            };
            trace!(
                "pipe {}: read {} bytes, headers finished: {}",
                self.pipe_id,
                read_n,
                self.headers_finished
            );

            if read_n == 0 {
                break;
            }

            let data = &scratch[..read_n];

            match self.state {
                State::AwaitingHeaders(ref mut buf) => {
                    // the terminator may straddle two reads
                    let from = buf.len().saturating_sub(HTTP_HEAD_END.len() - 1);
                    buf.append(data);

                    if let Some(end) = buf.index_of(HTTP_HEAD_END, from) {
                        let buf = std::mem::take(buf);
                        self.on_head(pipe, buf, end, handler);
                    }
                }
                _ => self.on_body(pipe, data, handler),
            }
        }

        self.scratch = scratch;
    }

    /// Parse `[0, end)` of `buf`, select the body framing and dispatch
    /// the bytes following the head.
    fn on_head<IO, H>(&mut self, pipe: &mut Pipe<IO>, mut buf: ByteBuffer, end: usize, handler: &mut H)
    where
        IO: Read + Write,
        H: ResponseHandler + ?Sized,
    {
        let head = match parse_head(&buf.utf8(0, end)) {
            Ok(head) => head,
            Err(e) => return self.fail(pipe, e.into(), handler),
        };

        let event = self.make_event(pipe, &head, end);

        self.headers_finished = true;
        self.connection = head.connection;
        self.content_length = head.content_length;
        self.state = if head.transfer_encoding.contains(TransferEncoding::CHUNKED) {
            State::BodyByChunk(ChunkedDecoder::new())
        } else {
            match head.content_length {
                Some(n) => State::BodyByLength { remaining: n },
                None => {
                    // delimited by close only
                    pipe.forbid_reuse = true;
                    State::BodyOpaque
                }
            }
        };

        debug!(
            "pipe {}: {} {}, content length: {:?}, transfer encoding: {:#04x}",
            self.pipe_id,
            event.status_code,
            event.http_version,
            event.content_length,
            event.transfer_encoding.bits()
        );
        handler.on_headers(&event);

        // point to body
        buf.view_from(end + HTTP_HEAD_END.len());

        if !buf.is_empty() {
            match self.state {
                // unknown framing, the next layer decides what these are
                State::BodyOpaque => pipe.stash(buf.as_slice()),
                _ => self.on_body(pipe, buf.as_slice(), handler),
            }
        }

        match self.connection.as_deref() {
            // a body already completed or failed by its own framing wins
            Some("Upgrade") => {
                if self.is_reading() {
                    self.finish(pipe, Finish::Upgrade, handler);
                } else {
                    debug!("pipe {}: body ended before the upgrade", self.pipe_id);
                }
            }
            Some(v) if v.eq_ignore_ascii_case("upgrade") => {
                warn!(
                    "pipe {}: ignore connection header {:?}, expect \"Upgrade\"",
                    self.pipe_id, v
                );
            }
            _ => {}
        }

        // Content-Length: 0
        if let State::BodyByLength { remaining: 0 } = self.state {
            self.finish(pipe, Finish::Length, handler);
        }
    }

    fn on_body<IO, H>(&mut self, pipe: &mut Pipe<IO>, data: &[u8], handler: &mut H)
    where
        IO: Read + Write,
        H: ResponseHandler + ?Sized,
    {
        match self.state {
            State::BodyByChunk(ref mut decoder) => {
                match decoder.feed(data, |chunk| handler.on_data(chunk)) {
                    Ok(Feed::Partial) => {}
                    Ok(Feed::Done(n)) => {
                        if n < data.len() {
                            pipe.stash(&data[n..]);
                        }
                        self.finish(pipe, Finish::Chunked, handler);
                    }
                    Err(e) => self.fail(pipe, e.into(), handler),
                }
            }
            State::BodyByLength { ref mut remaining } => {
                let n = std::cmp::min(*remaining, data.len() as u64) as usize;
                *remaining -= n as u64;
                let done = *remaining == 0;

                if n != 0 {
                    handler.on_data(&data[..n]);
                }

                if done {
                    // bytes past the declared length
                    if n < data.len() {
                        pipe.stash(&data[n..]);
                    }
                    self.finish(pipe, Finish::Length, handler);
                }
            }
            State::BodyOpaque => handler.on_data(data),
            _ => unreachable!("body bytes outside of a body state"),
        }
    }

    fn make_event<IO>(&self, pipe: &Pipe<IO>, head: &Head, end: usize) -> HeadersEvent {
        let since_start = |t: Option<Instant>| t.map(|t| t.saturating_duration_since(self.network_start));

        HeadersEvent {
            status_code: head.status_code,
            http_version: head.http_version,
            content_length: head.content_length,
            headers: head.headers.clone(),
            transfer_encoding: head.transfer_encoding,
            headers_size: end + HTTP_HEAD_END.len(),
            method: self.method.clone(),
            request_size: self.request_size,
            time_to_first_byte_read: since_start(pipe.first_byte_read()),
            time_to_first_byte_written: since_start(pipe.first_byte_written()),
        }
    }

    fn fail<IO, H>(&mut self, pipe: &mut Pipe<IO>, error: Error, handler: &mut H)
    where
        H: ResponseHandler + ?Sized,
    {
        debug!("pipe {}: {}", self.pipe_id, error);
        pipe.forbid_reuse = true;
        self.state = State::Failed;
        handler.on_error(error);
    }

    fn finish<IO, H>(&mut self, pipe: &mut Pipe<IO>, finish: Finish, handler: &mut H)
    where
        H: ResponseHandler + ?Sized,
    {
        if self.is_finished() {
            return;
        }

        match finish {
            Finish::Length | Finish::Chunked => pipe.idle = true,
            // the connection now belongs to another protocol, or to nobody
            Finish::Upgrade | Finish::Closed => pipe.forbid_reuse = true,
        }

        debug!("pipe {}: finished by {:?}", self.pipe_id, finish);
        self.state = State::Finished(finish);
        handler.on_finished(finish);
    }
}
