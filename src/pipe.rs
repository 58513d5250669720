//! Duplex byte pipe.
//!
//! [`Pipe`] wraps any `Read + Write` transport and adds what a layered
//! protocol stack needs on top of it: a stash of bytes that were pulled
//! from the transport but belong to the next layer, an ordered queue of
//! [`PipeEvent`] notifications, and some connection bookkeeping.
//!
//! The transport is expected to be non-blocking: `WouldBlock` is mapped to
//! "nothing available now" (`Ok(0)`), while a zero-length read is end of
//! stream and queues [`PipeEvent::Closed`].

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Result, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use log::trace;

use crate::buffer::ByteBuffer;

/// Notification emitted by a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeEvent {
    /// new bytes can be read
    Data,
    /// the transport is terminated, emitted once
    Closed,
}

static NEXT_PIPE_ID: AtomicU64 = AtomicU64::new(1);

/// Duplex transport handle.
pub struct Pipe<IO> {
    id: u64,
    io: IO,
    /// No request is in flight on this pipe.
    pub idle: bool,
    /// The pipe must not be handed to another request.
    pub forbid_reuse: bool,
    dns_time: Option<Duration>,
    connect_time: Option<Duration>,
    first_byte_written: Option<Instant>,
    first_byte_read: Option<Instant>,
    bytes_written: u64,
    bytes_read: u64,
    stash: Option<ByteBuffer>,
    events: VecDeque<PipeEvent>,
    closed: bool,
}

impl<IO> AsRef<IO> for Pipe<IO> {
    #[inline]
    fn as_ref(&self) -> &IO { &self.io }
}

impl<IO> AsMut<IO> for Pipe<IO> {
    #[inline]
    fn as_mut(&mut self) -> &mut IO { &mut self.io }
}

impl<IO> std::fmt::Debug for Pipe<IO> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipe")
            .field("id", &self.id)
            .field("idle", &self.idle)
            .field("forbid_reuse", &self.forbid_reuse)
            .field("bytes_written", &self.bytes_written)
            .field("bytes_read", &self.bytes_read)
            .field("stash", &self.stash.as_ref().map(ByteBuffer::len))
            .field("events", &self.events)
            .field("closed", &self.closed)
            .finish()
    }
}

impl<IO> Pipe<IO> {
    /// Wrap a connected transport.
    pub fn new(io: IO) -> Self {
        Pipe {
            id: NEXT_PIPE_ID.fetch_add(1, Ordering::Relaxed),
            io,
            idle: true,
            forbid_reuse: false,
            dns_time: None,
            connect_time: None,
            first_byte_written: None,
            first_byte_read: None,
            bytes_written: 0,
            bytes_read: 0,
            stash: None,
            events: VecDeque::new(),
            closed: false,
        }
    }

    /// Process-unique identity of this pipe.
    #[inline]
    pub const fn id(&self) -> u64 { self.id }

    #[inline]
    pub fn into_inner(self) -> IO { self.io }

    /// Put bytes back for whichever layer reads next.
    ///
    /// Bytes are appended to the pending stash, so they come out in the
    /// order they were stashed. A [`PipeEvent::Data`] is queued right away
    /// so the next consumer does not wait for the transport.
    pub fn stash(&mut self, data: &[u8]) {
        assert!(!data.is_empty(), "Must have length");

        match self.stash.as_mut() {
            Some(stash) => stash.append(data),
            None => self.stash = Some(ByteBuffer::new_with_data(data)),
        }
        trace!("pipe {}: stashed {} bytes", self.id, data.len());

        self.events.push_back(PipeEvent::Data);
    }

    /// Drain stashed bytes into `buf`, returning the number of bytes copied,
    /// or `None` if nothing is stashed.
    pub fn unstash(&mut self, buf: &mut [u8]) -> Option<usize> {
        let stash = self.stash.as_mut()?;
        let len = stash.len();

        if buf.len() >= len {
            buf[..len].copy_from_slice(stash.as_slice());
            self.stash = None;
            return Some(len);
        }

        let n = buf.len();
        buf.copy_from_slice(stash.slice(0, n));
        stash.view_from(n);
        Some(n)
    }

    /// Number of stashed bytes.
    #[inline]
    pub fn stashed(&self) -> usize { self.stash.as_ref().map_or(0, ByteBuffer::len) }

    /// Queue a [`PipeEvent::Data`], called by the transport owner when
    /// the transport becomes readable.
    #[inline]
    pub fn notify_data(&mut self) { self.events.push_back(PipeEvent::Data); }

    /// Mark the transport as terminated. Only the first call
    /// queues a [`PipeEvent::Closed`].
    pub fn notify_closed(&mut self) {
        if !self.closed {
            trace!("pipe {}: closed", self.id);
            self.closed = true;
            self.events.push_back(PipeEvent::Closed);
        }
    }

    /// Pop the oldest pending notification.
    #[inline]
    pub fn next_event(&mut self) -> Option<PipeEvent> { self.events.pop_front() }

    #[inline]
    pub const fn is_closed(&self) -> bool { self.closed }

    #[inline]
    pub const fn bytes_written(&self) -> u64 { self.bytes_written }

    #[inline]
    pub const fn bytes_read(&self) -> u64 { self.bytes_read }

    #[inline]
    pub const fn first_byte_written(&self) -> Option<Instant> { self.first_byte_written }

    #[inline]
    pub const fn first_byte_read(&self) -> Option<Instant> { self.first_byte_read }

    #[inline]
    pub const fn dns_time(&self) -> Option<Duration> { self.dns_time }

    #[inline]
    pub const fn connect_time(&self) -> Option<Duration> { self.connect_time }

    /// Forget the first-byte instants of the previous exchange,
    /// so they are recorded again for the next request.
    #[inline]
    pub fn reset_first_bytes(&mut self) {
        self.first_byte_written = None;
        self.first_byte_read = None;
    }

    /// Record how long name resolution took for this connection.
    #[inline]
    pub fn set_dns_time(&mut self, t: Duration) { self.dns_time = Some(t) }

    /// Record how long the transport took to connect.
    #[inline]
    pub fn set_connect_time(&mut self, t: Duration) { self.connect_time = Some(t) }
}

impl<IO: Read + Write> Pipe<IO> {
    /// Transmit all of `buf`.
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }

        self.idle = false;
        self.io.write_all(buf)?;

        if self.first_byte_written.is_none() {
            self.first_byte_written = Some(Instant::now());
        }
        self.bytes_written += buf.len() as u64;
        Ok(())
    }

    /// Read some bytes, stashed bytes first.
    ///
    /// Returns `Ok(0)` when nothing is available right now, which is not
    /// necessarily the end of stream; check [`Pipe::is_closed`] for that.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if let Some(n) = self.unstash(buf) {
            return Ok(n);
        }

        self.read_transport(buf)
    }

    /// Read from the transport only, leaving the stash untouched.
    pub fn read_transport(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.closed || buf.is_empty() {
            return Ok(0);
        }

        loop {
            match self.io.read(buf) {
                // EOF
                Ok(0) => {
                    self.notify_closed();
                    return Ok(0);
                }
                Ok(n) => {
                    if self.first_byte_read.is_none() {
                        self.first_byte_read = Some(Instant::now());
                    }
                    self.bytes_read += n as u64;
                    return Ok(n);
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => return Ok(0),
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
