//! Growable byte container with a movable view.
//!
//! A [`ByteBuffer`] owns one contiguous backing region. The addressable
//! window (the view) can be narrowed from the front or the back without
//! touching the retained bytes, so dropping an already consumed prefix
//! costs nothing.
//!
//! All offsets taken by the methods below are relative to the current view.
//! Addressing a range outside `[0, len)` is a programming error and panics.

use std::borrow::Cow;

/// Byte buffer with a view window over its backing store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    rd: usize,
    wr: usize,
    buf: Vec<u8>,
}

impl ByteBuffer {
    /// Create an empty buffer.
    #[inline]
    pub const fn new() -> Self {
        Self {
            rd: 0,
            wr: 0,
            buf: Vec::new(),
        }
    }

    /// Create an empty buffer which can hold `cap` bytes without reallocation.
    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            rd: 0,
            wr: 0,
            buf: Vec::with_capacity(cap),
        }
    }

    /// Create a buffer holding a copy of `data`.
    #[inline]
    pub fn new_with_data(data: &[u8]) -> Self {
        Self {
            rd: 0,
            wr: data.len(),
            buf: data.to_vec(),
        }
    }

    /// Logical length of the view.
    #[inline]
    pub const fn len(&self) -> usize { self.wr - self.rd }

    #[inline]
    pub const fn is_empty(&self) -> bool { self.wr == self.rd }

    /// Offset of the view inside the backing store.
    #[inline]
    pub const fn view_offset(&self) -> usize { self.rd }

    /// Bytes addressed by the view.
    #[inline]
    pub fn as_slice(&self) -> &[u8] { &self.buf[self.rd..self.wr] }

    /// Grow the logical end, copying `src` in.
    pub fn append(&mut self, src: &[u8]) {
        // drop bytes hidden behind a shrunk tail
        self.buf.truncate(self.wr);

        // reclaim the consumed prefix once it dominates the backing store
        if self.rd != 0 && self.rd >= self.buf.capacity() / 2 {
            self.buf.drain(..self.rd);
            self.wr -= self.rd;
            self.rd = 0;
        }

        self.buf.extend_from_slice(src);
        self.wr += src.len();
    }

    /// Overwrite `[offset, offset + src.len())` with `src`.
    ///
    /// `offset` may equal the current length, or the written range may run
    /// past it, in which case the view grows to cover the new bytes.
    pub fn set(&mut self, offset: usize, src: &[u8]) {
        assert!(
            offset <= self.len(),
            "set offset {} out of range {}",
            offset,
            self.len()
        );

        let overlap = std::cmp::min(src.len(), self.len() - offset);
        let beg = self.rd + offset;
        self.buf[beg..beg + overlap].copy_from_slice(&src[..overlap]);

        if overlap < src.len() {
            self.append(&src[overlap..]);
        }
    }

    /// Borrow `[offset, offset + len)` without copying.
    pub fn slice(&self, offset: usize, len: usize) -> &[u8] {
        assert!(
            offset.checked_add(len).map_or(false, |end| end <= self.len()),
            "slice {}+{} out of range {}",
            offset,
            len,
            self.len()
        );

        let beg = self.rd + offset;
        &self.buf[beg..beg + len]
    }

    /// Position of the first occurrence of `pattern` at or after `from`.
    pub fn index_of(&self, pattern: &[u8], from: usize) -> Option<usize> {
        let data = self.as_slice();
        if from > data.len() {
            return None;
        }
        if pattern.is_empty() {
            return Some(from);
        }

        data[from..]
            .windows(pattern.len())
            .position(|w| w == pattern)
            .map(|pos| pos + from)
    }

    /// Advance the start of the view by `offset` bytes.
    /// The retained suffix is never copied.
    pub fn view_from(&mut self, offset: usize) {
        assert!(
            offset <= self.len(),
            "view offset {} out of range {}",
            offset,
            self.len()
        );

        self.rd += offset;

        // nothing retained, start over
        if self.rd == self.wr {
            self.clear();
        }
    }

    /// Shrink the view to its first `len` bytes.
    pub fn truncate(&mut self, len: usize) {
        assert!(len <= self.len(), "truncate {} out of range {}", len, self.len());
        self.wr = self.rd + len;
    }

    /// Decode `[offset, offset + len)` as UTF-8, replacing invalid sequences.
    #[inline]
    pub fn utf8(&self, offset: usize, len: usize) -> Cow<'_, str> {
        String::from_utf8_lossy(self.slice(offset, len))
    }

    #[inline]
    pub fn clear(&mut self) {
        self.rd = 0;
        self.wr = 0;
        self.buf.clear();
    }
}

impl AsRef<[u8]> for ByteBuffer {
    #[inline]
    fn as_ref(&self) -> &[u8] { self.as_slice() }
}

impl From<&[u8]> for ByteBuffer {
    #[inline]
    fn from(data: &[u8]) -> Self { Self::new_with_data(data) }
}

impl From<Vec<u8>> for ByteBuffer {
    #[inline]
    fn from(buf: Vec<u8>) -> Self {
        Self {
            rd: 0,
            wr: buf.len(),
            buf,
        }
    }
}
