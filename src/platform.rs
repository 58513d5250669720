//! Platform defaults shared by every request.

/// Default size of the read staging buffer, 16K.
pub const DEFAULT_SCRATCH_SIZE: usize = 0x4000;

/// Ambient settings the parser relies on: default outgoing headers and
/// the size of the buffer each read is staged in.
///
/// Default headers are kept in insertion order and are written only when
/// the request does not carry a header with exactly the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    default_headers: Vec<(String, String)>,
    scratch_size: usize,
}

impl Default for Platform {
    fn default() -> Self {
        Self::bare()
            .with_default_header(
                "User-Agent",
                concat!("h1pipe/", env!("CARGO_PKG_VERSION")),
            )
            .with_default_header("Accept", "*/*")
    }
}

impl Platform {
    /// `User-Agent` and `Accept` defaults, 16K scratch buffer.
    #[inline]
    pub fn new() -> Self { Self::default() }

    /// No default headers, 16K scratch buffer.
    #[inline]
    pub const fn bare() -> Self {
        Self {
            default_headers: Vec::new(),
            scratch_size: DEFAULT_SCRATCH_SIZE,
        }
    }

    /// Add a default header, replacing the value of an existing one.
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        match self.default_headers.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_owned(),
            None => self
                .default_headers
                .push((name.to_owned(), value.to_owned())),
        }
        self
    }

    pub fn with_scratch_size(mut self, size: usize) -> Self {
        assert!(size > 0, "Scratch buffer must not be empty");
        self.scratch_size = size;
        self
    }

    #[inline]
    pub fn default_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.default_headers
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }

    #[inline]
    pub const fn scratch_size(&self) -> usize { self.scratch_size }

    /// Allocate a zeroed scratch buffer.
    #[inline]
    pub fn new_scratch(&self) -> Vec<u8> { vec![0; self.scratch_size] }
}
