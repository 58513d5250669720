// #![warn(missing_docs)]

//! Streaming HTTP/1.x response parser for client connections.
//!
//! ## Features
//! - Tolerate any fragmentation of the incoming bytes.
//! - Body framed by `Content-Length`, `Transfer-Encoding: chunked`, or neither.
//! - Hand bytes read past a response back to the pipe, for the next
//!   response or an upgraded protocol.
//! - Websocket handshake keys.
//!
//! ## High-level API
//!
//! - [`pipe`]
//! - [`http`]
//!
//! ```ignore
//! {
//!     let mut pipe = Pipe::new(tcp);
//!     let request = Request::get("www.example.com", "/index.html");
//!     let mut parser = ResponseParser::send(&mut pipe, &request, &Platform::new())?;
//!
//!     // on every readable notification of the transport
//!     pipe.notify_data();
//!     parser.drive(&mut pipe, &mut handler);
//! }
//! ```
//!
//! ## Low-level API
//!
//! - [`buffer`]
//! - [`chunked`]
//! - [`handshake`]
//!
//! Chunked:
//!
//! ```ignore
//! {
//!     let mut decoder = ChunkedDecoder::new();
//!     match decoder.feed(&buf, |chunk| body.extend_from_slice(chunk))? {
//!         Feed::Partial => { /* need more */ }
//!         Feed::Done(n) => { /* buf[n..] is not part of the body */ }
//!     }
//! }
//! ```
//!
//! Handshake:
//!
//! ```ignore
//! {
//!     // make a client handshake request
//!     let sec_key = new_sec_key();
//!     let request = Request::websocket(host, path, &sec_key);
//!
//!     // check the server handshake response
//!     validate_headers(&headers_event, &sec_key)?;
//! }
//! ```

pub mod buffer;
pub mod pipe;
pub mod chunked;
pub mod http;
pub mod handshake;
pub mod platform;
pub mod error;
