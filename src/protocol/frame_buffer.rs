//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for buffer management. Each push appends the chunk
//! and scans for the known signatures in [`FrameKind::PRIORITY`] order:
//! - signature found, frame incomplete: keep everything, wait for more bytes
//! - signature found, frame complete: emit it and clear the whole buffer
//! - `#HR` diagnostic: emit the text up to the end of its line, keep the rest
//! - no signature: keep buffering up to the configured bound
//!
//! The gateway forwards bus telegrams one at a time, so the buffer holds at
//! most one undecoded frame. Bytes that follow a completed frame in the same
//! chunk are dropped with it.
//!
//! # Example
//!
//! ```
//! use ht3_driver::protocol::{FrameBuffer, FrameKind, Inbound};
//!
//! let mut buffer = FrameBuffer::new();
//! let mut raw = vec![0u8; 14];
//! raw[..4].copy_from_slice(FrameKind::DateTime.signature());
//!
//! assert!(buffer.push(&raw[..6]).is_none());
//! match buffer.push(&raw[6..]) {
//!     Some(Inbound::Frame(frame)) => assert_eq!(frame.kind, FrameKind::DateTime),
//!     other => panic!("unexpected {:?}", other),
//! }
//! assert!(buffer.is_empty());
//! ```

use bytes::BytesMut;

use super::{Frame, FrameKind};

/// Default bound on buffered bytes while no signature is present.
pub const DEFAULT_MAX_BUFFERED: usize = 4096;

/// Result of a push that consumed the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A full frame of a known kind (decoded or ignored, see
    /// [`FrameKind::is_decoded`]).
    Frame(Frame),
    /// Gateway diagnostic text starting at `#HR`.
    Diagnostic(String),
    /// Buffer exceeded its bound without any signature and was discarded.
    Overflow(usize),
}

/// Buffer for accumulating incoming bytes and extracting frames.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Maximum bytes kept while no signature is present.
    max_buffered: usize,
}

impl FrameBuffer {
    /// Create a new frame buffer with default settings.
    pub fn new() -> Self {
        Self::with_max_buffered(DEFAULT_MAX_BUFFERED)
    }

    /// Create a new frame buffer with a custom bound.
    pub fn with_max_buffered(max_buffered: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(max_buffered.min(64 * 1024)),
            max_buffered,
        }
    }

    /// Push data into the buffer and try to extract a frame.
    ///
    /// Returns `None` while more data is needed.
    pub fn push(&mut self, data: &[u8]) -> Option<Inbound> {
        self.buffer.extend_from_slice(data);
        self.try_extract()
    }

    fn try_extract(&mut self) -> Option<Inbound> {
        for kind in FrameKind::PRIORITY {
            let Some(pos) = find(&self.buffer, kind.signature()) else {
                continue;
            };

            let Some(length) = kind.byte_length() else {
                // The diagnostic runs to the end of its line; later bytes may
                // start the next frame.
                let end = self.buffer[pos..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(self.buffer.len(), |i| pos + i + 1);
                let line = self.buffer.split_to(end);
                let text = String::from_utf8_lossy(&line[pos..]).into_owned();
                return Some(Inbound::Diagnostic(text));
            };

            if self.buffer.len() - pos < length {
                // First matching signature decides; wait for the rest of it.
                return None;
            }

            let _ = self.buffer.split_to(pos);
            let bytes = self.buffer.split_to(length).freeze();
            self.buffer.clear();

            return Some(Inbound::Frame(Frame::new(kind, bytes)));
        }

        if self.buffer.len() > self.max_buffered {
            let dropped = self.buffer.len();
            self.buffer.clear();
            return Some(Inbound::Overflow(dropped));
        }

        None
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discard all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Position of the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
