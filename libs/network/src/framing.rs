//! # Stream Framer - Self-Delimited JSON Boundary Recovery
//!
//! ## Purpose
//!
//! Recovers discrete frames from a TCP byte stream where each frame is one JSON
//! object and no length prefix is sent. Bytes are scanned once, in order, with
//! three pieces of state carried across chunks:
//!
//! - `depth`: count of unmatched `{` seen outside strings
//! - `in_string`: inside a JSON string literal
//! - `escape_next`: previous byte was a backslash inside a string
//!
//! When `depth` returns to zero after being positive, everything from the end
//! of the previous frame through the closing brace is emitted as one frame.
//! The scan position survives between pushes so bytes are never rescanned.
//!
//! ## Guarantees
//!
//! - Frames are identical no matter how the stream is split into chunks
//! - Braces and escaped quotes inside strings never affect depth
//! - A `}` at depth zero is ignored
//! - Pending bytes are capped; exceeding the cap is a [`FramingError`]
//!
//! ## Architecture Role
//!
//! ```text
//! socket read → [StreamFramer] → Bytes frames → HandoffQueue → parser workers
//! ```

use crate::error::FramingError;
use bytes::{Bytes, BytesMut};

/// Default cap on bytes held without a complete frame
pub const DEFAULT_MAX_PENDING_BYTES: usize = 1024 * 1024;

/// Incremental brace-depth framer for one connection
#[derive(Debug)]
pub struct StreamFramer {
    buffer: BytesMut,
    /// Next byte of `buffer` to scan
    scan_pos: usize,
    depth: usize,
    in_string: bool,
    escape_next: bool,
    max_pending: usize,
}

impl StreamFramer {
    pub fn new() -> Self {
        Self::with_max_pending(DEFAULT_MAX_PENDING_BYTES)
    }

    pub fn with_max_pending(max_pending: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            scan_pos: 0,
            depth: 0,
            in_string: false,
            escape_next: false,
            max_pending,
        }
    }

    /// Append a received chunk and move every completed frame into `frames`
    ///
    /// Frames completed by this chunk are always delivered, even when the
    /// bytes left over afterwards exceed the cap and an error is returned.
    pub fn push(&mut self, chunk: &[u8], frames: &mut Vec<Bytes>) -> Result<(), FramingError> {
        self.buffer.extend_from_slice(chunk);

        while self.scan_pos < self.buffer.len() {
            let byte = self.buffer[self.scan_pos];
            self.scan_pos += 1;

            if self.in_string {
                if self.escape_next {
                    self.escape_next = false;
                } else if byte == b'\\' {
                    self.escape_next = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' => self.depth += 1,
                b'}' if self.depth > 0 => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        frames.push(self.buffer.split_to(self.scan_pos).freeze());
                        self.scan_pos = 0;
                    }
                }
                _ => {}
            }
        }

        if self.buffer.len() > self.max_pending {
            return Err(FramingError::BufferOverflow {
                pending: self.buffer.len(),
                limit: self.max_pending,
            });
        }
        Ok(())
    }

    /// Bytes received but not yet part of an emitted frame
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Current unmatched brace depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    /// Discard pending bytes and scan state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.scan_pos = 0;
        self.depth = 0;
        self.in_string = false;
        self.escape_next = false;
    }
}

impl Default for StreamFramer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_all(framer: &mut StreamFramer, chunk: &[u8]) -> Vec<Bytes> {
        let mut frames = Vec::new();
        framer.push(chunk, &mut frames).unwrap();
        frames
    }

    #[test]
    fn test_two_frames_in_one_chunk() {
        let mut framer = StreamFramer::new();
        let frames = push_all(&mut framer, br#"{"a":1}{"b":{"c":2}}"#);
        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0][..], br#"{"a":1}"#);
        assert_eq!(&frames[1][..], br#"{"b":{"c":2}}"#);
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn test_split_across_chunks() {
        let mut framer = StreamFramer::new();
        assert!(push_all(&mut framer, br#"{"a":"#).is_empty());
        assert_eq!(framer.depth(), 1);
        let frames = push_all(&mut framer, br#"1}{"b""#);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], br#"{"a":1}"#);
        let frames = push_all(&mut framer, br#":2}"#);
        assert_eq!(&frames[0][..], br#"{"b":2}"#);
    }

    #[test]
    fn test_braces_inside_strings() {
        let mut framer = StreamFramer::new();
        let frames = push_all(&mut framer, br#"{"p":"}{\"x"}"#);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], br#"{"p":"}{\"x"}"#);
    }

    #[test]
    fn test_escaped_backslash_before_quote() {
        let mut framer = StreamFramer::new();
        let frames = push_all(&mut framer, br#"{"p":"a\\"}"#);
        assert_eq!(frames.len(), 1);
        assert_eq!(framer.depth(), 0);
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut framer = StreamFramer::new();
        assert!(push_all(&mut framer, br#"{"p":"\"#).is_empty());
        assert!(push_all(&mut framer, br#""}"#).is_empty());
        let frames = push_all(&mut framer, br#""}"#);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], br#"{"p":"\"}"}"#);
    }

    #[test]
    fn test_stray_closing_brace_ignored() {
        let mut framer = StreamFramer::new();
        let frames = push_all(&mut framer, br#"}}{"a":1}"#);
        assert_eq!(frames.len(), 1);
        // Leading bytes since the previous frame belong to the span
        assert_eq!(&frames[0][..], br#"}}{"a":1}"#);
    }

    #[test]
    fn test_inter_frame_bytes_prefix_next_frame() {
        let mut framer = StreamFramer::new();
        let frames = push_all(&mut framer, b"{\"a\":1}\n{\"b\":2}\n");
        assert_eq!(&frames[1][..], b"\n{\"b\":2}");
        assert_eq!(framer.pending_len(), 1);
    }

    #[test]
    fn test_overflow_still_delivers_complete_frames() {
        let mut framer = StreamFramer::with_max_pending(8);
        let mut frames = Vec::new();
        let err = framer
            .push(br#"{"a":1}{"unterminated":"xx"#, &mut frames)
            .unwrap_err();
        assert_eq!(frames.len(), 1);
        assert!(matches!(err, FramingError::BufferOverflow { limit: 8, .. }));

        framer.reset();
        assert_eq!(framer.pending_len(), 0);
        assert_eq!(push_all(&mut framer, br#"{"b":2}"#).len(), 1);
    }
}
