//! Structural framing for a stream of JSON objects.
//!
//! TCP delivers bytes, not messages: one read may end halfway through an
//! object or carry several objects at once. The [`Framer`] accumulates
//! reads and cuts out each complete, brace-balanced `{...}` object. There
//! is no length prefix; boundaries come purely from the structure.
//!
//! ```text
//!   read 1: {"type":"draw_card"}{"type":"atta
//!   read 2: ck","row":1,"col":2}\n
//!
//!   frames: {"type":"draw_card"}
//!           {"type":"attack","row":1,"col":2}
//! ```

use crate::ProtocolError;

/// Largest partial object the framer will hold before giving up on it.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Accumulates stream bytes and yields complete JSON objects.
///
/// Braces inside string literals (including escaped quotes) do not count
/// toward nesting depth. Bytes between objects (newlines, whitespace,
/// stray closing braces) are skipped.
#[derive(Debug)]
pub struct Framer {
    buf: Vec<u8>,
    limit: usize,
}

impl Framer {
    /// Creates a framer with the default [`MAX_FRAME_LEN`] limit.
    pub fn new() -> Self {
        Self::with_limit(MAX_FRAME_LEN)
    }

    /// Creates a framer that discards partial objects longer than `limit`.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
        }
    }

    /// Appends freshly read bytes.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Extracts the next complete object, if one is buffered.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Trailing partial
    /// bytes stay buffered for the next [`push`](Self::push).
    ///
    /// # Errors
    /// Returns [`ProtocolError::FrameTooLarge`] when an unfinished object
    /// exceeds the limit. The buffer is cleared and framing can continue
    /// with the next call.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        let Some(start) = self.buf.iter().position(|&b| b == b'{') else {
            self.buf.clear();
            return Ok(None);
        };
        self.buf.drain(..start);

        match find_object_end(&self.buf) {
            Some(end) => Ok(Some(self.buf.drain(..=end).collect())),
            None if self.buf.len() > self.limit => {
                self.buf.clear();
                Err(ProtocolError::FrameTooLarge { limit: self.limit })
            }
            None => Ok(None),
        }
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the index of the brace closing the object that starts at 0.
fn find_object_end(buf: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in buf.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
