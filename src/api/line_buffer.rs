//! Newline framing for a chunked response body.
//!
//! Network reads split the body at arbitrary byte offsets, including in the
//! middle of a record or of a multi-byte character. `LineBuffer` keeps both
//! the undecoded bytes and the unterminated text tail between reads so that a
//! record is only released once its `\n` has arrived.

use std::mem;

#[derive(Debug, Default)]
pub struct LineBuffer {
    tail: String,
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns every record completed by it, in order.
    ///
    /// A trailing `\r` is stripped from each record.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        if chunk.is_empty() {
            return Vec::new();
        }

        self.decode(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.tail[start..].find('\n') {
            let end = start + offset;
            let line = &self.tail[start..end];
            lines.push(line.strip_suffix('\r').unwrap_or(line).to_string());
            start = end + 1;
        }

        if start > 0 {
            self.tail.drain(..start);
        }

        lines
    }

    /// Releases the unterminated tail at end of stream.
    pub fn flush(&mut self) -> Option<String> {
        if !self.pending.is_empty() {
            let pending = mem::take(&mut self.pending);
            self.tail.push_str(&String::from_utf8_lossy(&pending));
        }

        if self.tail.is_empty() {
            return None;
        }

        let mut line = mem::take(&mut self.tail);
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// Number of bytes held back because they end in an incomplete character.
    pub fn pending_bytes(&self) -> usize {
        self.pending.len()
    }

    fn decode(&mut self, chunk: &[u8]) {
        let mut input = mem::take(&mut self.pending);
        input.extend_from_slice(chunk);

        let mut rest: &[u8] = &input;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    self.tail.push_str(valid);
                    return;
                }
                Err(error) => {
                    let (valid, after) = rest.split_at(error.valid_up_to());
                    self.tail.push_str(&String::from_utf8_lossy(valid));
                    match error.error_len() {
                        Some(invalid_len) => {
                            self.tail.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[invalid_len..];
                        }
                        None => {
                            // Incomplete sequence at the end; wait for the next read.
                            self.pending = after.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }
}
