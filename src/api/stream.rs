use super::line_buffer::LineBuffer;
use tracing::trace;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";

/// One newline-delimited record, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Raw payload following the `data: ` prefix.
    Data(String),
    /// The `[DONE]` terminator.
    Done,
    /// Blank lines, comments, `event:`/`id:` fields and anything else.
    Ignored,
}

/// Classifies a complete line. Unrecognized shapes are ignored, never rejected.
pub fn decode_line(line: &str) -> Frame {
    match line.strip_prefix(DATA_PREFIX) {
        Some(payload) if payload.trim() == DONE_SENTINEL => Frame::Done,
        Some(payload) => Frame::Data(payload.to_string()),
        None => Frame::Ignored,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Payload(String),
    Done,
}

/// Turns raw body chunks into payload events, halting at the first terminator.
#[derive(Debug, Default)]
pub struct StreamParser {
    lines: LineBuffer,
    finished: bool,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        let lines = self.lines.feed(chunk);
        self.decode_lines(lines)
    }

    /// Decodes the final unterminated line once the transport has closed.
    pub fn flush(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        match self.lines.flush() {
            Some(line) => self.decode_lines([line]),
            None => Vec::new(),
        }
    }

    /// True once `[DONE]` has been seen; later input is discarded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn decode_lines(&mut self, lines: impl IntoIterator<Item = String>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for line in lines {
            match decode_line(&line) {
                Frame::Data(payload) => events.push(StreamEvent::Payload(payload)),
                Frame::Done => {
                    self.finished = true;
                    events.push(StreamEvent::Done);
                    break;
                }
                Frame::Ignored => {
                    if !line.is_empty() {
                        trace!(line = %line, "ignoring non-data line");
                    }
                }
            }
        }
        events
    }
}
