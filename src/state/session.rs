use super::accumulator::{Accumulator, FragmentSink};
use crate::api::payload::Payload;
use crate::api::stream::{StreamEvent, StreamParser};
use crate::api::ByteStream;
use crate::error::ChatError;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Per-request reader: body chunks in, ordered fragments out.
pub struct StreamSession<S: FragmentSink> {
    stream: ByteStream,
    parser: StreamParser,
    accumulator: Accumulator<S>,
}

impl<S: FragmentSink> StreamSession<S> {
    pub fn new(stream: ByteStream, sink: S) -> Self {
        Self {
            stream,
            parser: StreamParser::new(),
            accumulator: Accumulator::new(sink),
        }
    }

    /// Reads until `[DONE]` or transport close and returns the full message.
    ///
    /// Fragments already delivered stay delivered when this returns an error;
    /// the completion callback only runs on success.
    pub async fn run(mut self, cancel: &CancellationToken) -> Result<String, ChatError> {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("stream cancelled by caller");
                    return Err(ChatError::Aborted);
                }
                next = self.stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    let events = self.parser.process(&chunk);
                    if self.deliver(events) {
                        break;
                    }
                }
                Some(Err(error)) => {
                    warn!(%error, "stream interrupted");
                    return Err(error);
                }
                None => {
                    let events = self.parser.flush();
                    self.deliver(events);
                    break;
                }
            }
        }

        Ok(self.accumulator.finish())
    }

    /// Returns true once the terminator has been seen.
    fn deliver(&mut self, events: Vec<StreamEvent>) -> bool {
        for event in events {
            match event {
                StreamEvent::Payload(raw) => {
                    let payload = Payload::parse(&raw);
                    self.accumulator.append(payload.text());
                }
                StreamEvent::Done => return true,
            }
        }
        false
    }
}
