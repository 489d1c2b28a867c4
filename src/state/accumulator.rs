use super::conversation::ConversationStreamUpdate;
use tokio::sync::mpsc;

/// Observer for incremental assistant text.
pub trait FragmentSink {
    /// Called once per fragment, in arrival order.
    fn fragment(&mut self, text: &str);

    /// Called once with the full message when the stream ends normally.
    fn complete(&mut self, _full_text: &str) {}
}

impl<T: FragmentSink + ?Sized> FragmentSink for &mut T {
    fn fragment(&mut self, text: &str) {
        (**self).fragment(text);
    }

    fn complete(&mut self, full_text: &str) {
        (**self).complete(full_text);
    }
}

impl<T: FragmentSink> FragmentSink for Option<T> {
    fn fragment(&mut self, text: &str) {
        if let Some(sink) = self {
            sink.fragment(text);
        }
    }

    fn complete(&mut self, full_text: &str) {
        if let Some(sink) = self {
            sink.complete(full_text);
        }
    }
}

impl FragmentSink for mpsc::UnboundedSender<ConversationStreamUpdate> {
    fn fragment(&mut self, text: &str) {
        let _ = self.send(ConversationStreamUpdate::Delta(text.to_string()));
    }

    fn complete(&mut self, full_text: &str) {
        let _ = self.send(ConversationStreamUpdate::Complete(full_text.to_string()));
    }
}

/// Running full message for one stream, forwarding each fragment as it lands.
pub struct Accumulator<S: FragmentSink> {
    full_text: String,
    sink: S,
    fragments: usize,
}

impl<S: FragmentSink> Accumulator<S> {
    pub fn new(sink: S) -> Self {
        Self {
            full_text: String::new(),
            sink,
            fragments: 0,
        }
    }

    /// Zero-length fragments do not reach the sink.
    pub fn append(&mut self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        self.full_text.push_str(fragment);
        self.fragments += 1;
        self.sink.fragment(fragment);
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// Consumes the accumulator, so the completion callback runs exactly once.
    pub fn finish(mut self) -> String {
        self.sink.complete(&self.full_text);
        self.full_text
    }
}
