use serde_json::Value;
use tracing::debug;

/// Envelope field that carries the text fragment.
pub const TEXT_FIELD: &str = "data";

/// Outcome of interpreting one frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A JSON envelope whose text field was found.
    Structured { text: String },
    /// Anything else, used verbatim.
    Raw { text: String },
}

impl Payload {
    /// Never fails: payloads that are not a usable envelope are kept as raw text.
    pub fn parse(raw: &str) -> Self {
        if !raw.starts_with('{') {
            return Self::raw(raw);
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(envelope)) => match envelope.get(TEXT_FIELD) {
                Some(Value::String(text)) => Self::Structured { text: text.clone() },
                None | Some(Value::Null) => Self::raw(raw),
                Some(other) => Self::Structured {
                    text: other.to_string(),
                },
            },
            Ok(_) => Self::raw(raw),
            Err(error) => {
                debug!(%error, "frame payload is not a JSON envelope; using raw text");
                Self::raw(raw)
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Structured { text } | Self::Raw { text } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Structured { text } | Self::Raw { text } => text,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured { .. })
    }

    fn raw(raw: &str) -> Self {
        Self::Raw {
            text: raw.to_string(),
        }
    }
}
