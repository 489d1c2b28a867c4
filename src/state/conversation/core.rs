use super::{ConversationManager, ConversationStreamUpdate};
use crate::error::ChatError;
use crate::state::session::StreamSession;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

impl ConversationManager {
    /// Sends one user message and streams the answer into `stream_delta_tx`.
    ///
    /// Emits `Opened` once the backend accepts the request, a `Delta` per
    /// fragment, and `Complete` on a normal end of stream. Errors are returned,
    /// not emitted.
    pub async fn send_message(
        &self,
        content: &str,
        stream_delta_tx: Option<&mpsc::UnboundedSender<ConversationStreamUpdate>>,
        cancel: &CancellationToken,
    ) -> Result<String, ChatError> {
        let stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Aborted),
            opened = self.client.create_stream(content) => opened?,
        };
        emit_stream_update(stream_delta_tx, ConversationStreamUpdate::Opened);

        let full_text = StreamSession::new(stream, stream_delta_tx.cloned())
            .run(cancel)
            .await?;
        debug!(chars = full_text.chars().count(), "assistant message complete");
        Ok(full_text)
    }
}

fn emit_stream_update(
    stream_delta_tx: Option<&mpsc::UnboundedSender<ConversationStreamUpdate>>,
    update: ConversationStreamUpdate,
) {
    if let Some(tx) = stream_delta_tx {
        let _ = tx.send(update);
    }
}
