use super::UiUpdate;
use crate::state::{ConversationManager, ConversationState, ConversationStreamUpdate, Submission};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

/// Owns the conversation state and applies request updates in one place.
///
/// Request tasks never touch the state; they only send `UiUpdate`s, which are
/// applied by `drain_updates`/`next_update` on the caller's task.
pub struct ChatRuntime {
    state: ConversationState,
    conversation: Arc<ConversationManager>,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
    update_rx: mpsc::UnboundedReceiver<UiUpdate>,
    cancel: Option<CancellationToken>,
}

impl ChatRuntime {
    pub fn new(conversation: ConversationManager) -> Self {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        Self {
            state: ConversationState::new(),
            conversation: Arc::new(conversation),
            update_tx,
            update_rx,
            cancel: None,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Returns false when the submission was rejected (blank input or busy).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&mut self, input: &str) -> bool {
        let Some(submission) = self.state.submit(input) else {
            return false;
        };

        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());
        task::spawn(run_submission(
            Arc::clone(&self.conversation),
            submission,
            self.update_tx.clone(),
            cancel,
        ));
        true
    }

    /// Aborts the in-flight request, if any. The abort arrives as an error update.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }

    pub fn reset(&mut self) {
        self.cancel();
        self.state.reset();
    }

    pub fn dismiss_error(&mut self) {
        self.state.dismiss_error();
    }

    /// Applies every update already queued without waiting. Returns how many
    /// changed the state.
    pub fn drain_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.update_rx.try_recv() {
            if self.apply(update) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next update and applies it. Returns whether it changed the state.
    pub async fn next_update(&mut self) -> bool {
        match self.update_rx.recv().await {
            Some(update) => self.apply(update),
            None => false,
        }
    }

    fn apply(&mut self, update: UiUpdate) -> bool {
        let session = update.session();
        let applied = self.state.apply(update);
        if !applied {
            trace!(session = session.get(), "dropped stale update");
        }
        applied
    }

    /// Waits until the current exchange has completed or failed.
    pub async fn wait_idle(&mut self) {
        while self.state.is_loading() {
            self.next_update().await;
        }
    }
}

async fn run_submission(
    conversation: Arc<ConversationManager>,
    submission: Submission,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
    cancel: CancellationToken,
) {
    let session = submission.session;
    let (delta_tx, mut delta_rx) = mpsc::unbounded_channel::<ConversationStreamUpdate>();

    let forward_tx = update_tx.clone();
    let stream_forwarder = task::spawn(async move {
        let mut completed = false;
        while let Some(delta) = delta_rx.recv().await {
            let ui_update = match delta {
                ConversationStreamUpdate::Opened => UiUpdate::RequestOpened { session },
                ConversationStreamUpdate::Delta(text) => UiUpdate::StreamDelta { session, text },
                ConversationStreamUpdate::Complete(_) => {
                    completed = true;
                    UiUpdate::TurnComplete { session }
                }
            };
            let _ = forward_tx.send(ui_update);
        }
        completed
    });

    let response = conversation
        .send_message(&submission.message, Some(&delta_tx), &cancel)
        .await;
    drop(delta_tx);

    let completed = match stream_forwarder.await {
        Ok(completed) => completed,
        Err(join_error) => {
            let _ = update_tx.send(UiUpdate::Error {
                session,
                message: format!("Stream forwarding failed: {join_error}"),
            });
            return;
        }
    };

    match response {
        Ok(_) if completed => {}
        Ok(_) => {
            let _ = update_tx.send(UiUpdate::TurnComplete { session });
        }
        Err(error) => {
            warn!(session = session.get(), %error, "chat request failed");
            let _ = update_tx.send(UiUpdate::Error {
                session,
                message: error.to_string(),
            });
        }
    }
}
