use crate::api::ApiClient;
use std::sync::Arc;

/// What a running request reports back while it streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationStreamUpdate {
    /// The backend accepted the request and the body is being read.
    Opened,
    Delta(String),
    /// Normal end of stream, with the full assistant message.
    Complete(String),
}

pub struct ConversationManager {
    pub(super) client: Arc<ApiClient>,
}

impl ConversationManager {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> Arc<ApiClient> {
        Arc::clone(&self.client)
    }
}
