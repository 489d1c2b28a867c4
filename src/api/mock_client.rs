use crate::api::client::{ByteStream, MockStreamProducer};
use crate::error::ChatError;
use bytes::Bytes;
use futures::stream;
use reqwest::StatusCode;
use std::sync::{Arc, Mutex};

/// One scripted reply from the fake backend.
pub enum MockResponse {
    /// Body chunks, delivered exactly as given (no framing is added).
    Chunks(Vec<String>),
    /// Non-2xx status returned before streaming starts.
    Rejected { status: StatusCode, body: String },
    /// Some chunks, then a transport failure.
    Interrupted { chunks: Vec<String>, error: String },
}

#[derive(Clone)]
pub struct MockApiClient {
    responses: Arc<Mutex<Vec<MockResponse>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockApiClient {
    pub fn new(responses: Vec<Vec<String>>) -> Self {
        Self::scripted(responses.into_iter().map(MockResponse::Chunks).collect())
    }

    pub fn scripted(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Messages received so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl MockStreamProducer for MockApiClient {
    fn create_mock_stream(&self, message: &str) -> Result<ByteStream, ChatError> {
        self.requests.lock().unwrap().push(message.to_string());

        let mut responses_guard = self.responses.lock().unwrap();
        if responses_guard.is_empty() {
            return Err(ChatError::TransportInterrupted(
                "MockApiClient: No more responses configured".to_string(),
            ));
        }

        match responses_guard.remove(0) {
            MockResponse::Chunks(chunks) => {
                let items: Vec<Result<Bytes, ChatError>> =
                    chunks.into_iter().map(|s| Ok(Bytes::from(s))).collect();
                Ok(Box::pin(stream::iter(items)))
            }
            MockResponse::Rejected { status, body } => Err(ChatError::rejected(status, &body)),
            MockResponse::Interrupted { chunks, error } => {
                let mut items: Vec<Result<Bytes, ChatError>> =
                    chunks.into_iter().map(|s| Ok(Bytes::from(s))).collect();
                items.push(Err(ChatError::TransportInterrupted(error)));
                Ok(Box::pin(stream::iter(items)))
            }
        }
    }
}
