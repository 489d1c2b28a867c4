use super::logging::{debug_payload_enabled, emit_debug_payload};
use crate::config::Config;
use crate::error::ChatError;
use crate::types::{ChatRequest, ChatResponse, Credential, HealthStatus};
use crate::util::{is_local_endpoint_url, join_endpoint};
use anyhow::Context;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;
use tracing::{info, warn};

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ChatError>> + Send>>;

const CHAT_PATH: &str = "chat";
const COMPLETION_PATH: &str = "chat/completion";
const HEALTH_PATH: &str = "health";
const API_KEY_HEADER: &str = "x-api-key";

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, message: &str) -> Result<ByteStream, ChatError>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_url: String,
    credential: Option<Credential>,
    tenant_id: Option<String>,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("supportdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            credential: config.credential.clone(),
            tenant_id: config.tenant_id.clone(),
            #[cfg(test)]
            mock_stream_producer: None,
        })
    }

    #[cfg(test)]
    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: "http://localhost:8000".to_string(),
            credential: None,
            tenant_id: None,
            mock_stream_producer: Some(mock_producer),
        }
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }

    /// Opens the streaming chat request.
    ///
    /// A non-2xx status is returned as `RequestRejected` before any body byte is
    /// handed out.
    pub async fn create_stream(&self, message: &str) -> Result<ByteStream, ChatError> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(message);
            }
        }

        let request_url = join_endpoint(&self.api_url, CHAT_PATH);
        let response = self.send_chat(&request_url, message).await?;
        info!(url = %request_url, status = %response.status(), "chat stream opened");

        let request_url_for_stream = request_url.clone();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_api_request_error(error, &request_url_for_stream))
        });
        Ok(Box::pin(stream))
    }

    /// Non-streaming sibling of `create_stream`: returns the whole answer at once.
    pub async fn complete(&self, message: &str) -> Result<String, ChatError> {
        let request_url = join_endpoint(&self.api_url, COMPLETION_PATH);
        let response = self.send_chat(&request_url, message).await?;
        let body = response
            .text()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?;

        serde_json::from_str::<ChatResponse>(&body)
            .map(|parsed| parsed.response)
            .map_err(|error| ChatError::InvalidResponse {
                url: request_url,
                reason: error.to_string(),
            })
    }

    pub async fn health(&self) -> Result<HealthStatus, ChatError> {
        let request_url = join_endpoint(&self.api_url, HEALTH_PATH);
        let response = self
            .authorize(self.http.get(&request_url))
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?;
        let response = reject_unsuccessful(response).await?;

        response
            .json::<HealthStatus>()
            .await
            .map_err(|error| ChatError::InvalidResponse {
                url: request_url,
                reason: error.to_string(),
            })
    }

    async fn send_chat(
        &self,
        request_url: &str,
        message: &str,
    ) -> Result<reqwest::Response, ChatError> {
        let payload = ChatRequest {
            message,
            tenant_id: self.tenant_id.as_deref(),
        };

        if debug_payload_enabled() {
            match serde_json::to_value(&payload) {
                Ok(value) => emit_debug_payload(request_url, &value),
                Err(error) => warn!(%error, "cannot render chat payload for debugging"),
            }
        }

        let request = self
            .http
            .post(request_url)
            .header("content-type", "application/json")
            .json(&payload);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, request_url))?;
        reject_unsuccessful(response).await
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credential {
            Some(Credential::Bearer(token)) => request.bearer_auth(token),
            Some(Credential::ApiKey(key)) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }
}

async fn reject_unsuccessful(response: reqwest::Response) -> Result<reqwest::Response, ChatError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let error = ChatError::rejected(status, &body);
    warn!(%status, detail = %error, "chat request rejected");
    Err(error)
}

fn map_api_request_error(error: reqwest::Error, request_url: &str) -> ChatError {
    let message = if error.is_connect() && is_local_endpoint_url(request_url) {
        format!(
            "cannot reach local support backend '{request_url}': {error}. Start the backend or update SUPPORTDESK_API_URL."
        )
    } else if error.is_connect() {
        format!("cannot reach support backend '{request_url}': {error}")
    } else if error.is_timeout() {
        format!("request to '{request_url}' timed out: {error}")
    } else if error.is_body() || error.is_decode() {
        format!("response from '{request_url}' was interrupted: {error}")
    } else {
        format!("request to '{request_url}' failed: {error}")
    };
    ChatError::TransportInterrupted(message)
}
