use anyhow::{bail, Result};

use crate::types::Credential;
use crate::util::{is_local_endpoint_url, non_blank_env};

const API_URL_ENV: &str = "SUPPORTDESK_API_URL";
const TOKEN_ENV: &str = "SUPPORTDESK_TOKEN";
const API_KEY_ENV: &str = "SUPPORTDESK_API_KEY";
const TENANT_ID_ENV: &str = "SUPPORTDESK_TENANT_ID";
const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL; routes such as `/chat` are joined onto it.
    pub api_url: String,
    pub credential: Option<Credential>,
    pub tenant_id: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let api_url = non_blank_env(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        // A bearer token wins over an API key when both are present.
        let credential = non_blank_env(TOKEN_ENV)
            .map(Credential::Bearer)
            .or_else(|| non_blank_env(API_KEY_ENV).map(Credential::ApiKey));
        let tenant_id = non_blank_env(TENANT_ID_ENV);

        Ok(Self {
            api_url,
            credential,
            tenant_id,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!(
                "Invalid {API_URL_ENV} '{}': expected http:// or https:// URL",
                self.api_url
            );
        }

        if !self.is_local_endpoint() && self.credential.is_none() {
            bail!(
                "{TOKEN_ENV} or {API_KEY_ENV} must be set for non-local endpoints (url: '{}')",
                self.api_url
            );
        }

        Ok(())
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }
}
