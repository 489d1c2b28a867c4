use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::util::{non_blank_env, parse_bool_flag};

const DEBUG_PAYLOAD_ENV: &str = "SUPPORTDESK_DEBUG_PAYLOAD";
const LOG_PATH_ENV: &str = "SUPPORTDESK_LOG_PATH";
const LOG_FILTER_ENV: &str = "SUPPORTDESK_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

pub fn debug_payload_enabled() -> bool {
    std::env::var(DEBUG_PAYLOAD_ENV)
        .ok()
        .and_then(|value| parse_bool_flag(&value))
        .unwrap_or(false)
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let formatted_payload = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    tracing::debug!(url = request_url, payload = %formatted_payload, "chat request payload");
}

/// Installs the global subscriber: file output when a log path is configured,
/// stderr otherwise.
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match resolve_log_path() {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("cannot open log file '{path}'"))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}

fn resolve_log_path() -> Option<String> {
    non_blank_env(LOG_PATH_ENV)
}
