//! Anthropic Messages API client backing the generic statement extractor.

use commission_config::settings::FallbackSettings;
use commission_extract::{FallbackError, FallbackExtractor};

use crate::exit_codes;
use crate::fetch::common::{self, FetchClient};
use crate::CliError;

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

pub struct ClaudeExtractor {
    client: FetchClient,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeExtractor {
    /// Build from settings with the key taken from `ANTHROPIC_API_KEY`.
    pub fn from_env(settings: &FallbackSettings) -> Result<Self, CliError> {
        let api_key = common::resolve_secret(None, "Anthropic", None, API_KEY_ENV)?;
        Self::with_base_url(settings, api_key, ANTHROPIC_API_BASE.to_string())
    }

    pub fn with_base_url(
        settings: &FallbackSettings,
        api_key: String,
        base_url: String,
    ) -> Result<Self, CliError> {
        Ok(Self {
            client: FetchClient::new("Anthropic", common::extract_error_message)?,
            api_key,
            base_url,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
        })
    }

    fn send_prompt(&self, prompt: &str) -> Result<String, CliError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        });

        let reply = self.client.send_json(|http| {
            http.post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
        })?;

        let text = reply["content"]
            .as_array()
            .and_then(|blocks| blocks.iter().find_map(|b| b["text"].as_str()))
            .ok_or_else(|| {
                CliError::new(
                    exit_codes::EXIT_FETCH_UPSTREAM,
                    "Anthropic response has no text content",
                )
            })?;
        tracing::debug!(
            model = %self.model,
            chars = text.len(),
            stop_reason = reply["stop_reason"].as_str().unwrap_or(""),
            "completion received"
        );
        Ok(text.to_string())
    }
}

impl FallbackExtractor for ClaudeExtractor {
    fn complete(&self, prompt: &str) -> Result<String, FallbackError> {
        self.send_prompt(prompt)
            .map_err(|e| FallbackError::Request(e.message))
    }
}
