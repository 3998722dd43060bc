//! Shared HTTP plumbing for the remote services (Drive, Anthropic, Resend).
//!
//! - `FetchClient`: blocking client with status → exit-code classification
//! - `resolve_secret`: flag > env > error
//!
//! Every call is a single attempt. A failure surfaces to the caller, which
//! decides whether it is fatal (Drive, email) or per-file (fallback
//! extraction).

use std::time::Duration;

use crate::exit_codes;
use crate::CliError;

// ── Constants ───────────────────────────────────────────────────────

pub(crate) const USER_AGENT: &str = concat!("commission/", env!("CARGO_PKG_VERSION"));
const TIMEOUT_SECS: u64 = 60;

// ── FetchClient ─────────────────────────────────────────────────────

/// Shared HTTP client that maps HTTP status codes to the standard exit
/// codes.
///
/// Adapters own their credential, base URL, and auth method. They pass a
/// request-building closure which receives the underlying
/// `reqwest::blocking::Client` and returns a fully configured
/// `RequestBuilder`.
pub(crate) struct FetchClient {
    http: reqwest::blocking::Client,
    source_name: String,
    error_extractor: fn(&serde_json::Value, u16) -> String,
}

impl FetchClient {
    pub(crate) fn new(
        source_name: &str,
        error_extractor: fn(&serde_json::Value, u16) -> String,
    ) -> Result<Self, CliError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CliError::io(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            source_name: source_name.to_string(),
            error_extractor,
        })
    }

    fn upstream(&self, message: String) -> CliError {
        CliError::new(exit_codes::EXIT_FETCH_UPSTREAM, message)
    }

    /// Send once. Non-2xx responses become errors carrying the service's
    /// own message.
    pub(crate) fn send(
        &self,
        build_request: impl FnOnce(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response, CliError> {
        let resp = build_request(&self.http).send().map_err(|e| {
            self.upstream(format!("{} request failed: {}", self.source_name, e))
        })?;

        let status = resp.status().as_u16();
        if status < 400 {
            return Ok(resp);
        }

        let text = resp.text().unwrap_or_default();
        let body: serde_json::Value =
            serde_json::from_str(text.trim_start_matches('\u{feff}')).unwrap_or(serde_json::Value::Null);
        let msg = (self.error_extractor)(&body, status);

        let (code, what) = match status {
            401 | 403 => (exit_codes::EXIT_FETCH_AUTH, "auth failed"),
            400 => (exit_codes::EXIT_FETCH_VALIDATION, "request rejected"),
            _ if status < 500 => (exit_codes::EXIT_FETCH_UPSTREAM, "error"),
            _ => (exit_codes::EXIT_FETCH_UPSTREAM, "upstream error"),
        };
        tracing::debug!(source = %self.source_name, status, body = %text, "request failed");
        Err(CliError::new(
            code,
            format!("{} {} ({}): {}", self.source_name, what, status, msg),
        ))
    }

    /// Send once and parse the body as JSON (BOM tolerated).
    pub(crate) fn send_json(
        &self,
        build_request: impl FnOnce(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<serde_json::Value, CliError> {
        let resp = self.send(build_request)?;
        let text = resp.text().map_err(|e| {
            self.upstream(format!("failed to read {} response body: {}", self.source_name, e))
        })?;
        let trimmed = text.trim_start_matches('\u{feff}');
        serde_json::from_str(trimmed).map_err(|e| {
            let end = trimmed
                .char_indices()
                .nth(200)
                .map(|(i, _)| i)
                .unwrap_or(trimmed.len());
            self.upstream(format!(
                "failed to parse {} JSON response: {} (body: {})",
                self.source_name,
                e,
                &trimmed[..end],
            ))
        })
    }

    /// Send once and return the raw body.
    pub(crate) fn send_bytes(
        &self,
        build_request: impl FnOnce(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<Vec<u8>, CliError> {
        let resp = self.send(build_request)?;
        resp.bytes().map(|b| b.to_vec()).map_err(|e| {
            self.upstream(format!("failed to read {} response body: {}", self.source_name, e))
        })
    }
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Resolve a credential: flag value > environment variable > error.
pub(crate) fn resolve_secret(
    flag: Option<String>,
    source_name: &str,
    flag_name: Option<&str>,
    env_var: &str,
) -> Result<String, CliError> {
    let missing = || {
        let how = match flag_name {
            Some(flag) => format!("use {} or set {}", flag, env_var),
            None => format!("set {}", env_var),
        };
        CliError::new(
            exit_codes::EXIT_FETCH_NOT_AUTH,
            format!("missing {} credential ({})", source_name, how),
        )
    };

    if let Some(value) = flag {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            return Err(missing());
        }
        return Ok(trimmed);
    }

    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(missing()),
    }
}

/// `{"error": {"message": ...}}` (Google, Anthropic) or `{"message": ...}`
/// (Resend), else the bare status.
pub(crate) fn extract_error_message(body: &serde_json::Value, status: u16) -> String {
    body["error"]["message"]
        .as_str()
        .or_else(|| body["message"].as_str())
        .or_else(|| body["error"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_resolve_secret_flag_priority() {
        let key = resolve_secret(Some("  token_123  ".into()), "Test", Some("--token"), "TEST_KEY").unwrap();
        assert_eq!(key, "token_123");
    }

    #[test]
    fn test_resolve_secret_empty_flag() {
        let err = resolve_secret(Some("  ".into()), "Test", Some("--token"), "TEST_KEY").unwrap_err();
        assert_eq!(err.code, exit_codes::EXIT_FETCH_NOT_AUTH);
        assert_eq!(err.message, "missing Test credential (use --token or set TEST_KEY)");
    }

    #[test]
    fn test_resolve_secret_missing_env_only() {
        std::env::remove_var("__COMMISSION_TEST_KEY_MISSING");
        let err = resolve_secret(None, "Test", None, "__COMMISSION_TEST_KEY_MISSING").unwrap_err();
        assert_eq!(err.code, exit_codes::EXIT_FETCH_NOT_AUTH);
        assert_eq!(
            err.message,
            "missing Test credential (set __COMMISSION_TEST_KEY_MISSING)"
        );
    }

    #[test]
    fn test_extract_error_message_shapes() {
        let google = serde_json::json!({"error": {"code": 404, "message": "File not found"}});
        assert_eq!(extract_error_message(&google, 404), "File not found");
        let resend = serde_json::json!({"statusCode": 422, "message": "Invalid `to` field"});
        assert_eq!(extract_error_message(&resend, 422), "Invalid `to` field");
        assert_eq!(extract_error_message(&serde_json::Value::Null, 502), "HTTP 502");
    }

    #[test]
    fn test_status_classification() {
        let server = MockServer::start();
        let cases = [
            ("/auth", 401, exit_codes::EXIT_FETCH_AUTH, "Test auth failed (401): nope"),
            ("/bad", 400, exit_codes::EXIT_FETCH_VALIDATION, "Test request rejected (400): nope"),
            ("/gone", 404, exit_codes::EXIT_FETCH_UPSTREAM, "Test error (404): nope"),
            ("/down", 503, exit_codes::EXIT_FETCH_UPSTREAM, "Test upstream error (503): nope"),
        ];
        for (path, status, _, _) in cases {
            server.mock(|when, then| {
                when.method(GET).path(path);
                then.status(status)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({"message": "nope"}));
            });
        }

        let client = FetchClient::new("Test", extract_error_message).unwrap();
        for (path, _, code, message) in cases {
            let url = server.url(path);
            let err = client.send_json(|http| http.get(&url)).unwrap_err();
            assert_eq!(err.code, code, "{}", path);
            assert_eq!(err.message, message);
        }
    }

    #[test]
    fn test_json_with_bom() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/ok");
            then.status(200).body("\u{feff}{\"ok\": true}");
        });
        let client = FetchClient::new("Test", extract_error_message).unwrap();
        let url = server.url("/ok");
        let body = client.send_json(|http| http.get(&url)).unwrap();
        assert_eq!(body["ok"], true);
    }
}
