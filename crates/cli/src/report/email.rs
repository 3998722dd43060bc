//! Report delivery through the Resend email API.

use std::path::PathBuf;

use base64::Engine;

use crate::exit_codes;
use crate::fetch::common::{self, FetchClient};
use crate::CliError;

const RESEND_API_BASE: &str = "https://api.resend.com";
const API_KEY_ENV: &str = "RESEND_API_KEY";

/// A file to attach; skipped at send time when it does not exist.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub path: PathBuf,
}

pub struct Message<'a> {
    pub from: &'a str,
    pub to: &'a [String],
    pub subject: String,
    pub html: &'a str,
    pub attachments: &'a [Attachment],
}

pub fn subject(month_name: &str) -> String {
    format!("Commission Reconciliation Report - {}", month_name)
}

pub struct ResendClient {
    client: FetchClient,
    api_key: String,
    base_url: String,
}

impl ResendClient {
    pub fn from_env() -> Result<Self, CliError> {
        let api_key = common::resolve_secret(None, "Resend", None, API_KEY_ENV)?;
        Self::with_base_url(api_key, RESEND_API_BASE.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, CliError> {
        Ok(Self {
            client: FetchClient::new("Resend", common::extract_error_message)?,
            api_key,
            base_url,
        })
    }

    /// Send `message`; returns the email id Resend assigns. Auth failures
    /// keep their exit code, everything else becomes a delivery failure.
    pub fn send(&self, message: &Message<'_>) -> Result<String, CliError> {
        let body = request_body(message)?;
        let url = format!("{}/emails", self.base_url);

        let reply = self
            .client
            .send_json(|http| http.post(&url).bearer_auth(&self.api_key).json(&body))
            .map_err(|e| match e.code {
                exit_codes::EXIT_FETCH_AUTH | exit_codes::EXIT_FETCH_NOT_AUTH => e,
                _ => CliError::new(
                    exit_codes::EXIT_EMAIL_FAILED,
                    format!("email delivery failed: {}", e.message),
                ),
            })?;

        let id = reply["id"].as_str().unwrap_or_default().to_string();
        tracing::info!(id = %id, recipients = message.to.len(), "report emailed");
        Ok(id)
    }
}

fn request_body(message: &Message<'_>) -> Result<serde_json::Value, CliError> {
    let b64 = base64::engine::general_purpose::STANDARD;
    let mut attachments = Vec::new();
    for attachment in message.attachments {
        if !attachment.path.exists() {
            tracing::debug!(file = %attachment.filename, "attachment not present, skipping");
            continue;
        }
        let bytes = std::fs::read(&attachment.path).map_err(|e| {
            CliError::io(format!("cannot read {}: {}", attachment.path.display(), e))
        })?;
        attachments.push(serde_json::json!({
            "filename": attachment.filename,
            "content": b64.encode(bytes),
        }));
    }

    Ok(serde_json::json!({
        "from": message.from,
        "to": message.to,
        "subject": message.subject,
        "html": message.html,
        "attachments": attachments,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_subject() {
        assert_eq!(subject("August 2025"), "Commission Reconciliation Report - August 2025");
    }

    #[test]
    fn test_send_with_present_attachments_only() {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("commission_output.csv");
        std::fs::write(&csv, "carrier,group_name,commission,state\n").unwrap();
        let attachments = vec![
            Attachment { filename: "commission_output.csv".into(), path: csv },
            Attachment {
                filename: "reconciliation.csv".into(),
                path: dir.path().join("reconciliation.csv"),
            },
        ];
        let to = vec!["ops@example.com".to_string()];

        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/emails")
                .header("Authorization", "Bearer re_test")
                .json_body(serde_json::json!({
                    "from": "reports@example.com",
                    "to": ["ops@example.com"],
                    "subject": "Commission Reconciliation Report - August 2025",
                    "html": "<p>hi</p>",
                    "attachments": [{
                        "filename": "commission_output.csv",
                        "content": "Y2Fycmllcixncm91cF9uYW1lLGNvbW1pc3Npb24sc3RhdGUK"
                    }]
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({"id": "email_123"}));
        });

        let client = ResendClient::with_base_url("re_test".into(), server.base_url()).unwrap();
        let id = client
            .send(&Message {
                from: "reports@example.com",
                to: &to,
                subject: subject("August 2025"),
                html: "<p>hi</p>",
                attachments: &attachments,
            })
            .unwrap();
        mock.assert();
        assert_eq!(id, "email_123");
    }

    #[test]
    fn test_rejection_is_delivery_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/emails");
            then.status(422)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "statusCode": 422,
                    "name": "validation_error",
                    "message": "Invalid `to` field"
                }));
        });

        let client = ResendClient::with_base_url("re_test".into(), server.base_url()).unwrap();
        let to = vec!["not-an-address".to_string()];
        let err = client
            .send(&Message {
                from: "reports@example.com",
                to: &to,
                subject: subject("August 2025"),
                html: "",
                attachments: &[],
            })
            .unwrap_err();
        assert_eq!(err.code, exit_codes::EXIT_EMAIL_FAILED);
        assert_eq!(err.message, "email delivery failed: Resend error (422): Invalid `to` field");
    }

    #[test]
    fn test_auth_failure_keeps_code() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/emails");
            then.status(401)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({"message": "API key is invalid"}));
        });

        let client = ResendClient::with_base_url("bad".into(), server.base_url()).unwrap();
        let to = vec!["ops@example.com".to_string()];
        let err = client
            .send(&Message {
                from: "reports@example.com",
                to: &to,
                subject: subject("August 2025"),
                html: "",
                attachments: &[],
            })
            .unwrap_err();
        assert_eq!(err.code, exit_codes::EXIT_FETCH_AUTH);
    }
}
