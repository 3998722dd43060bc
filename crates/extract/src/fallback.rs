//! Generic extraction through a text-completion service, for statements no
//! template recognises.
//!
//! The engine owns the prompt and the reply contract; the service call itself
//! sits behind [`FallbackExtractor`] so this crate stays free of HTTP.

use serde::Deserialize;

use crate::error::FallbackError;
use crate::model::{Extraction, RawEntry};
use crate::money::{cents_from_f64, parse_amount};

pub const DEFAULT_MAX_CHARS: usize = 50_000;
pub const UNKNOWN_CARRIER: &str = "Unknown";

/// A completion service that answers a prompt with free text.
pub trait FallbackExtractor {
    fn complete(&self, prompt: &str) -> Result<String, FallbackError>;
}

/// Extract entries from statement pages with `service`.
pub fn extract_with(
    service: &dyn FallbackExtractor,
    pages: &[String],
    max_chars: usize,
) -> Result<Extraction, FallbackError> {
    let text = pages.join("\n");
    if text.trim().is_empty() {
        return Err(FallbackError::EmptyText);
    }
    let text = truncate_chars(&text, max_chars);
    let reply = service.complete(&build_prompt(text))?;
    parse_reply(&reply)
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            tracing::warn!(
                chars = text.chars().count(),
                max_chars,
                "statement text too long, truncating"
            );
            &text[..cut]
        }
        None => text,
    }
}

pub fn build_prompt(statement_text: &str) -> String {
    format!(
        r#"You are analyzing a commission statement PDF. Extract the following information:

1. Carrier Name: The insurance carrier or company that issued this statement
2. Group Names: All customer/group names that received commissions
3. Commission Amounts: The commission amount for each group

Here is the text from the PDF:

{statement_text}

Please respond with a JSON object in this exact format:
{{
  "carrier": "Carrier Name",
  "entries": [
    {{"group_name": "Company Name 1", "commission": 123.45}},
    {{"group_name": "Company Name 2", "commission": 678.90}}
  ]
}}

Important:
- If the carrier name is not obvious, use your best guess
- Extract ALL group names and their corresponding commission amounts
- Commission amounts should be numbers, not strings
- If a statement shows a total only with no group breakdown, use an empty string for group_name
- Return ONLY the JSON object, no other text"#
    )
}

// ---------------------------------------------------------------------------
// Reply parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    carrier: Option<String>,
    #[serde(default)]
    entries: Vec<ReplyEntry>,
}

#[derive(Debug, Deserialize)]
struct ReplyEntry {
    #[serde(default)]
    group_name: Option<String>,
    #[serde(default)]
    commission: serde_json::Value,
}

/// Parse the service's reply. Markdown code fences around the JSON are
/// tolerated.
pub fn parse_reply(reply: &str) -> Result<Extraction, FallbackError> {
    let body = strip_fences(reply.trim());
    let parsed: Reply = serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(500).collect();
        FallbackError::MalformedJson(format!("{e} (reply: {preview})"))
    })?;

    let carrier = parsed
        .carrier
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| UNKNOWN_CARRIER.to_string());

    let mut entries = Vec::with_capacity(parsed.entries.len());
    for entry in parsed.entries {
        let group = entry.group_name.unwrap_or_default().trim().to_string();
        let cents = match &entry.commission {
            serde_json::Value::Number(n) => n.as_f64().and_then(cents_from_f64),
            serde_json::Value::String(s) => parse_amount(s).ok(),
            serde_json::Value::Null => Some(0),
            _ => None,
        };
        match cents {
            Some(cents) => entries.push(RawEntry::new(group, cents)),
            None => tracing::warn!(group = %group, commission = %entry.commission, "fallback: unusable amount"),
        }
    }

    Ok(Extraction { carrier, entries })
}

fn strip_fences(text: &str) -> &str {
    let after_open = if let Some((_, rest)) = text.split_once("```json") {
        rest
    } else if let Some((_, rest)) = text.split_once("```") {
        rest
    } else {
        return text;
    };
    after_open.split("```").next().unwrap_or(after_open).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Canned {
        reply: Result<String, String>,
        seen: RefCell<Option<String>>,
    }

    impl FallbackExtractor for Canned {
        fn complete(&self, prompt: &str) -> Result<String, FallbackError> {
            *self.seen.borrow_mut() = Some(prompt.to_string());
            self.reply.clone().map_err(FallbackError::Request)
        }
    }

    fn canned(reply: &str) -> Canned {
        Canned {
            reply: Ok(reply.to_string()),
            seen: RefCell::new(None),
        }
    }

    #[test]
    fn parses_plain_json() {
        let out = parse_reply(
            r#"{"carrier": "Humana", "entries": [{"group_name": "Acme", "commission": 123.45}]}"#,
        )
        .unwrap();
        assert_eq!(out.carrier, "Humana");
        assert_eq!(out.entries, vec![RawEntry::new("Acme", 12345)]);
    }

    #[test]
    fn unwraps_code_fences() {
        let reply = "Here you go:\n```json\n{\"carrier\": \"Delta\", \"entries\": [{\"group_name\": \"\", \"commission\": \"1,000.10\"}]}\n```";
        let out = parse_reply(reply).unwrap();
        assert_eq!(out.carrier, "Delta");
        assert_eq!(out.entries, vec![RawEntry::new("", 100010)]);

        let bare = "```\n{\"entries\": []}\n```";
        let out = parse_reply(bare).unwrap();
        assert_eq!(out.carrier, UNKNOWN_CARRIER);
        assert!(out.entries.is_empty());
    }

    #[test]
    fn missing_fields_default() {
        let out = parse_reply(r#"{"carrier": "", "entries": [{"commission": 5}]}"#).unwrap();
        assert_eq!(out.carrier, UNKNOWN_CARRIER);
        assert_eq!(out.entries, vec![RawEntry::new("", 500)]);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = parse_reply("I could not read this statement.").unwrap_err();
        assert!(matches!(err, FallbackError::MalformedJson(_)));
    }

    #[test]
    fn empty_text_never_calls_service() {
        let svc = canned("{}");
        let err = extract_with(&svc, &["   \n".to_string()], DEFAULT_MAX_CHARS).unwrap_err();
        assert!(matches!(err, FallbackError::EmptyText));
        assert!(svc.seen.borrow().is_none());
    }

    #[test]
    fn long_text_is_truncated_in_prompt() {
        let svc = canned(r#"{"carrier": "X", "entries": []}"#);
        let page = "é".repeat(20);
        extract_with(&svc, &[page], 8).unwrap();
        let prompt = svc.seen.borrow().clone().unwrap();
        assert!(prompt.contains(&"é".repeat(8)));
        assert!(!prompt.contains(&"é".repeat(9)));
    }

    #[test]
    fn service_errors_propagate() {
        let svc = Canned {
            reply: Err("HTTP 500".to_string()),
            seen: RefCell::new(None),
        };
        let err = extract_with(&svc, &["text".to_string()], DEFAULT_MAX_CHARS).unwrap_err();
        assert!(matches!(err, FallbackError::Request(_)));
    }
}
