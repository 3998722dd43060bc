//! `commission fetch drive`: download statement PDFs from a Google Drive
//! folder (Drive v3 REST).

use std::path::Path;

use crate::exit_codes;
use crate::{CliError, Context};

use super::common::{self, FetchClient};

// ── Constants ───────────────────────────────────────────────────────

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const PAGE_SIZE: u32 = 1000;
const PDF_MIME: &str = "application/pdf";

// ── Drive file listing ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct DriveFile {
    id: String,
    name: String,
}

/// Drive query string literals escape `\` and `'` with a backslash.
fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn folder_query(folder_id: &str) -> String {
    format!("'{}' in parents and trashed=false", escape_query_literal(folder_id))
}

fn is_pdf(name: &str, mime_type: &str) -> bool {
    mime_type == PDF_MIME || name.to_ascii_lowercase().ends_with(".pdf")
}

/// Reduce a Drive file name to a safe local file name.
fn local_file_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

// ── Drive client ────────────────────────────────────────────────────

pub struct DriveClient {
    client: FetchClient,
    access_token: String,
    base_url: String,
}

impl DriveClient {
    pub fn new(access_token: String) -> Result<Self, CliError> {
        Self::with_base_url(access_token, DRIVE_API_BASE.to_string())
    }

    pub fn with_base_url(access_token: String, base_url: String) -> Result<Self, CliError> {
        Ok(Self {
            client: FetchClient::new("Google Drive", common::extract_error_message)?,
            access_token,
            base_url,
        })
    }

    /// Every PDF directly inside `folder_id`, following `nextPageToken`.
    fn list_pdfs(&self, folder_id: &str) -> Result<Vec<DriveFile>, CliError> {
        let url = format!("{}/files", self.base_url);
        let query = folder_query(folder_id);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        let mut page = 0u32;

        loop {
            page += 1;
            let mut params = vec![
                ("q".to_string(), query.clone()),
                ("fields".to_string(), "nextPageToken, files(id, name, mimeType)".to_string()),
                ("pageSize".to_string(), PAGE_SIZE.to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken".to_string(), token.clone()));
            }

            let body = self.client.send_json(|http| {
                http.get(&url)
                    .bearer_auth(&self.access_token)
                    .query(&params)
            })?;

            let listed = body["files"].as_array().ok_or_else(|| {
                CliError::new(
                    exit_codes::EXIT_FETCH_UPSTREAM,
                    "Google Drive response missing 'files' array",
                )
            })?;
            tracing::debug!(page, files = listed.len(), "listed Drive page");

            for file in listed {
                let id = file["id"].as_str().unwrap_or("");
                let name = file["name"].as_str().unwrap_or("");
                let mime_type = file["mimeType"].as_str().unwrap_or("");
                if id.is_empty() || !is_pdf(name, mime_type) {
                    continue;
                }
                files.push(DriveFile {
                    id: id.to_string(),
                    name: name.to_string(),
                });
            }

            match body["nextPageToken"].as_str() {
                Some(next) if !next.is_empty() => {
                    // Pagination guard: detect a token that does not advance
                    if page_token.as_deref() == Some(next) {
                        return Err(CliError::new(
                            exit_codes::EXIT_FETCH_UPSTREAM,
                            "Google Drive pagination stuck: same page token returned twice",
                        ));
                    }
                    page_token = Some(next.to_string());
                }
                _ => break,
            }
        }

        files.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(files)
    }

    fn download(&self, file_id: &str) -> Result<Vec<u8>, CliError> {
        let url = format!("{}/files/{}", self.base_url, file_id);
        self.client.send_bytes(|http| {
            http.get(&url)
                .bearer_auth(&self.access_token)
                .query(&[("alt", "media")])
        })
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct FetchTally {
    downloaded: usize,
    kept: usize,
    skipped: usize,
}

/// Download every listed PDF into `dest`.
fn fetch_into(
    client: &DriveClient,
    folder_id: &str,
    dest: &Path,
    overwrite: bool,
) -> Result<FetchTally, CliError> {
    let files = client.list_pdfs(folder_id)?;
    tracing::info!(folder = folder_id, pdfs = files.len(), "Drive folder listed");

    std::fs::create_dir_all(dest)
        .map_err(|e| CliError::output(format!("cannot create {}: {}", dest.display(), e)))?;

    let mut tally = FetchTally::default();
    for file in &files {
        let Some(name) = local_file_name(&file.name) else {
            tracing::warn!(id = %file.id, "Drive file has no usable name, skipping");
            tally.skipped += 1;
            continue;
        };
        let target = dest.join(&name);
        if target.exists() && !overwrite {
            tracing::info!(file = %name, "already present, keeping local copy");
            tally.kept += 1;
            continue;
        }

        let bytes = client.download(&file.id)?;
        std::fs::write(&target, &bytes)
            .map_err(|e| CliError::output(format!("cannot write {}: {}", target.display(), e)))?;
        tracing::info!(file = %name, bytes = bytes.len(), "downloaded");
        tally.downloaded += 1;
    }
    Ok(tally)
}

// ── Entry point ─────────────────────────────────────────────────────

pub fn cmd_fetch_drive(
    ctx: &Context,
    folder_id: &str,
    access_token: Option<String>,
    overwrite: bool,
) -> Result<(), CliError> {
    if folder_id.trim().is_empty() {
        return Err(CliError::args("--folder-id must not be empty"));
    }
    let token = common::resolve_secret(
        access_token,
        "Google Drive",
        Some("--access-token"),
        "GOOGLE_DRIVE_TOKEN",
    )?;

    let client = DriveClient::new(token)?;
    let dest = &ctx.paths.statements_dir;
    let tally = fetch_into(&client, folder_id.trim(), dest, overwrite)?;

    ctx.say(format!(
        "{}: downloaded {}, kept {} existing, skipped {} → {}",
        ctx.month,
        tally.downloaded,
        tally.kept,
        tally.skipped,
        dest.display()
    ));
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────
