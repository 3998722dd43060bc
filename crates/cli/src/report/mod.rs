//! `commission report`: reconcile the month against the bank statement,
//! render `report.html`, and email it.

mod email;
mod html;

use std::path::{Path, PathBuf};

use commission_config::paths::{COMMISSION_CSV, RECONCILIATION_CSV, STATE_SUMMARY_CSV};
use commission_extract::{summarize_by_state, CommissionEntry, PdfTextReader, Pdftotext};
use commission_recon::{ReconResult, ReconStatus};

use crate::output;
use crate::{CliError, Context};

use email::{Attachment, Message, ResendClient};
use html::ReportView;

pub fn cmd_report(
    ctx: &Context,
    bank_statement: Option<PathBuf>,
    no_email: bool,
) -> Result<(), CliError> {
    let entries = output::read_commission_csv(
        &ctx.paths.commission_csv(),
        &format!("commission extract --month {}", ctx.month),
    )?;

    let bank_path = locate_bank_statement(ctx, bank_statement)?;
    let reader = Pdftotext::locate().map_err(CliError::extract)?;
    let bank_text = reader
        .pages(&bank_path)
        .map_err(CliError::extract)?
        .join("\n");
    tracing::info!(bank_statement = %bank_path.display(), "bank statement read");

    let html = build_report(ctx, &entries, &bank_text)?;

    if no_email {
        ctx.say(format!("Report written to {}", ctx.paths.report_html().display()));
        return Ok(());
    }
    send_report(ctx, &html)
}

fn locate_bank_statement(ctx: &Context, flag: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match flag {
        Some(path) if path.is_file() => Ok(path),
        Some(path) => Err(CliError::missing(format!(
            "bank statement not found: {}",
            path.display()
        ))),
        None => ctx.paths.find_bank_statement().ok_or_else(|| {
            CliError::missing(format!(
                "no bank statement PDF in {}",
                ctx.paths.bank_dir.display()
            ))
            .with_hint("place the month's statement there or pass --bank-statement <file>")
        }),
    }
}

/// Reconcile, then write `state_summary.csv`, `reconciliation.csv` and
/// `report.html`. Returns the rendered page.
fn build_report(
    ctx: &Context,
    entries: &[CommissionEntry],
    bank_text: &str,
) -> Result<String, CliError> {
    let paths = &ctx.paths;

    let states = summarize_by_state(entries);
    output::write_state_summary_csv(&paths.state_summary_csv(), &states)?;

    let recon = commission_recon::run_with_statement(
        &ctx.settings.recon,
        entries
            .iter()
            .map(|e| (e.carrier.as_str(), e.commission_cents)),
        bank_text,
    )
    .map_err(CliError::recon)?;
    output::write_reconciliation_csv(&paths.reconciliation_csv(), &recon.records)?;
    log_reconciliation(&recon);

    let review = output::read_review_csv(&paths.needs_review_csv())?;
    let attachments = attachments(&paths.output_dir);
    let attached: Vec<String> = attachments
        .iter()
        .filter(|a| a.path.exists())
        .map(|a| a.filename.clone())
        .collect();

    let month_name = ctx.month.long_name();
    let page = html::render(&ReportView {
        month_name: &month_name,
        states: &states,
        recon: &recon,
        review: &review,
        preview_limit: ctx.settings.email.review_preview_limit,
        attachments: &attached,
    });
    output::write_text(&paths.report_html(), &page)?;
    tracing::info!(path = %paths.report_html().display(), "report written");
    Ok(page)
}

fn log_reconciliation(recon: &ReconResult) {
    let s = &recon.summary;
    tracing::info!(
        carriers = s.total_carriers,
        matched = s.matched,
        variance = s.variance,
        bank_only = s.bank_only,
        commission_only = s.commission_only,
        "reconciliation complete"
    );
    for r in recon.records.iter().filter(|r| r.status != ReconStatus::Matched) {
        tracing::warn!(
            carrier = %r.carrier,
            status = %r.status,
            variance_cents = r.variance_cents,
            "carrier did not reconcile"
        );
    }
}

fn attachments(output_dir: &Path) -> Vec<Attachment> {
    [COMMISSION_CSV, RECONCILIATION_CSV, STATE_SUMMARY_CSV]
        .into_iter()
        .map(|name| Attachment {
            filename: name.to_string(),
            path: output_dir.join(name),
        })
        .collect()
}

fn send_report(ctx: &Context, html: &str) -> Result<(), CliError> {
    let settings = &ctx.settings.email;
    if settings.from.trim().is_empty() || settings.to.is_empty() {
        return Err(CliError::settings("email sender or recipients not configured")
            .with_hint("set [email] from and to in the settings file, or pass --no-email"));
    }

    let client = ResendClient::from_env()?;
    let attachments = attachments(&ctx.paths.output_dir);
    let result = client.send(&Message {
        from: &settings.from,
        to: &settings.to,
        subject: email::subject(&ctx.month.long_name()),
        html,
        attachments: &attachments,
    });
    if let Err(e) = &result {
        tracing::error!(error = %e.message, "report email failed");
    }
    result?;

    ctx.say(format!("Report emailed to {}", settings.to.join(", ")));
    Ok(())
}
