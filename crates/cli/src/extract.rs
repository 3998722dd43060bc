//! `commission extract`: statements → matched entries → month output files.

use commission_extract::{
    CorrectionStore, CommissionEntry, ExtractionRun, Orchestrator, Pdftotext, Roster, StateMatcher,
};

use crate::llm::ClaudeExtractor;
use crate::output;
use crate::{CliError, Context};

pub fn cmd_extract(ctx: &Context, no_fallback: bool) -> Result<(), CliError> {
    let corrections = load_corrections(ctx)?;
    let run = extract_month(ctx, &corrections, no_fallback)?;
    write_outputs(ctx, &run)?;
    print_summary(ctx, &run);
    Ok(())
}

pub fn load_corrections(ctx: &Context) -> Result<CorrectionStore, CliError> {
    CorrectionStore::load(&ctx.settings.corrections_path()).map_err(CliError::extract)
}

/// Run extraction for the month without writing anything.
pub fn extract_month(
    ctx: &Context,
    corrections: &CorrectionStore,
    no_fallback: bool,
) -> Result<ExtractionRun, CliError> {
    let paths = &ctx.paths;
    if !paths.statements_dir.is_dir() {
        return Err(CliError::missing(format!(
            "statement directory not found: {}",
            paths.statements_dir.display()
        ))
        .with_hint(format!(
            "put the {} statements there or run `commission fetch drive --month {} --folder-id <id>`",
            ctx.month, ctx.month
        )));
    }

    let roster_path = ctx.settings.paths.roster_path();
    if !roster_path.is_file() {
        return Err(CliError::missing(format!(
            "roster not found: {}",
            roster_path.display()
        ))
        .with_hint("set [paths] roster in the settings file"));
    }
    let matching = &ctx.settings.matching;
    let roster = Roster::load_csv(&roster_path, &matching.name_column, &matching.state_column)
        .map_err(CliError::extract)?;
    tracing::info!(contacts = roster.len(), roster = %roster_path.display(), "roster loaded");
    let matcher = StateMatcher::new(roster, matching.match_config());

    let reader = Pdftotext::locate().map_err(CliError::extract)?;

    let fallback = if no_fallback || !ctx.settings.fallback.enabled {
        None
    } else {
        match ClaudeExtractor::from_env(&ctx.settings.fallback) {
            Ok(svc) => Some(svc),
            Err(e) => {
                tracing::warn!("{}; unrecognised statements will yield no entries", e.message);
                None
            }
        }
    };

    let mut orchestrator = Orchestrator::new(&reader, &matcher, corrections)
        .with_options(ctx.settings.extraction.options())
        .with_fallback_max_chars(ctx.settings.fallback.max_chars);
    if let Some(svc) = &fallback {
        orchestrator = orchestrator.with_fallback(svc);
    }

    orchestrator.run(&paths.statements_dir).map_err(CliError::extract)
}

/// Write `commission_output.csv`, `needs_review.csv` (only when something
/// needs review) and `all_commission_data.json`.
pub fn write_outputs(ctx: &Context, run: &ExtractionRun) -> Result<(), CliError> {
    let paths = &ctx.paths;
    output::write_commission_csv(&paths.commission_csv(), &run.entries)?;

    let review_entries: Vec<&CommissionEntry> = run.review.iter().map(|item| &item.entry).collect();
    if review_entries.is_empty() {
        output::remove_stale(&paths.needs_review_csv())?;
    } else {
        output::write_review_csv(&paths.needs_review_csv(), &review_entries)?;
    }

    let records = output::data_records(&run.entries, &run.review_keys());
    output::write_all_data_json(&paths.all_data_json(), &records)?;

    tracing::info!(dir = %paths.output_dir.display(), "outputs written");
    Ok(())
}

pub fn print_summary(ctx: &Context, run: &ExtractionRun) {
    let failed = run.files.iter().filter(|f| f.failed).count();
    let empty = run.files.iter().filter(|f| !f.failed && f.entries == 0).count();

    ctx.say(format!(
        "{}: {} entries from {} statements, total {}",
        ctx.month,
        run.entries.len(),
        run.files.len(),
        commission_extract::money::format_dollars(run.total_cents()),
    ));
    if !run.review.is_empty() {
        ctx.say(format!(
            "  {} need review (see {})",
            run.review.len(),
            ctx.paths.needs_review_csv().display()
        ));
    }
    if failed > 0 || empty > 0 {
        ctx.say(format!("  {} unreadable, {} with no entries (see log)", failed, empty));
    }
    ctx.say(format!("  output: {}", ctx.paths.output_dir.display()));
}
