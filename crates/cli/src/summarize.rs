//! `commission summarize`: commission_output.csv → state_summary.csv.

use commission_extract::money::{format_basis_points, format_dollars};
use commission_extract::{summarize_by_state, CommissionEntry, StateSummary};

use crate::output;
use crate::{CliError, Context};

pub fn cmd_summarize(ctx: &Context) -> Result<(), CliError> {
    let entries = output::read_commission_csv(
        &ctx.paths.commission_csv(),
        &format!("commission extract --month {}", ctx.month),
    )?;
    summarize_entries(ctx, &entries)?;
    Ok(())
}

/// Summarize, write `state_summary.csv`, and print the table.
pub fn summarize_entries(ctx: &Context, entries: &[CommissionEntry]) -> Result<StateSummary, CliError> {
    let summary = summarize_by_state(entries);
    let path = ctx.paths.state_summary_csv();
    output::write_state_summary_csv(&path, &summary)?;
    tracing::info!(states = summary.rows.len(), path = %path.display(), "state summary written");

    if !ctx.quiet {
        print!("{}", render_table(&summary));
    }
    Ok(summary)
}

fn render_table(summary: &StateSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<12} {:>16} {:>10}\n", "State", "Commission", "Share"));
    for row in &summary.rows {
        out.push_str(&format!(
            "{:<12} {:>16} {:>10}\n",
            row.state,
            format_dollars(row.total_cents),
            format_basis_points(row.basis_points),
        ));
    }
    out.push_str(&format!(
        "{:<12} {:>16} {:>10}\n",
        "GRAND TOTAL",
        format_dollars(summary.grand_total_cents),
        "100.00%",
    ));
    out
}
