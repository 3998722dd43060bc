//! Month output files: write after extraction, read back in later stages.
//!
//! | File                       | Columns                                              |
//! |----------------------------|------------------------------------------------------|
//! | `commission_output.csv`    | carrier, group_name, commission, state               |
//! | `needs_review.csv`         | carrier, group_name, commission, state, match_confidence |
//! | `all_commission_data.json` | every entry plus confidence and review flags         |
//! | `state_summary.csv`        | State, Total Commission, Percentage of Total         |
//! | `reconciliation.csv`       | carrier, commission_total, bank_total, variance, status |
//!
//! Amounts are written as `1234.56` (integer cents formatted, never float).
//! CSV headers are written even when there are no rows.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use commission_extract::money::{format_basis_points, format_cents, parse_money_string};
use commission_extract::{CommissionEntry, StateSummary};
use commission_recon::ReconRecord;
use serde::{Deserialize, Serialize};

use crate::CliError;

// ── Row types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct CommissionRow {
    carrier: String,
    group_name: String,
    commission: String,
    state: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewRow {
    pub carrier: String,
    pub group_name: String,
    pub commission: String,
    pub state: String,
    pub match_confidence: u8,
}

/// One element of `all_commission_data.json`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataRecord {
    pub carrier: String,
    pub group_name: String,
    pub commission: String,
    pub commission_cents: i64,
    pub state: String,
    pub match_confidence: u8,
    /// Same value as `match_confidence`; kept for consumers of the older field name.
    pub confidence: u8,
    pub needs_review: bool,
    pub user_verified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ReconRow {
    carrier: String,
    commission_total: String,
    bank_total: String,
    variance: String,
    status: String,
}

// ── Writers ─────────────────────────────────────────────────────────

fn create(path: &Path) -> Result<BufWriter<File>, CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            CliError::output(format!("cannot create {}: {}", parent.display(), e))
        })?;
    }
    let f = File::create(path)
        .map_err(|e| CliError::output(format!("cannot create {}: {}", path.display(), e)))?;
    Ok(BufWriter::new(f))
}

fn csv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>, CliError> {
    Ok(csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(create(path)?))
}

fn write_err(path: &Path, e: impl std::fmt::Display) -> CliError {
    CliError::output(format!("CSV write error in {}: {}", path.display(), e))
}

/// Header first, then every row, then flush.
fn write_rows<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<(), CliError> {
    let mut w = csv_writer(path)?;
    w.write_record(header).map_err(|e| write_err(path, e))?;
    for row in rows {
        w.serialize(row).map_err(|e| write_err(path, e))?;
    }
    w.flush().map_err(|e| write_err(path, e))
}

pub fn write_commission_csv(path: &Path, entries: &[CommissionEntry]) -> Result<(), CliError> {
    let rows: Vec<CommissionRow> = entries
        .iter()
        .map(|e| CommissionRow {
            carrier: e.carrier.clone(),
            group_name: e.group_name.clone(),
            commission: format_cents(e.commission_cents),
            state: e.state.clone(),
        })
        .collect();
    write_rows(path, &["carrier", "group_name", "commission", "state"], &rows)
}

pub fn write_review_csv(path: &Path, entries: &[&CommissionEntry]) -> Result<(), CliError> {
    let rows: Vec<ReviewRow> = entries
        .iter()
        .map(|e| ReviewRow {
            carrier: e.carrier.clone(),
            group_name: e.group_name.clone(),
            commission: format_cents(e.commission_cents),
            state: e.state.clone(),
            match_confidence: e.match_confidence,
        })
        .collect();
    write_rows(
        path,
        &["carrier", "group_name", "commission", "state", "match_confidence"],
        &rows,
    )
}

pub fn data_records(
    entries: &[CommissionEntry],
    review_keys: &HashSet<(String, String, i64)>,
) -> Vec<DataRecord> {
    entries
        .iter()
        .map(|e| {
            let key = (e.carrier.clone(), e.group_name.clone(), e.commission_cents);
            DataRecord {
                carrier: e.carrier.clone(),
                group_name: e.group_name.clone(),
                commission: format_cents(e.commission_cents),
                commission_cents: e.commission_cents,
                state: e.state.clone(),
                match_confidence: e.match_confidence,
                confidence: e.match_confidence,
                needs_review: review_keys.contains(&key),
                user_verified: e.user_verified,
            }
        })
        .collect()
}

pub fn write_all_data_json(path: &Path, records: &[DataRecord]) -> Result<(), CliError> {
    let mut w = create(path)?;
    serde_json::to_writer_pretty(&mut w, records)
        .map_err(|e| CliError::output(format!("JSON write error in {}: {}", path.display(), e)))?;
    writeln!(w)
        .and_then(|_| w.flush())
        .map_err(|e| CliError::output(format!("cannot write {}: {}", path.display(), e)))
}

/// `State,Total Commission,Percentage of Total`, one row per state, a blank
/// line, then the grand total.
pub fn write_state_summary_csv(path: &Path, summary: &StateSummary) -> Result<(), CliError> {
    let mut w = csv_writer(path)?;
    w.write_record(["State", "Total Commission", "Percentage of Total"])
        .map_err(|e| write_err(path, e))?;
    for row in &summary.rows {
        w.write_record([
            row.state.as_str(),
            &format_cents(row.total_cents),
            &format_basis_points(row.basis_points),
        ])
        .map_err(|e| write_err(path, e))?;
    }
    w.flush().map_err(|e| write_err(path, e))?;

    // The blank separator is not a CSV record; write it on the raw stream.
    let mut inner = w
        .into_inner()
        .map_err(|e| write_err(path, e.error()))?;
    writeln!(inner)
        .and_then(|_| {
            writeln!(
                inner,
                "GRAND TOTAL,{},100.00%",
                format_cents(summary.grand_total_cents)
            )
        })
        .and_then(|_| inner.flush())
        .map_err(|e| write_err(path, e))
}

pub fn write_reconciliation_csv(path: &Path, records: &[ReconRecord]) -> Result<(), CliError> {
    let rows: Vec<ReconRow> = records
        .iter()
        .map(|r| ReconRow {
            carrier: r.carrier.clone(),
            commission_total: format_cents(r.commission_cents),
            bank_total: format_cents(r.bank_cents),
            variance: format_cents(r.variance_cents),
            status: r.status.to_string(),
        })
        .collect();
    write_rows(
        path,
        &["carrier", "commission_total", "bank_total", "variance", "status"],
        &rows,
    )
}

/// Delete a file left over from an earlier run. Absent files are fine.
pub fn remove_stale(path: &Path) -> Result<(), CliError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed stale output");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CliError::output(format!(
            "cannot remove {}: {}",
            path.display(),
            e
        ))),
    }
}

// ── Readers ─────────────────────────────────────────────────────────

fn open_csv(path: &Path, produced_by: &str) -> Result<csv::Reader<File>, CliError> {
    if !path.exists() {
        return Err(CliError::missing(format!("{} not found", path.display()))
            .with_hint(format!("run `{}` first", produced_by)));
    }
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {}", path.display(), e)))
}

fn read_err(path: &Path, line: usize, e: impl std::fmt::Display) -> CliError {
    CliError::io(format!("{}:{}: {}", path.display(), line, e))
}

/// Read `commission_output.csv` back into entries. The file carries no
/// confidence, so entries come back with `match_confidence` 0.
pub fn read_commission_csv(path: &Path, produced_by: &str) -> Result<Vec<CommissionEntry>, CliError> {
    let mut reader = open_csv(path, produced_by)?;
    let mut entries = Vec::new();
    for (i, row) in reader.deserialize::<CommissionRow>().enumerate() {
        // header is line 1
        let line = i + 2;
        let row = row.map_err(|e| read_err(path, line, e))?;
        let commission_cents = parse_money_string(&row.commission)
            .map_err(|e| read_err(path, line, format!("commission {:?}: {}", row.commission, e)))?;
        entries.push(CommissionEntry {
            carrier: row.carrier,
            group_name: row.group_name,
            commission_cents,
            state: row.state.trim().to_string(),
            match_confidence: 0,
            user_verified: false,
        });
    }
    Ok(entries)
}

/// Read `needs_review.csv`. The file is only written when something needs
/// review, so a missing file means an empty list.
pub fn read_review_csv(path: &Path) -> Result<Vec<ReviewRow>, CliError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = open_csv(path, "commission extract")?;
    let mut rows = Vec::new();
    for (i, row) in reader.deserialize::<ReviewRow>().enumerate() {
        rows.push(row.map_err(|e| read_err(path, i + 2, e))?);
    }
    Ok(rows)
}

/// Parse a status label as written to `reconciliation.csv`.
#[cfg(test)]
fn parse_status(label: &str) -> Option<commission_recon::ReconStatus> {
    commission_recon::ReconStatus::ALL
        .into_iter()
        .find(|s| s.to_string() == label)
}

#[cfg(test)]
pub fn read_reconciliation_csv(path: &Path) -> Result<Vec<ReconRecord>, CliError> {
    let mut reader = open_csv(path, "commission report")?;
    let mut records = Vec::new();
    for (i, row) in reader.deserialize::<ReconRow>().enumerate() {
        let line = i + 2;
        let row = row.map_err(|e| read_err(path, line, e))?;
        let cents = |s: &str| parse_money_string(s).map_err(|e| read_err(path, line, e));
        let status = parse_status(&row.status)
            .ok_or_else(|| read_err(path, line, format!("unknown status {:?}", row.status)))?;
        records.push(ReconRecord {
            carrier: row.carrier,
            commission_cents: cents(&row.commission_total)?,
            bank_cents: cents(&row.bank_total)?,
            variance_cents: cents(&row.variance)?,
            status,
        });
    }
    Ok(records)
}

// ── Misc ────────────────────────────────────────────────────────────

/// Write a whole text file (used for `report.html`).
pub fn write_text(path: &Path, contents: &str) -> Result<(), CliError> {
    let mut w = create(path)?;
    w.write_all(contents.as_bytes())
        .and_then(|_| w.flush())
        .map_err(|e| CliError::output(format!("cannot write {}: {}", path.display(), e)))
}
