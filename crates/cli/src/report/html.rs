//! `report.html`: one self-contained page, inline CSS, no scripts.

use std::fmt::Write;

use commission_extract::money::{format_basis_points, format_dollars};
use commission_extract::StateSummary;
use commission_recon::{ReconResult, ReconStatus};

use crate::output::ReviewRow;

/// Everything the page shows.
pub struct ReportView<'a> {
    pub month_name: &'a str,
    pub states: &'a StateSummary,
    pub recon: &'a ReconResult,
    pub review: &'a [ReviewRow],
    pub preview_limit: usize,
    pub attachments: &'a [String],
}

const STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 20px; color: #222; }
h1 { color: #2c3e50; }
h2 { color: #34495e; border-bottom: 2px solid #3498db; padding-bottom: 5px; }
table { border-collapse: collapse; width: 100%; margin: 20px 0; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #3498db; color: white; }
tr:nth-child(even) { background-color: #f2f2f2; }
.summary-box { background-color: #ecf0f1; padding: 15px; border-radius: 5px; margin: 20px 0; }
.status-matched { color: #27ae60; font-weight: bold; }
.status-variance { color: #f39c12; font-weight: bold; }
.status-unmatched { color: #e74c3c; font-weight: bold; }
.positive { color: #27ae60; }
.negative { color: #e74c3c; }
.amount { text-align: right; }
.footer { margin-top: 40px; font-size: 12px; color: #7f8c8d; }
";

/// Escape text for element content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn status_class(status: ReconStatus) -> &'static str {
    match status {
        ReconStatus::Matched => "status-matched",
        ReconStatus::Variance => "status-variance",
        ReconStatus::BankOnly | ReconStatus::CommissionOnly => "status-unmatched",
    }
}

fn sign_class(cents: i64) -> &'static str {
    if cents < 0 {
        "negative"
    } else {
        "positive"
    }
}

pub fn render(view: &ReportView<'_>) -> String {
    let mut html = String::new();
    // Writing into a String cannot fail.
    let _ = render_into(&mut html, view);
    html
}

fn render_into(html: &mut String, view: &ReportView<'_>) -> std::fmt::Result {
    let title = format!("Commission Reconciliation Report - {}", escape(view.month_name));
    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html>\n<head>\n<meta charset=\"utf-8\">")?;
    writeln!(html, "<title>{}</title>", title)?;
    writeln!(html, "<style>\n{}</style>\n</head>\n<body>", STYLE)?;
    writeln!(html, "<h1>{}</h1>", title)?;

    summary_section(html, view)?;
    state_section(html, view.states)?;
    recon_section(html, view.recon)?;
    if !view.review.is_empty() {
        review_section(html, view.review, view.preview_limit)?;
    }

    writeln!(html, "<div class=\"footer\">")?;
    if !view.attachments.is_empty() {
        let names: Vec<String> = view.attachments.iter().map(|a| escape(a)).collect();
        writeln!(html, "<p>Attached: {}</p>", names.join(", "))?;
    }
    writeln!(
        html,
        "<p>Generated by commission {}</p>\n</div>",
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(html, "</body>\n</html>")
}

fn summary_section(html: &mut String, view: &ReportView<'_>) -> std::fmt::Result {
    let summary = &view.recon.summary;
    let variance = summary.variance_cents();
    writeln!(html, "<h2>Executive Summary</h2>\n<div class=\"summary-box\">")?;
    writeln!(
        html,
        "<p><strong>Total Commission:</strong> {}</p>",
        format_dollars(summary.commission_total_cents)
    )?;
    writeln!(
        html,
        "<p><strong>Total Bank Deposits:</strong> {}</p>",
        format_dollars(summary.bank_total_cents)
    )?;
    writeln!(
        html,
        "<p><strong>Variance:</strong> <span class=\"{}\">{}</span></p>",
        sign_class(variance),
        format_dollars(variance)
    )?;
    writeln!(html, "<p><strong>Carriers:</strong> {}</p>", summary.total_carriers)?;
    for status in ReconStatus::ALL {
        writeln!(
            html,
            "<p><span class=\"{}\">{}:</span> {}</p>",
            status_class(status),
            status,
            summary.count(status)
        )?;
    }
    if !summary.unmapped_payers.is_empty() {
        let payers: Vec<String> = summary.unmapped_payers.iter().map(|p| escape(p)).collect();
        writeln!(html, "<p><strong>Unmapped bank payers:</strong> {}</p>", payers.join(", "))?;
    }
    if !view.review.is_empty() {
        writeln!(
            html,
            "<p><strong>Entries needing review:</strong> {}</p>",
            view.review.len()
        )?;
    }
    writeln!(html, "</div>")
}

fn state_section(html: &mut String, states: &StateSummary) -> std::fmt::Result {
    writeln!(html, "<h2>Commission by State</h2>\n<table>")?;
    writeln!(html, "<tr><th>State</th><th>Total Commission</th><th>Percentage</th></tr>")?;
    for row in &states.rows {
        writeln!(
            html,
            "<tr><td>{}</td><td class=\"amount\">{}</td><td class=\"amount\">{}</td></tr>",
            escape(&row.state),
            format_dollars(row.total_cents),
            format_basis_points(row.basis_points)
        )?;
    }
    writeln!(
        html,
        "<tr><td><strong>GRAND TOTAL</strong></td><td class=\"amount\"><strong>{}</strong></td><td class=\"amount\"><strong>100.00%</strong></td></tr>",
        format_dollars(states.grand_total_cents)
    )?;
    writeln!(html, "</table>")
}

fn recon_section(html: &mut String, recon: &ReconResult) -> std::fmt::Result {
    writeln!(html, "<h2>Bank Reconciliation</h2>\n<table>")?;
    writeln!(
        html,
        "<tr><th>Carrier</th><th>Commission Total</th><th>Bank Total</th><th>Variance</th><th>Status</th></tr>"
    )?;
    for r in &recon.records {
        writeln!(
            html,
            "<tr><td>{}</td><td class=\"amount\">{}</td><td class=\"amount\">{}</td><td class=\"amount {}\">{}</td><td class=\"{}\">{}</td></tr>",
            escape(&r.carrier),
            format_dollars(r.commission_cents),
            format_dollars(r.bank_cents),
            sign_class(r.variance_cents),
            format_dollars(r.variance_cents),
            status_class(r.status),
            r.status
        )?;
    }
    writeln!(html, "</table>")
}

fn review_section(html: &mut String, review: &[ReviewRow], limit: usize) -> std::fmt::Result {
    writeln!(html, "<h2>Entries Needing Review ({})</h2>\n<table>", review.len())?;
    writeln!(
        html,
        "<tr><th>Carrier</th><th>Group</th><th>Commission</th><th>State</th><th>Confidence</th></tr>"
    )?;
    for row in review.iter().take(limit) {
        writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td class=\"amount\">{}</td><td>{}</td><td>{}%</td></tr>",
            escape(&row.carrier),
            escape(&row.group_name),
            escape(&row.commission),
            escape(&row.state),
            row.match_confidence
        )?;
    }
    if review.len() > limit {
        writeln!(
            html,
            "<tr><td colspan=\"5\"><em>... and {} more entries (see attached needs_review.csv)</em></td></tr>",
            review.len() - limit
        )?;
    }
    writeln!(html, "</table>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use commission_extract::StateTotal;
    use commission_recon::{ReconConfig, ReconRecord};

    fn review_row(group: &str) -> ReviewRow {
        ReviewRow {
            carrier: "Beam".to_string(),
            group_name: group.to_string(),
            commission: "25.00".to_string(),
            state: "CA".to_string(),
            match_confidence: 72,
        }
    }

    fn recon() -> ReconResult {
        let text = "\
08/04 Electronic Deposit From Guardian Life In        500.00
08/11 Electronic Deposit From BeamInsAdmin            240.00
";
        commission_recon::run_with_statement(
            &ReconConfig::default(),
            [("Guardian", 50000), ("Beam", 25000), ("Allied <West>", 1000)],
            text,
        )
        .unwrap()
    }

    fn states() -> StateSummary {
        StateSummary {
            rows: vec![StateTotal {
                state: "CA".to_string(),
                total_cents: 76000,
                basis_points: 10000,
            }],
            grand_total_cents: 76000,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("A&B <Co> \"x\" 'y'"), "A&amp;B &lt;Co&gt; &quot;x&quot; &#39;y&#39;");
    }

    #[test]
    fn test_render_sections() {
        let recon = recon();
        let states = states();
        let attachments = vec!["commission_output.csv".to_string()];
        let html = render(&ReportView {
            month_name: "August 2025",
            states: &states,
            recon: &recon,
            review: &[],
            preview_limit: 20,
            attachments: &attachments,
        });

        assert!(html.contains("<h1>Commission Reconciliation Report - August 2025</h1>"));
        assert!(html.contains("<strong>Total Commission:</strong> $760.00"));
        assert!(html.contains("<strong>Total Bank Deposits:</strong> $740.00"));
        assert!(html.contains("<span class=\"negative\">-$20.00</span>"));
        assert!(html.contains("<td>Allied &lt;West&gt;</td>"));
        assert!(html.contains("<td class=\"status-variance\">VARIANCE</td>"));
        assert!(html.contains("<td class=\"status-matched\">MATCHED</td>"));
        assert!(html.contains("<td class=\"status-unmatched\">COMMISSION ONLY</td>"));
        assert!(html.contains("Attached: commission_output.csv"));
        assert!(!html.contains("Entries Needing Review"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn test_review_preview_is_capped() {
        let recon = ReconResult {
            records: Vec::<ReconRecord>::new(),
            ..recon()
        };
        let states = states();
        let review: Vec<ReviewRow> = (0..23).map(|i| review_row(&format!("Group {}", i))).collect();
        let html = render(&ReportView {
            month_name: "August 2025",
            states: &states,
            recon: &recon,
            review: &review,
            preview_limit: 20,
            attachments: &[],
        });

        assert!(html.contains("Entries Needing Review (23)"));
        assert!(html.contains("<td>Group 19</td>"));
        assert!(!html.contains("<td>Group 20</td>"));
        assert!(html.contains("... and 3 more entries (see attached needs_review.csv)"));
    }
}
