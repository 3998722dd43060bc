//! `commission review`: drive a [`ReviewSession`] from stdin.
//!
//! Lines are read on a helper thread and handed over a channel so the
//! per-item timeout can be enforced with `recv_timeout`. The session itself
//! decides what every answer means.

use std::io::{BufRead, BufReader, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use commission_extract::money::format_dollars;
use commission_extract::{
    CorrectionStore, ExtractionRun, ReviewDecision, ReviewEvent, ReviewItem, ReviewSession,
    ReviewState,
};

use crate::exit_codes::EXIT_REVIEW_CANCELLED;
use crate::{extract, CliError, Context};

pub fn cmd_review(ctx: &Context, no_fallback: bool) -> Result<(), CliError> {
    let mut corrections = extract::load_corrections(ctx)?;
    let mut run = extract::extract_month(ctx, &corrections, no_fallback)?;
    review_run(ctx, &mut run, &mut corrections, BufReader::new(std::io::stdin()))?;
    extract::write_outputs(ctx, &run)?;
    extract::print_summary(ctx, &run);
    Ok(())
}

/// Review every flagged entry of `run`, apply the decisions to its entries,
/// and save remembered corrections. Items still unverified afterwards stay
/// in `run.review`.
pub fn review_run<R: BufRead + Send + 'static>(
    ctx: &Context,
    run: &mut ExtractionRun,
    corrections: &mut CorrectionStore,
    input: R,
) -> Result<(), CliError> {
    if run.review.is_empty() {
        ctx.say("Nothing needs review.");
        return Ok(());
    }

    let lines = spawn_line_reader(input);
    let mut session = ReviewSession::new(ctx.settings.review.timeout());
    let mut prompt = std::io::stderr().lock();
    let outcome = drive(&mut session, run.review.clone(), &lines, corrections, &mut prompt)?;

    if outcome == ReviewState::Cancelled {
        return Err(CliError::new(EXIT_REVIEW_CANCELLED, "review cancelled; no outputs written"));
    }

    let applied = session.apply_to(&mut run.entries).map_err(CliError::review)?;
    let entries = &run.entries;
    run.review.retain_mut(|item| match entries.get(item.entry_index) {
        Some(entry) if entry.user_verified => false,
        Some(entry) => {
            item.entry = entry.clone();
            true
        }
        None => false,
    });
    tracing::info!(applied, still_flagged = run.review.len(), "review applied");

    corrections
        .save(&ctx.settings.corrections_path())
        .map_err(CliError::extract)?;
    Ok(())
}

// ── Input ───────────────────────────────────────────────────────────

/// Forward lines from `input` until EOF. The receiver sees a disconnect
/// once the input is exhausted.
fn spawn_line_reader<R: BufRead + Send + 'static>(input: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// A parsed reviewer answer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Answer {
    Decide { decision: ReviewDecision, remember: bool },
    Cancel,
}

fn parse_answer(line: &str) -> Result<Answer, String> {
    let trimmed = line.trim();
    let (body, remember) = match trimmed.strip_suffix('!') {
        Some(body) => (body.trim(), true),
        None => (trimmed, false),
    };
    let lower = body.to_ascii_lowercase();
    let decision = match lower.as_str() {
        "" | "c" | "y" => ReviewDecision::Confirm,
        "s" | "n" if !remember => ReviewDecision::Skip,
        "a" if !remember => ReviewDecision::ApproveAll,
        "q" if !remember => return Ok(Answer::Cancel),
        code if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
            ReviewDecision::Change(code.to_ascii_uppercase())
        }
        _ => return Err(format!("unrecognised answer '{}'", trimmed)),
    };
    Ok(Answer::Decide { decision, remember })
}

// ── Session loop ────────────────────────────────────────────────────

enum Input {
    Line(String),
    TimedOut,
    Closed,
}

fn wait_for_line(lines: &Receiver<String>, timeout: Option<Duration>) -> Input {
    let received = match timeout {
        Some(t) => lines.recv_timeout(t),
        None => lines.recv().map_err(|_| RecvTimeoutError::Disconnected),
    };
    match received {
        Ok(line) => Input::Line(line),
        Err(RecvTimeoutError::Timeout) => Input::TimedOut,
        Err(RecvTimeoutError::Disconnected) => Input::Closed,
    }
}

/// Feed events into `session` until it reaches `AwaitingReport` or
/// `Cancelled`. End of input cancels.
fn drive(
    session: &mut ReviewSession,
    items: Vec<ReviewItem>,
    lines: &Receiver<String>,
    corrections: &mut CorrectionStore,
    out: &mut impl Write,
) -> Result<ReviewState, CliError> {
    session
        .handle(ReviewEvent::Extracted(items), corrections)
        .map_err(CliError::review)?;

    loop {
        let Some(item) = session.current().cloned() else {
            return Ok(session.state().clone());
        };
        let (position, total) = session.progress();
        write_prompt(out, &item, position, total)
            .map_err(|e| CliError::io(format!("cannot write prompt: {}", e)))?;

        let event = loop {
            match wait_for_line(lines, session.timeout()) {
                Input::Closed => {
                    let _ = writeln!(out, "\nend of input");
                    break ReviewEvent::Cancel;
                }
                Input::TimedOut => {
                    let _ = writeln!(out, "\nno answer, keeping {}", item.entry.state);
                    break ReviewEvent::TimedOut;
                }
                Input::Line(line) => match parse_answer(&line) {
                    Ok(Answer::Cancel) => break ReviewEvent::Cancel,
                    Ok(Answer::Decide { decision, remember }) => {
                        break ReviewEvent::Decision { decision, remember }
                    }
                    Err(msg) => {
                        let _ = write!(out, "{}; try c, s, a, q or a state code: ", msg);
                        let _ = out.flush();
                    }
                },
            }
        };

        if let Err(e) = session.handle(event, corrections) {
            // A bad state code; ask again for the same item.
            let _ = writeln!(out, "{}", e);
        }
    }
}

fn write_prompt(
    out: &mut impl Write,
    item: &ReviewItem,
    position: usize,
    total: usize,
) -> std::io::Result<()> {
    let entry = &item.entry;
    writeln!(out)?;
    writeln!(out, "[{}/{}] {} | {} | {}", position, total, entry.carrier, entry.group_name, format_dollars(entry.commission_cents))?;
    match &item.matched_name {
        Some(name) => writeln!(
            out,
            "  best match: {} ({}) {}%",
            name, entry.state, entry.match_confidence
        )?,
        None => writeln!(out, "  best match: {} {}%", entry.state, entry.match_confidence)?,
    }
    for alt in item.alternatives.iter().filter(|a| Some(&a.name) != item.matched_name.as_ref()) {
        writeln!(out, "  also:       {} ({}) {}%", alt.name, alt.state, alt.score)?;
    }
    write!(out, "state [{}] (c/XX/s/a/q, ! to remember): ", entry.state)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use commission_extract::{CommissionEntry, MatchCandidate};

    fn item(index: usize, group: &str, state: &str) -> ReviewItem {
        let entry = CommissionEntry {
            carrier: "Beam".to_string(),
            group_name: group.to_string(),
            commission_cents: 25000,
            state: state.to_string(),
            match_confidence: 72,
            user_verified: false,
        };
        ReviewItem {
            id: entry.review_id(),
            entry_index: index,
            entry,
            matched_name: Some("Acme Corp".to_string()),
            alternatives: vec![MatchCandidate {
                name: "Acme Corp".to_string(),
                state: "CA".to_string(),
                score: 72,
            }],
        }
    }

    fn feed(lines: &[&str]) -> Receiver<String> {
        let (tx, rx) = mpsc::channel();
        for line in lines {
            tx.send(line.to_string()).unwrap();
        }
        rx
    }

    #[test]
    fn answers() {
        assert_eq!(
            parse_answer(""),
            Ok(Answer::Decide { decision: ReviewDecision::Confirm, remember: false })
        );
        assert_eq!(
            parse_answer("nv!"),
            Ok(Answer::Decide { decision: ReviewDecision::Change("NV".into()), remember: true })
        );
        assert_eq!(
            parse_answer(" c! "),
            Ok(Answer::Decide { decision: ReviewDecision::Confirm, remember: true })
        );
        assert_eq!(parse_answer("q"), Ok(Answer::Cancel));
        assert_eq!(
            parse_answer("A"),
            Ok(Answer::Decide { decision: ReviewDecision::ApproveAll, remember: false })
        );
        assert!(parse_answer("q!").is_err());
        assert!(parse_answer("nevada").is_err());
    }

    #[test]
    fn decisions_flow_through_session() {
        let mut session = ReviewSession::new(None);
        let mut corrections = CorrectionStore::default();
        let lines = feed(&["bogus", "or!", "s"]);
        let mut out = Vec::new();
        let state = drive(
            &mut session,
            vec![item(0, "Acme Corporation", "CA"), item(3, "Acme Co", "CA")],
            &lines,
            &mut corrections,
            &mut out,
        )
        .unwrap();

        assert_eq!(state, ReviewState::AwaitingReport);
        assert_eq!(corrections.get("Acme Corporation"), Some("OR"));
        let resolved = session.resolved().unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].0, 0);
        assert_eq!(resolved[0].1.state, "OR");
        assert!(resolved[0].1.user_verified);
        assert_eq!(resolved[1].0, 3);
        assert!(!resolved[1].1.user_verified);

        let prompt = String::from_utf8(out).unwrap();
        assert!(prompt.contains("[1/2] Beam | Acme Corporation | $250.00"));
        assert!(prompt.contains("unrecognised answer 'bogus'"));
    }

    #[test]
    fn end_of_input_cancels() {
        let mut session = ReviewSession::new(None);
        let mut corrections = CorrectionStore::default();
        let lines = feed(&["c"]);
        let mut out = Vec::new();
        let state = drive(
            &mut session,
            vec![item(0, "A", "CA"), item(1, "B", "CA")],
            &lines,
            &mut corrections,
            &mut out,
        )
        .unwrap();
        assert_eq!(state, ReviewState::Cancelled);
    }

    #[test]
    fn timeout_keeps_best_match() {
        let mut session = ReviewSession::new(Some(Duration::from_millis(20)));
        let mut corrections = CorrectionStore::default();
        // Sender stays alive so the channel times out instead of disconnecting.
        let (_tx, lines) = mpsc::channel::<String>();
        let mut out = Vec::new();
        let state = drive(&mut session, vec![item(0, "A", "CA")], &lines, &mut corrections, &mut out)
            .unwrap();
        assert_eq!(state, ReviewState::AwaitingReport);
        let resolved = session.resolved().unwrap();
        assert_eq!(resolved[0].1.state, "CA");
        assert!(!resolved[0].1.user_verified);
    }

    #[test]
    fn line_reader_forwards_until_eof() {
        let rx = spawn_line_reader(std::io::Cursor::new("c\nnv\n"));
        let got: Vec<String> = rx.iter().collect();
        assert_eq!(got, vec!["c".to_string(), "nv".to_string()]);
    }
}
