//! `commission-extract`: turns carrier commission statements into
//! state-tagged commission entries.
//!
//! Pure engine crate apart from the `pdftotext` reader: callers hand in a
//! roster, a correction store and (optionally) a fallback extractor, and get
//! back entries plus a review subset. No network or CLI dependencies.

pub mod carriers;
pub mod corrections;
pub mod error;
pub mod fallback;
pub mod matcher;
pub mod model;
pub mod money;
pub mod orchestrator;
pub mod pdf;
pub mod review;
pub mod router;
pub mod summary;

pub use carriers::{Carrier, ExtractOptions, RemainderPolicy};
pub use corrections::CorrectionStore;
pub use error::{ExtractError, FallbackError, ReviewError};
pub use fallback::FallbackExtractor;
pub use matcher::{MatchConfig, MatchOutcome, Roster, StateMatcher};
pub use model::{CommissionEntry, Extraction, MatchCandidate, RawEntry, ReviewItem};
pub use orchestrator::{ExtractionRun, Orchestrator};
pub use pdf::{PdfTextReader, Pdftotext};
pub use review::{ReviewDecision, ReviewEvent, ReviewSession, ReviewState};
pub use router::{route, Route};
pub use summary::{summarize_by_state, StateSummary, StateTotal};
