//! `commission-recon`: matches bank deposits against commission totals per
//! carrier.
//!
//! Pure engine crate: receives commission lines and bank statement text,
//! returns classified records. No CLI or IO dependencies.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod deposits;
pub mod engine;
pub mod error;
pub mod summary;
pub mod model;

pub use config::ReconConfig;
pub use deposits::parse_deposits;
pub use engine::{run, run_with_statement};
pub use error::ReconError;
pub use model::{BankDeposit, ReconInput, ReconRecord, ReconResult, ReconStatus, ReconSummary};
