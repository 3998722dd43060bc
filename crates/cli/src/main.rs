// commission - monthly commission statement extraction, state summary,
// bank reconciliation and report delivery

mod exit_codes;
mod extract;
mod fetch;
mod llm;
mod logging;
mod month;
mod output;
mod report;
mod review;
mod summarize;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use commission_config::{ConfigError, MonthPaths, Settings};
use commission_extract::{ExtractError, ReviewError};
use commission_recon::ReconError;

use exit_codes::{
    EXIT_ERROR, EXIT_MISSING_INPUT, EXIT_OUTPUT, EXIT_SETTINGS, EXIT_SUCCESS, EXIT_USAGE,
};
use fetch::FetchCommands;
use month::Month;

#[derive(Parser)]
#[command(name = "commission")]
#[command(about = "Extract carrier commission statements, summarize by state, reconcile against the bank")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: $COMMISSION_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Log debug detail (individual matches, skipped lines)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug, Default)]
pub struct MonthArg {
    /// Month to process, YYYY-MM (default: current month)
    #[arg(long)]
    month: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract commission entries from the month's carrier statements
    #[command(after_help = "\
Examples:
  commission extract --month 2025-08
  commission extract --month 2025-08 --no-fallback
  ANTHROPIC_API_KEY=sk-ant-... commission extract

Reads <data_dir>/<month>/commission_statements/**/*.pdf and writes
commission_output.csv, needs_review.csv and all_commission_data.json
to <output_dir>/<month>/.")]
    Extract {
        #[command(flatten)]
        month: MonthArg,

        /// Skip the generic extractor for statements no template recognises
        #[arg(long)]
        no_fallback: bool,
    },

    /// Total the month's commissions by state
    #[command(after_help = "\
Examples:
  commission summarize --month 2025-08

Reads commission_output.csv and writes state_summary.csv.")]
    Summarize {
        #[command(flatten)]
        month: MonthArg,
    },

    /// Extract, then confirm low-confidence state matches one at a time
    #[command(after_help = "\
Examples:
  commission review --month 2025-08

Answers at the prompt:
  <enter> or c   confirm the suggested state
  XX             use state XX instead (two letters)
  s              skip (keep the suggestion, unverified)
  a              approve every remaining suggestion
  q              cancel; nothing is written
Append ! to c or XX to remember the answer for future runs (e.g. nv!).")]
    Review {
        #[command(flatten)]
        month: MonthArg,

        /// Skip the generic extractor for statements no template recognises
        #[arg(long)]
        no_fallback: bool,
    },

    /// Reconcile against the bank statement and email the report
    #[command(after_help = "\
Examples:
  commission report --month 2025-08
  commission report --month 2025-08 --no-email
  commission report --bank-statement ~/Downloads/usbank-aug.pdf --no-email
  RESEND_API_KEY=re_... commission report")]
    Report {
        #[command(flatten)]
        month: MonthArg,

        /// Bank statement PDF (default: first PDF in <data_dir>/<month>/bank_statement/)
        #[arg(long)]
        bank_statement: Option<PathBuf>,

        /// Write report.html instead of sending email
        #[arg(long)]
        no_email: bool,
    },

    /// Extract, summarize and report in one pass
    #[command(after_help = "\
Examples:
  commission run --month 2025-08
  commission run --month 2025-08 --review
  commission run --no-email")]
    Run {
        #[command(flatten)]
        month: MonthArg,

        /// Bank statement PDF (default: first PDF in <data_dir>/<month>/bank_statement/)
        #[arg(long)]
        bank_statement: Option<PathBuf>,

        /// Write report.html instead of sending email
        #[arg(long)]
        no_email: bool,

        /// Skip the generic extractor for statements no template recognises
        #[arg(long)]
        no_fallback: bool,

        /// Review low-confidence matches interactively before reporting
        #[arg(long)]
        review: bool,
    },

    /// Download statements from remote storage
    #[command(subcommand)]
    Fetch(FetchCommands),
}

impl Commands {
    fn month_arg(&self) -> Option<&str> {
        let arg = match self {
            Commands::Extract { month, .. }
            | Commands::Summarize { month }
            | Commands::Review { month, .. }
            | Commands::Report { month, .. }
            | Commands::Run { month, .. } => month,
            Commands::Fetch(cmd) => cmd.month(),
        };
        arg.month.as_deref()
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("GIT_COMMIT_HASH"),
        ")\n",
        "target: ",
        env!("TARGET"),
        "\n",
        "profile: ",
        env!("BUILD_PROFILE"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    // Validate --month before touching settings or the log directory.
    let month = Month::resolve(cli.command.month_arg())?;

    let (settings, source) = Settings::load(cli.config.as_deref()).map_err(CliError::config)?;

    let _log_guard = logging::init(
        &settings.paths.log_dir,
        logging::Verbosity::from_flags(cli.quiet, cli.verbose),
    );
    tracing::debug!(settings = %source, month = %month, "starting");

    let ctx = Context::new(settings, month, cli.quiet);

    match cli.command {
        Commands::Extract { no_fallback, .. } => extract::cmd_extract(&ctx, no_fallback),
        Commands::Summarize { .. } => summarize::cmd_summarize(&ctx),
        Commands::Review { no_fallback, .. } => review::cmd_review(&ctx, no_fallback),
        Commands::Report {
            bank_statement,
            no_email,
            ..
        } => report::cmd_report(&ctx, bank_statement, no_email),
        Commands::Run {
            bank_statement,
            no_email,
            no_fallback,
            review,
            ..
        } => cmd_run(&ctx, bank_statement, no_email, no_fallback, review),
        Commands::Fetch(cmd) => fetch::cmd_fetch(&ctx, cmd),
    }
}

/// extract → (review) → summarize → report.
fn cmd_run(
    ctx: &Context,
    bank_statement: Option<PathBuf>,
    no_email: bool,
    no_fallback: bool,
    interactive: bool,
) -> Result<(), CliError> {
    let mut corrections = extract::load_corrections(ctx)?;
    let mut run = extract::extract_month(ctx, &corrections, no_fallback)?;
    if interactive {
        review::review_run(
            ctx,
            &mut run,
            &mut corrections,
            std::io::BufReader::new(std::io::stdin()),
        )?;
    }
    extract::write_outputs(ctx, &run)?;
    extract::print_summary(ctx, &run);

    summarize::summarize_entries(ctx, &run.entries)?;
    report::cmd_report(ctx, bank_statement, no_email)
}

// ============================================================================
// Run context
// ============================================================================

pub struct Context {
    pub settings: Settings,
    pub month: Month,
    pub paths: MonthPaths,
    pub quiet: bool,
}

impl Context {
    pub fn new(settings: Settings, month: Month, quiet: bool) -> Self {
        let paths = MonthPaths::new(&settings, &month.to_string());
        Self {
            settings,
            month,
            paths,
            quiet,
        }
    }

    /// Print a result line on stdout unless `--quiet`.
    pub fn say(&self, line: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", line.as_ref());
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn missing(msg: impl Into<String>) -> Self {
        Self::new(EXIT_MISSING_INPUT, msg)
    }

    pub fn settings(msg: impl Into<String>) -> Self {
        Self::new(EXIT_SETTINGS, msg)
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self::new(EXIT_OUTPUT, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::NotFound(_) => "check the --config path".to_string(),
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => {
                format!("fix or remove {}", path.display())
            }
            ConfigError::Invalid(_) => "fix the named setting in the settings file".to_string(),
        };
        Self::settings(err.to_string()).with_hint(hint)
    }

    pub fn extract(err: ExtractError) -> Self {
        let message = err.to_string();
        match err {
            ExtractError::RosterRead { .. } => Self::missing(message)
                .with_hint("set [paths] roster in the settings file"),
            ExtractError::RosterColumn { .. } => Self::settings(message)
                .with_hint("set [matching] name_column / state_column to the roster's headers"),
            ExtractError::MissingDir(_) => Self::missing(message),
            ExtractError::PdftotextMissing => Self::io(message)
                .with_hint("install poppler-utils (apt install poppler-utils / brew install poppler)"),
            ExtractError::Corrections { path, .. } => Self::io(message)
                .with_hint(format!("fix or delete {}", path.display())),
            ExtractError::Pattern(_) | ExtractError::Pdftotext { .. } | ExtractError::Io(_) => {
                Self::io(message)
            }
        }
    }

    pub fn recon(err: ReconError) -> Self {
        match err {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                Self::settings(err.to_string()).with_hint("check the [recon] section")
            }
            ReconError::Marker { .. } => {
                Self::settings(err.to_string()).with_hint("check [recon] deposit_marker")
            }
        }
    }

    pub fn review(err: ReviewError) -> Self {
        Self::io(err.to_string())
    }
}
