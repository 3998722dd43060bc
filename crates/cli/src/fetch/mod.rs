//! `commission fetch`: pull the month's statements from remote storage.

pub(crate) mod common;
mod drive;

use clap::Subcommand;

use crate::{CliError, Context, MonthArg};

#[derive(Subcommand)]
pub enum FetchCommands {
    /// Download the month's statement PDFs from a Google Drive folder
    #[command(after_help = "\
Examples:
  commission fetch drive --month 2025-08 --folder-id 1AbC...
  commission fetch drive --folder-id 1AbC... --access-token ya29....
  GOOGLE_DRIVE_TOKEN=ya29.... commission fetch drive --month 2025-08 --folder-id 1AbC...

Files land in <data_dir>/<month>/commission_statements/. Existing files
are kept unless --overwrite is given.")]
    Drive {
        #[command(flatten)]
        month: MonthArg,

        /// Drive folder holding the month's statements
        #[arg(long)]
        folder_id: String,

        /// OAuth access token (default: GOOGLE_DRIVE_TOKEN env)
        #[arg(long)]
        access_token: Option<String>,

        /// Replace files that already exist locally
        #[arg(long)]
        overwrite: bool,
    },
}

impl FetchCommands {
    pub fn month(&self) -> &MonthArg {
        match self {
            FetchCommands::Drive { month, .. } => month,
        }
    }
}

pub fn cmd_fetch(ctx: &Context, cmd: FetchCommands) -> Result<(), CliError> {
    match cmd {
        FetchCommands::Drive {
            folder_id,
            access_token,
            overwrite,
            ..
        } => drive::cmd_fetch_drive(ctx, &folder_id, access_token, overwrite),
    }
}
