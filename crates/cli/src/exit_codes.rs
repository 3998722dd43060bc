//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; cron jobs and wrappers rely
//! on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                      |
//! |---------|-----------|--------------------------------------------------|
//! | 0       | Universal | Success                                          |
//! | 1       | Universal | General error (unspecified)                      |
//! | 2       | Universal | CLI usage error (bad `--month`, bad flags)       |
//! | 3-9     | Pipeline  | Missing input, bad settings, output failures     |
//! | 10-19   | Review    | Interactive review outcomes                      |
//! | 50-59   | Remote    | Drive, Anthropic and Resend calls                |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, malformed `--month`.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Pipeline (3-9)
// =============================================================================

/// A required input is missing: statement directory, roster, bank
/// statement, or the output of an earlier stage.
pub const EXIT_MISSING_INPUT: u8 = 3;

/// Settings file unreadable, unparsable or invalid.
pub const EXIT_SETTINGS: u8 = 4;

/// Cannot create the output directory or write an output file.
pub const EXIT_OUTPUT: u8 = 5;

// =============================================================================
// Review (10-19)
// =============================================================================

/// Reviewer cancelled the session; no report was produced.
pub const EXIT_REVIEW_CANCELLED: u8 = 10;

// =============================================================================
// Remote (50-59)
// =============================================================================

/// No credential supplied (flag or environment variable).
pub const EXIT_FETCH_NOT_AUTH: u8 = 50;

/// Service rejected the credential (HTTP 401/403).
pub const EXIT_FETCH_AUTH: u8 = 51;

/// Service rejected the request (HTTP 400).
pub const EXIT_FETCH_VALIDATION: u8 = 52;

/// Other 4xx, 5xx, network failure, or unreadable response.
pub const EXIT_FETCH_UPSTREAM: u8 = 53;

/// The report email could not be delivered.
pub const EXIT_EMAIL_FAILED: u8 = 54;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_MISSING_INPUT,
            EXIT_SETTINGS,
            EXIT_OUTPUT,
            EXIT_REVIEW_CANCELLED,
            EXIT_FETCH_NOT_AUTH,
            EXIT_FETCH_AUTH,
            EXIT_FETCH_VALIDATION,
            EXIT_FETCH_UPSTREAM,
            EXIT_EMAIL_FAILED,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
