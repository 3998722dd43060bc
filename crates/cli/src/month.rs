//! `--month YYYY-MM`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::CliError;

/// A calendar month, always rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn current() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    /// `--month` value, or the current month when absent.
    pub fn resolve(arg: Option<&str>) -> Result<Self, CliError> {
        match arg {
            Some(value) => value.parse(),
            None => Ok(Self::current()),
        }
    }

    /// Long form for email subjects: `August 2025`.
    pub fn long_name(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| self.to_string())
    }
}

impl FromStr for Month {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            CliError::args(format!(
                "Invalid month format '{}'. Use YYYY-MM (e.g., 2025-08)",
                s
            ))
        };
        // chrono accepts single-digit months and signed years; pin the shape first.
        let fixed_width = s.len() == 7
            && s
                .bytes()
                .enumerate()
                .all(|(i, b)| if i == 4 { b == b'-' } else { b.is_ascii_digit() });
        if !fixed_width {
            return Err(invalid());
        }
        let first = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .map_err(|_| invalid())?;
        Ok(Self {
            year: first.year(),
            month: first.month(),
        })
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
