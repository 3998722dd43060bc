// Application settings
// Loaded from --config, $COMMISSION_CONFIG, or ~/.config/commission/settings.toml

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use commission_extract::{ExtractOptions, MatchConfig, RemainderPolicy};
use commission_recon::ReconConfig;
use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable naming a settings file.
pub const CONFIG_ENV: &str = "COMMISSION_CONFIG";

pub const DEFAULT_FALLBACK_MODEL: &str = "claude-3-haiku-20240307";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathSettings {
    /// Holds `<month>/commission_statements`, `<month>/bank_statement` and
    /// `master_data/`.
    pub data_dir: PathBuf,
    /// Per-month outputs go to `<output_dir>/<month>/`.
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Roster CSV. Defaults to `<data_dir>/master_data/master_contacts.csv`.
    pub roster: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            log_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("commission")
                .join("logs"),
            roster: None,
        }
    }
}

impl PathSettings {
    pub fn roster_path(&self) -> PathBuf {
        self.roster
            .clone()
            .unwrap_or_else(|| self.data_dir.join("master_data").join("master_contacts.csv"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchingSettings {
    pub auto_accept: u8,
    pub review_floor: u8,
    pub fallback_state: String,
    /// Roster column holding the company name.
    pub name_column: String,
    /// Roster column holding the state code.
    pub state_column: String,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        let thresholds = MatchConfig::default();
        Self {
            auto_accept: thresholds.auto_accept,
            review_floor: thresholds.review_floor,
            fallback_state: thresholds.fallback_state,
            name_column: "Card Name".to_string(),
            state_column: "State".to_string(),
        }
    }
}

impl MatchingSettings {
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            auto_accept: self.auto_accept,
            review_floor: self.review_floor,
            fallback_state: self.fallback_state.trim().to_ascii_uppercase(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionSettings {
    pub remainder_policy: RemainderPolicy,
}

impl ExtractionSettings {
    pub fn options(&self) -> ExtractOptions {
        ExtractOptions {
            remainder_policy: self.remainder_policy,
        }
    }
}

/// Generic extraction for unrecognised statements. The API key is read from
/// `ANTHROPIC_API_KEY`, never from this file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackSettings {
    pub enabled: bool,
    pub model: String,
    pub max_tokens: u32,
    /// Statement text beyond this many characters is cut before sending.
    pub max_chars: usize,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: DEFAULT_FALLBACK_MODEL.to_string(),
            max_tokens: 4000,
            max_chars: commission_extract::fallback::DEFAULT_MAX_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmailSettings {
    pub from: String,
    pub to: Vec<String>,
    /// Rows of the review list shown in the report before "and N more".
    pub review_preview_limit: usize,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            from: String::new(),
            to: Vec::new(),
            review_preview_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReviewSettings {
    /// Seconds to wait for each decision. Unset waits forever.
    pub timeout_secs: Option<u64>,
    /// Correction store. Defaults to `<output_dir>/corrections.json`.
    pub corrections: Option<PathBuf>,
}

impl ReviewSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub paths: PathSettings,
    pub matching: MatchingSettings,
    pub extraction: ExtractionSettings,
    pub fallback: FallbackSettings,
    pub recon: ReconConfig,
    pub email: EmailSettings,
    pub review: ReviewSettings,
}

/// Where the settings came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    Flag(PathBuf),
    Env(PathBuf),
    UserConfig(PathBuf),
    Defaults,
}

impl SettingsSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Flag(p) | Self::Env(p) | Self::UserConfig(p) => Some(p),
            Self::Defaults => None,
        }
    }
}

impl std::fmt::Display for SettingsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag(p) => write!(f, "{} (--config)", p.display()),
            Self::Env(p) => write!(f, "{} (${CONFIG_ENV})", p.display()),
            Self::UserConfig(p) => write!(f, "{}", p.display()),
            Self::Defaults => write!(f, "built-in defaults"),
        }
    }
}

impl Settings {
    /// Get the per-user settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("commission");
        config_dir.join("settings.toml")
    }

    /// Pick the settings file: flag, then environment, then the per-user
    /// file if it exists.
    pub fn resolve_source(
        flag: Option<&Path>,
        env: Option<OsString>,
        user_config: &Path,
    ) -> SettingsSource {
        if let Some(path) = flag {
            return SettingsSource::Flag(path.to_path_buf());
        }
        if let Some(path) = env.filter(|v| !v.is_empty()) {
            return SettingsSource::Env(PathBuf::from(path));
        }
        if user_config.is_file() {
            return SettingsSource::UserConfig(user_config.to_path_buf());
        }
        SettingsSource::Defaults
    }

    /// Load settings for this process. An explicitly named file that does not
    /// exist is an error; a missing per-user file means defaults.
    pub fn load(flag: Option<&Path>) -> Result<(Self, SettingsSource), ConfigError> {
        let source =
            Self::resolve_source(flag, std::env::var_os(CONFIG_ENV), &Self::config_path());
        let settings = match source.path() {
            Some(path) => Self::load_file(path)?,
            None => Self::default(),
        };
        tracing::debug!(source = %source, "settings loaded");
        Ok((settings, source))
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(input).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.matching;
        if m.auto_accept > 100 {
            return Err(ConfigError::Invalid(format!(
                "matching.auto_accept must be 0-100, got {}",
                m.auto_accept
            )));
        }
        if m.review_floor > m.auto_accept {
            return Err(ConfigError::Invalid(format!(
                "matching.review_floor ({}) must not exceed matching.auto_accept ({})",
                m.review_floor, m.auto_accept
            )));
        }
        let state = m.fallback_state.trim();
        if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Invalid(format!(
                "matching.fallback_state must be a two-letter code, got '{}'",
                m.fallback_state
            )));
        }
        if m.name_column.trim().is_empty() || m.state_column.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "matching.name_column and matching.state_column must not be empty".into(),
            ));
        }
        if self.fallback.max_chars == 0 {
            return Err(ConfigError::Invalid("fallback.max_chars must be positive".into()));
        }
        self.recon
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("recon: {e}")))?;
        Ok(())
    }

    /// Correction store location.
    pub fn corrections_path(&self) -> PathBuf {
        self.review
            .corrections
            .clone()
            .unwrap_or_else(|| self.paths.output_dir.join("corrections.json"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[paths]
data_dir = "/srv/commission/data"
output_dir = "/srv/commission/output"
log_dir = "/var/log/commission"
roster = "/srv/commission/roster.csv"

[matching]
auto_accept = 85
review_floor = 65
fallback_state = "or"
name_column = "Company"
state_column = "St"

[extraction]
remainder_policy = "signed"

[fallback]
enabled = false
model = "claude-3-5-haiku-latest"
max_tokens = 2000
max_chars = 20000

[recon]
deposit_marker = "ACH Credit From"
match_below_cents = 2

[recon.payer_map]
"Guardian Life In" = "Guardian"

[email]
from = "reports@example.com"
to = ["ops@example.com", "owner@example.com"]
review_preview_limit = 10

[review]
timeout_secs = 120
corrections = "/srv/commission/corrections.json"
"#;

    #[test]
    fn parse_full() {
        let s = Settings::from_toml(FULL).unwrap();
        assert_eq!(s.paths.roster_path(), PathBuf::from("/srv/commission/roster.csv"));
        assert_eq!(s.matching.match_config().auto_accept, 85);
        assert_eq!(s.matching.match_config().fallback_state, "OR");
        assert_eq!(s.matching.name_column, "Company");
        assert_eq!(s.extraction.options().remainder_policy, RemainderPolicy::Signed);
        assert!(!s.fallback.enabled);
        assert_eq!(s.fallback.max_tokens, 2000);
        assert_eq!(s.recon.deposit_marker, "ACH Credit From");
        assert_eq!(s.recon.payer_map.len(), 1);
        assert_eq!(s.email.to.len(), 2);
        assert_eq!(s.email.review_preview_limit, 10);
        assert_eq!(s.review.timeout(), Some(Duration::from_secs(120)));
        assert_eq!(
            s.corrections_path(),
            PathBuf::from("/srv/commission/corrections.json")
        );
    }

    #[test]
    fn empty_file_is_defaults() {
        let s = Settings::from_toml("").unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.matching.auto_accept, 80);
        assert_eq!(s.matching.review_floor, 60);
        assert_eq!(s.matching.fallback_state, "WA");
        assert_eq!(s.matching.name_column, "Card Name");
        assert_eq!(s.fallback.model, "claude-3-haiku-20240307");
        assert_eq!(s.fallback.max_tokens, 4000);
        assert_eq!(s.fallback.max_chars, 50_000);
        assert_eq!(s.email.review_preview_limit, 20);
        assert_eq!(s.review.timeout(), None);
        assert_eq!(
            s.paths.roster_path(),
            PathBuf::from("data/master_data/master_contacts.csv")
        );
        assert_eq!(s.corrections_path(), PathBuf::from("output/corrections.json"));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let s = Settings::from_toml("[matching]\nauto_accept = 90\n").unwrap();
        assert_eq!(s.matching.auto_accept, 90);
        assert_eq!(s.matching.review_floor, 60);
        assert_eq!(s.recon, ReconConfig::default());
    }

    #[test]
    fn zero_timeout_means_none() {
        let s = Settings::from_toml("[review]\ntimeout_secs = 0\n").unwrap();
        assert_eq!(s.review.timeout(), None);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let err = Settings::from_toml("[matching]\nauto_accept = 50\n").unwrap_err();
        assert!(err.to_string().contains("review_floor"));
    }

    #[test]
    fn rejects_bad_fallback_state() {
        let err = Settings::from_toml("[matching]\nfallback_state = \"Washington\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_section() {
        let err = Settings::from_toml("[smtp]\nhost = \"mail\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn recon_errors_surface() {
        let err = Settings::from_toml("[recon]\ndeposit_marker = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("recon"));
    }

    #[test]
    fn source_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("settings.toml");

        assert_eq!(
            Settings::resolve_source(None, None, &user),
            SettingsSource::Defaults
        );

        fs::write(&user, "").unwrap();
        assert_eq!(
            Settings::resolve_source(None, None, &user),
            SettingsSource::UserConfig(user.clone())
        );
        assert_eq!(
            Settings::resolve_source(None, Some("/etc/c.toml".into()), &user),
            SettingsSource::Env(PathBuf::from("/etc/c.toml"))
        );
        assert_eq!(
            Settings::resolve_source(
                Some(Path::new("mine.toml")),
                Some("/etc/c.toml".into()),
                &user
            ),
            SettingsSource::Flag(PathBuf::from("mine.toml"))
        );
        assert_eq!(
            Settings::resolve_source(None, Some("".into()), &user),
            SettingsSource::UserConfig(user)
        );
    }

    #[test]
    fn load_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let err = Settings::load_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));

        fs::write(&path, "[paths\n").unwrap();
        match Settings::load_file(&path).unwrap_err() {
            ConfigError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }

        fs::write(&path, "[email]\nto = [\"a@example.com\"]\n").unwrap();
        let s = Settings::load_file(&path).unwrap();
        assert_eq!(s.email.to, vec!["a@example.com".to_string()]);
    }
}
