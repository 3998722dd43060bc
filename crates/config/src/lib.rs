// Configuration loading

pub mod error;
pub mod paths;
pub mod settings;

pub use error::ConfigError;
pub use paths::MonthPaths;
pub use settings::{Settings, SettingsSource};
