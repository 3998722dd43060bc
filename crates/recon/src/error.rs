use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty marker, negative tolerance, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// The deposit marker could not be turned into a pattern.
    #[error("invalid deposit marker '{marker}': {message}")]
    Marker { marker: String, message: String },
}
