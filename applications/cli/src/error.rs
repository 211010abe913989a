/// CLI error types
use cadence_client::ProviderError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Track provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid track library: {0}")]
    Library(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
