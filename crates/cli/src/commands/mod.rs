//! CLI command implementations.

pub mod catalog;
pub mod policy;
pub mod quote;

use std::path::{Path, PathBuf};

use keepsake_core::catalog::CatalogError;
use keepsake_core::policy::PolicyError;
use keepsake_core::pricing::PricingError;
use keepsake_core::validation::{FieldError, join_errors};
use thiserror::Error;

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, String),

    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("invalid policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("cannot price session: {0}")]
    Pricing(#[from] PricingError),

    #[error("session exceeds policy limits: {}", join_errors(.0))]
    Limits(Vec<FieldError>),

    #[error("failed to render output: {0}")]
    Render(String),
}

/// Read and deserialize a YAML file.
pub(crate) fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CommandError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| CommandError::Read(path.to_path_buf(), e))?;
    serde_yaml::from_str(&content).map_err(|e| CommandError::Parse(path.to_path_buf(), e.to_string()))
}

/// Read and deserialize a JSON file.
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CommandError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| CommandError::Read(path.to_path_buf(), e))?;
    serde_json::from_str(&content).map_err(|e| CommandError::Parse(path.to_path_buf(), e.to_string()))
}
