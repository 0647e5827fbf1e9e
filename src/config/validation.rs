//! Configuration validation
//!
//! Semantic checks that serde cannot express. Runs once at startup, before
//! the listener is bound, and compiles the forward table on success.

use std::fmt;

use super::types::Config;
use crate::logger::LogLevel;
use crate::routing::{ForwardTable, ForwardTableError};

/// Reason the startup configuration was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    InvalidAddress(String),
    UnknownLogLevel(String),
    NoIndexFiles,
    InvalidIndexFile(String),
    ForwardTable(ForwardTableError),
    HealthPathCollision(String),
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress(msg) => write!(f, "server address: {msg}"),
            Self::UnknownLogLevel(level) => write!(
                f,
                "logging.level '{level}' is not one of error, warn, info, debug"
            ),
            Self::NoIndexFiles => write!(f, "spa.index_files must name at least one file"),
            Self::InvalidIndexFile(name) => {
                write!(f, "spa.index_files entry '{name}' must be a plain file name")
            }
            Self::ForwardTable(e) => write!(f, "spa.forward_paths: {e}"),
            Self::HealthPathCollision(path) => write!(
                f,
                "health path '{path}' is also a forward path; the probe would shadow the SPA route"
            ),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

impl From<ForwardTableError> for ConfigValidationError {
    fn from(e: ForwardTableError) -> Self {
        Self::ForwardTable(e)
    }
}

impl Config {
    /// Validate the configuration and compile the forward table
    pub fn validate(&self) -> Result<ForwardTable, ConfigValidationError> {
        self.get_socket_addr()
            .map_err(ConfigValidationError::InvalidAddress)?;

        if LogLevel::parse(&self.logging.level).is_none() {
            return Err(ConfigValidationError::UnknownLogLevel(
                self.logging.level.clone(),
            ));
        }

        if self.spa.index_files.is_empty() {
            return Err(ConfigValidationError::NoIndexFiles);
        }
        if let Some(bad) = self
            .spa
            .index_files
            .iter()
            .find(|f| f.is_empty() || f.contains('/') || f.contains(".."))
        {
            return Err(ConfigValidationError::InvalidIndexFile(bad.clone()));
        }

        let table = ForwardTable::new(self.spa.forward_paths.as_slice(), &self.spa.forward_target)?;

        if self.health.enabled {
            for path in [&self.health.liveness_path, &self.health.readiness_path] {
                if table.resolve(path).is_some() {
                    return Err(ConfigValidationError::HealthPathCollision(path.clone()));
                }
            }
        }

        Ok(table)
    }
}
