//! # MarkupKit Common
//!
//! Common error types and logging configuration shared by the MarkupKit crates.
//!
//! ## Features
//!
//! - Unified error type for DOM construction, parsing and template loading
//! - Logging configuration and setup
//! - Result extension traits

use std::path::PathBuf;
use thiserror::Error;

pub mod logging;

pub use logging::{init_logging, init_test_logging, LogConfig, LogFormat};

/// Unified error type for MarkupKit.
#[derive(Error, Debug)]
pub enum MarkupKitError {
    /// A node name failed lexical validation.
    #[error("Invalid node name: {0:?}")]
    InvalidNodeName(String),

    /// A template file could not be located.
    #[error("Template not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    /// A row or column index outside a table's bounds.
    #[error("Invalid index: row {row}, column {column}")]
    InvalidIndex { row: usize, column: usize },

    /// Markup could not be tokenized.
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// An external template host failed to produce markup.
    #[error("Template host error: {message}")]
    TemplateHost {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MarkupKitError {
    /// Create an invalid node name error.
    pub fn invalid_node_name(name: impl Into<String>) -> Self {
        Self::InvalidNodeName(name.into())
    }

    /// Create a template not found error.
    pub fn template_not_found(path: impl Into<PathBuf>) -> Self {
        Self::TemplateNotFound { path: path.into() }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a template host error.
    pub fn template_host(message: impl Into<String>) -> Self {
        Self::TemplateHost {
            message: message.into(),
            source: None,
        }
    }

    /// Create a template host error with source.
    pub fn template_host_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::TemplateHost {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Get the error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            MarkupKitError::InvalidNodeName(_) => "invalid_node_name",
            MarkupKitError::TemplateNotFound { .. } => "template_not_found",
            MarkupKitError::InvalidIndex { .. } => "invalid_index",
            MarkupKitError::Parse { .. } => "parse",
            MarkupKitError::TemplateHost { .. } => "template_host",
            MarkupKitError::Config(_) => "config",
            MarkupKitError::Io(_) => "io",
        }
    }
}

/// Result type alias for MarkupKit operations.
pub type Result<T> = std::result::Result<T, MarkupKitError>;

/// Extension trait for Option.
pub trait OptionExt<T> {
    /// Convert None to a TemplateNotFound error for the given path.
    fn ok_or_not_found(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, path: impl Into<PathBuf>) -> Result<T> {
        self.ok_or_else(|| MarkupKitError::template_not_found(path))
    }
}
