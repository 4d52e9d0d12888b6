//! Error types for the mock server.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MockError>;

/// Errors raised while building, dispatching, or rendering mock endpoints.
#[derive(Error, Debug)]
pub enum MockError {
    /// An endpoint record lacks a required field.
    #[error("Endpoint {index}: missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    /// The configured method is not part of the supported verb set.
    #[error("Unsupported HTTP method: {method}")]
    InvalidMethod { method: String },

    /// The path pattern cannot be turned into a route.
    #[error("Invalid path pattern '{path}': {reason}")]
    InvalidPathPattern { path: String, reason: String },

    /// The configured status code is outside 100..=599.
    #[error("Invalid status code: {status}")]
    InvalidStatusCode { status: u16 },

    /// No registered endpoint matches the request.
    #[error("No endpoint registered for {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// Substituting parameters produced text that is not valid JSON.
    #[error("Rendered template is not valid JSON: {source}")]
    TemplateDecode {
        template: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration path does not point at a supported file.
    #[error("Invalid configuration file: {}", path.display())]
    InvalidConfigFile { path: PathBuf },

    /// A required environment variable is not set.
    #[error("Could not find environment variable: {name}")]
    MissingEnvironmentVariable { name: &'static str },

    /// The configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
