//! Error types for linking compiled graphs into a host script.

use std::path::PathBuf;

use sigflow_core::GraphError;
use thiserror::Error;

/// Errors that can occur while configuring or running the linker.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The template does not contain a required marker
    #[error("template has no '{0}' marker")]
    MissingMarker(String),

    /// The two markers are equal or overlap in the template
    #[error("markers '{values}' and '{code}' overlap")]
    MarkerOverlap {
        /// Marker replaced by the combined values text.
        values: String,
        /// Marker replaced by the combined code text.
        code: String,
    },

    /// A graph failed to compile
    #[error("failed to compile graph: {0}")]
    Graph(#[from] GraphError),

    /// Failed to read a configuration file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl LinkError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LinkError::ReadFile {
            path: path.into(),
            source,
        }
    }
}
