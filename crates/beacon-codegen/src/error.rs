//! Errors raised by the code generator
//!
//! Only environment faults are errors: unreadable files, unparseable sources,
//! bad configuration. A declaration that cannot be instrumented is reported as
//! a [`crate::Diagnostic`] and skipped.

use std::path::{Path, PathBuf};

/// Error type for generator operations
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// Reading or writing a file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A source file is not valid Rust
    #[error("Parse error in {}: {source}", path.display())]
    Parse {
        /// Source file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: syn::Error,
    },

    /// Configuration is malformed or inconsistent
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },

    /// Generated text for a wrapper does not parse back into tokens
    #[error("Generated code for {wrapper} does not parse: {message}")]
    Emit {
        /// Wrapper type name
        wrapper: String,
        /// Parser message
        message: String,
    },

    /// No output directory configured and `OUT_DIR` unset
    #[error("OUT_DIR is not set; call Builder::out_dir or run from a build script")]
    MissingOutDir,
}

impl CodegenError {
    /// Create an I/O error for a path
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a parse error for a path
    pub fn parse(path: impl AsRef<Path>, source: syn::Error) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an emission error
    pub fn emit(wrapper: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Emit {
            wrapper: wrapper.into(),
            message: message.into(),
        }
    }
}

/// Result alias for generator operations
pub type Result<T> = std::result::Result<T, CodegenError>;
