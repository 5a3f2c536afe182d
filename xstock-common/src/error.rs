//! Error types shared by xstock crates.

use thiserror::Error;

/// Result type alias using the xstock error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process-level error type.
///
/// Domain failures (collaborator calls, statistics) have their own types in
/// the `xstock` crate; this one covers configuration problems found before
/// any work starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
