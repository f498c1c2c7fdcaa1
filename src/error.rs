//! Error types used by this crate.

use std::io;

use thiserror::Error;

/// Custom error type returned when something goes wrong with discovering games for a platform.
///
/// These never cross [`crate::data::GamesDetector::scan_all`]: the detector turns them into an
/// empty bucket plus a [`crate::data::ScanReport`].
#[derive(Error, Debug)]
pub enum GamesParsingError {
    /// Error originating from [`io::Error`]
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Error originating from [`nom::Err`]
    #[error(transparent)]
    Nom(#[from] nom::Err<nom::error::Error<String>>),

    /// Error originating from [`serde_json::Error`]
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A registry query failed or returned nothing usable
    #[error("Registry error: {0}")]
    Registry(String),

    /// The scan was cancelled through its [`crate::data::CancellationToken`]
    #[error("Scan cancelled")]
    Cancelled,

    /// Error originating from any other source
    #[error("Other error: {0}")]
    Other(String),
}

impl From<nom::Err<nom::error::Error<&str>>> for GamesParsingError {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Self {
        Self::Nom(err.map_input(Into::into))
    }
}
