//! Crate-wide error type.
//!
//! Mirrors the three-tier classification: `Store` and `Programming` variants
//! are fatal and meant to terminate the process; everything else a stage can
//! encounter (network failures, non-200 responses, missing magic strings) is
//! handled locally by the stage and never surfaces here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("programming error: {0}")]
    Programming(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("too many matches: {0}")]
    TooManyMatches(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
