//! Error types shared by the gate driver, its collaborators and the profile store.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by this crate.
///
/// The gate itself never surfaces these to the visitor: a failed completeness
/// lookup is folded into an incomplete profile. They are returned from the
/// collaborator traits and from [`ProfileStore`](crate::ProfileStore) so that
/// callers can log or display them.
#[derive(Error, Debug)]
pub enum Error {
    /// The database or remote row-query API failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// The auth provider could not produce a session.
    #[error("auth provider error: {0}")]
    Auth(String),

    /// A remote lookup did not answer in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// A mandatory profile field was blank.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A configuration value could not be parsed.
    #[error("invalid configuration for {key}: {reason}")]
    Config { key: &'static str, reason: String },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
