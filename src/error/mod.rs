//! Error definitions
//!
//! This module provides error types for testkit-swizzle.

use thiserror::Error;

use crate::swizzle::Operation;

/// Main error type for testkit-swizzle
#[derive(Error, Debug)]
pub enum Error {
    /// The target object does not expose the requested operation.
    ///
    /// Surfaced synchronously at install time, never at call time, so a
    /// mistyped operation fails the test immediately instead of leaving a
    /// mis-wired interception behind.
    #[error("target object does not respond to operation `{0}`")]
    NoSuchOperation(Operation),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
