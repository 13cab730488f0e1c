//! Domain error types
//!
//! This module defines error types for locally detected problems:
//! malformed content envelopes, bad path parameters, masks that do not
//! compile, and conflicting upload options. None of these ever reach a
//! transport backend.

use thiserror::Error;

/// Errors raised while converting between a payload and its envelope
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// The envelope carried no content at all (an empty string is valid)
    #[error("Content is null")]
    NullContent,

    /// The content is not valid for its declared transfer encoding
    #[error("Content has invalid base64 format: {0}")]
    InvalidContentFormat(String),

    /// Raw bytes could not be carried as text without loss
    #[error("Content is not valid UTF-8 text; request a binary transfer instead")]
    NotText,
}

/// Errors that can occur while validating a request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A path parameter was missing or all whitespace
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// An include or exclude mask did not compile
    #[error("Invalid mask '{mask}': {reason}")]
    InvalidMask {
        /// The mask exactly as supplied by the caller
        mask: String,
        /// Regex compiler message
        reason: String,
    },

    /// The requested combination of options is not allowed
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl DomainError {
    pub(crate) fn blank_parameter(name: &str) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: "value is null or whitespace".to_string(),
        }
    }
}
