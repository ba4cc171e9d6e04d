// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for brush construction

use thiserror::Error;

/// Result type for brush geometry operations
pub type Result<T> = std::result::Result<T, BrushError>;

/// Brush construction errors
///
/// Every variant means "nothing was constructed": callers never receive a
/// partially built mesh or partition alongside an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrushError {
    /// Too few vertices, zero height, degenerate or zero-area outline
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The constructed half-edge mesh broke a structural invariant
    #[error("validation failure: {0}")]
    ValidationFailure(String),

    /// The outline could not be decomposed into convex pieces
    #[error("partition failure: {0}")]
    PartitionFailure(String),
}

impl BrushError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        BrushError::InvalidInput(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        BrushError::ValidationFailure(msg.into())
    }

    pub fn partition(msg: impl Into<String>) -> Self {
        BrushError::PartitionFailure(msg.into())
    }

    /// Short machine-friendly name of the failure class
    pub fn kind(&self) -> &'static str {
        match self {
            BrushError::InvalidInput(_) => "invalid_input",
            BrushError::ValidationFailure(_) => "validation_failure",
            BrushError::PartitionFailure(_) => "partition_failure",
        }
    }
}
