// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the annealing drivers.

use std::fmt;

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Driver error types.
#[derive(Debug)]
pub enum Error {
    /// Configuration error
    Config(String),
    /// Problem setup rejected before integration
    Validation(ValidationError),
    /// Configuration the requested driver does not support
    Unsupported(String),
    /// Failure reported by the external integrator
    Integration(String),
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::Unsupported(msg) => write!(f, "Unsupported configuration: {}", msg),
            Error::Integration(msg) => write!(f, "Integration failed: {}", msg),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Setup errors detected before the integrator is invoked.
#[derive(Debug)]
pub enum ValidationError {
    /// Field validation failed
    Field { field: String, message: String },
    /// Operator or state dimension mismatch
    Dimension {
        what: String,
        expected: usize,
        actual: usize,
    },
    /// Auxiliary-data wrapper and control type do not fit together
    IncompatibleAuxData(String),
    /// Physics constraint violated
    PhysicsConstraint(String),
}

impl ValidationError {
    /// Shorthand for a [`ValidationError::Field`].
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        ValidationError::Field {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Field { field, message } => {
                write!(f, "Field '{}': {}", field, message)
            }
            ValidationError::Dimension {
                what,
                expected,
                actual,
            } => write!(
                f,
                "Dimension mismatch for {}: expected {}, got {}",
                what, expected, actual
            ),
            ValidationError::IncompatibleAuxData(msg) => {
                write!(f, "Auxiliary data incompatible with control: {}", msg)
            }
            ValidationError::PhysicsConstraint(msg) => {
                write!(f, "Physics constraint violated: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
