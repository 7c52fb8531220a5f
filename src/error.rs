//! Error type for hopscotch table operations.

use thiserror::Error;

/// Everything that can go wrong when creating or growing a table.
///
/// Neighborhood exhaustion is not an error: it is handled inside `put`
/// by resizing, and only shows up here when resizing is not possible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HopscotchError {
    /// The backing arrays would exceed the largest representable allocation.
    #[error("Memory allocation failed: requested {bytes} bytes")]
    OutOfMemory {
        /// Number of bytes requested
        bytes: usize,
    },

    /// Creation parameters that cannot describe a valid table.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong with the parameters
        message: String,
    },

    /// A non-resizable table has no room left for the key.
    #[error("Table is full and may not be resized (capacity {capacity})")]
    TableFull {
        /// Physical capacity of the table
        capacity: usize,
    },

    /// Growing would exceed the largest supported logical bin count.
    #[error("Cannot grow table beyond {bins} logical bins")]
    CapacityOverflow {
        /// Logical bin count the resize asked for
        bins: usize,
    },
}

impl HopscotchError {
    /// Create an invalid configuration error
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HopscotchError>;
