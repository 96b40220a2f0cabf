#![forbid(unsafe_code)]

//! Pagination error types.

use std::fmt;

use quire_core::NodeId;

/// Errors raised while setting up or running a pagination pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginateError {
    /// A numeric argument is outside its valid domain.
    InvalidArgument {
        /// Which argument was rejected.
        argument: &'static str,
        /// Why it was rejected.
        message: String,
    },
    /// The designated pagination target cannot be paginated independently
    /// where it sits in the tree.
    ConfigurationConflict {
        /// The offending node.
        node: NodeId,
        /// What is wrong with the placement.
        message: String,
    },
}

impl fmt::Display for PaginateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { argument, message } => {
                write!(f, "invalid argument `{argument}`: {message}")
            }
            Self::ConfigurationConflict { node, message } => {
                write!(f, "configuration conflict at {node}: {message}")
            }
        }
    }
}

impl std::error::Error for PaginateError {}

/// Result type for pagination operations.
pub type PaginateResult<T> = Result<T, PaginateError>;
