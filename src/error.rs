use crate::request::Method;
use thiserror::Error;

/// Startup-time registration failures. These are fatal: a process must not
/// begin serving with a partial route table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("route pattern {pattern:?} must start with '/'")]
    InvalidPattern { pattern: String },

    #[error("route {method} {pattern} is already registered")]
    DuplicateRoute { method: Method, pattern: String },
}
