// SPDX-FileCopyrightText: 2025 softras contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error type shared by every softras crate.

use thiserror::Error;

use crate::types::ObjectId;

/// Errors surfaced by the state manager and the render pipeline.
///
/// All errors are raised synchronously at the point of misuse and leave
/// externally visible state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A handle or raw id did not resolve to a live object.
    #[error("object with id {0} could not be found")]
    ObjectNotFound(ObjectId),

    /// The requested mode exists in the API but has no implementation.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// A parameter was structurally valid but unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_object_not_found() {
        let err = RenderError::ObjectNotFound(7);
        assert_eq!(err.to_string(), "object with id 7 could not be found");
    }

    #[test]
    fn test_display_not_implemented() {
        let err = RenderError::NotImplemented("point primitives");
        assert_eq!(err.to_string(), "not implemented: point primitives");
    }

    #[test]
    fn test_display_invalid_argument() {
        let err = RenderError::InvalidArgument("count exceeds index buffer".into());
        assert_eq!(err.to_string(), "invalid argument: count exceeds index buffer");
    }
}
