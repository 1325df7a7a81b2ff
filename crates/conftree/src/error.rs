//! Error types for path parsing, value coercion and tree operations.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Result type alias for conftree operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// A malformed dotted path string.
///
/// Offsets are byte offsets into `path`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A quoted segment is missing its closing quote.
    #[error("unterminated quote starting at offset {offset} in path `{path}`")]
    UnterminatedQuote {
        /// The path being parsed
        path: String,
        /// Offset of the opening quote
        offset: usize,
    },

    /// A backslash inside a quoted segment is followed by something other
    /// than a quote or a backslash.
    #[error("invalid escape `\\{found}` at offset {offset} in path `{path}`")]
    InvalidEscape {
        /// The path being parsed
        path: String,
        /// Offset of the backslash
        offset: usize,
        /// The character following the backslash
        found: char,
    },

    /// A closing quote is followed by something other than a separator.
    #[error("unexpected character `{found}` after closing quote at offset {offset} in path `{path}`")]
    UnexpectedCharacter {
        /// The path being parsed
        path: String,
        /// Offset of the offending character
        offset: usize,
        /// The offending character
        found: char,
    },
}

/// A value that a transform could not convert.
///
/// Transforms build these themselves. Views and wrappers hand them back to the
/// caller exactly as the transform produced them.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CoercionError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl CoercionError {
    /// Create a coercion error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a coercion error caused by another error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The kind of value found where a nested config was expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    /// No value at all
    Nothing,
    /// A scalar value
    Scalar,
    /// A list value
    List,
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Found::Nothing => write!(f, "no value"),
            Found::Scalar => write!(f, "a scalar"),
            Found::List => write!(f, "a list"),
        }
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A dotted path could not be parsed.
    #[error(transparent)]
    PathSyntax(#[from] PathError),

    /// A transform rejected a value.
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// A nested config was expected but something else is stored there.
    #[error("expected a nested config at `{}`, found {found}", crate::path::join(path, '.'))]
    StructuralMismatch {
        /// Path where the nested config was expected
        path: Vec<String>,
        /// What was found instead
        found: Found,
    },

    /// An operation that needs at least one path segment got none.
    #[error("path must have at least one segment")]
    EmptyPath,

    /// A comment was set on a path that holds no value.
    #[error("cannot comment `{}`: no value at this path", crate::path::join(path, '.'))]
    MissingEntry {
        /// Path of the missing value
        path: Vec<String>,
    },

    /// Configuration nesting exceeds maximum depth.
    #[error("config nesting too deep (max depth: {max_depth}) at path: {}", crate::path::join(path, '.'))]
    NestingTooDeep {
        /// Maximum allowed depth
        max_depth: usize,
        /// Path where the limit was exceeded
        path: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_mismatch_message() {
        let err = ConfigError::StructuralMismatch {
            path: vec!["server".into(), "port".into()],
            found: Found::Scalar,
        };
        insta::assert_snapshot!(err.to_string(), @"expected a nested config at `server.port`, found a scalar");
    }

    #[test]
    fn test_message_quotes_dotted_segments() {
        let err = ConfigError::MissingEntry {
            path: vec!["a.b".into(), "c".into()],
        };
        insta::assert_snapshot!(err.to_string(), @r#"cannot comment `"a.b".c`: no value at this path"#);
    }

    #[test]
    fn test_coercion_error_is_transparent() {
        let parse_err = "abc".parse::<i64>().unwrap_err();
        let err: ConfigError = CoercionError::with_source("not an integer: abc", parse_err).into();
        assert_eq!(err.to_string(), "not an integer: abc");
        match err {
            ConfigError::Coercion(inner) => {
                assert_eq!(inner.message(), "not an integer: abc");
                assert!(inner.source().is_some());
            }
            other => panic!("expected coercion error, got {other:?}"),
        }
    }

    #[test]
    fn test_path_error_message() {
        let err = PathError::UnterminatedQuote {
            path: "a.\"b".into(),
            offset: 2,
        };
        insta::assert_snapshot!(err.to_string(), @r#"unterminated quote starting at offset 2 in path `a."b`"#);
    }
}
