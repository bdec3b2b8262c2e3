//! Configuration errors
//!
//! Validation failures carry the dotted path of the offending field, e.g.
//! `fallback.providers[2]`, so a bad config file can be fixed without
//! guesswork.

use std::fmt;
use thiserror::Error;

/// Failure to load a router configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("cannot read router config '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML/JSON or does not match the schema
    #[error("cannot parse router config '{path}' (line {}, column {}): {message}",
            .line.map_or_else(|| "?".to_string(), |l| l.to_string()),
            .column.map_or_else(|| "?".to_string(), |c| c.to_string()))]
    ParseError {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    /// The document parsed but breaks a rule
    #[error("invalid router config: {0}")]
    ValidationError(#[from] ValidationError),

    /// A `${VAR}` placeholder names an unset variable
    #[error("environment variable '{var}' referenced by router config is not set")]
    EnvVarNotFound { var: String },
}

/// A rule violation at a specific field
#[derive(Debug, Error)]
pub struct ValidationError {
    /// Dotted path of the offending field
    pub field_path: String,
    /// What is wrong with it
    pub kind: ValidationErrorKind,
    /// Extra detail for the reader
    pub context: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_path, self.kind)?;
        match &self.context {
            Some(context) => write!(f, " ({})", context),
            None => Ok(()),
        }
    }
}

/// Kinds of rule violations
#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("must be set")]
    RequiredFieldMissing,

    #[error("out of range: {message}")]
    OutOfRange { message: String },

    #[error("'{value}' appears more than once")]
    DuplicateValue { value: String },

    #[error("conflicts with another setting: {message}")]
    Incompatible { message: String },

    #[error("not a usable URL: {message}")]
    InvalidUrl { message: String },

    #[error("unsupported version '{actual}', expected '{expected}'")]
    InvalidVersion { expected: String, actual: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            context: None,
        }
    }

    /// Attach extra detail
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::RequiredFieldMissing)
    }

    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(field_path, ValidationErrorKind::OutOfRange { message })
    }

    /// A numeric field that must be strictly positive
    pub fn not_positive(field_path: impl Into<String>) -> Self {
        Self::out_of_range(field_path, "must be greater than 0")
    }

    pub fn duplicate(field_path: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(field_path, ValidationErrorKind::DuplicateValue { value })
    }

    pub fn incompatible(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(field_path, ValidationErrorKind::Incompatible { message })
    }

    pub fn invalid_url(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(field_path, ValidationErrorKind::InvalidUrl { message })
    }
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path_and_context() {
        let err = ValidationError::duplicate("fallback.providers[2]", "openai")
            .with_context("each provider may appear once");
        assert_eq!(
            err.to_string(),
            "fallback.providers[2]: 'openai' appears more than once (each provider may appear once)"
        );
    }

    #[test]
    fn test_parse_error_without_location() {
        let err = ConfigError::ParseError {
            path: "inline".into(),
            line: None,
            column: None,
            message: "bad".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot parse router config 'inline' (line ?, column ?): bad"
        );
    }
}
