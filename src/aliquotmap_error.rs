//! Unified error type for aliquotmap front ends.
//!
//! The numeric core reports its own narrow error ([`FactorError`]); everything
//! the command layer can fail with is folded into [`AliquotError`], which
//! provides:
//! - Clear categorization via variants (Io, Parse, Config, Engine, Cli,
//!   Validation)
//! - Structured error codes for programmatic handling (e.g., E001, E030)
//! - Error classification (`is_user_fixable`) and a suggested exit code
//! - Serde serialization for structured logging
//!
//! # Error Codes
//!
//! Error codes are assigned by category:
//! - E001-E009: I/O and filesystem errors
//! - E010-E019: Input record parse errors
//! - E020-E029: Configuration errors
//! - E030-E039: Engine errors
//! - E040-E049: CLI errors
//! - E050-E059: Validation errors
//!
//! # Example
//!
//! ```rust
//! use aliquotmap::aliquotmap_error::{AliquotError, ErrorCode};
//!
//! let err = AliquotError::config_with_field("must be positive", "engine.max_steps");
//! assert_eq!(err.code(), ErrorCode::CONFIG_INVALID);
//! assert!(err.is_user_fixable());
//! ```

use crate::math::{FactorError, Natural};
use crate::observability::RunPhase;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Structured error code for documentation and programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    /// I/O error - file not found
    pub const IO_FILE_NOT_FOUND: ErrorCode = ErrorCode("E001");
    /// I/O error - permission denied
    pub const IO_PERMISSION_DENIED: ErrorCode = ErrorCode("E002");
    /// I/O error - generic
    pub const IO_GENERIC: ErrorCode = ErrorCode("E009");

    /// Parse error - a natural number could not be read
    pub const PARSE_NATURAL: ErrorCode = ErrorCode("E010");
    /// Parse error - malformed record
    pub const PARSE_RECORD: ErrorCode = ErrorCode("E011");

    /// Config error - invalid value
    pub const CONFIG_INVALID: ErrorCode = ErrorCode("E020");
    /// Config error - file not found
    pub const CONFIG_FILE_NOT_FOUND: ErrorCode = ErrorCode("E022");
    /// Config error - generic
    pub const CONFIG_GENERIC: ErrorCode = ErrorCode("E029");

    /// Engine error - divisor search exceeded its restart ceiling
    pub const ENGINE_RESTART_CEILING: ErrorCode = ErrorCode("E030");

    /// CLI error - invalid argument
    pub const CLI_INVALID_ARG: ErrorCode = ErrorCode("E042");

    /// Validation error - generic
    pub const VALIDATION_GENERIC: ErrorCode = ErrorCode("E050");
    /// Validation error - recomputed results disagree with reported ones
    pub const VALIDATION_MISMATCH: ErrorCode = ErrorCode("E051");

    /// Get the error code string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unified error type for aliquotmap operations.
#[derive(Debug, Clone)]
pub enum AliquotError {
    /// I/O and filesystem errors.
    Io {
        code: ErrorCode,
        message: String,
        path: Option<PathBuf>,
        source: Option<Arc<std::io::Error>>,
    },

    /// Input that could not be read as a seed or record.
    Parse {
        code: ErrorCode,
        message: String,
        /// 1-based line in the input, if the input is line oriented.
        line: Option<usize>,
    },

    /// Configuration errors.
    Config {
        code: ErrorCode,
        message: String,
        field: Option<String>,
        path: Option<PathBuf>,
    },

    /// Failures inside the numeric engine.
    Engine {
        code: ErrorCode,
        message: String,
        seed: Option<Natural>,
        phase: Option<RunPhase>,
    },

    /// CLI argument errors.
    Cli {
        code: ErrorCode,
        message: String,
        arg: Option<String>,
    },

    /// Validation errors (may contain multiple issues).
    Validation {
        code: ErrorCode,
        count: usize,
        errors: Vec<String>,
    },
}

impl AliquotError {
    // ==========================================================================
    // Constructor Methods
    // ==========================================================================

    /// Create an I/O error from a std::io::Error.
    #[must_use]
    pub fn from_io_error(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::IO_FILE_NOT_FOUND,
            std::io::ErrorKind::PermissionDenied => ErrorCode::IO_PERMISSION_DENIED,
            _ => ErrorCode::IO_GENERIC,
        };
        Self::Io {
            code,
            message: err.to_string(),
            path,
            source: Some(Arc::new(err)),
        }
    }

    /// A value that is not a non-negative decimal integer.
    #[must_use]
    pub fn parse_natural(text: impl AsRef<str>) -> Self {
        Self::Parse {
            code: ErrorCode::PARSE_NATURAL,
            message: format!("'{}' is not a non-negative decimal integer", text.as_ref()),
            line: None,
        }
    }

    /// A malformed input record at the given line.
    #[must_use]
    pub fn parse_record(message: impl Into<String>, line: usize) -> Self {
        Self::Parse {
            code: ErrorCode::PARSE_RECORD,
            message: message.into(),
            line: Some(line),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::CONFIG_GENERIC,
            message: message.into(),
            field: None,
            path: None,
        }
    }

    /// Create a configuration error with field context.
    #[must_use]
    pub fn config_with_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::CONFIG_INVALID,
            message: message.into(),
            field: Some(field.into()),
            path: None,
        }
    }

    /// Create a configuration error with path context.
    #[must_use]
    pub fn config_with_path(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Config {
            code: ErrorCode::CONFIG_FILE_NOT_FOUND,
            message: message.into(),
            field: None,
            path: Some(path.into()),
        }
    }

    /// Wrap an engine failure for the given seed.
    #[must_use]
    pub fn engine(err: &FactorError, seed: Option<Natural>) -> Self {
        let code = match err {
            FactorError::RestartCeiling { .. } => ErrorCode::ENGINE_RESTART_CEILING,
        };
        Self::Engine {
            code,
            message: err.to_string(),
            seed,
            phase: Some(RunPhase::Factoring),
        }
    }

    /// Create a CLI error for an invalid argument.
    #[must_use]
    pub fn cli_invalid_arg(arg: impl Into<String>, reason: impl Into<String>) -> Self {
        let arg_str = arg.into();
        Self::Cli {
            code: ErrorCode::CLI_INVALID_ARG,
            message: format!("Invalid argument '{}': {}", arg_str, reason.into()),
            arg: Some(arg_str),
        }
    }

    /// Recomputed results disagree with reported ones.
    #[must_use]
    pub fn mismatches(errors: Vec<String>) -> Self {
        Self::Validation {
            code: ErrorCode::VALIDATION_MISMATCH,
            count: errors.len(),
            errors,
        }
    }

    // ==========================================================================
    // Accessor Methods
    // ==========================================================================

    /// Get the error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Io { code, .. }
            | Self::Parse { code, .. }
            | Self::Config { code, .. }
            | Self::Engine { code, .. }
            | Self::Cli { code, .. }
            | Self::Validation { code, .. } => *code,
        }
    }

    /// Get the error category name.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io { .. } => "I/O",
            Self::Parse { .. } => "Parse",
            Self::Config { .. } => "Config",
            Self::Engine { .. } => "Engine",
            Self::Cli { .. } => "CLI",
            Self::Validation { .. } => "Validation",
        }
    }

    /// Get the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Io { message, .. }
            | Self::Parse { message, .. }
            | Self::Config { message, .. }
            | Self::Engine { message, .. }
            | Self::Cli { message, .. } => message,
            Self::Validation { errors, .. } => errors.first().map_or("Validation failed", |s| s),
        }
    }

    // ==========================================================================
    // Classification Methods
    // ==========================================================================

    /// Check if this error is something the user can fix.
    ///
    /// Engine errors and I/O failures are not; bad input, arguments and
    /// configuration are.
    #[must_use]
    pub fn is_user_fixable(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::Cli { .. } | Self::Validation { .. } | Self::Parse { .. }
        )
    }

    /// Get the suggested exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cli { .. } => 2,        // Invalid usage
            Self::Config { .. } => 3,     // Configuration error
            Self::Validation { .. } => 4, // Validation error
            Self::Parse { .. } => 5,      // Parse error
            Self::Engine { .. } => 1,     // Computation failed
            Self::Io { .. } => 1,         // I/O error
        }
    }
}

impl std::fmt::Display for AliquotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io {
                code,
                message,
                path,
                ..
            } => {
                write!(f, "[{}] I/O error: {}", code, message)?;
                if let Some(p) = path {
                    write!(f, " (path: {})", p.display())?;
                }
                Ok(())
            }
            Self::Parse {
                code,
                message,
                line,
            } => {
                write!(f, "[{}] Parse error: {}", code, message)?;
                if let Some(l) = line {
                    write!(f, " at line {}", l)?;
                }
                Ok(())
            }
            Self::Config {
                code,
                message,
                field,
                path,
            } => {
                write!(f, "[{}] Configuration error: {}", code, message)?;
                if let Some(fld) = field {
                    write!(f, " (field: {})", fld)?;
                }
                if let Some(p) = path {
                    write!(f, " (file: {})", p.display())?;
                }
                Ok(())
            }
            Self::Engine {
                code,
                message,
                seed,
                phase,
            } => {
                write!(f, "[{}] Engine error: {}", code, message)?;
                if let Some(s) = seed {
                    write!(f, " (seed: {})", s)?;
                }
                if let Some(ph) = phase {
                    write!(f, " (phase: {})", ph)?;
                }
                Ok(())
            }
            Self::Cli { code, message, arg } => {
                write!(f, "[{}] CLI error: {}", code, message)?;
                if let Some(a) = arg {
                    write!(f, " (argument: {})", a)?;
                }
                Ok(())
            }
            Self::Validation {
                code,
                count,
                errors,
            } => {
                write!(f, "[{}] Validation failed with {} error(s)", code, count)?;
                if *count <= 3 {
                    for (i, err) in errors.iter().enumerate() {
                        write!(f, "\n  {}. {}", i + 1, err)?;
                    }
                } else {
                    for (i, err) in errors.iter().take(2).enumerate() {
                        write!(f, "\n  {}. {}", i + 1, err)?;
                    }
                    write!(f, "\n  ... and {} more", count - 2)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for AliquotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

// =============================================================================
// Serde Serialization for Structured Logging
// =============================================================================

impl Serialize for AliquotError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("AliquotError", 4)?;
        state.serialize_field("code", &self.code().as_str())?;
        state.serialize_field("category", &self.category())?;
        state.serialize_field("message", &self.to_string())?;
        state.serialize_field("user_fixable", &self.is_user_fixable())?;
        state.end()
    }
}

impl From<std::io::Error> for AliquotError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(err, None)
    }
}

impl From<FactorError> for AliquotError {
    fn from(err: FactorError) -> Self {
        Self::engine(&err, None)
    }
}
