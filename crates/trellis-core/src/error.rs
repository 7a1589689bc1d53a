//! Unified application error types for Trellis.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// A route pattern could not be compiled into a matcher.
    InvalidPattern,
    /// A hook callback failed while an action or filter was running.
    HookCallback,
    /// A hook was fired again while already running on the same call stack.
    HookReentrancy,
    /// A plugin entry point failed during boot.
    PluginLoad,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate entry, concurrent modification, etc.).
    Conflict,
    /// An internal server error occurred.
    Internal,
    /// A storage I/O error occurred.
    Storage,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
}

impl ErrorKind {
    /// HTTP status code used when this kind reaches a client.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Validation => 400,
            Self::Conflict => 409,
                Self::InvalidPattern
            | Self::HookCallback
            | Self::HookReentrancy
            | Self::PluginLoad
            | Self::Internal
            | Self::Storage
            | Self::Configuration
            | Self::Serialization => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::InvalidPattern => write!(f, "INVALID_PATTERN"),
            Self::HookCallback => write!(f, "HOOK_CALLBACK"),
            Self::HookReentrancy => write!(f, "HOOK_REENTRANCY"),
            Self::PluginLoad => write!(f, "PLUGIN_LOAD"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
        }
    }
}

/// The unified application error used throughout Trellis.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an invalid route pattern error.
    pub fn invalid_pattern(pattern: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidPattern,
            format!("Invalid route pattern '{pattern}': {reason}"),
        )
    }

    /// Create a hook callback error naming the hook, plugin, and callback.
    pub fn hook_callback(
        hook: &str,
        plugin_id: &str,
        callback: &str,
        reason: impl fmt::Display,
    ) -> Self {
        Self::new(
            ErrorKind::HookCallback,
            format!("Hook '{hook}' callback '{callback}' (plugin '{plugin_id}') failed: {reason}"),
        )
    }

    /// Create a hook re-entrancy error.
    pub fn hook_reentrancy(hook: &str) -> Self {
        Self::new(
            ErrorKind::HookReentrancy,
            format!("Hook '{hook}' fired while already running on this call stack"),
        )
    }

    /// Create a plugin load error, keeping the cause.
    pub fn plugin_load(plugin_id: &str, cause: AppError) -> Self {
        Self::with_source(
            ErrorKind::PluginLoad,
            format!("Plugin '{plugin_id}' failed to load: {}", cause.message),
            cause,
        )
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Returns whether this error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("TOML parse error: {err}"),
            err,
        )
    }
}
