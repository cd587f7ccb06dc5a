//! Error handling types for Gantry.
//!
//! Errors fall into two families. Start-time errors ([`GantryError`] and its
//! sub-enums) propagate to the caller of `start` and leave the server in the
//! `Unstarted` state. Per-request errors ([`TranslateError`],
//! [`DispatchError`]) are caught at the handler adapter boundary and converted
//! into HTTP 400/500 responses; they never reach the backend's accept loop.

use std::error::Error as StdError;

use thiserror::Error;

use crate::Lifecycle;

/// Main error type for Gantry operations.
///
/// # Examples
///
/// ```rust,ignore
/// use gantry::errors::GantryError;
///
/// match result {
///     Err(GantryError::Config(config_err)) => {
///         println!("Configuration issue: {}", config_err);
///     }
///     Err(GantryError::Bind(addr)) => {
///         println!("Failed to bind to address: {}", addr);
///     }
///     Err(other) => println!("Error: {}", other),
///     Ok(_) => println!("Success!"),
/// }
/// ```
#[derive(Debug, Error, PartialEq)]
pub enum GantryError {
    /// Configuration-related errors, surfaced before anything is bound
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failed to bind or resolve a network address
    #[error("Failed to bind to address: {0}")]
    Bind(String),

    /// An operation was invoked in the wrong lifecycle state
    #[error("Lifecycle error: {0}")]
    State(#[from] StateError),

    /// Backend startup errors after a successful bind
    #[error("Failed to start backend: {0}")]
    Start(String),

    /// Backend shutdown errors
    #[error("Failed to stop backend: {0}")]
    Stop(String),

    /// A response could not be fully written to the client; the connection
    /// is considered broken and is closed, never retried
    #[error("Transport write failed: {0}")]
    TransportWrite(String),
}

/// Configuration-related errors.
///
/// These occur during validation of a [`ServerConfig`](crate::config::ServerConfig),
/// either at build time or when `start` re-validates a deserialized config.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// The host string is empty
    #[error("host is empty")]
    EmptyHost,

    /// The mount path does not start with '/'
    #[error("mount path must start with '/': {0}")]
    InvalidMountPath(String),

    /// An invalid backend option value
    #[error("invalid backend option: {0}")]
    BackendOption(String),
}

/// Lifecycle state machine violations.
#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum StateError {
    /// `start` was called on a handle that already started
    #[error("server already started (state: {0:?})")]
    AlreadyStarted(Lifecycle),

    /// `join` or `stop` was called before the server was running
    #[error("server is not running (state: {0:?})")]
    NotRunning(Lifecycle),
}

/// Request translation errors.
///
/// Raised by `to_canonical` when a backend-native request is missing required
/// start-line fields, or when reading the body trips the configured limit.
/// The handler adapter maps these to HTTP 400; they are never re-raised into
/// the backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslateError {
    /// The request line carries no path (e.g. authority-form CONNECT)
    #[error("request line is missing a path")]
    MissingPath,

    /// The request method is empty
    #[error("request method is empty")]
    EmptyMethod,

    /// The request body exceeded the configured size limit
    #[error("request body exceeds the configured limit of {0} bytes")]
    BodyTooLarge(usize),

    /// The request body stream failed mid-read
    #[error("failed to read request body: {0}")]
    Body(String),
}

/// A failure raised by the framework's dispatch call.
///
/// Applications return this from [`App::dispatch`](crate::app::App::dispatch).
/// The handler adapter maps it to an HTTP 500 with a generic body; the error
/// itself is only logged, never sent to the client.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DispatchError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl DispatchError {
    /// Creates a dispatch failure from a plain message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    /// Creates a dispatch failure wrapping an underlying error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Returns the failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<TranslateError> for DispatchError {
    fn from(err: TranslateError) -> Self {
        Self::with_source("failed to read canonical request", err)
    }
}
