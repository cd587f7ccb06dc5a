//! Configuration builders and types for the server adapter.
//!
//! This module provides a fluent builder API for configuring:
//! - The bind address (host and port)
//! - The mount path the handler adapter is registered at
//! - The backend implementation and its options
//!
//! All types also derive [`serde::Deserialize`] so a bootstrap binary can
//! load them from a TOML file.
//!
//! # Examples
//!
//! ```rust,ignore
//! use gantry::config::{BackendOptions, ServerConfig};
//!
//! let config = ServerConfig::builder()
//!     .host("0.0.0.0")
//!     .port(8080)
//!     .mount_path("/api")
//!     .options(
//!         BackendOptions::builder()
//!             .max_body_bytes(64 * 1024)
//!             .build(),
//!     )
//!     .build()?;
//! ```

use serde::Deserialize;

use crate::errors::{ConfigError, GantryError};

/// Default cap on buffered request body size (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Available server backend implementations.
///
/// Backends are selected by explicit configuration rather than by probing a
/// library for expected methods. Any type implementing the
/// [`Backend`](crate::backend::Backend) contract can additionally be injected
/// directly via [`Gantry::start_with_backend`](crate::Gantry::start_with_backend).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// HTTP/1.1 backend built on tokio and hyper
    #[default]
    Hyper,
}

/// Builder for creating `BackendOptions` instances.
#[derive(Clone)]
pub struct BackendOptionsBuilder {
    max_body_bytes: Option<usize>,
    keep_alive: bool,
    tcp_nodelay: bool,
}

impl BackendOptionsBuilder {
    /// Sets the maximum number of body bytes the translator will buffer
    /// when an application collects a request body.
    pub fn max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = Some(max_body_bytes);
        self
    }

    /// Removes the request body size limit.
    ///
    /// Applications that stream bodies incrementally may prefer this; buffered
    /// collection then reads without bound.
    pub fn unlimited_body(mut self) -> Self {
        self.max_body_bytes = None;
        self
    }

    /// Sets whether HTTP/1.1 keep-alive is enabled on the backend.
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Sets whether `TCP_NODELAY` is applied to accepted connections.
    pub fn tcp_nodelay(mut self, tcp_nodelay: bool) -> Self {
        self.tcp_nodelay = tcp_nodelay;
        self
    }

    /// Creates the `BackendOptions` with the configured settings.
    pub fn build(self) -> BackendOptions {
        BackendOptions {
            max_body_bytes: self.max_body_bytes,
            keep_alive: self.keep_alive,
            tcp_nodelay: self.tcp_nodelay,
        }
    }
}

/// Options forwarded to the chosen backend.
///
/// These are the only knobs the adapter interprets itself; everything else
/// about connection handling is the backend's own concern.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendOptions {
    max_body_bytes: Option<usize>,
    keep_alive: bool,
    tcp_nodelay: bool,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            max_body_bytes: Some(DEFAULT_MAX_BODY_BYTES),
            keep_alive: true,
            tcp_nodelay: true,
        }
    }
}

impl BackendOptions {
    /// Creates a new `BackendOptionsBuilder` with default settings.
    ///
    /// Default values:
    /// - max_body_bytes: 1 MiB
    /// - keep_alive: true
    /// - tcp_nodelay: true
    pub fn builder() -> BackendOptionsBuilder {
        let defaults = Self::default();
        BackendOptionsBuilder {
            max_body_bytes: defaults.max_body_bytes,
            keep_alive: defaults.keep_alive,
            tcp_nodelay: defaults.tcp_nodelay,
        }
    }

    /// Returns the body buffering limit, if any.
    pub fn max_body_bytes(&self) -> Option<usize> {
        self.max_body_bytes
    }

    /// Returns whether keep-alive is enabled.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Returns whether `TCP_NODELAY` is applied.
    pub fn tcp_nodelay(&self) -> bool {
        self.tcp_nodelay
    }
}

/// Builder for creating `ServerConfig` instances.
///
/// # Examples
///
/// ```rust,ignore
/// use gantry::config::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .host("127.0.0.1")
///     .port(8443)
///     .build()?;
/// ```
#[derive(Clone)]
pub struct ServerConfigBuilder {
    host: String,
    port: u16,
    mount_path: String,
    backend: BackendKind,
    options: BackendOptions,
}

impl ServerConfigBuilder {
    /// Sets the host to bind to.
    ///
    /// Common values:
    /// - "0.0.0.0" - All interfaces
    /// - "127.0.0.1" - Localhost only
    /// - "::1" - IPv6 localhost
    ///
    /// Hostnames are resolved at bind time; an unresolvable host fails
    /// `start` with a bind error.
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_owned();
        self
    }

    /// Sets the port to bind to.
    ///
    /// Port 0 asks the operating system for an ephemeral port; the chosen
    /// port is available via [`Gantry::local_addr`](crate::Gantry::local_addr)
    /// after `start`.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the URL path prefix the handler adapter is registered at.
    ///
    /// Defaults to `/`, mounting the application at the root. Requests
    /// outside the mount path receive a 404 without entering dispatch.
    pub fn mount_path(mut self, mount_path: &str) -> Self {
        self.mount_path = mount_path.to_owned();
        self
    }

    /// Selects the backend implementation.
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the backend options.
    pub fn options(mut self, options: BackendOptions) -> Self {
        self.options = options;
        self
    }

    /// Creates the `ServerConfig` with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is empty, the mount path does not start
    /// with `/`, or an option value is out of range.
    pub fn build(self) -> Result<ServerConfig, GantryError> {
        let config = ServerConfig {
            host: self.host,
            port: self.port,
            mount_path: self.mount_path,
            backend: self.backend,
            options: self.options,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration for one server adapter instance.
///
/// Immutable once the server starts; constructed before any bind happens.
///
/// # Examples
///
/// ```rust,ignore
/// use gantry::config::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .host("0.0.0.0")
///     .port(8080)
///     .build()?;
///
/// println!("Binding to {}:{}", config.host(), config.port());
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    host: String,
    port: u16,
    mount_path: String,
    backend: BackendKind,
    options: BackendOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            mount_path: "/".to_owned(),
            backend: BackendKind::default(),
            options: BackendOptions::default(),
        }
    }
}

impl ServerConfig {
    /// Creates a new `ServerConfigBuilder` with default settings.
    ///
    /// Default values:
    /// - host: "127.0.0.1"
    /// - port: 8080
    /// - mount_path: "/"
    /// - backend: hyper
    pub fn builder() -> ServerConfigBuilder {
        let defaults = Self::default();
        ServerConfigBuilder {
            host: defaults.host,
            port: defaults.port,
            mount_path: defaults.mount_path,
            backend: defaults.backend,
            options: defaults.options,
        }
    }

    /// Returns the host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the mount path.
    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// Returns the selected backend kind.
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Returns the backend options.
    pub fn options(&self) -> &BackendOptions {
        &self.options
    }

    /// Validates the configuration.
    ///
    /// Deserialized configs bypass the builder, so `start` re-runs this
    /// before constructing a backend.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if !self.mount_path.starts_with('/') {
            return Err(ConfigError::InvalidMountPath(self.mount_path.clone()));
        }
        if self.options.max_body_bytes == Some(0) {
            return Err(ConfigError::BackendOption(
                "max_body_bytes must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}
