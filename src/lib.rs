//! # Gantry
//!
//! **A pluggable HTTP server adapter: run one application on interchangeable
//! server backends**
//!
//! Gantry binds an application framework to a swappable HTTP server backend.
//! The application implements a single capability —
//! `dispatch(CanonicalRequest) -> CanonicalResponse` — and Gantry takes care
//! of the rest: constructing a backend bound to a host/port, registering a
//! root handler at a mount path, translating between the backend's native
//! request/response objects and the canonical shapes, and driving a uniform
//! lifecycle (`start`, `join`, `stop`).
//!
//! ## Features
//!
//! - **One dispatch contract**: applications never see backend-native types
//! - **Substitutable backends**: any type exposing bind/register/run/stop
//!   can serve the same application unchanged
//! - **Uniform lifecycle**: an explicit state machine with graceful shutdown
//!   instead of run-forever semantics
//! - **Faithful translation**: duplicate headers, ordering, and streaming
//!   bodies round-trip without loss
//! - **Contained failures**: malformed requests become 400s, dispatch errors
//!   and panics become 500s; nothing crosses into the accept loop
//!
//! ## Basic Usage
//!
//! ```rust,ignore
//! use gantry::{app_fn, CanonicalResponse, Gantry};
//! use gantry::config::ServerConfig;
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder()
//!         .host("127.0.0.1")
//!         .port(8080)
//!         .build()?;
//!
//!     let app = app_fn(|request| async move {
//!         let body = format!("{} {}\n", request.method(), request.path());
//!         Ok(CanonicalResponse::builder()
//!             .status(StatusCode::OK)
//!             .text(&body))
//!     });
//!
//!     let server = Gantry::new(config, app);
//!     server.run().await?; // start, wait for Ctrl+C, stop gracefully
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`Gantry`]: the lifecycle controller owning the backend instance
//! - [`config::ServerConfig`]: host, port, mount path, and backend selection
//! - [`app::App`]: the dispatch capability an application implements
//! - [`translate`]: request/response translation between native and
//!   canonical shapes
//! - [`handler::RootHandler`]: the single entry point a backend invokes per
//!   request
//! - [`backend::Backend`]: the four-operation contract a server backend
//!   exposes
//!
//! ## Lifecycle
//!
//! `Unstarted -> Starting -> Running -> Stopping -> Stopped`
//!
//! Start-time failures (configuration, bind) leave the state `Unstarted`
//! with nothing registered. `stop` drains in-flight requests up to a grace
//! period, then forcibly closes what remains; calling it again is a no-op.
//!
//! ## Modules
//!
//! - [`app`]: canonical request/response types and the dispatch contract
//! - [`backend`]: the backend contract and the built-in hyper backend
//! - [`config`]: server and backend configuration builders
//! - [`errors`]: error types
//! - [`handler`]: the handler adapter
//! - [`translate`]: native/canonical translation

use std::{
    net::SocketAddr,
    sync::{Arc, OnceLock},
    time::Duration,
};

use log::info;
use tokio::sync::{watch, Mutex};

use crate::{
    app::App,
    backend::{Backend, BackendServer},
    config::ServerConfig,
    errors::{GantryError, StateError},
    handler::RootHandler,
};

pub mod app;
pub mod backend;
pub mod config;
pub mod errors;
pub mod handler;
pub mod translate;
mod tests;
pub mod utils;

pub use crate::app::{app_fn, CanonicalRequest, CanonicalResponse};

/// Grace period used by [`Gantry::run`] when shutting down on a signal.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// Lifecycle states of a server adapter instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Lifecycle {
    /// Constructed, nothing bound yet
    Unstarted,
    /// Bound and registered, accept loop not yet confirmed
    Starting,
    /// Accepting connections
    Running,
    /// Draining in-flight requests
    Stopping,
    /// Fully shut down
    Stopped,
}

/// Lifecycle controller and handle to one running backend instance.
///
/// A `Gantry` owns exactly one backend. The application dispatch capability
/// is injected at construction and lives only inside this handle; there is no
/// ambient registration. `start` may be called once per handle; a second call
/// fails with a state error and leaves the running server untouched.
///
/// All operations take `&self`, so a `Gantry` can be shared behind an
/// [`Arc`] to `join` from one task and `stop` from another.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
/// use gantry::{app_fn, CanonicalResponse, Gantry};
/// use gantry::config::ServerConfig;
///
/// # async fn example() -> Result<(), gantry::errors::GantryError> {
/// let config = ServerConfig::builder().port(8080).build()?;
/// let server = Gantry::new(config, app_fn(|_request| async move {
///     Ok(CanonicalResponse::builder().text("Hello, World!"))
/// }));
///
/// server.start().await?;
/// // Server is running, do other work...
/// server.stop(Duration::from_secs(5)).await?;
/// # Ok(())
/// # }
/// ```
pub struct Gantry {
    config: ServerConfig,
    app: Arc<dyn App>,
    state: watch::Sender<Lifecycle>,
    backend: Mutex<Option<BackendServer>>,
    local_addr: OnceLock<SocketAddr>,
}

impl Gantry {
    /// Creates a new server adapter for the given configuration and
    /// application.
    pub fn new<A: App>(config: ServerConfig, app: A) -> Gantry {
        Self::with_app(config, Arc::new(app))
    }

    /// Creates a new server adapter from an already shared application.
    pub fn with_app(config: ServerConfig, app: Arc<dyn App>) -> Gantry {
        let (state, _) = watch::channel(Lifecycle::Unstarted);
        Gantry {
            config,
            app,
            state,
            backend: Mutex::new(None),
            local_addr: OnceLock::new(),
        }
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> Lifecycle {
        *self.state.borrow()
    }

    /// Returns the bound address once the server has started.
    ///
    /// Useful with port 0, where the operating system picks the port.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Starts the server: validates the configuration, constructs the
    /// configured backend, binds it, registers the handler adapter at the
    /// mount path, and begins accepting connections.
    ///
    /// Valid only from `Unstarted`. On any failure the state remains
    /// `Unstarted` and no partial registration is left behind.
    ///
    /// # Errors
    ///
    /// Returns a configuration error before anything is bound, a bind error
    /// when the port is taken or the host does not resolve, or a state error
    /// when the server already started.
    pub async fn start(&self) -> Result<(), GantryError> {
        let backend = BackendServer::from_config(&self.config);
        self.start_with_backend(backend).await
    }

    /// Starts the server on a caller-provided backend instead of the
    /// configured one.
    ///
    /// Any implementation of the [`Backend`](crate::backend::Backend)
    /// contract is substitutable here; host, port, and options from the
    /// configuration are ignored in favor of whatever the backend was
    /// constructed with.
    pub async fn start_with_backend(&self, mut backend: BackendServer) -> Result<(), GantryError> {
        let mut slot = self.backend.lock().await;

        let current = self.state();
        if current != Lifecycle::Unstarted {
            return Err(StateError::AlreadyStarted(current).into());
        }

        self.config.validate()?;

        // Bind before any registration so a failure leaves nothing dangling.
        backend.bind().await?;

        let handler = RootHandler::new(
            self.app.clone(),
            self.config.mount_path(),
            self.config.options().max_body_bytes(),
        );
        backend.register(self.config.mount_path(), handler);

        self.state.send_replace(Lifecycle::Starting);

        if let Err(err) = backend.run().await {
            self.state.send_replace(Lifecycle::Unstarted);
            return Err(err);
        }

        if let Some(addr) = backend.local_addr() {
            let _ = self.local_addr.set(addr);
            info!("server running on {} (mounted at {})", addr, self.config.mount_path());
        }

        *slot = Some(backend);
        self.state.send_replace(Lifecycle::Running);

        Ok(())
    }

    /// Blocks the calling task until the server reaches `Stopped`.
    ///
    /// For servers that should run for the lifetime of the process. Callable
    /// once the server is `Running`; returns immediately when already
    /// `Stopped`.
    ///
    /// # Errors
    ///
    /// Returns a state error when the server has not been started.
    pub async fn join(&self) -> Result<(), GantryError> {
        let mut rx = self.state.subscribe();
        loop {
            match *rx.borrow_and_update() {
                Lifecycle::Stopped => return Ok(()),
                Lifecycle::Running | Lifecycle::Stopping => {}
                other => return Err(StateError::NotRunning(other).into()),
            }
            if rx.changed().await.is_err() {
                return Ok(());
            }
        }
    }

    /// Stops the server gracefully.
    ///
    /// Signals the backend to stop accepting, waits up to `timeout` for
    /// in-flight requests to complete, then forcibly closes the remaining
    /// connections. Valid from `Starting` or `Running`; a no-op from
    /// `Stopping` or `Stopped`.
    ///
    /// # Errors
    ///
    /// Returns a state error when the server was never started, or a stop
    /// error when the backend fails to shut down.
    pub async fn stop(&self, timeout: Duration) -> Result<(), GantryError> {
        let mut slot = self.backend.lock().await;

        match self.state() {
            Lifecycle::Stopping | Lifecycle::Stopped => return Ok(()),
            Lifecycle::Starting | Lifecycle::Running => {}
            other => return Err(StateError::NotRunning(other).into()),
        }

        self.state.send_replace(Lifecycle::Stopping);
        info!("stopping server...");

        let result = match slot.take() {
            Some(mut backend) => backend.stop(timeout).await,
            None => Ok(()),
        };

        self.state.send_replace(Lifecycle::Stopped);
        result
    }

    /// Starts the server and runs until interrupted.
    ///
    /// Combines [`Gantry::start`] with signal handling: waits for Ctrl+C,
    /// then stops with [`DEFAULT_GRACE_PERIOD`].
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to start or to stop.
    pub async fn run(&self) -> Result<(), GantryError> {
        self.start().await?;

        info!(
            "server listening on {}:{}, press Ctrl+C to stop",
            self.config.host(),
            self.config.port()
        );

        let _ = tokio::signal::ctrl_c().await;

        self.stop(DEFAULT_GRACE_PERIOD).await
    }
}
