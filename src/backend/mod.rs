//! The backend capability contract and the built-in backends.
//!
//! A backend is the concrete HTTP server: socket accept, HTTP parsing,
//! keep-alive, and connection management. The adapter only requires the four
//! operations on [`Backend`]; any implementation of that contract can be
//! substituted without changing the rest of the crate. The backend owns its
//! own concurrency strategy; the adapter makes no assumption beyond the
//! handler being safely callable from concurrent execution contexts.

use std::{future::Future, net::SocketAddr, pin::Pin, time::Duration};

use crate::{
    config::{BackendKind, ServerConfig},
    errors::GantryError,
    handler::RootHandler,
};

pub mod hyper;

use self::hyper::HyperBackend;

/// Boxed future type returned by [`Backend`] operations.
pub type BackendFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, GantryError>> + Send + 'a>>;

/// The four operations a substitutable server backend must expose.
///
/// The lifecycle controller drives these strictly in the order
/// `bind` → `register` → `run` → `stop`.
pub trait Backend: Send {
    /// Resolves and binds the configured address.
    ///
    /// # Errors
    ///
    /// Fails with a bind error when the port is in use or the host does not
    /// resolve.
    fn bind(&mut self) -> BackendFuture<'_, ()>;

    /// Registers the handler adapter at a mount path.
    ///
    /// Exactly one handler is registered per backend instance.
    fn register(&mut self, mount_path: &str, handler: RootHandler);

    /// Starts the accept loop. Returns once the backend is accepting.
    ///
    /// # Errors
    ///
    /// Fails when called before `bind` or without a registered handler.
    fn run(&mut self) -> BackendFuture<'_, ()>;

    /// Stops the backend.
    ///
    /// New connections are refused immediately; in-flight requests get up to
    /// `timeout` to finish, after which their connections are forcibly
    /// closed. A partially written response on a forcibly closed connection
    /// is an accepted degradation, not an error.
    fn stop(&mut self, timeout: Duration) -> BackendFuture<'_, ()>;

    /// Returns the bound address once `bind` has succeeded.
    fn local_addr(&self) -> Option<SocketAddr>;
}

/// A backend instance owned by the lifecycle controller.
pub enum BackendServer {
    /// The built-in tokio/hyper backend
    Hyper(HyperBackend),
    /// A caller-provided backend implementation
    Custom(Box<dyn Backend>),
}

impl BackendServer {
    /// Constructs the backend selected by the configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        match config.backend() {
            BackendKind::Hyper => BackendServer::Hyper(HyperBackend::new(
                config.host(),
                config.port(),
                config.options().clone(),
            )),
        }
    }

    /// Wraps a caller-provided backend implementation.
    pub fn custom(backend: Box<dyn Backend>) -> Self {
        BackendServer::Custom(backend)
    }
}

impl Backend for BackendServer {
    fn bind(&mut self) -> BackendFuture<'_, ()> {
        match self {
            BackendServer::Hyper(backend) => backend.bind(),
            BackendServer::Custom(backend) => backend.bind(),
        }
    }

    fn register(&mut self, mount_path: &str, handler: RootHandler) {
        match self {
            BackendServer::Hyper(backend) => backend.register(mount_path, handler),
            BackendServer::Custom(backend) => backend.register(mount_path, handler),
        }
    }

    fn run(&mut self) -> BackendFuture<'_, ()> {
        match self {
            BackendServer::Hyper(backend) => backend.run(),
            BackendServer::Custom(backend) => backend.run(),
        }
    }

    fn stop(&mut self, timeout: Duration) -> BackendFuture<'_, ()> {
        match self {
            BackendServer::Hyper(backend) => backend.stop(timeout),
            BackendServer::Custom(backend) => backend.stop(timeout),
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            BackendServer::Hyper(backend) => backend.local_addr(),
            BackendServer::Custom(backend) => backend.local_addr(),
        }
    }
}
