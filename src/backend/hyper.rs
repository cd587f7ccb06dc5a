//! HTTP/1.1 backend built on tokio and hyper.

use std::{
    convert::Infallible,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use http_body_util::BodyExt;
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::{rt::TokioIo, server::graceful::GracefulShutdown};
use log::{debug, error, info};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    app::BodyError,
    backend::{Backend, BackendFuture},
    config::BackendOptions,
    errors::GantryError,
    handler::RootHandler,
};

/// Server backend speaking HTTP/1.1 over TCP.
///
/// Each accepted connection is served on its own tokio task, so the handler
/// adapter is invoked concurrently for simultaneous connections. Within one
/// keep-alive connection hyper writes responses in request order.
pub struct HyperBackend {
    host: String,
    port: u16,
    options: BackendOptions,
    handler: Option<RootHandler>,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    accept_task: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
    force_close: CancellationToken,
}

impl HyperBackend {
    /// Creates an unbound backend for the given address and options.
    pub fn new(host: &str, port: u16, options: BackendOptions) -> Self {
        Self {
            host: host.to_owned(),
            port,
            options,
            handler: None,
            listener: None,
            local_addr: None,
            accept_task: None,
            shutdown: CancellationToken::new(),
            force_close: CancellationToken::new(),
        }
    }

    async fn resolve(&self) -> Result<SocketAddr, GantryError> {
        if let Ok(ip) = self.host.parse::<Ipv4Addr>() {
            return Ok(SocketAddr::from((ip, self.port)));
        }
        if let Ok(ip) = self.host.parse::<Ipv6Addr>() {
            return Ok(SocketAddr::from((ip, self.port)));
        }
        let mut addrs = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|err| GantryError::Bind(format!("{}:{}: {}", self.host, self.port, err)))?;
        addrs.next().ok_or_else(|| {
            GantryError::Bind(format!("{}:{}: no addresses resolved", self.host, self.port))
        })
    }
}

impl Backend for HyperBackend {
    fn bind(&mut self) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            let addr = self.resolve().await?;
            let listener = TcpListener::bind(addr)
                .await
                .map_err(|err| GantryError::Bind(format!("{addr}: {err}")))?;
            self.local_addr = listener.local_addr().ok();
            self.listener = Some(listener);
            Ok(())
        })
    }

    fn register(&mut self, mount_path: &str, handler: RootHandler) {
        debug!("registering handler at mount path {mount_path}");
        self.handler = Some(handler);
    }

    fn run(&mut self) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            let listener = self
                .listener
                .take()
                .ok_or_else(|| GantryError::Start("backend is not bound".to_owned()))?;
            let handler = self
                .handler
                .clone()
                .ok_or_else(|| GantryError::Start("no handler registered".to_owned()))?;

            self.accept_task = Some(tokio::spawn(accept_loop(
                listener,
                handler,
                self.options.clone(),
                self.shutdown.clone(),
                self.force_close.clone(),
            )));

            Ok(())
        })
    }

    fn stop(&mut self, timeout: Duration) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            self.shutdown.cancel();

            if let Some(mut task) = self.accept_task.take() {
                if tokio::time::timeout(timeout, &mut task).await.is_err() {
                    info!("grace period of {timeout:?} elapsed, closing remaining connections");
                    self.force_close.cancel();
                    if let Err(err) = task.await {
                        if !err.is_cancelled() {
                            return Err(GantryError::Stop(err.to_string()));
                        }
                    }
                }
            }

            Ok(())
        })
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

async fn accept_loop(
    listener: TcpListener,
    handler: RootHandler,
    options: BackendOptions,
    shutdown: CancellationToken,
    force_close: CancellationToken,
) {
    let graceful = GracefulShutdown::new();

    if let Ok(addr) = listener.local_addr() {
        info!("backend accepting connections on {addr}");
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => {
                let (stream, remote_addr) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        error!("cannot accept connection: {err}");
                        continue;
                    }
                };

                if options.tcp_nodelay() {
                    if let Err(err) = stream.set_nodelay(true) {
                        error!("cannot set TCP_NODELAY: {err}");
                    }
                }

                serve_connection(
                    stream,
                    remote_addr,
                    handler.clone(),
                    &options,
                    &graceful,
                    force_close.clone(),
                );
            }
        }
    }

    // Stop accepting before draining; the backlog is released with the listener.
    drop(listener);

    tokio::select! {
        _ = graceful.shutdown() => debug!("all connections drained"),
        _ = force_close.cancelled() => {}
    }
}

fn serve_connection(
    stream: tokio::net::TcpStream,
    remote_addr: SocketAddr,
    handler: RootHandler,
    options: &BackendOptions,
    graceful: &GracefulShutdown,
    force_close: CancellationToken,
) {
    let io = TokioIo::new(stream);

    let service = service_fn(move |request: http::Request<Incoming>| {
        let handler = handler.clone();
        async move {
            let request = request.map(|body| body.map_err(|err| Box::new(err) as BodyError).boxed());
            Ok::<_, Infallible>(handler.handle(request, remote_addr).await)
        }
    });

    let mut builder = http1::Builder::new();
    builder.keep_alive(options.keep_alive());

    let connection = graceful.watch(builder.serve_connection(io, service));

    tokio::spawn(async move {
        tokio::select! {
            result = connection => {
                if let Err(err) = result {
                    error!("{}", GantryError::TransportWrite(format!("{remote_addr}: {err}")));
                }
            }
            // Dropping the connection future closes the socket mid-flight.
            _ = force_close.cancelled() => debug!("connection from {remote_addr} forcibly closed"),
        }
    });
}
