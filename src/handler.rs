//! The handler adapter: the single entry point a backend invokes per request.

use std::{net::SocketAddr, panic::AssertUnwindSafe, sync::Arc};

use futures_util::FutureExt;
use http::{Request, Response, StatusCode};
use log::{error, warn};

use crate::{
    app::{AdapterBody, App},
    translate,
};

/// Adapter between a backend's native requests and framework dispatch.
///
/// Exactly one handler is registered per mount path. The backend may invoke
/// [`RootHandler::handle`] concurrently for distinct connections; the handler
/// holds no mutable state, so concurrent invocations cannot interfere.
/// Cloning is cheap and shares the same application.
///
/// All per-request errors are absorbed here: translation failures become 400,
/// dispatch failures and panics become 500. Nothing escapes into the
/// backend's accept loop.
#[derive(Clone)]
pub struct RootHandler {
    app: Arc<dyn App>,
    mount_path: Arc<str>,
    max_body_bytes: Option<usize>,
}

impl RootHandler {
    /// Creates a handler forwarding into `app` for requests under `mount_path`.
    pub fn new(app: Arc<dyn App>, mount_path: &str, max_body_bytes: Option<usize>) -> Self {
        Self { app, mount_path: Arc::from(mount_path), max_body_bytes }
    }

    /// Returns the mount path this handler serves.
    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    fn is_mounted(&self, path: &str) -> bool {
        let mount = self.mount_path.as_ref();
        mount == "/"
            || path == mount
            || path
                .strip_prefix(mount)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Handles one native request, always producing a native response.
    pub async fn handle(
        &self,
        request: Request<AdapterBody>,
        remote_addr: SocketAddr,
    ) -> Response<AdapterBody> {
        if !self.is_mounted(request.uri().path()) {
            return translate::error_response(
                StatusCode::NOT_FOUND,
                "no handler mounted at this path",
            );
        }

        let canonical = match translate::to_canonical(request, remote_addr, self.max_body_bytes) {
            Ok(canonical) => canonical,
            Err(err) => {
                warn!("rejecting malformed request from {remote_addr}: {err}");
                return translate::error_response(StatusCode::BAD_REQUEST, "malformed request");
            }
        };

        match AssertUnwindSafe(self.app.dispatch(canonical))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => translate::from_canonical(response),
            Ok(Err(err)) => {
                error!("dispatch failed for request from {remote_addr}: {err}");
                translate::error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error",
                )
            }
            Err(_) => {
                error!("dispatch panicked for request from {remote_addr}");
                translate::error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error",
                )
            }
        }
    }
}
