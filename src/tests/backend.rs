use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{
    app::{app_fn, CanonicalRequest, CanonicalResponse},
    backend::{Backend, BackendFuture, BackendServer},
    config::ServerConfig,
    errors::GantryError,
    handler::RootHandler,
    Gantry, Lifecycle,
};

struct MockBackend {
    calls: Arc<Mutex<Vec<String>>>,
    fail_bind: bool,
}

impl MockBackend {
    fn new(calls: Arc<Mutex<Vec<String>>>) -> MockBackend {
        MockBackend {
            calls,
            fail_bind: false,
        }
    }

    fn failing_bind(calls: Arc<Mutex<Vec<String>>>) -> MockBackend {
        MockBackend {
            calls,
            fail_bind: true,
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl Backend for MockBackend {
    fn bind(&mut self) -> BackendFuture<'_, ()> {
        self.record("bind");
        let fail = self.fail_bind;
        Box::pin(async move {
            if fail {
                Err(GantryError::Bind("mock address in use".to_string()))
            } else {
                Ok(())
            }
        })
    }

    fn register(&mut self, mount_path: &str, _handler: RootHandler) {
        self.record(format!("register {mount_path}"));
    }

    fn run(&mut self) -> BackendFuture<'_, ()> {
        self.record("run");
        Box::pin(async move { Ok(()) })
    }

    fn stop(&mut self, _timeout: Duration) -> BackendFuture<'_, ()> {
        self.record("stop");
        Box::pin(async move { Ok(()) })
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some("127.0.0.1:9999".parse().unwrap())
    }
}

fn noop_app() -> impl crate::app::App {
    app_fn(|_request: CanonicalRequest| async move {
        Ok(CanonicalResponse::builder().empty())
    })
}

#[tokio::test]
async fn test_backend_contract_ordering() {
    let config = ServerConfig::builder().mount_path("/api").build().unwrap();
    let gantry = Gantry::new(config, noop_app());

    let calls = Arc::new(Mutex::new(Vec::new()));
    let mock = MockBackend::new(calls.clone());

    gantry
        .start_with_backend(BackendServer::custom(Box::new(mock)))
        .await
        .unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        ["bind", "register /api", "run"]
    );
    assert_eq!(gantry.state(), Lifecycle::Running);
    assert_eq!(gantry.local_addr(), Some("127.0.0.1:9999".parse().unwrap()));

    gantry.stop(Duration::from_secs(1)).await.unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        ["bind", "register /api", "run", "stop"]
    );
    assert_eq!(gantry.state(), Lifecycle::Stopped);
}

#[tokio::test]
async fn test_bind_failure_leaves_unstarted() {
    let config = ServerConfig::default();
    let gantry = Gantry::new(config, noop_app());

    let calls = Arc::new(Mutex::new(Vec::new()));
    let mock = MockBackend::failing_bind(calls.clone());

    let result = gantry
        .start_with_backend(BackendServer::custom(Box::new(mock)))
        .await;

    assert_eq!(
        result,
        Err(GantryError::Bind("mock address in use".to_string()))
    );
    assert_eq!(gantry.state(), Lifecycle::Unstarted);
    // No partial registration is left behind.
    assert_eq!(*calls.lock().unwrap(), ["bind"]);
}
