//! In-process mock backend for exercising real HTTP round trips in tests.

use axum::{
    extract::{Request, State},
    http::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE},
    middleware::{self, Next},
    response::Response,
    Router,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::ApiConfig;
use crate::gateway::{Gateway, GatewayAuthority};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Clone, Default)]
pub struct RequestLog(Arc<Mutex<Vec<RecordedRequest>>>);

impl RequestLog {
    pub fn count(&self, path: &str) -> usize {
        self.0.lock().iter().filter(|r| r.path == path).count()
    }

    pub fn last(&self, path: &str) -> Option<RecordedRequest> {
        self.0.lock().iter().rev().find(|r| r.path == path).cloned()
    }

    pub fn total(&self) -> usize {
        self.0.lock().len()
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub log: RequestLog,
    task: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub async fn spawn(router: Router) -> MockBackend {
    let log = RequestLog::default();
    let app = router.layer(middleware::from_fn_with_state(log.clone(), record));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        base_url: format!("http://{}", addr),
        log,
        task,
    }
}

async fn record(State(log): State<RequestLog>, request: Request, next: Next) -> Response {
    let entry = {
        let header = |name: HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        RecordedRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            authorization: header(AUTHORIZATION),
            content_type: header(CONTENT_TYPE),
        }
    };
    log.0.lock().push(entry);
    next.run(request).await
}

pub fn gateway_for(backend: &MockBackend) -> (Arc<Gateway>, GatewayAuthority) {
    let config = ApiConfig {
        base_url: backend.base_url.clone(),
        timeout_secs: Some(5),
    };
    Gateway::new(&config).unwrap()
}
