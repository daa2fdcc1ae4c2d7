//! In-process axum backend that records every request it sees.

#![allow(dead_code)]

use axum::{
    Router,
    extract::{Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
};
use ganster_client::{ApiClient, MemorySessionStore, SessionStore};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

pub type RequestLog = Arc<Mutex<Vec<Recorded>>>;

pub struct MockBackend {
    pub base_url: Url,
    pub log: RequestLog,
}

impl MockBackend {
    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().last().cloned().expect("no request recorded")
    }

    pub fn client(&self) -> ApiClient {
        self.client_with(Arc::new(MemorySessionStore::default()))
    }

    pub fn client_with(&self, store: Arc<dyn SessionStore>) -> ApiClient {
        ApiClient::new(self.base_url.clone(), store)
    }
}

async fn record(State(log): State<RequestLog>, request: Request, next: Next) -> Response {
    let entry = Recorded {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        authorization: request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    log.lock().unwrap().push(entry);
    next.run(request).await
}

pub async fn spawn(router: Router) -> MockBackend {
    let log: RequestLog = Arc::default();
    let app = router.layer(middleware::from_fn_with_state(log.clone(), record));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        base_url: Url::parse(&format!("http://{}", addr)).unwrap(),
        log,
    }
}

/// An address nothing is listening on.
pub async fn dead_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}", addr)).unwrap()
}

pub fn user_json() -> Value {
    json!({
        "id": "665f1c2e9b1e8a0012345678",
        "username": "ferris",
        "email": "ferris@example.com",
        "role": "user",
        "created_at": "2024-05-01T10:00:00",
        "is_active": true
    })
}

pub fn tokens_json(token: &str) -> Value {
    json!({
        "access_token": token,
        "token_type": "bearer",
        "user": user_json()
    })
}

pub fn question_json(id: &str) -> Value {
    json!({
        "id": id,
        "title": "How do I share state between tasks?",
        "description": "I have a counter that several tokio tasks update.",
        "tags": ["rust", "tokio"],
        "user_id": "665f1c2e9b1e8a0012345678",
        "created_at": "2024-05-01T10:00:00",
        "answers": ["a1"],
        "accepted_answer": null,
        "answer_count": 1,
        "username": "ferris"
    })
}

pub fn answer_json(id: &str, question_id: &str) -> Value {
    json!({
        "id": id,
        "question_id": question_id,
        "user_id": "665f1c2e9b1e8a0012345678",
        "content": "Wrap it in an Arc<Mutex<_>>.",
        "votes": 2,
        "created_at": "2024-05-01T11:00:00",
        "is_accepted": false,
        "username": "ferris",
        "user_role": "user"
    })
}
