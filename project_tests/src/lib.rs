//! # Mock QLStats Upstream
//!
//! A scriptable stand-in for the QLStats API, served by `axum` on a loopback
//! port. Each server address (and the directory) is mapped to a [`Reply`];
//! every request is recorded so tests can assert on the fan-out.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// What the mock answers for one endpoint.
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with this JSON body.
    Json(Value),
    /// Bare status with a plain-text body.
    Status(u16),
    /// 200 with a body that is not JSON.
    Garbage,
    /// Wait, then answer.
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    pub fn delayed(delay: Duration, reply: Reply) -> Self {
        Reply::Delayed(delay, Box::new(reply))
    }

    async fn respond(&self) -> Response {
        let mut reply = self;
        while let Reply::Delayed(delay, inner) = reply {
            tokio::time::sleep(*delay).await;
            reply = inner.as_ref();
        }
        match reply {
            Reply::Json(body) => Json(body.clone()).into_response(),
            Reply::Status(code) => {
                let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, "upstream error").into_response()
            }
            Reply::Garbage => (StatusCode::OK, "<html>definitely not json</html>").into_response(),
            Reply::Delayed(..) => unreachable!("delays are unwrapped above"),
        }
    }
}

struct MockState {
    directory: Reply,
    servers: HashMap<String, Reply>,
    hits: Mutex<Vec<String>>,
}

/// A running mock upstream. Lives until the test runtime shuts down.
pub struct MockUpstream {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockUpstream {
    /// Starts the mock. Servers without an entry in `servers` answer 404.
    pub async fn start(directory: Reply, servers: HashMap<String, Reply>) -> Self {
        let state = Arc::new(MockState {
            directory,
            servers,
            hits: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/server/skillrating", get(directory_handler))
            .route("/api/server/{addr}/players", get(players_handler))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock upstream");
        let addr = listener.local_addr().expect("mock upstream address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock upstream crashed");
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Server addresses (or `skillrating`) requested so far, in arrival order.
    pub fn hits(&self) -> Vec<String> {
        self.state.hits.lock().expect("hits lock").clone()
    }
}

async fn directory_handler(State(state): State<Arc<MockState>>) -> Response {
    state.hits.lock().expect("hits lock").push("skillrating".to_string());
    state.directory.respond().await
}

async fn players_handler(State(state): State<Arc<MockState>>, Path(addr): Path<String>) -> Response {
    state.hits.lock().expect("hits lock").push(addr.clone());
    match state.servers.get(&addr) {
        Some(reply) => reply.respond().await,
        None => Reply::Status(404).respond().await,
    }
}

/// A base URL nothing listens on.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind probe");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{}/", addr)
}

/// An upstream players document with `count` players named after `prefix`.
pub fn players_doc(prefix: &str, count: usize) -> Value {
    let players: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "steamID": format!("{prefix}{i}"),
                "name": format!("{prefix} #{i}"),
                "team": i % 2,
                "rating": 1400 + i,
                "rd": 50 + i,
                "time": 1_500_000_000 + i
            })
        })
        .collect();
    json!({
        "ok": true,
        "players": players,
        "serverinfo": {"server": "", "gt": "ca", "map": "campgrounds", "mapstart": "0"}
    })
}

/// One directory entry.
pub fn directory_entry(server: &str, pc: i64, sc: i64) -> Value {
    json!({
        "server": server, "gt": "ca", "min": 1200, "avg": 1500, "max": 1800,
        "pc": pc, "sc": sc, "bc": 0
    })
}
