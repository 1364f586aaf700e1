use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{
        Request, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tokio::{net::TcpListener, task::JoinHandle};

/// What the stub answers on `POST /api/auth/login`.
#[derive(Debug, Clone)]
pub enum LoginReply {
    /// 200 with a user record carrying this id.
    UserId(u64),
    /// 200 with a bearer token.
    Token(String),
    /// Bare status with an empty body.
    Status(u16),
}

/// One request the stub received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Clone)]
struct HubState {
    login: LoginReply,
    hits: Arc<Mutex<Vec<Hit>>>,
    closes: Arc<AtomicUsize>,
}

/// Axum stand-in for the freelance hub API, bound to an ephemeral port.
///
/// Profile routes answer so that a probe walking the default candidates
/// sees 500, then 404, then 200.
pub struct StubHub {
    pub addr: SocketAddr,
    hits: Arc<Mutex<Vec<Hit>>>,
    closes: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl StubHub {
    pub async fn start(login: LoginReply) -> Result<Self> {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let closes = Arc::new(AtomicUsize::new(0));
        let state = HubState {
            login,
            hits: Arc::clone(&hits),
            closes: Arc::clone(&closes),
        };

        let app = Router::new()
            .route("/api/auth/login", post(login_handler))
            .route("/api/auth/me", get(authorized))
            .route("/api/health", get(|| async { "OK" }))
            .route("/api/projects", get(authorized))
            .route("/api/projects/open", get(authorized))
            .route(
                "/api/profile/freelancer/{id}",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .route(
                "/api/profile/freelancer",
                get(|| async { StatusCode::NOT_FOUND }),
            )
            .route("/api/profile/{id}", get(authorized))
            .route("/api/profile", get(authorized))
            .route("/socket.io/", get(socket_handler))
            .layer(middleware::from_fn_with_state(state.clone(), record_hit))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind stub hub listener")?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Stub hub stopped: {}", e);
            }
        });

        Ok(Self {
            addr,
            hits,
            closes,
            handle,
        })
    }

    pub fn base_url(&self) -> String { format!("http://{}", self.addr) }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().expect("hit log poisoned").clone()
    }

    pub fn hits_to(&self, path: &str) -> Vec<Hit> {
        self.hits().into_iter().filter(|h| h.path == path).collect()
    }

    /// Close frames received from WebSocket clients.
    pub fn channel_closes(&self) -> usize { self.closes.load(Ordering::SeqCst) }
}

impl Drop for StubHub {
    fn drop(&mut self) { self.handle.abort(); }
}

async fn record_hit(
    State(state): State<HubState>, request: Request, next: Next,
) -> Response {
    let hit = Hit {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        authorization: request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    state.hits.lock().expect("hit log poisoned").push(hit);
    next.run(request).await
}

async fn login_handler(State(state): State<HubState>) -> Response {
    match state.login {
        LoginReply::UserId(id) => Json(json!({
            "id": id,
            "email": "free@gmail.com",
            "role": "freelancer"
        }))
        .into_response(),
        LoginReply::Token(token) => Json(json!({ "token": token })).into_response(),
        LoginReply::Status(status) => StatusCode::from_u16(status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
    }
}

async fn authorized(headers: HeaderMap) -> Response {
    if headers.contains_key(AUTHORIZATION) {
        Json(json!({ "items": [] })).into_response()
    }
    else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn socket_handler(
    State(state): State<HubState>, headers: HeaderMap, ws: WebSocketUpgrade,
) -> Response {
    if !headers.contains_key(AUTHORIZATION) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    ws.on_upgrade(move |socket| pong_loop(socket, state.closes))
}

async fn pong_loop(mut socket: WebSocket, closes: Arc<AtomicUsize>) {
    while let Some(Ok(message)) = socket.recv().await {
        let reply = match message {
            Message::Text(text) if text.as_str().contains("connection_test") => {
                json!({ "event": "connected" })
            }
            Message::Text(_) => json!({ "event": "pong" }),
            Message::Close(_) => {
                closes.fetch_add(1, Ordering::SeqCst);
                break;
            }
            _ => continue,
        };
        if socket
            .send(Message::Text(reply.to_string().into()))
            .await
            .is_err()
        {
            break;
        }
    }
}
