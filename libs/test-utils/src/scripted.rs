use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use session_errors::SessionError;
use session_handlers::{Channel, ChannelConnector, HttpPort};
use session_models::{ApiRequest, ApiResponse, AuthHeaders};

type Reply = Result<ApiResponse, SessionError>;

/// In-memory [`HttpPort`] answering from per-path queues.
///
/// The last queued reply for a path repeats once the queue is drained.
/// Paths with nothing scripted answer 500.
#[derive(Debug, Default)]
pub struct ScriptedHttp {
    routes: HashMap<String, VecDeque<Reply>>,
    requests: Vec<ApiRequest>,
}

impl ScriptedHttp {
    pub fn new() -> Self { Self::default() }

    pub fn respond(
        mut self, path: &str, status: u16, body: impl Into<String>,
    ) -> Self {
        self.push(path, Ok(ApiResponse::new(status, body)));
        self
    }

    pub fn respond_json(
        self, path: &str, status: u16, body: serde_json::Value,
    ) -> Self {
        self.respond(path, status, body.to_string())
    }

    pub fn fail(mut self, path: &str, err: SessionError) -> Self {
        self.push(path, Err(err));
        self
    }

    fn push(&mut self, path: &str, reply: Reply) {
        self.routes
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn requests(&self) -> &[ApiRequest] { &self.requests }

    pub fn paths(&self) -> Vec<&str> {
        self.requests.iter().map(|r| r.path.as_str()).collect()
    }

    pub fn requests_to(&self, path: &str) -> Vec<&ApiRequest> {
        self.requests.iter().filter(|r| r.path == path).collect()
    }
}

#[async_trait]
impl HttpPort for ScriptedHttp {
    async fn send(&mut self, request: ApiRequest) -> Reply {
        let reply = self.routes.get_mut(&request.path).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            }
            else {
                queue.front().cloned()
            }
        });
        self.requests.push(request);
        reply.unwrap_or_else(|| Ok(ApiResponse::new(500, "unscripted")))
    }
}

/// Everything the scripted channels observed.
#[derive(Debug, Default)]
pub struct ChannelLog {
    pub connects: Vec<(String, AuthHeaders)>,
    pub sent: Vec<String>,
    pub closes: usize,
}

/// [`ChannelConnector`] handing out in-memory channels.
///
/// Replies are shared by every channel it opens; an empty reply queue reads
/// as a closed connection.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    log: Arc<Mutex<ChannelLog>>,
    replies: Arc<Mutex<VecDeque<Result<String, SessionError>>>>,
    refuse: Option<SessionError>,
    stall: bool,
}

impl ScriptedConnector {
    pub fn new() -> Self { Self::default() }

    pub fn reply(self, frame: &str) -> Self {
        self.queue(Ok(frame.to_string()));
        self
    }

    pub fn reply_error(self, err: SessionError) -> Self {
        self.queue(Err(err));
        self
    }

    pub fn refusing(mut self, err: SessionError) -> Self {
        self.refuse = Some(err);
        self
    }

    /// Channels whose sends and closes never complete.
    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    fn queue(&self, reply: Result<String, SessionError>) {
        self.replies
            .lock()
            .expect("reply queue poisoned")
            .push_back(reply);
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, ChannelLog> {
        self.log.lock().expect("channel log poisoned")
    }
}

#[async_trait]
impl ChannelConnector for ScriptedConnector {
    async fn connect(
        &self, path: &str, headers: &AuthHeaders, _timeout: Duration,
    ) -> Result<Box<dyn Channel>, SessionError> {
        self.log().connects.push((path.to_string(), headers.clone()));
        if let Some(err) = &self.refuse {
            return Err(err.clone());
        }
        Ok(Box::new(ScriptedChannel {
            log: Arc::clone(&self.log),
            replies: Arc::clone(&self.replies),
            closed: false,
            stall: self.stall,
        }))
    }
}

struct ScriptedChannel {
    log: Arc<Mutex<ChannelLog>>,
    replies: Arc<Mutex<VecDeque<Result<String, SessionError>>>>,
    closed: bool,
    stall: bool,
}

#[async_trait]
impl Channel for ScriptedChannel {
    async fn send_text(&mut self, frame: String) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::ChannelClosed);
        }
        if self.stall {
            std::future::pending::<()>().await;
        }
        self.log.lock().expect("channel log poisoned").sent.push(frame);
        Ok(())
    }

    async fn receive_text(&mut self) -> Result<String, SessionError> {
        self.replies
            .lock()
            .expect("reply queue poisoned")
            .pop_front()
            .unwrap_or(Err(SessionError::ChannelClosed))
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.stall {
            std::future::pending::<()>().await;
        }
        if !self.closed {
            self.closed = true;
            self.log.lock().expect("channel log poisoned").closes += 1;
        }
        Ok(())
    }
}
