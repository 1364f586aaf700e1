use std::time::Duration;

use async_trait::async_trait;
use session_errors::SessionError;
use session_models::{ApiRequest, ApiResponse, AuthHeaders};

/// Request/response transport the session issues its HTTP calls through.
///
/// Implementations enforce `request.timeout` and report expiry as
/// [`SessionError::Timeout`].
#[async_trait]
pub trait HttpPort: Send {
    async fn send(
        &mut self, request: ApiRequest,
    ) -> Result<ApiResponse, SessionError>;
}

/// Open bidirectional text channel owned by a single session.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn send_text(&mut self, frame: String) -> Result<(), SessionError>;

    async fn receive_text(&mut self) -> Result<String, SessionError>;

    /// Closing an already closed channel must succeed.
    async fn close(&mut self) -> Result<(), SessionError>;
}

#[async_trait]
pub trait ChannelConnector: Send + Sync {
    async fn connect(
        &self, path: &str, headers: &AuthHeaders, timeout: Duration,
    ) -> Result<Box<dyn Channel>, SessionError>;
}
