use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use session_errors::SessionError;
use session_handlers::{Channel, ChannelConnector};
use session_models::AuthHeaders;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        Error as WsError, Message,
        client::IntoClientRequest,
        http::{HeaderName, HeaderValue},
    },
};
use tracing::debug;
use url::Url;

/// Opens WebSocket channels relative to the target's HTTP base URL.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    base_url: Url,
}

impl WebSocketConnector {
    pub fn new(base_url: Url) -> Self { Self { base_url } }

    /// Resolve `path` against the base URL and switch to the ws scheme.
    pub fn channel_url(&self, path: &str) -> Result<Url, SessionError> {
        let mut url =
            self.base_url.join(path).map_err(SessionError::transport)?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(SessionError::Transport(format!(
                    "unsupported scheme for persistent connection: {other}"
                )));
            }
        };
        url.set_scheme(scheme).map_err(|_| {
            SessionError::Transport(format!("cannot switch {url} to {scheme}"))
        })?;
        Ok(url)
    }
}

#[async_trait]
impl ChannelConnector for WebSocketConnector {
    async fn connect(
        &self, path: &str, headers: &AuthHeaders, timeout: Duration,
    ) -> Result<Box<dyn Channel>, SessionError> {
        let url = self.channel_url(path)?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(SessionError::transport)?;
        for (name, value) in headers.iter() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(SessionError::transport)?;
            let value =
                HeaderValue::from_str(value).map_err(SessionError::transport)?;
            request.headers_mut().insert(name, value);
        }

        let (stream, response) =
            tokio::time::timeout(timeout, connect_async(request))
                .await
                .map_err(|_| SessionError::Timeout(timeout))?
                .map_err(map_error)?;
        debug!(
            url = %url,
            status = response.status().as_u16(),
            "WebSocket upgrade complete"
        );

        Ok(Box::new(WebSocketChannel {
            stream,
            closed: false,
        }))
    }
}

pub struct WebSocketChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

#[async_trait]
impl Channel for WebSocketChannel {
    async fn send_text(&mut self, frame: String) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::ChannelClosed);
        }
        self.stream.send(Message::Text(frame)).await.map_err(map_error)
    }

    /// Next text (or binary, lossily decoded) frame; control frames are
    /// skipped.
    async fn receive_text(&mut self) -> Result<String, SessionError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Binary(bytes))) => {
                    return Ok(String::from_utf8_lossy(&bytes).into_owned());
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.closed = true;
                    return Err(SessionError::ChannelClosed);
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(map_error(e)),
            }
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.stream.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(SessionError::transport(e)),
        }
    }
}

fn map_error(err: WsError) -> SessionError {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => {
            SessionError::ChannelClosed
        }
        other => SessionError::transport(other),
    }
}
