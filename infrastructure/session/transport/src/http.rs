use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, header::CONTENT_TYPE};
use session_errors::SessionError;
use session_handlers::HttpPort;
use session_models::{ApiRequest, ApiResponse, HttpMethod};
use url::Url;

/// [`HttpPort`] backed by a plain reqwest client, for running sessions
/// outside the load runtime.
#[derive(Debug, Clone)]
pub struct ReqwestHttp {
    client: Client,
    base_url: Url,
}

impl ReqwestHttp {
    pub fn new(base_url: Url) -> Result<Self, SessionError> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .build()
            .map_err(SessionError::transport)?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl HttpPort for ReqwestHttp {
    async fn send(
        &mut self, request: ApiRequest,
    ) -> Result<ApiResponse, SessionError> {
        let url = self
            .base_url
            .join(&request.path)
            .map_err(SessionError::transport)?;
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder =
            self.client.request(method, url).timeout(request.timeout);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.json {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_error(e, request.timeout))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_error(e, request.timeout))?;

        Ok(ApiResponse { status, body })
    }
}

fn map_error(err: reqwest::Error, timeout: Duration) -> SessionError {
    if err.is_timeout() {
        SessionError::Timeout(timeout)
    }
    else {
        SessionError::transport(err)
    }
}
