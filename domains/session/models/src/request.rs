use std::time::Duration;

use serde_json::Value;
use session_errors::SessionError;
use typed_builder::TypedBuilder;

use crate::identity::AuthHeaders;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Transport-neutral request issued by a session.
///
/// `label` is the name the load runtime aggregates metrics under.
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
pub struct ApiRequest {
    #[builder(default = HttpMethod::Get)]
    pub method: HttpMethod,
    #[builder(setter(into))]
    pub path: String,
    #[builder(setter(into))]
    pub label: String,
    #[builder(default)]
    pub headers: AuthHeaders,
    #[builder(default, setter(strip_option))]
    pub json: Option<Value>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(&self) -> Result<Value, SessionError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_defaults() {
        let request = ApiRequest::builder()
            .path("/api/health")
            .label("GET /api/health")
            .timeout(Duration::from_secs(5))
            .build();

        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.headers.is_empty());
        assert!(request.json.is_none());
    }

    #[test]
    fn test_response_json_decode_failure() {
        let response = ApiResponse::new(200, "<html>oops</html>");

        assert!(matches!(response.json(), Err(SessionError::Decode(_))));
    }
}
