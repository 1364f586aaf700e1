use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const AUTHORIZATION: &str = "Authorization";

/// Header set attached to authenticated requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthHeaders(BTreeMap<String, String>);

impl AuthHeaders {
    pub fn empty() -> Self { Self::default() }

    pub fn bearer(token: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(AUTHORIZATION.to_string(), format!("Bearer {token}"));
        Self(headers)
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Which field of a successful login body carries the session identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoginShape {
    /// Body holds the user record; a placeholder token is built from `id`.
    UserId,
    /// Body holds a bearer token under `token`.
    Token,
}

impl LoginShape {
    /// Body field this shape reads.
    pub fn field(&self) -> &'static str {
        match self {
            Self::UserId => "id",
            Self::Token => "token",
        }
    }

    /// Derive the identity from a decoded 200 login body.
    ///
    /// Returns `None` when the field this shape relies on is missing.
    pub fn derive_identity(
        &self, body: &Value, token_prefix: &str,
    ) -> Option<AuthIdentity> {
        let user_id = body.get("id").and_then(render_id);

        match self {
            Self::UserId => {
                let id = user_id?;
                let token = format!("{token_prefix}{id}");
                Some(AuthIdentity::with_token(token, Some(id)))
            }
            Self::Token => {
                let token = body
                    .get("token")
                    .and_then(Value::as_str)
                    .filter(|t| !t.is_empty())?;
                Some(AuthIdentity::with_token(token.to_string(), user_id))
            }
        }
    }
}

fn render_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Authentication state established during session startup.
///
/// Headers are only ever derived from a token, so a non-empty header set
/// implies an authenticated identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthIdentity {
    token: Option<String>,
    user_id: Option<String>,
    headers: AuthHeaders,
}

impl AuthIdentity {
    pub fn anonymous() -> Self { Self::default() }

    pub fn with_token(token: String, user_id: Option<String>) -> Self {
        let headers = AuthHeaders::bearer(&token);
        Self {
            token: Some(token),
            user_id,
            headers,
        }
    }

    pub fn is_authenticated(&self) -> bool { self.token.is_some() }

    pub fn token(&self) -> Option<&str> { self.token.as_deref() }

    pub fn user_id(&self) -> Option<&str> { self.user_id.as_deref() }

    pub fn headers(&self) -> &AuthHeaders { &self.headers }
}
