use std::{fmt, future::Future, sync::Arc, time::Duration};

use serde_json::json;
use session_errors::SessionError;
use session_models::{
    ActionKind, ApiRequest, ApiResponse, AuthHeaders, AuthIdentity,
    HttpMethod, SessionConfig,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    outcome::{ActionReport, Outcome},
    ports::{Channel, ChannelConnector, HttpPort},
};

const PROFILE_LABEL: &str = "GET profile";
const ANONYMOUS_LISTING_LABEL: &str = "GET projects (no auth)";

/// Per-user state: the identity from startup plus the optional channel.
#[derive(Default)]
pub struct SessionState {
    pub identity: AuthIdentity,
    channel: Option<Box<dyn Channel>>,
}

impl SessionState {
    pub fn has_channel(&self) -> bool { self.channel.is_some() }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("identity", &self.identity)
            .field("channel", &self.channel.is_some())
            .finish()
    }
}

/// One simulated client.
///
/// Startup ([`authenticate`](Self::authenticate), then optionally
/// [`open_channel`](Self::open_channel)) is the only phase that changes the
/// identity. Actions go through [`perform`](Self::perform) and never fail
/// the caller; [`teardown`](Self::teardown) releases the channel once.
#[derive(Debug)]
pub struct SyntheticSession {
    config: Arc<SessionConfig>,
    state: SessionState,
}

impl SyntheticSession {
    pub fn new(config: Arc<SessionConfig>) -> Self {
        Self {
            config,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState { &self.state }

    pub fn identity(&self) -> &AuthIdentity { &self.state.identity }

    /// Log in with the configured credentials.
    ///
    /// Any failure leaves the session anonymous with empty headers.
    #[instrument(skip_all, fields(session = %self.config.name))]
    pub async fn authenticate<H>(&mut self, http: &mut H) -> Outcome
    where
        H: HttpPort + ?Sized,
    {
        let result = match http.send(self.login_request()).await {
            Ok(response) => {
                info!(status = response.status, "Login response received");
                self.identity_from(&response)
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(identity) => {
                info!(
                    user_id = identity.user_id().unwrap_or("-"),
                    "Session authenticated"
                );
                self.state.identity = identity;
                Outcome::Succeeded { status: Some(200) }
            }
            Err(err) => {
                warn!(
                    error = err.kind(),
                    "Login failed, continuing unauthenticated: {}", err
                );
                self.state.identity = AuthIdentity::anonymous();
                Outcome::Failed(err)
            }
        }
    }

    /// Open the persistent connection and send the connectivity probe.
    ///
    /// Returns `None` when this session kind has no channel endpoint. Once
    /// connected the channel is kept even if the probe goes wrong, so that
    /// teardown still closes it.
    #[instrument(skip_all, fields(session = %self.config.name))]
    pub async fn open_channel<C>(&mut self, connector: &C) -> Option<Outcome>
    where
        C: ChannelConnector + ?Sized,
    {
        let path = self.config.endpoints.channel.as_deref()?;

        if !self.state.identity.is_authenticated() {
            info!("Skipping persistent connection for anonymous session");
            return Some(Outcome::Skipped {
                reason: "session is not authenticated",
            });
        }

        let timeout = self.config.timeouts.channel();
        let connect =
            connector.connect(path, self.state.identity.headers(), timeout);
        let mut channel = match bounded(timeout, connect).await {
            Ok(channel) => channel,
            Err(err) => {
                warn!(error = err.kind(), "Connection failed: {}", err);
                return Some(Outcome::Failed(err));
            }
        };

        let probe = event_frame(&self.config.keepalive.probe_event);
        let reply = match bounded(timeout, channel.send_text(probe)).await {
            Ok(()) => bounded(timeout, channel.receive_text()).await,
            Err(err) => Err(err),
        };
        let outcome = match reply {
            Ok(reply) if reply.contains("error") => {
                Outcome::Failed(SessionError::ChannelRejected(reply))
            }
            Ok(_) => Outcome::Succeeded { status: None },
            Err(err) => Outcome::Failed(err),
        };

        match &outcome {
            Outcome::Failed(err) => {
                warn!(error = err.kind(), "Connection probe failed: {}", err)
            }
            _ => info!("Persistent connection established"),
        }

        self.state.channel = Some(channel);
        Some(outcome)
    }

    /// Run one repeatable action and log its outcome.
    pub async fn perform<H>(
        &mut self, action: ActionKind, http: &mut H,
    ) -> ActionReport
    where
        H: HttpPort + ?Sized,
    {
        let report = match action {
            ActionKind::HealthCheck => {
                let path = &self.config.endpoints.health;
                self.get(http, action, path, get_label(path), AuthHeaders::empty())
                    .await
            }
            ActionKind::BrowseListing => {
                let path = &self.config.endpoints.listing;
                let headers = self.state.identity.headers().clone();
                self.get(http, action, path, get_label(path), headers).await
            }
            ActionKind::ViewProfile => self.view_profile(http).await,
            ActionKind::CurrentUser => {
                let path = &self.config.endpoints.current_user;
                let headers = self.state.identity.headers().clone();
                self.get(http, action, path, get_label(path), headers).await
            }
            ActionKind::AnonymousListing => {
                let path = &self.config.endpoints.listing;
                self.get(
                    http,
                    action,
                    path,
                    ANONYMOUS_LISTING_LABEL.to_string(),
                    AuthHeaders::empty(),
                )
                .await
            }
            ActionKind::Keepalive => self.keepalive().await,
            ActionKind::LoginProbe => {
                let outcome = match http.send(self.login_request()).await {
                    Ok(response) => Outcome::from_status(response.status),
                    Err(err) => Outcome::Failed(err),
                };
                ActionReport::new(action, 1, outcome)
            }
        };

        self.log_report(&report);
        report
    }

    /// Close the persistent connection if one is held.
    ///
    /// The channel is taken out of the state first, so repeated calls are
    /// no-ops returning `None`.
    pub async fn teardown(&mut self) -> Option<Outcome> {
        let mut channel = self.state.channel.take()?;

        let timeout = self.config.timeouts.channel();
        let outcome = match bounded(timeout, channel.close()).await {
            Ok(()) => Outcome::Succeeded { status: None },
            Err(err) => Outcome::Failed(err),
        };

        match &outcome {
            Outcome::Failed(err) => warn!(
                session = %self.config.name,
                error = err.kind(),
                "Failed to close persistent connection: {}", err
            ),
            _ => info!(
                session = %self.config.name,
                "Persistent connection closed"
            ),
        }

        Some(outcome)
    }

    fn login_request(&self) -> ApiRequest {
        let login = &self.config.login;
        ApiRequest::builder()
            .method(HttpMethod::Post)
            .path(login.path.as_str())
            .label(format!("POST {}", login.path))
            .json(json!({
                "email": self.config.credentials.email,
                "password": self.config.credentials.password,
            }))
            .timeout(self.config.timeouts.login())
            .build()
    }

    fn identity_from(
        &self, response: &ApiResponse,
    ) -> Result<AuthIdentity, SessionError> {
        if response.status != 200 {
            return Err(SessionError::AuthFailed {
                status: response.status,
            });
        }

        let body = response.json()?;
        debug!(%body, "Login response body");

        let shape = self.config.login.shape;
        shape
            .derive_identity(&body, &self.config.login.token_prefix)
            .ok_or_else(|| {
                SessionError::Decode(format!(
                    "login response has no usable `{}` field",
                    shape.field()
                ))
            })
    }

    async fn get<H>(
        &self, http: &mut H, action: ActionKind, path: &str, label: String,
        headers: AuthHeaders,
    ) -> ActionReport
    where
        H: HttpPort + ?Sized,
    {
        let request = ApiRequest::builder()
            .path(path)
            .label(label)
            .headers(headers)
            .timeout(self.config.timeouts.for_action(action))
            .build();

        let outcome = match http.send(request).await {
            Ok(response) => Outcome::from_status(response.status),
            Err(err) => Outcome::Failed(err),
        };
        ActionReport::new(action, 1, outcome)
    }

    /// Walk the profile candidates until one answers 200 or 404.
    ///
    /// Anonymous sessions skip the walk entirely.
    async fn view_profile<H>(&self, http: &mut H) -> ActionReport
    where
        H: HttpPort + ?Sized,
    {
        let action = ActionKind::ViewProfile;
        if !self.state.identity.is_authenticated() {
            return ActionReport::skipped(
                action,
                "session is not authenticated",
            );
        }
        let urls = self.config.profile_urls(self.state.identity.user_id());
        if urls.is_empty() {
            return ActionReport::skipped(action, "no profile candidate applies");
        }

        let timeout = self.config.timeouts.for_action(action);
        let mut requests = 0;
        let mut last_status = 0;

        for url in urls {
            requests += 1;
            debug!(session = %self.config.name, url = %url, "Trying profile URL");

            let request = ApiRequest::builder()
                .path(url.as_str())
                .label(PROFILE_LABEL)
                .headers(self.state.identity.headers().clone())
                .timeout(timeout)
                .build();

            match http.send(request).await {
                Ok(response) if matches!(response.status, 200 | 404) => {
                    return ActionReport::new(
                        action,
                        requests,
                        Outcome::from_status(response.status),
                    )
                    .with_resolved(url);
                }
                Ok(response) => last_status = response.status,
                Err(err) => {
                    return ActionReport::new(
                        action,
                        requests,
                        Outcome::Failed(err),
                    );
                }
            }
        }

        ActionReport::new(action, requests, Outcome::Rejected {
            status: last_status,
        })
    }

    /// Ping over the channel, hold it briefly, then wait for a frame.
    async fn keepalive(&mut self) -> ActionReport {
        let action = ActionKind::Keepalive;
        let Some(channel) = self.state.channel.as_mut() else {
            return ActionReport::skipped(action, "no persistent connection");
        };

        let timeout = self.config.timeouts.channel();
        let ping = event_frame(&self.config.keepalive.ping_event);
        if let Err(err) = bounded(timeout, channel.send_text(ping)).await {
            return ActionReport::new(action, 1, Outcome::Failed(err));
        }

        tokio::time::sleep(self.config.keepalive.pause()).await;

        let outcome = match bounded(timeout, channel.receive_text()).await {
            Ok(_) => Outcome::Succeeded { status: None },
            Err(err) => Outcome::Failed(err),
        };
        ActionReport::new(action, 1, outcome)
    }

    fn log_report(&self, report: &ActionReport) {
        let session = self.config.name.as_str();
        let action = report.action.as_str();
        let outcome = report.outcome.as_str();

        match &report.outcome {
            Outcome::Succeeded { status } => info!(
                session,
                action,
                outcome,
                status = status.unwrap_or(0),
                requests = report.requests,
                resolved = report.resolved.as_deref().unwrap_or("-"),
                "Action completed"
            ),
            Outcome::Rejected { status } => warn!(
                session,
                action,
                outcome,
                status,
                requests = report.requests,
                resolved = report.resolved.as_deref().unwrap_or("-"),
                "Action rejected"
            ),
            Outcome::Failed(err) => warn!(
                session,
                action,
                outcome,
                error = err.kind(),
                requests = report.requests,
                "Action failed: {}",
                err
            ),
            Outcome::Skipped { reason } => {
                debug!(session, action, outcome, reason, "Action skipped")
            }
        }
    }
}

/// Run a channel operation, reporting expiry as [`SessionError::Timeout`].
async fn bounded<T, F>(
    timeout: Duration, operation: F,
) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    tokio::time::timeout(timeout, operation)
        .await
        .unwrap_or(Err(SessionError::Timeout(timeout)))
}

fn get_label(path: &str) -> String { format!("GET {path}") }

fn event_frame(event: &str) -> String {
    json!({"event": event, "data": {}}).to_string()
}
