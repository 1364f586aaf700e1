//! Goose wiring for synthetic freelance hub sessions.
//!
//! Each [`SessionConfig`] becomes one scenario: an on-start transaction that
//! authenticates (and opens the persistent connection when configured), one
//! weighted transaction per enabled action, and an on-stop transaction that
//! tears the session down. Transactions always succeed from goose's point of
//! view; request failures still show up in its metrics under each label.

use std::{future::Future, pin::Pin, sync::Arc};

use async_trait::async_trait;
use goose::prelude::*;
use session_errors::SessionError;
use session_handlers::{HttpPort, SyntheticSession};
use session_models::{
    ActionKind, ApiRequest, ApiResponse, HttpMethod, SessionConfig,
};
use session_transport::WebSocketConnector;
use tracing::{subscriber::SetGlobalDefaultError, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt};

type TransactionFuture<'r> =
    Pin<Box<dyn Future<Output = TransactionResult> + Send + 'r>>;

/// [`HttpPort`] that routes requests through a goose user so they are
/// counted in the attack metrics.
pub struct GooseHttp<'u> {
    user: &'u mut GooseUser,
}

impl<'u> GooseHttp<'u> {
    pub fn new(user: &'u mut GooseUser) -> Self { Self { user } }
}

#[async_trait]
impl HttpPort for GooseHttp<'_> {
    async fn send(
        &mut self, request: ApiRequest,
    ) -> Result<ApiResponse, SessionError> {
        let mut builder = self
            .user
            .get_request_builder(&goose_method(request.method), &request.path)
            .map_err(SessionError::transport)?
            .timeout(request.timeout);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.json {
            builder = builder
                .header("Content-Type", "application/json")
                .body(body.to_string());
        }

        let goose_request = GooseRequest::builder()
            .method(goose_method(request.method))
            .path(request.path.as_str())
            .name(request.label.as_str())
            .set_request_builder(builder)
            .build();

        let goose = self
            .user
            .request(goose_request)
            .await
            .map_err(SessionError::transport)?;

        match goose.response {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.map_err(|e| {
                    if e.is_timeout() {
                        SessionError::Timeout(request.timeout)
                    }
                    else {
                        SessionError::transport(e)
                    }
                })?;
                Ok(ApiResponse { status, body })
            }
            Err(e) if e.is_timeout() => {
                Err(SessionError::Timeout(request.timeout))
            }
            Err(e) => Err(SessionError::transport(e)),
        }
    }
}

fn goose_method(method: HttpMethod) -> GooseMethod {
    match method {
        HttpMethod::Get => GooseMethod::Get,
        HttpMethod::Post => GooseMethod::Post,
    }
}

/// Goose session data. The session is taken out for the duration of a
/// transaction so the user can be borrowed for requests.
struct SessionSlot(Option<SyntheticSession>);

fn take_session(user: &mut GooseUser) -> Option<SyntheticSession> {
    user.get_session_data_mut::<SessionSlot>()
        .and_then(|slot| slot.0.take())
}

fn store_session(user: &mut GooseUser, session: SyntheticSession) {
    user.set_session_data(SessionSlot(Some(session)));
}

fn bind<F>(function: F) -> Transaction
where
    F: for<'r> Fn(&'r mut GooseUser) -> TransactionFuture<'r>
        + Send
        + Sync
        + 'static,
{
    Transaction::new(Arc::new(function))
}

async fn start_session(user: &mut GooseUser, config: Arc<SessionConfig>) {
    let mut session = SyntheticSession::new(config);
    session.authenticate(&mut GooseHttp::new(user)).await;

    let connector = WebSocketConnector::new(user.base_url.clone());
    session.open_channel(&connector).await;

    store_session(user, session);
}

async fn run_action(user: &mut GooseUser, action: ActionKind) {
    let Some(mut session) = take_session(user) else {
        warn!(action = %action, "No session for this user, skipping action");
        return;
    };
    session.perform(action, &mut GooseHttp::new(user)).await;
    store_session(user, session);
}

async fn stop_session(user: &mut GooseUser) {
    if let Some(mut session) = take_session(user) {
        session.teardown().await;
    }
}

pub fn start_transaction(config: Arc<SessionConfig>) -> Transaction {
    bind(move |user| {
        let config = Arc::clone(&config);
        Box::pin(async move {
            start_session(user, config).await;
            Ok(())
        })
    })
    .set_name("session_start")
    .set_on_start()
}

pub fn action_transaction(
    action: ActionKind, weight: usize,
) -> Result<Transaction, GooseError> {
    bind(move |user| {
        Box::pin(async move {
            run_action(user, action).await;
            Ok(())
        })
    })
    .set_name(action.as_str())
    .set_weight(weight)
}

pub fn stop_transaction() -> Transaction {
    bind(|user| {
        Box::pin(async move {
            stop_session(user).await;
            Ok(())
        })
    })
    .set_name("session_stop")
    .set_on_stop()
}

/// Install the fmt subscriber filtered by `RUST_LOG`.
///
/// The `log` facade is left alone so goose can install its own logger and
/// honour `-v` and `--log-file`.
pub fn init_tracing() -> Result<(), SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)
}

/// Build the goose scenario for one session kind.
pub fn build_scenario(
    config: Arc<SessionConfig>,
) -> Result<Scenario, GooseError> {
    let mut scenario = Scenario::new(&config.name)
        .set_weight(config.scenario_weight)?
        .set_wait_time(config.wait_time.min(), config.wait_time.max())?
        .register_transaction(start_transaction(Arc::clone(&config)))
        .register_transaction(stop_transaction());

    for (action, weight) in config.weights.enabled() {
        scenario =
            scenario.register_transaction(action_transaction(action, weight)?);
    }

    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portal_scenario_registers_weighted_actions() {
        let scenario =
            build_scenario(Arc::new(SessionConfig::freelance_portal()))
                .unwrap();

        assert_eq!(scenario.name, "freelance-portal");
        assert_eq!(scenario.weight, 5);

        let weighted: Vec<(&str, usize)> = scenario
            .transactions
            .iter()
            .filter(|t| !t.on_start && !t.on_stop)
            .map(|t| (t.name.as_str(), t.weight))
            .collect();
        assert_eq!(weighted, vec![
            ("health_check", 10),
            ("browse_listing", 8),
            ("view_profile", 6),
            ("current_user", 5),
            ("anonymous_listing", 3),
        ]);
    }

    #[test]
    fn test_scenario_has_single_start_and_stop() {
        let scenario =
            build_scenario(Arc::new(SessionConfig::bidding_user())).unwrap();

        let starts: Vec<_> =
            scenario.transactions.iter().filter(|t| t.on_start).collect();
        let stops: Vec<_> =
            scenario.transactions.iter().filter(|t| t.on_stop).collect();

        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].name, "session_start");
        assert_eq!(stops.len(), 1);
        assert_eq!(scenario.weight, 3);
    }
}
