use std::{sync::Arc, time::Duration};

use goose::config::GooseConfiguration;
use goose::prelude::*;
use gumdrop::Options;
use load_testing::build_scenario;
use session_models::{SessionConfig, WaitTime};
use test_utils::{LoginReply, StubHub};

fn configuration(host: &str) -> GooseConfiguration {
    let args = [
        "--host",
        host,
        "--users",
        "1",
        "--hatch-rate",
        "1",
        "--iterations",
        "1",
        "--quiet",
    ];
    GooseConfiguration::parse_args_default(&args).unwrap()
}

fn bidder_with_listing() -> SessionConfig {
    let mut config = SessionConfig::bidding_user();
    config.wait_time = WaitTime {
        min_ms: 0,
        max_ms: 0,
    };
    config.keepalive.pause_ms = 10;
    config.weights.browse_listing = 1;
    config
}

async fn wait_for_close(hub: &StubHub) -> usize {
    for _ in 0..50 {
        if hub.channel_closes() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    hub.channel_closes()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_single_user_runs_full_session_lifecycle() {
    let hub = StubHub::start(LoginReply::Token("jwt.token".into()))
        .await
        .unwrap();
    let scenario = build_scenario(Arc::new(bidder_with_listing())).unwrap();

    let metrics =
        GooseAttack::initialize_with_config(configuration(&hub.base_url()))
            .unwrap()
            .register_scenario(scenario)
            .execute()
            .await
            .unwrap();

    assert_eq!(hub.hits_to("/api/auth/login").len(), 1);

    let listing = hub.hits_to("/api/projects/open");
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].authorization.as_deref(), Some("Bearer jwt.token"));

    let upgrade = hub.hits_to("/socket.io/");
    assert_eq!(upgrade.len(), 1);
    assert_eq!(upgrade[0].authorization.as_deref(), Some("Bearer jwt.token"));

    assert_eq!(wait_for_close(&hub).await, 1);

    let labels: Vec<&String> = metrics.requests.keys().collect();
    assert!(
        labels.iter().any(|k| k.ends_with("POST /api/auth/login")),
        "{labels:?}"
    );
    assert!(
        labels.iter().any(|k| k.ends_with("GET /api/projects/open")),
        "{labels:?}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_login_does_not_abort_attack() {
    let hub = StubHub::start(LoginReply::Status(401)).await.unwrap();
    let scenario = build_scenario(Arc::new(bidder_with_listing())).unwrap();

    GooseAttack::initialize_with_config(configuration(&hub.base_url()))
        .unwrap()
        .register_scenario(scenario)
        .execute()
        .await
        .unwrap();

    let listing = hub.hits_to("/api/projects/open");
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].authorization, None);
    assert!(hub.hits_to("/socket.io/").is_empty());
}
