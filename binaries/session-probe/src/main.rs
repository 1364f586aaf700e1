use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use session_handlers::{ActionReport, Outcome, SyntheticSession};
use session_models::SessionConfig;
use session_transport::{ReqwestHttp, WebSocketConnector};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

#[derive(Parser)]
#[command(name = "session-probe")]
#[command(about = "Run one synthetic session against a freelance hub and report each step")]
struct Cli {
    /// Base URL of the target deployment
    #[arg(long)]
    host: String,

    /// Session preset to run (freelance-portal, api-user, bidding-user, login-smoke)
    #[arg(long, default_value = "freelance-portal")]
    preset: String,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ProbeLine {
    step: String,
    outcome: &'static str,
    status: Option<u16>,
    requests: usize,
    detail: Option<String>,
}

impl ProbeLine {
    fn step(step: &str, outcome: &Outcome, requests: usize) -> Self {
        Self {
            step: step.to_string(),
            outcome: outcome.as_str(),
            status: outcome.status(),
            requests,
            detail: detail(outcome),
        }
    }

    fn action(report: &ActionReport) -> Self {
        let mut line =
            Self::step(report.action.as_str(), &report.outcome, report.requests);
        if let Some(resolved) = &report.resolved {
            line.detail = Some(resolved.clone());
        }
        line
    }
}

fn detail(outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Failed(e) => Some(e.to_string()),
        Outcome::Skipped { reason } => Some((*reason).to_string()),
        _ => None,
    }
}

async fn probe(config: SessionConfig, base_url: Url) -> Result<Vec<ProbeLine>> {
    let mut http = ReqwestHttp::new(base_url.clone())?;
    let connector = WebSocketConnector::new(base_url);
    let actions = config.weights.enabled();
    let mut session = SyntheticSession::new(Arc::new(config));
    let mut lines = Vec::new();

    let login = session.authenticate(&mut http).await;
    lines.push(ProbeLine::step("login", &login, 1));

    if let Some(outcome) = session.open_channel(&connector).await {
        lines.push(ProbeLine::step("open_channel", &outcome, 1));
    }

    for (action, _) in actions {
        let report = session.perform(action, &mut http).await;
        lines.push(ProbeLine::action(&report));
    }

    if let Some(outcome) = session.teardown().await {
        lines.push(ProbeLine::step("teardown", &outcome, 1));
    }

    Ok(lines)
}

fn print_table(lines: &[ProbeLine]) {
    println!(
        "{:<20} {:<10} {:>6} {:>8}  detail",
        "step", "outcome", "status", "requests"
    );
    for line in lines {
        let status =
            line.status.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:<20} {:<10} {:>6} {:>8}  {}",
            line.step,
            line.outcome,
            status,
            line.requests,
            line.detail.as_deref().unwrap_or("")
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let base_url = Url::parse(&cli.host)
        .with_context(|| format!("invalid --host {}", cli.host))?;
    let config = SessionConfig::preset(&cli.preset)?;
    config.validate()?;

    info!(preset = %config.name, host = %base_url, "Probing target");
    let lines = probe(config, base_url).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    }
    else {
        print_table(&lines);
    }

    Ok(())
}
