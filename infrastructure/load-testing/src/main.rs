use std::sync::Arc;

use goose::prelude::*;
use load_testing::{build_scenario, init_tracing};
use session_models::LoadSettings;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Tracing already initialised: {e}");
    }

    let settings = match LoadSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid load test configuration");
            std::process::exit(1);
        }
    };

    let mut attack = GooseAttack::initialize()?;
    for session in settings.sessions {
        info!(
            session = %session.name,
            weight = session.scenario_weight,
            actions = session.weights.enabled().len(),
            "Registering session scenario"
        );
        attack = attack.register_scenario(build_scenario(Arc::new(session))?);
    }

    attack
        .set_default(GooseDefault::Host, "http://localhost:5000")?
        .set_default(GooseDefault::Users, 100)?
        .set_default(GooseDefault::HatchRate, "10/1s")?
        .set_default(GooseDefault::RunTime, 300)?
        .execute()
        .await?;

    Ok(())
}
