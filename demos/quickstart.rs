//! Register a learner, feed it a few labeled readings, and ask for a
//! prediction.
//!
//! Run with: cargo run --example quickstart

use online_learner::config::Config;
use online_learner::registry::create_store;
use online_learner::{LearnerService, RegisterOptions};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "online_learner={}",
                    config.observability.log_level
                ))
            }),
        )
        .init();

    let store = create_store(&config.storage).await?;
    let service = LearnerService::new(store);

    let id = service.register(RegisterOptions::default()).await?;
    tracing::info!(learner_id = id, "Registered learner");

    // Two classes of sensor readings
    service
        .observe(id, &json!({"classLabel": "idle", "measurement": {"rpm": 100.0, "temp": 30.0}}))
        .await?;
    service
        .observe(id, &json!({"classLabel": "load", "measurement": {"rpm": 900.0, "temp": 80.0}}))
        .await?;

    // A new reading: lower score = closer class
    let scores = service
        .predict(id, &json!({"measurement": {"rpm": 850.0, "temp": 75.0}}))
        .await?;

    for (label, score) in &scores {
        println!("{label}: {score}");
    }

    Ok(())
}
