use anyhow::{Context, Result};
use colored::*;
use log::{error, info};
use service::{config::Config, logging::Logger};
use testing_tools::api_client::ApiClient;
use testing_tools::output::print_test_summary;
use testing_tools::scenarios::{run_scenario, ScenarioOutcome};

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    match run(&config).await {
        Ok(passed) => std::process::exit(if passed { 0 } else { 1 }),
        Err(e) => {
            error!("Smoke test could not start: {e:#}");
            std::process::exit(2);
        }
    }
}

async fn run(config: &Config) -> Result<bool> {
    info!("Running task creation smoke test against {}", config.base_url);

    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let api_client = ApiClient::new(client, config.base_url.trim_end_matches('/').to_string());

    let outcome = run_scenario(&api_client, &config.scenario_settings()).await;

    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    print_test_summary(outcome.steps());

    if let ScenarioOutcome::Aborted { step, error, .. } = &outcome {
        println!(
            "\n{}",
            format!("Run stopped at {}: {}", step, error).bright_red().bold()
        );
    }

    let passed = outcome.passed();
    if passed {
        println!("\n{}", "Smoke test passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Smoke test failed! ✗".bright_red().bold());
    }

    Ok(passed)
}
