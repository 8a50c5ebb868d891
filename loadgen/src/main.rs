use std::time::Duration;

use shipload_loadgen::config::Config;
use shipload_loadgen::harness::Scenario;
use shipload_loadgen::scenarios;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shipload=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = Config::from_env();
    info!(
        target = %config.target_url,
        accounts = config.accounts.len(),
        "loaded configuration"
    );
    let report_json = config.report_json.clone();

    let scenario = scenarios::install(Scenario::new(config));
    let stop = scenario.stop_handle();
    let recorder = scenario.recorder();

    // First Ctrl-C asks for a graceful stop; in-flight actions finish
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping scenario");
            stop.stop();
        }
    });

    let progress = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(10));
        // the first tick fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            info!(
                actors = recorder.live_actors(),
                requests = recorder.requests_total(),
                failed = recorder.requests_failed(),
                "progress"
            );
        }
    });

    let report = scenario.run().await;
    progress.abort();

    println!("{}", report.render());
    if let Some(path) = report_json {
        std::fs::write(&path, report.to_json()?)?;
        info!(path = %path, "wrote JSON report");
    }

    Ok(())
}
