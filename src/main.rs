use customer_import::config::{load_dotenv, ImportConfig};
use customer_import::ops::telemetry;
use customer_import::ImportError;
use std::error::Error;
use std::process;

#[tokio::main]
async fn main() {
    let dotenv = load_dotenv();

    // Initialize Telemetry
    telemetry::init_tracing();
    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let config = match ImportConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            process::exit(1);
        }
    };

    let result = tokio::select! {
        result = customer_import::run(&config) => result,
        _ = tokio::signal::ctrl_c() => {
            Err(ImportError::Interrupted("received Ctrl-C".to_string()))
        }
    };

    if let Some(path) = &config.metrics_file {
        if let Err(e) = telemetry::write_metrics_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write metrics");
        }
    }

    match result {
        Ok(summary) if !summary.has_failures() => {
            tracing::info!(total = summary.total, "Ran successfully");
            process::exit(0);
        }
        Ok(summary) => {
            for failure in &summary.failures {
                tracing::error!(
                    customer_id = %failure.customer_id,
                    error = %error_chain(&failure.error),
                    "Customer was not imported"
                );
            }
            tracing::error!("{}", summary);
            process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %error_chain(&e), "Error occurred");
            process::exit(1);
        }
    }
}

// Renders an error and its sources as "outer: inner: root"
fn error_chain(error: &dyn Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}
