use github_repo_resource::{handle, Config};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// The lib and the binary log under different targets
const DEFAULT_LOG_FILTER: &str = "github_repo_resource=info,bootstrap=info";

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = Config::from_env()?;
    info!("GitHub API: {}", config.github_api_url);

    // one client for the lifetime of the container to reuse connections between warm invocations
    let client = reqwest::Client::builder().build()?;

    let client = &client;
    let config = &config;

    if let Err(e) = lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle(client, config, event).await.map_err(Error::from)
    }))
    .await
    {
        debug!("Runtime error: {:?}", e);
        return Err(e);
    }

    Ok(())
}

/// Initializes the tracing from RUST_LOG env var if present or sets INFO for this crate only.
/// CloudWatch adds its own timestamps and does not render colors.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .compact()
        .init();
}
