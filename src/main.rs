mod airbnb;
mod config;
mod credentials;
mod export;
mod extract;
mod host;
mod http;
mod identity;
mod pipeline;
mod progress;
mod retry;

use airbnb::AirbnbClient;
use eyre::{WrapErr, eyre};
use pipeline::{HarvestOptions, HarvestPipeline, PipelineError};
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "harvester.main", "run failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let host_reference = host_reference_from_env().ok_or_else(|| {
        eyre!(
            "no host reference given; set HOST_URL (profile URL or bare host id) \
             or pass it as the first argument"
        )
    })?;

    let api = AirbnbClient::new();
    let mut pipeline = HarvestPipeline::new(api, HarvestOptions::from_env());
    match pipeline.run(&host_reference).await {
        Ok(report) => {
            println!(
                "done: {} rows written to {} ({} discovered, {} already processed)",
                report.written,
                config::CSV_FILE.as_str(),
                report.discovered,
                report.already_processed,
            );
            Ok(())
        }
        Err(PipelineError::UnresolvedHost(input)) => Err(eyre!(
            "could not extract a host id from `{input}`; accepted forms: \
             /users/show/<id>, /users/profile/<id>, or a bare numeric id"
        )),
        Err(err) => Err(err).wrap_err("harvest run failed"),
    }
}

fn host_reference_from_env() -> Option<String> {
    std::env::var("HOST_URL")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            std::env::args()
                .nth(1)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
