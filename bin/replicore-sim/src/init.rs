//! Process telemetry initialisation for `replicore-sim` commands.
use anyhow::Result;

use replisdk::runtime::telemetry;
use replisdk::runtime::telemetry::Telemetry;
use replisdk::runtime::telemetry::TelemetryConfig;
use replisdk::runtime::telemetry::TelemetryOptions;

/// ID of the replicore-sim release in sentry recommended format.
const RELEASE_ID: &str = concat!(env!("CARGO_PKG_NAME"), "@", env!("CARGO_PKG_VERSION"));

/// Initialise process telemetry.
pub async fn telemetry(conf: TelemetryConfig) -> Result<Telemetry> {
    let telemetry_options = TelemetryOptions::for_sentry_release(RELEASE_ID)
        .for_app(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        .finish();
    let telemetry = telemetry::initialise(conf, telemetry_options).await?;
    slog::info!(telemetry.logger, "Process telemetry initialised");
    Ok(telemetry)
}
