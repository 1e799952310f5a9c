//! Data object storing the simulator's configuration.
use serde::Deserialize;
use serde::Serialize;

use replisdk::runtime::telemetry::TelemetryConfig;

use super::RuntimeConf;

/// Global configuration for the simulated cluster state provider process.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Conf {
    /// Process runtime configuration.
    #[serde(default)]
    pub runtime: RuntimeConf,

    /// Simulator-specific configuration.
    #[serde(default)]
    pub simulator: SimulatorConf,

    /// Telemetry configuration for the process.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Configuration specific to the simulated cluster state provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConf {
    /// Seed mixed into every leader election's RNG, for reproducible runs.
    #[serde(default = "SimulatorConf::default_election_seed")]
    pub election_seed: u64,
}

impl SimulatorConf {
    fn default_election_seed() -> u64 {
        0
    }
}

impl Default for SimulatorConf {
    fn default() -> Self {
        SimulatorConf {
            election_seed: Self::default_election_seed(),
        }
    }
}
