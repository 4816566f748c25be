//! Demonstration binary for the Wardstone subsystem.
//!
//! Wires structured logging, configuration, an in-memory attribute host,
//! and the ward subsystem together, runs a scripted scenario, and shuts
//! down cleanly.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `wardstone-config.yaml`
//! 3. Create the in-memory attribute host and monotonic clock
//! 4. Assemble and start the subsystem (launches the sweeper)
//! 5. Run the demonstration scenario
//! 6. Shut the subsystem down (cancel the sweeper, reconcile, clear)

mod error;
mod scenario;

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use wardstone_core::{
    AttributeHost, EntityPresence, InMemoryAttributeHost, MonotonicClock, TimeSource,
    WardSubsystem, WardstoneConfig,
};

use crate::error::EngineError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration loading or subsystem startup fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("wardstone-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        duration_seconds = config.status.duration_seconds,
        cooldown_seconds = config.status.cooldown_seconds,
        sweep_interval_ms = config.sweeper.interval_ms,
        "Configuration loaded"
    );

    // 3. Create the host double and clock.
    let host = Arc::new(InMemoryAttributeHost::new());
    let clock = Arc::new(MonotonicClock::new());

    // 4. Assemble and start the subsystem.
    let subsystem = Arc::new(WardSubsystem::new(
        &config,
        Arc::clone(&host) as Arc<dyn AttributeHost>,
        Arc::clone(&host) as Arc<dyn EntityPresence>,
        clock as Arc<dyn TimeSource>,
    ));
    subsystem.start().map_err(EngineError::from)?;

    // 5. Run the demonstration scenario.
    scenario::run_demo(&subsystem, &host).await;

    // 6. Clean shutdown.
    subsystem.shutdown().await;
    info!("wardstone-engine stopped");

    Ok(())
}

/// Load `wardstone-config.yaml` from the working directory, falling back
/// to defaults when the file is absent.
fn load_config() -> Result<WardstoneConfig, EngineError> {
    let path = Path::new("wardstone-config.yaml");
    if path.exists() {
        Ok(WardstoneConfig::from_file(path)?)
    } else {
        info!("no wardstone-config.yaml found, using defaults");
        Ok(WardstoneConfig::default())
    }
}
