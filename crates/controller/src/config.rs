//! Configuration loading for the controller binary

use anyhow::{Context, Result};
use controller_lib::ControllerConfig;

/// Load configuration: struct defaults, then the optional file, then
/// `CONTROLLER_*` environment variables, then CLI overrides.
pub fn load(cli: &crate::Cli) -> Result<ControllerConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = &cli.config {
        builder = builder.add_source(config::File::with_name(path));
    }
    builder = builder.add_source(
        config::Environment::with_prefix("CONTROLLER").try_parsing(true),
    );

    let loaded = builder.build().context("Failed to load configuration")?;
    let mut config: ControllerConfig = loaded
        .try_deserialize()
        .context("Failed to parse configuration")?;

    if let Some(value) = &cli.target_url {
        config.target_url = value.clone();
    }
    if let Some(value) = &cli.workload {
        config.workload = value.clone();
    }
    if let Some(value) = &cli.namespace {
        config.namespace = value.clone();
    }
    if let Some(value) = &cli.predictor_url {
        config.predictor_url = value.clone();
    }
    if let Some(value) = &cli.log_path {
        config.log_path = value.clone();
    }
    if let Some(value) = cli.pace_secs {
        config.pace_secs = value;
    }

    config.validate()?;
    Ok(config)
}
