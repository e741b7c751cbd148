use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::errors::Result;
use crate::validate::validate_settings;

pub const CONFIG_FILE_NAME: &str = "config.yml";
pub const SENSOR_FILE_PATH: &str = "sensors/temperature/reading";
const ENV_PREFIX: &str = "PUBLISHER";

/// Device and hub settings, keyed as in `config.yml`
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub azure_mqtt_host: String,
    /// Topic the reading is published on
    pub azure_mqtt_endpoint: String,
    pub azure_device_name: String,
    pub azure_device_key: String,
}

/// Loads settings from a YAML file, then applies `PUBLISHER_*` environment
/// overrides (e.g. `PUBLISHER_AZURE_DEVICE_KEY`).
pub fn load_settings(path: &Path) -> Result<Settings> {
    let settings: Settings = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(Environment::with_prefix(ENV_PREFIX))
        .build()?
        .try_deserialize()?;

    validate_settings(&settings)?;

    Ok(settings)
}

/// Resolves `relative` against the directory holding the running executable.
pub fn beside_executable(relative: &str) -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(relative))
}
