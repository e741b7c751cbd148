mod config;
mod errors;
mod model;
mod mqtt;
mod sas;
mod sensor;
mod session;
mod validate;

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{beside_executable, load_settings, CONFIG_FILE_NAME, SENSOR_FILE_PATH};
use crate::errors::{Error, Result};
use crate::model::DeviceIdentity;
use crate::mqtt::{mqtt_options, MqttTransport};
use crate::sas::generate_token;
use crate::session::{PublishSession, Timeouts};

/// Publishes one temperature reading to Azure IoT Hub over MQTT.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// YAML settings file [default: config.yml next to the executable]
    #[arg(long, env = "PUBLISHER_CONFIG")]
    config: Option<PathBuf>,

    /// Sensor dump [default: sensors/temperature/reading next to the executable]
    #[arg(long, env = "PUBLISHER_SENSOR_FILE")]
    sensor_file: Option<PathBuf>,

    /// Seconds to wait for the broker to accept the connection (0 waits forever)
    #[arg(long, env = "PUBLISHER_CONNECT_TIMEOUT_SECS", default_value_t = 30)]
    connect_timeout_secs: u64,

    /// Seconds to wait for the publish to be flushed (0 waits forever)
    #[arg(long, env = "PUBLISHER_PUBLISH_TIMEOUT_SECS", default_value_t = 30)]
    publish_timeout_secs: u64,

    /// Abort instead of connecting with a token signed by an undecodable key
    #[arg(long, env = "PUBLISHER_STRICT_KEY")]
    strict_key: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(args).await {
        error!("Run aborted: {}", e);
    }
}

async fn run(args: Args) -> Result<()> {
    let config_path = match args.config {
        Some(path) => path,
        None => beside_executable(CONFIG_FILE_NAME)?,
    };
    let sensor_path = match args.sensor_file {
        Some(path) => path,
        None => beside_executable(SENSOR_FILE_PATH)?,
    };

    info!("Loading configuration from {}", config_path.display());
    let settings = load_settings(&config_path)?;

    let reading = sensor::read_temperature(&sensor_path)?;
    info!("Temperature reading: {}", reading.payload());

    let credential = generate_token(&DeviceIdentity::from(&settings));
    if let Some(reason) = credential.key_error() {
        if args.strict_key {
            return Err(Error::KeyDecode(reason.to_string()));
        }
        warn!(
            "Connecting with a token signed by an unusable key ({}); \
             the broker will likely refuse it",
            reason
        );
    }
    info!(expiry = credential.expiry, "Generated SAS token");

    let transport = MqttTransport::new(mqtt_options(&settings, &credential));
    let timeouts = Timeouts::from_secs(args.connect_timeout_secs, args.publish_timeout_secs);

    PublishSession::new(transport, timeouts)
        .deliver(&settings.azure_mqtt_endpoint, &reading)
        .await
}
