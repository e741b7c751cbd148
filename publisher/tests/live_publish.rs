use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_publisher");

fn run_publisher(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .env("RUST_LOG", "info")
        .env("NO_COLOR", "1")
        .env_remove("PUBLISHER_CONFIG")
        .env_remove("PUBLISHER_SENSOR_FILE")
        .env_remove("PUBLISHER_STRICT_KEY")
        .output()
        .expect("spawn publisher")
}

#[test]
fn test_missing_config_logs_and_exits_cleanly() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("config.yml");

    let output = run_publisher(&["--config", config.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    // Failures are reported in the log, not through the exit code
    assert!(output.status.success());
    assert!(stdout.contains("Run aborted"), "stdout: {}", stdout);
    assert!(!stdout.contains("Connecting to MQTT broker"));
}

#[test]
fn test_unparseable_reading_never_connects() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("config.yml");
    fs::write(
        &config,
        "azure_mqtt_host: myhub.azure-devices.net\n\
         azure_mqtt_endpoint: devices/sensor01/messages/events/\n\
         azure_device_name: sensor01\n\
         azure_device_key: dGVzdGtleQ==\n",
    )
    .unwrap();
    let sensor = tmp.path().join("reading");
    fs::write(&sensor, "72 01 4b 46 7f ff 0e 10 57 : crc=57 NO\n").unwrap();

    let output = run_publisher(&[
        "--config",
        config.to_str().unwrap(),
        "--sensor-file",
        sensor.to_str().unwrap(),
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Sensor reading error"), "stdout: {}", stdout);
    assert!(!stdout.contains("Connecting to MQTT broker"));
}

/// Needs a real IoT Hub device: set PUBLISHER_AZURE_MQTT_HOST,
/// PUBLISHER_AZURE_MQTT_ENDPOINT, PUBLISHER_AZURE_DEVICE_NAME and
/// PUBLISHER_AZURE_DEVICE_KEY, then run with `--ignored`.
#[test]
#[ignore]
fn test_publish_to_iot_hub() {
    let tmp = TempDir::new().unwrap();
    // Every field comes from the environment overrides
    let config = tmp.path().join("config.yml");
    fs::write(&config, "{}\n").unwrap();
    let sensor = tmp.path().join("reading");
    fs::write(&sensor, "72 01 4b 46 7f ff 0e 10 57 t=21345\n").unwrap();

    let output = run_publisher(&[
        "--config",
        config.to_str().unwrap(),
        "--sensor-file",
        sensor.to_str().unwrap(),
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("Published 21.3"), "stdout: {}", stdout);
}
