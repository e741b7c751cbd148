use crate::config::Settings;
use crate::errors::{Error, Result};

/// Validates loaded settings before anything touches the network.
///
/// The device key is left alone: an unusable key still produces a token,
/// flagged on the credential, and `--strict-key` decides whether that aborts.
pub fn validate_settings(settings: &Settings) -> Result<()> {
    let fields = [
        ("azure_mqtt_host", &settings.azure_mqtt_host),
        ("azure_mqtt_endpoint", &settings.azure_mqtt_endpoint),
        ("azure_device_name", &settings.azure_device_name),
    ];

    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!("{} cannot be empty", name)));
        }
    }

    // Host ends up in the broker address and the SAS resource path
    if settings
        .azure_mqtt_host
        .chars()
        .any(|c| c == '/' || c.is_whitespace())
    {
        return Err(Error::Validation(format!(
            "azure_mqtt_host {:?} must be a bare host name",
            settings.azure_mqtt_host
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            azure_mqtt_host: "myhub.azure-devices.net".to_string(),
            azure_mqtt_endpoint: "devices/sensor01/messages/events/".to_string(),
            azure_device_name: "sensor01".to_string(),
            azure_device_key: "dGVzdGtleQ==".to_string(),
        }
    }

    #[test]
    fn test_valid_settings() {
        assert!(validate_settings(&settings()).is_ok());
    }

    #[test]
    fn test_empty_host() {
        let mut s = settings();
        s.azure_mqtt_host = "".to_string();

        assert!(validate_settings(&s).is_err());
    }

    #[test]
    fn test_blank_endpoint() {
        let mut s = settings();
        s.azure_mqtt_endpoint = "   ".to_string();

        assert!(validate_settings(&s).is_err());
    }

    #[test]
    fn test_empty_key_is_accepted() {
        let mut s = settings();
        s.azure_device_key = "".to_string();

        assert!(validate_settings(&s).is_ok());
    }

    #[test]
    fn test_host_with_scheme() {
        let mut s = settings();
        s.azure_mqtt_host = "mqtts://myhub.azure-devices.net".to_string();

        match validate_settings(&s) {
            Err(Error::Validation(msg)) => assert!(msg.contains("bare host name")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
