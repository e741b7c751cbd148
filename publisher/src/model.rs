use crate::config::Settings;

/// Identifying triple the device authenticates with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub host: String,
    pub device_name: String,
    /// Base64 encoded shared access key
    pub secret_key: String,
}

impl DeviceIdentity {
    pub fn new(
        host: impl Into<String>,
        device_name: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            device_name: device_name.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl From<&Settings> for DeviceIdentity {
    fn from(settings: &Settings) -> Self {
        Self::new(
            settings.azure_mqtt_host.clone(),
            settings.azure_device_name.clone(),
            settings.azure_device_key.clone(),
        )
    }
}

/// Single sensor measurement sent once per run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
}

impl Reading {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    /// Wire form: fixed-point with exactly one decimal.
    pub fn payload(&self) -> String {
        format!("{:.1}", self.value)
    }
}
