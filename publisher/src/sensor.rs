use std::path::Path;

use tracing::debug;

use crate::errors::{Error, Result};
use crate::model::Reading;

/// Raw sensor values are thousandths of a degree
const TEMP_CONVERSION_RATE: f64 = 1000.0;

/// Reads a 1-Wire style dump (`... t=21345`) and converts it to degrees.
pub fn read_temperature(path: &Path) -> Result<Reading> {
    let content = std::fs::read_to_string(path)?;
    let reading = parse_reading(&content)?;

    debug!("Read {} from {}", reading.value, path.display());

    Ok(reading)
}

/// The value is whatever follows the last `=` of the last token.
pub fn parse_reading(content: &str) -> Result<Reading> {
    let token = content
        .split_whitespace()
        .last()
        .ok_or_else(|| Error::Sensor("reading is empty".to_string()))?;
    let raw = token.rsplit('=').next().unwrap_or(token);

    let value: i64 = raw
        .parse()
        .map_err(|e| Error::Sensor(format!("cannot parse {:?} as integer: {}", raw, e)))?;

    Ok(Reading::new(value as f64 / TEMP_CONVERSION_RATE))
}
