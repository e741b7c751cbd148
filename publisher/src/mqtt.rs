use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, Transport,
};
use tracing::{debug, info};

use crate::config::Settings;
use crate::errors::Result;
use crate::sas::Credential;

pub const MQTT_TLS_PORT: u16 = 8883;
pub const API_VERSION: &str = "2021-04-12";

const KEEP_ALIVE_SECS: u64 = 30;
const REQUEST_CAPACITY: usize = 10;

/// The two broker operations a publish session needs.
pub trait BrokerLink {
    /// Resolves once the broker has acknowledged the connection.
    async fn connect(&mut self) -> Result<()>;

    /// Resolves once the QoS 0 publish has been written to the network.
    async fn publish(&mut self, topic: &str, payload: String) -> Result<()>;
}

/// Azure IoT Hub expects `<host>/<device>/?api-version=<date>` as username.
pub fn username(settings: &Settings) -> String {
    format!(
        "{}/{}/?api-version={}",
        settings.azure_mqtt_host, settings.azure_device_name, API_VERSION
    )
}

/// TLS on 8883, MQTT 3.1.1, clean session, SAS token as password.
pub fn mqtt_options(settings: &Settings, credential: &Credential) -> MqttOptions {
    let mut mqtt_options = MqttOptions::new(
        settings.azure_device_name.clone(),
        settings.azure_mqtt_host.clone(),
        MQTT_TLS_PORT,
    );
    mqtt_options.set_transport(Transport::tls_with_default_config());
    mqtt_options.set_credentials(username(settings), credential.to_string());
    mqtt_options.set_keep_alive(Duration::from_secs(KEEP_ALIVE_SECS));
    mqtt_options.set_clean_session(true);

    mqtt_options
}

/// [`BrokerLink`] backed by a rumqttc client and its event loop.
pub struct MqttTransport {
    client: AsyncClient,
    eventloop: EventLoop,
    broker: (String, u16),
}

impl MqttTransport {
    pub fn new(mqtt_options: MqttOptions) -> Self {
        let broker = mqtt_options.broker_address();
        let (client, eventloop) = AsyncClient::new(mqtt_options, REQUEST_CAPACITY);
        Self {
            client,
            eventloop,
            broker,
        }
    }
}

impl BrokerLink for MqttTransport {
    async fn connect(&mut self) -> Result<()> {
        info!("Connecting to MQTT broker at {}:{}", self.broker.0, self.broker.1);

        // A refused CONNACK comes back from poll() as ConnectionError
        loop {
            match self.eventloop.poll().await? {
                Event::Incoming(Packet::ConnAck(ack)) if ack.code == ConnectReturnCode::Success => {
                    info!("Connected to MQTT broker");
                    return Ok(());
                }
                other => debug!("Waiting for CONNACK, got {:?}", other),
            }
        }
    }

    async fn publish(&mut self, topic: &str, payload: String) -> Result<()> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await?;

        // The outgoing event is only reported after the write was flushed
        loop {
            match self.eventloop.poll().await? {
                Event::Outgoing(Outgoing::Publish(_)) => {
                    debug!("Publish flushed on topic {}", topic);
                    return Ok(());
                }
                other => debug!("Waiting for publish flush, got {:?}", other),
            }
        }
    }
}
