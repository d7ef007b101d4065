//! MqttSink - publishes each batch as one MQTT message
//!
//! QoS 0, retain=false. The rumqttc event loop is driven by a background
//! task; `send` only enqueues the publish request.

use std::time::Duration;

use config_loader::{MqttConnection, MqttIdentity};
use contracts::{Batch, ContractError, RecordSink, SendReport};
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
    TlsConfiguration, Transport,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

/// MqttSink configuration
#[derive(Debug, Clone)]
pub struct MqttSinkConfig {
    pub topic: String,
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive: Duration,
    pub clean_session: bool,
    pub max_packet_bytes: usize,
    pub identity: Option<MqttIdentity>,
    /// Time allowed for the initial CONNACK
    pub connect_timeout: Duration,
    /// Request channel capacity between client and event loop
    pub channel_capacity: usize,
}

impl MqttSinkConfig {
    pub fn from_connection(topic: impl Into<String>, connection: &MqttConnection) -> Self {
        Self {
            topic: topic.into(),
            host: connection.config.endpoint.clone(),
            port: connection.config.port,
            client_id: connection.client_id.clone(),
            keep_alive: Duration::from_secs(connection.config.keep_alive_secs),
            clean_session: connection.config.clean_session,
            max_packet_bytes: connection.config.max_packet_bytes,
            identity: connection.identity.clone(),
            connect_timeout: Duration::from_secs(10),
            channel_capacity: 64,
        }
    }

    /// rumqttc options for this configuration
    pub fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options
            .set_keep_alive(self.keep_alive)
            .set_clean_session(self.clean_session)
            .set_max_packet_size(self.max_packet_bytes, self.max_packet_bytes);

        if let Some(identity) = &self.identity {
            options.set_transport(Transport::tls_with_config(TlsConfiguration::Simple {
                ca: identity.ca.clone(),
                alpn: None,
                client_auth: Some((identity.certificate.clone(), identity.private_key.clone())),
            }));
        }
        options
    }
}

/// MQTT publishing sink
pub struct MqttSink {
    name: String,
    topic: String,
    max_packet_bytes: usize,
    client: AsyncClient,
    driver: JoinHandle<()>,
    published: u64,
}

impl MqttSink {
    /// Connect to the broker and wait for CONNACK
    #[instrument(
        name = "mqtt_sink_connect",
        skip(config),
        fields(host = %config.host, port = config.port, topic = %config.topic)
    )]
    pub async fn connect(name: String, config: MqttSinkConfig) -> Result<Self, ContractError> {
        let (client, mut eventloop) =
            AsyncClient::new(config.mqtt_options(), config.channel_capacity);

        let connack = tokio::time::timeout(config.connect_timeout, async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => return Ok(ack),
                    Ok(event) => trace!(?event, "Event before CONNACK"),
                    Err(e) => return Err(e),
                }
            }
        })
        .await
        .map_err(|_| {
            ContractError::sink_connection(
                &name,
                format!("no CONNACK within {:?}", config.connect_timeout),
            )
        })?
        .map_err(|e| ContractError::sink_connection(&name, e.to_string()))?;

        if connack.code != ConnectReturnCode::Success {
            return Err(ContractError::sink_connection(
                &name,
                format!("broker refused connection: {:?}", connack.code),
            ));
        }

        info!(sink = %name, client_id = %config.client_id, "MQTT connection established");

        let driver = tokio::spawn(drive_event_loop(name.clone(), eventloop));

        Ok(Self {
            name,
            topic: config.topic,
            max_packet_bytes: config.max_packet_bytes,
            client,
            driver,
            published: 0,
        })
    }
}

impl RecordSink for MqttSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "mqtt_sink_send",
        skip(self, batch),
        fields(sink = %self.name, batch = batch.sequence, records = batch.len())
    )]
    async fn send(&mut self, batch: &Batch) -> Result<SendReport, ContractError> {
        if batch.is_empty() {
            return Ok(SendReport::accepted(0));
        }

        let payload = publish_payload(batch, self.max_packet_bytes)
            .map_err(|message| ContractError::sink_write(&self.name, message))?;

        self.client
            .publish(&self.topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        self.published += 1;
        Ok(SendReport::accepted(batch.len()))
    }

    #[instrument(name = "mqtt_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Err(e) = self.client.disconnect().await {
            warn!(sink = %self.name, error = %e, "Disconnect request failed");
        }
        if tokio::time::timeout(Duration::from_secs(2), &mut self.driver)
            .await
            .is_err()
        {
            self.driver.abort();
        }
        info!(sink = %self.name, published = self.published, "MqttSink closed");
        Ok(())
    }
}

/// Serialize a batch, rejecting payloads the broker would refuse
pub fn publish_payload(batch: &Batch, max_packet_bytes: usize) -> Result<Vec<u8>, String> {
    let payload = batch
        .to_json_payload()
        .map_err(|e| format!("serialize batch: {e}"))?;
    if payload.len() > max_packet_bytes {
        return Err(format!(
            "payload of {} bytes exceeds max packet size {}",
            payload.len(),
            max_packet_bytes
        ));
    }
    Ok(payload)
}

/// Poll the event loop until a DISCONNECT goes out
///
/// Errors are logged; the next poll reconnects.
async fn drive_event_loop(sink_name: String, mut eventloop: EventLoop) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!(sink = %sink_name, "Disconnect sent, stopping event loop");
                break;
            }
            Ok(event) => trace!(sink = %sink_name, ?event, "MQTT event"),
            Err(e) => {
                warn!(sink = %sink_name, error = %e, "MQTT connection error, reconnecting");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
