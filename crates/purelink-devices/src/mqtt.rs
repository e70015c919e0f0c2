//! MQTT link to a single Pure Link appliance.
//!
//! ## Topic Format
//!
//! Status (device → client): `{device_type}/{serial}/status/current`
//! Commands (client → device): `{device_type}/{serial}/command`
//!
//! The device runs its own broker; the client authenticates with the serial
//! number and the hashed device password. The rumqttc event loop runs on its
//! own task and folds every decoded event into a [`LinkState`] published over
//! a `watch` channel, so it keeps polling no matter how slowly the handle
//! reads.

use std::time::Duration;

use purelink_core::config::defaults;
use purelink_core::return_code::UNEXPECTED_DISCONNECTION_CODE;
use purelink_core::{
    decode_bytes, ConnectionError, Decoded, DeviceCommand, DisconnectionError, FanMode,
    SensorsData, StandbyMonitoring, StateData, TemperatureUnit,
};
use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError as MqttConnectionError, Event, EventLoop,
    MqttOptions, Outgoing, Packet, QoS,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapter::{AdapterError, AdapterResult, ConnectionStatus, LinkEvent};
use crate::config::DeviceConfig;

/// Code reported when the link drops before any CONNACK arrives.
const SERVER_UNAVAILABLE_CODE: u8 = 3;

/// Everything the event loop has seen on the link so far.
///
/// Sequence numbers count snapshots, so a waiter can tell a new snapshot from
/// one that was already there before it sent a request.
#[derive(Debug, Clone, Default)]
struct LinkState {
    connack: Option<u8>,
    closed: Option<u8>,
    state: Option<StateData>,
    state_seq: u64,
    sensors: Option<SensorsData>,
    sensors_seq: u64,
}

impl LinkState {
    fn apply(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Connected { code } => self.connack = Some(code),
            // First close wins: a requested disconnect stays code 0.
            LinkEvent::Disconnected { code } => {
                self.closed.get_or_insert(code);
            }
            LinkEvent::State(state) => {
                self.state = Some(state);
                self.state_seq += 1;
            }
            LinkEvent::Sensors(sensors) => {
                self.sensors = Some(sensors);
                self.sensors_seq += 1;
            }
        }
    }
}

/// Handle to one appliance over MQTT.
pub struct PureLinkDevice {
    config: DeviceConfig,
    client: Option<AsyncClient>,
    link: Option<watch::Receiver<LinkState>>,
    task: Option<JoinHandle<()>>,
    status: ConnectionStatus,
    state_data: Option<StateData>,
    sensor_data: Option<SensorsData>,
}

impl PureLinkDevice {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            client: None,
            link: None,
            task: None,
            status: ConnectionStatus::Disconnected,
            state_data: None,
            sensor_data: None,
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Open the link, then fetch a first state and sensor snapshot.
    pub async fn connect(&mut self) -> AdapterResult<()> {
        if self.status.is_connected() {
            return Ok(());
        }

        let client_id = format!("purelink-{}", Uuid::new_v4().simple());
        let mut options =
            MqttOptions::new(client_id, self.config.ip_address.clone(), self.config.port);
        options.set_credentials(self.config.serial.clone(), self.config.hashed_password());
        options.set_clean_session(true);
        options.set_keep_alive(Duration::from_secs(defaults::KEEP_ALIVE_SECS));

        let (client, eventloop) = AsyncClient::new(options, 10);
        let (link_tx, link_rx) = watch::channel(LinkState::default());
        self.task = Some(tokio::spawn(run_event_loop(
            eventloop,
            link_tx,
            self.config.temperature_unit,
            self.config.serial.clone(),
        )));
        self.client = Some(client);
        self.link = Some(link_rx);
        self.status = ConnectionStatus::Connecting;

        info!(
            category = "mqtt",
            serial = %self.config.serial,
            "Connecting to {}:{}", self.config.ip_address, self.config.port
        );

        let deadline = Instant::now() + Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS);
        let code = match self.watch_link(deadline, |link| link.connack.is_some()).await? {
            Some(link) => link.connack.unwrap_or(SERVER_UNAVAILABLE_CODE),
            None => {
                self.teardown(ConnectionStatus::Error);
                return Err(ConnectionError::timeout().into());
            }
        };

        if code != 0 {
            self.teardown(ConnectionStatus::Error);
            let error = ConnectionError::from_code(code)?;
            warn!(category = "mqtt", code, "{}", error.message);
            return Err(error.into());
        }

        let status_topic = self.config.status_topic();
        self.client()?
            .subscribe(status_topic.as_str(), QoS::AtMostOnce)
            .await
            .map_err(|e| AdapterError::Communication(e.to_string()))?;
        self.status = ConnectionStatus::Connected;
        info!(category = "mqtt", topic = %status_topic, "Connected and subscribed");

        self.refresh().await
    }

    /// Request the current state and wait for snapshots sent after the
    /// request.
    pub async fn refresh(&mut self) -> AdapterResult<()> {
        let (state_seen, sensors_seen) = {
            let link = self.link.as_ref().ok_or(AdapterError::NotConnected)?.borrow();
            (link.state_seq, link.sensors_seq)
        };
        self.send(DeviceCommand::RequestCurrentState).await?;
        self.await_snapshots(state_seen, sensors_seen).await
    }

    /// Latest state and sensor snapshots, when the sensors carry data.
    pub fn get_data(&self) -> Option<(&StateData, &SensorsData)> {
        if !self.has_valid_data() {
            return None;
        }
        self.state_data.as_ref().zip(self.sensor_data.as_ref())
    }

    pub fn has_valid_data(&self) -> bool {
        self.state_data.is_some() && self.sensor_data.as_ref().is_some_and(SensorsData::has_data)
    }

    pub async fn set_fan_mode(&mut self, mode: FanMode) -> AdapterResult<()> {
        self.send(DeviceCommand::SetFanMode(mode)).await
    }

    pub async fn set_standby_monitoring(&mut self, monitoring: StandbyMonitoring) -> AdapterResult<()> {
        self.send(DeviceCommand::SetStandbyMonitoring(monitoring))
            .await
    }

    /// Publish a command to the device's command topic.
    pub async fn send(&mut self, command: DeviceCommand) -> AdapterResult<()> {
        if !self.status.is_connected() {
            return Err(AdapterError::NotConnected);
        }
        let qos = if command.is_state_change() {
            QoS::AtLeastOnce
        } else {
            QoS::AtMostOnce
        };
        let topic = self.config.command_topic();
        debug!(category = "mqtt", topic = %topic, msg = command.msg(), "Publishing command");
        self.client()?
            .publish(topic, qos, false, command.to_payload())
            .await
            .map_err(|e| AdapterError::Communication(e.to_string()))
    }

    /// Close the link and wait for the event loop to confirm.
    ///
    /// Fails with `NotConnected` when no link is open. A link that already
    /// dropped reports its disconnection code.
    pub async fn disconnect(&mut self) -> AdapterResult<()> {
        let Some(client) = self.client.take() else {
            return Err(AdapterError::NotConnected);
        };

        let code = match self.closed_code() {
            Some(code) => code,
            None => match client.disconnect().await {
                Ok(()) => {
                    let deadline =
                        Instant::now() + Duration::from_secs(defaults::DISCONNECT_TIMEOUT_SECS);
                    match self.watch_link(deadline, |_| false).await? {
                        Some(link) => link.closed.unwrap_or(UNEXPECTED_DISCONNECTION_CODE),
                        None => DisconnectionError::timeout().code,
                    }
                }
                // The event loop stopped after the check above.
                Err(e) => match self.closed_code() {
                    Some(code) => code,
                    None => {
                        self.teardown(ConnectionStatus::Error);
                        return Err(AdapterError::Communication(e.to_string()));
                    }
                },
            },
        };

        self.teardown(ConnectionStatus::Disconnected);
        if code == 0 {
            info!(category = "mqtt", serial = %self.config.serial, "Disconnected");
            Ok(())
        } else {
            let error = DisconnectionError::from_code(code);
            warn!(category = "mqtt", code, "{}", error.message);
            Err(error.into())
        }
    }

    fn client(&self) -> AdapterResult<&AsyncClient> {
        self.client.as_ref().ok_or(AdapterError::NotConnected)
    }

    fn closed_code(&self) -> Option<u8> {
        self.link.as_ref().and_then(|link| link.borrow().closed)
    }

    /// Wait until `ready` holds or the link closes. `None` on timeout.
    async fn watch_link(
        &self,
        deadline: Instant,
        ready: impl Fn(&LinkState) -> bool,
    ) -> AdapterResult<Option<LinkState>> {
        let mut link = self.link.clone().ok_or(AdapterError::NotConnected)?;
        let waited = timeout_at(
            deadline,
            link.wait_for(|state| state.closed.is_some() || ready(state)),
        )
        .await
        .map(|result| result.is_ok());

        let mut state = link.borrow().clone();
        match waited {
            Ok(true) => {}
            // Event loop gone without saying why.
            Ok(false) => {
                state.closed.get_or_insert(UNEXPECTED_DISCONNECTION_CODE);
            }
            Err(_) => return Ok(None),
        }
        Ok(Some(state))
    }

    /// Wait for a state snapshot newer than `state_seen`, then for a sensor
    /// snapshot newer than `sensors_seen`, each bounded by the data timeout.
    /// The latest of both is kept.
    async fn await_snapshots(&mut self, state_seen: u64, sensors_seen: u64) -> AdapterResult<()> {
        self.await_link(|link| link.state_seq > state_seen).await?;
        let link = self.await_link(|link| link.sensors_seq > sensors_seen).await?;

        if let Some(state) = &link.state {
            debug!(category = "mqtt", "{}", state);
        }
        if let Some(sensors) = &link.sensors {
            debug!(category = "mqtt", "{}", sensors);
        }
        self.state_data = link.state;
        self.sensor_data = link.sensors;
        Ok(())
    }

    async fn await_link(&mut self, ready: impl Fn(&LinkState) -> bool) -> AdapterResult<LinkState> {
        let deadline = Instant::now() + Duration::from_secs(defaults::DATA_TIMEOUT_SECS);
        let Some(link) = self.watch_link(deadline, &ready).await? else {
            return Err(AdapterError::Timeout(defaults::DATA_TIMEOUT_SECS * 1000));
        };
        // A snapshot that made it before the link dropped still counts.
        if ready(&link) {
            return Ok(link);
        }
        let code = link.closed.unwrap_or(UNEXPECTED_DISCONNECTION_CODE);
        self.teardown(ConnectionStatus::Error);
        Err(DisconnectionError::from_code(code).into())
    }

    fn teardown(&mut self, status: ConnectionStatus) {
        self.client = None;
        self.link = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.status = status;
    }
}

impl Drop for PureLinkDevice {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Map a CONNACK return code onto the numeric table.
pub fn connack_code(code: ConnectReturnCode) -> u8 {
    match code {
        ConnectReturnCode::Success => 0,
        ConnectReturnCode::RefusedProtocolVersion => 1,
        ConnectReturnCode::BadClientId => 2,
        ConnectReturnCode::ServiceUnavailable => 3,
        ConnectReturnCode::BadUserNamePassword => 4,
        ConnectReturnCode::NotAuthorized => 5,
    }
}

/// Decode one status publish into a link event.
///
/// Messages that are neither state nor sensor data yield nothing. Malformed
/// ones are logged and skipped.
pub fn decode_publish(payload: &[u8], unit: TemperatureUnit) -> Option<LinkEvent> {
    match decode_bytes(payload, unit) {
        Ok(Decoded::State(state)) => Some(LinkEvent::State(state)),
        Ok(Decoded::Sensors(sensors)) => Some(LinkEvent::Sensors(sensors)),
        Ok(Decoded::Other(msg)) => {
            debug!(category = "mqtt", msg = %msg, "Ignoring message");
            None
        }
        Err(e) => {
            warn!(
                category = "mqtt",
                error = %e,
                payload = %String::from_utf8_lossy(payload),
                "Skipping undecodable message"
            );
            None
        }
    }
}

async fn run_event_loop(
    mut eventloop: EventLoop,
    link_tx: watch::Sender<LinkState>,
    unit: TemperatureUnit,
    serial: String,
) {
    loop {
        let event = match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => LinkEvent::Connected {
                code: connack_code(ack.code),
            },
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                match decode_publish(&publish.payload, unit) {
                    Some(event) => event,
                    None => continue,
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                link_tx.send_modify(|link| link.apply(LinkEvent::Disconnected { code: 0 }));
                break;
            }
            Ok(_) => continue,
            Err(MqttConnectionError::ConnectionRefused(code)) => {
                link_tx.send_modify(|link| {
                    link.apply(LinkEvent::Connected {
                        code: connack_code(code),
                    })
                });
                break;
            }
            Err(e) => {
                warn!(category = "mqtt", serial = %serial, "MQTT link error: {}", e);
                break;
            }
        };

        link_tx.send_modify(|link| link.apply(event));
        if link_tx.is_closed() {
            break;
        }
    }

    link_tx.send_modify(|link| {
        link.apply(LinkEvent::Disconnected {
            code: UNEXPECTED_DISCONNECTION_CODE,
        })
    });
    debug!(category = "mqtt", serial = %serial, "Event loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connack_codes() {
        assert_eq!(connack_code(ConnectReturnCode::Success), 0);
        assert_eq!(connack_code(ConnectReturnCode::BadUserNamePassword), 4);
        assert_eq!(connack_code(ConnectReturnCode::NotAuthorized), 5);
    }

    #[test]
    fn test_decode_publish() {
        let payload = br#"{"msg":"ENVIRONMENTAL-CURRENT-SENSOR-DATA","data":{"hact":"0040","tact":"2950","vact":"INIT","pact":"0001"}}"#;
        match decode_publish(payload, TemperatureUnit::Celsius) {
            Some(LinkEvent::Sensors(sensors)) => {
                assert_eq!(sensors.humidity, Some(40));
                assert_eq!(sensors.volatile_compounds, 0);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_publish_skips_other_and_malformed() {
        assert_eq!(decode_publish(br#"{"msg":"HELLO"}"#, TemperatureUnit::Celsius), None);
        assert_eq!(decode_publish(b"garbage", TemperatureUnit::Celsius), None);
        let missing_pact = br#"{"msg":"ENVIRONMENTAL-CURRENT-SENSOR-DATA","data":{"hact":"0040","tact":"2950","vact":"0001"}}"#;
        assert_eq!(decode_publish(missing_pact, TemperatureUnit::Celsius), None);
    }

    #[test]
    fn test_link_state_keeps_first_close() {
        let mut link = LinkState::default();
        link.apply(LinkEvent::Connected { code: 0 });
        link.apply(LinkEvent::Disconnected { code: 0 });
        link.apply(LinkEvent::Disconnected {
            code: UNEXPECTED_DISCONNECTION_CODE,
        });
        assert_eq!(link.connack, Some(0));
        assert_eq!(link.closed, Some(0));
    }

    #[test]
    fn test_link_state_counts_snapshots() {
        let payload = br#"{"msg":"ENVIRONMENTAL-CURRENT-SENSOR-DATA","data":{"hact":"0040","tact":"2950","vact":"INIT","pact":"0001"}}"#;
        let mut link = LinkState::default();
        for _ in 0..3 {
            if let Some(event) = decode_publish(payload, TemperatureUnit::Celsius) {
                link.apply(event);
            }
        }
        assert_eq!(link.sensors_seq, 3);
        assert_eq!(link.state_seq, 0);
        assert!(link.state.is_none());
    }

    #[tokio::test]
    async fn test_commands_require_connection() {
        let config = DeviceConfig::new("127.0.0.1", "NN2-EU-KEA0000A", "secret", "475");
        let mut device = PureLinkDevice::new(config);
        assert_eq!(device.status(), ConnectionStatus::Disconnected);
        assert!(matches!(
            device.set_fan_mode(FanMode::Auto).await,
            Err(AdapterError::NotConnected)
        ));
        assert!(device.get_data().is_none());
        assert!(!device.has_valid_data());
        assert!(matches!(device.disconnect().await, Err(AdapterError::NotConnected)));
    }
}
