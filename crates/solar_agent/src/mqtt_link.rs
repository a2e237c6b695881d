//! Adaptador rumqttc (cliente síncrono) para [`BrokerLink`].
//!
//! O `Connection` do rumqttc reconecta sozinho na próxima iteração após um
//! erro; o loop do subscriber só controla *quando* essa iteração acontece.

use crate::subscriber::{BrokerLink, LinkCloser, LinkError, LinkEvent};
use rumqttc::{
    Client, ConnectReturnCode, Connection, ConnectionError, Event, MqttOptions, NetworkOptions, Packet, QoS,
};
use solar_core::config::BrokerConfig;
use std::time::Duration;

const KEEP_ALIVE: Duration = Duration::from_secs(15);
/// Limite, em segundos, do handshake TCP + CONNACK.
///
/// Um `stop()` durante a conexão espera no máximo esse tempo.
pub const CONNECT_TIMEOUT_SECS: u64 = 2;
/// Capacidade do channel de requisições do cliente.
const REQUEST_CAPACITY: usize = 10;

/// Sessão MQTT sobre TCP.
pub struct MqttLink {
    client: Client,
    connection: Connection,
}

impl MqttLink {
    /// Prepara a sessão; a conexão só acontece no primeiro `poll`.
    pub fn new(broker: &BrokerConfig, client_id: &str) -> Self {
        let mut opts = MqttOptions::new(client_id, broker.address.clone(), broker.port);
        opts.set_keep_alive(KEEP_ALIVE);
        opts.set_clean_session(true);

        let (client, mut connection) = Client::new(opts, REQUEST_CAPACITY);
        connection.eventloop.set_network_options(network_options());
        Self { client, connection }
    }
}

fn network_options() -> NetworkOptions {
    let mut opts = NetworkOptions::new();
    opts.set_connection_timeout(CONNECT_TIMEOUT_SECS);
    opts
}

/// Identificador do cliente por máquina: `SolarTray-<hostname>`.
pub fn client_id() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".into());
    format!("SolarTray-{host}")
}

impl BrokerLink for MqttLink {
    type Closer = MqttCloser;

    fn poll(&mut self) -> Result<LinkEvent, LinkError> {
        match self.connection.iter().next() {
            None => Err(LinkError::Closed),
            Some(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                if ack.code == ConnectReturnCode::Success {
                    Ok(LinkEvent::Connected)
                } else {
                    Err(LinkError::Refused(format!("{:?}", ack.code)))
                }
            }
            Some(Ok(Event::Incoming(Packet::Publish(publish)))) => Ok(LinkEvent::Message {
                topic: publish.topic,
                payload: publish.payload.to_vec(),
            }),
            Some(Ok(Event::Incoming(Packet::Disconnect))) => {
                Err(LinkError::Transport("broker enviou DISCONNECT".into()))
            }
            Some(Ok(_)) => Ok(LinkEvent::Idle),
            Some(Err(e)) => Err(map_connection_error(e)),
        }
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), LinkError> {
        self.client
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| LinkError::Transport(e.to_string()))
    }

    fn closer(&self) -> MqttCloser {
        MqttCloser(self.client.clone())
    }
}

fn map_connection_error(e: ConnectionError) -> LinkError {
    match e {
        ConnectionError::ConnectionRefused(code) => LinkError::Refused(format!("{code:?}")),
        ConnectionError::RequestsDone => LinkError::Closed,
        other => LinkError::Transport(other.to_string()),
    }
}

/// Handle de desconexão usado por `stop()`.
pub struct MqttCloser(Client);

impl LinkCloser for MqttCloser {
    fn close(&self) -> Result<(), LinkError> {
        self.0
            .try_disconnect()
            .map_err(|e| LinkError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_has_prefix() {
        let id = client_id();
        assert!(id.starts_with("SolarTray-"));
        assert!(id.len() > "SolarTray-".len());
    }

    #[test]
    fn connect_attempt_is_bounded() {
        assert_eq!(network_options().connection_timeout(), CONNECT_TIMEOUT_SECS);
        assert!(Duration::from_secs(CONNECT_TIMEOUT_SECS) <= crate::subscriber::RECONNECT_BACKOFF);
    }

    #[test]
    fn stop_during_silent_handshake_is_bounded() {
        use crate::subscriber::{ReconnectingSubscriber, SubscriberOptions};
        use std::net::TcpListener;
        use std::time::Instant;

        // Aceita TCP mas nunca responde com CONNACK.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = std::thread::spawn(move || listener.accept().map(|(stream, _)| stream));

        let broker = BrokerConfig {
            address: "127.0.0.1".into(),
            port,
        };
        let link = MqttLink::new(&broker, "SolarTray-test");
        let (mut sub, _rx) = ReconnectingSubscriber::start(link, SubscriberOptions::default()).unwrap();
        let _stream = accept.join().unwrap().unwrap();

        let started = Instant::now();
        sub.stop();
        assert!(started.elapsed() < Duration::from_secs(CONNECT_TIMEOUT_SECS + 2));
    }

    #[test]
    fn refused_code_maps_to_refused() {
        let e = map_connection_error(ConnectionError::ConnectionRefused(
            ConnectReturnCode::NotAuthorized,
        ));
        assert_eq!(e, LinkError::Refused("NotAuthorized".into()));
        assert_eq!(map_connection_error(ConnectionError::RequestsDone), LinkError::Closed);
    }
}
