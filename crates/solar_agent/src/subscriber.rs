//! Thread de ingestão MQTT.
//!
//! Mantém a sessão com o broker, assina os tópicos fixos a cada conexão,
//! funde as mensagens no snapshot e envia eventos para a UI via channel.
//! Qualquer queda de conexão cai no loop de reconexão (espera fixa, sem
//! limite de tentativas) até [`ReconnectingSubscriber::stop`].

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};
use solar_core::protocol::{TOPICS, apply_message};
use solar_core::types::Snapshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Espera entre tentativas de reconexão.
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);

// ──────────────────────────────────────────────
// Transporte
// ──────────────────────────────────────────────

/// Algo que o transporte reportou.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Broker aceitou a sessão
    Connected,
    /// Publicação recebida
    Message { topic: String, payload: Vec<u8> },
    /// Pings, acks e demais pacotes sem interesse
    Idle,
}

/// Falhas do transporte. Nunca chegam ao chamador do subscriber.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinkError {
    #[error("recusada pelo broker ({0})")]
    Refused(String),

    #[error("{0}")]
    Transport(String),

    #[error("link encerrado")]
    Closed,
}

/// Encerra o link a partir de outra thread enquanto `poll` está bloqueado.
pub trait LinkCloser: Send + Sync + 'static {
    fn close(&self) -> Result<(), LinkError>;
}

/// Sessão com o broker, dirigida pela thread de ingestão.
pub trait BrokerLink: Send + 'static {
    type Closer: LinkCloser;

    /// Bloqueia até o próximo evento. Após um erro, a próxima chamada
    /// é uma nova tentativa de conexão.
    fn poll(&mut self) -> Result<LinkEvent, LinkError>;

    /// Assina um tópico com QoS "at most once".
    fn subscribe(&mut self, topic: &str) -> Result<(), LinkError>;

    fn closer(&self) -> Self::Closer;
}

// ──────────────────────────────────────────────
// Eventos para a UI
// ──────────────────────────────────────────────

/// Mensagem enviada da thread de ingestão para a UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriberEvent {
    Connected,
    /// Só emitido uma vez, quando a primeira tentativa falha
    ConnectionFailed(String),
    /// Cópia do snapshot logo após aplicar uma mensagem
    SnapshotUpdated(Snapshot),
}

#[derive(Debug, Clone)]
pub struct SubscriberOptions {
    pub backoff: Duration,
}

impl Default for SubscriberOptions {
    fn default() -> Self {
        Self {
            backoff: RECONNECT_BACKOFF,
        }
    }
}

// ──────────────────────────────────────────────
// Handle
// ──────────────────────────────────────────────

/// Dono da thread de ingestão. `Drop` chama [`stop`](Self::stop).
pub struct ReconnectingSubscriber {
    stopping: Arc<AtomicBool>,
    shutdown_tx: Option<Sender<()>>,
    closer: Box<dyn LinkCloser>,
    thread: Option<JoinHandle<()>>,
}

impl ReconnectingSubscriber {
    /// Inicia a thread de ingestão. Retorna o handle e o receiver de eventos.
    pub fn start<L: BrokerLink>(
        link: L,
        options: SubscriberOptions,
    ) -> std::io::Result<(Self, Receiver<SubscriberEvent>)> {
        let (events_tx, events_rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let stopping = Arc::new(AtomicBool::new(false));
        let closer: Box<dyn LinkCloser> = Box::new(link.closer());

        let session = SessionLoop {
            link,
            snapshot: Snapshot::default(),
            events: events_tx,
            shutdown: shutdown_rx,
            stopping: stopping.clone(),
            backoff: options.backoff,
            connected: false,
            ever_connected: false,
            failure_reported: false,
        };

        let thread = std::thread::Builder::new()
            .name("mqtt-subscriber".into())
            .spawn(move || session.run())?;

        Ok((
            Self {
                stopping,
                shutdown_tx: Some(shutdown_tx),
                closer,
                thread: Some(thread),
            },
            events_rx,
        ))
    }

    /// Desconecta, cancela a espera de reconexão e aguarda a thread.
    ///
    /// Idempotente; erros de desconexão são apenas logados.
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        self.stopping.store(true, Ordering::SeqCst);
        // Fechar o channel acorda o recv_timeout do backoff.
        self.shutdown_tx.take();
        if let Err(e) = self.closer.close() {
            debug!("Erro ao desconectar (ignorado): {e}");
        }
        if thread.join().is_err() {
            warn!("Thread mqtt-subscriber terminou com panic");
        }
        info!("Subscriber MQTT encerrado");
    }
}

impl Drop for ReconnectingSubscriber {
    fn drop(&mut self) {
        self.stop();
    }
}

// ──────────────────────────────────────────────
// Loop da thread
// ──────────────────────────────────────────────

struct SessionLoop<L: BrokerLink> {
    link: L,
    snapshot: Snapshot,
    events: Sender<SubscriberEvent>,
    shutdown: Receiver<()>,
    stopping: Arc<AtomicBool>,
    backoff: Duration,
    connected: bool,
    ever_connected: bool,
    failure_reported: bool,
}

impl<L: BrokerLink> SessionLoop<L> {
    fn run(mut self) {
        while !self.is_stopping() {
            match self.link.poll() {
                Ok(LinkEvent::Connected) => self.on_connected(),
                Ok(LinkEvent::Message { topic, payload }) => self.on_message(&topic, &payload),
                Ok(LinkEvent::Idle) => {}
                Err(e) => {
                    if self.is_stopping() {
                        break;
                    }
                    self.on_link_error(&e);
                    if !self.wait_backoff() {
                        break;
                    }
                }
            }
        }
        debug!("Loop mqtt-subscriber finalizado");
    }

    fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    fn on_connected(&mut self) {
        // Sessão limpa: as assinaturas são refeitas a cada conexão.
        for binding in TOPICS.iter() {
            if let Err(e) = self.link.subscribe(binding.topic) {
                warn!("Falha ao assinar {}: {e}", binding.topic);
            }
        }
        self.connected = true;
        self.ever_connected = true;
        info!("Conectado ao broker, {} tópicos assinados", TOPICS.len());
        self.emit(SubscriberEvent::Connected);
    }

    fn on_message(&mut self, topic: &str, payload: &[u8]) {
        match apply_message(&mut self.snapshot, topic, payload) {
            Ok(reading) => {
                debug!("{topic} → {:?} = {}", reading.field, reading.value);
                self.emit(SubscriberEvent::SnapshotUpdated(self.snapshot));
            }
            Err(e) => debug!("Mensagem descartada de {topic}: {e}"),
        }
    }

    fn on_link_error(&mut self, e: &LinkError) {
        if !self.ever_connected && !self.failure_reported {
            self.failure_reported = true;
            warn!("Falha na conexão inicial: {e}. Tentando novamente a cada {:?}...", self.backoff);
            self.emit(SubscriberEvent::ConnectionFailed(format!(
                "Solar: connect failed: {e}"
            )));
        } else if self.connected {
            warn!("Conexão com o broker perdida: {e}. Reconectando...");
        } else {
            debug!("Reconexão falhou: {e}");
        }
        self.connected = false;
    }

    /// `false` se o shutdown foi pedido durante a espera.
    fn wait_backoff(&self) -> bool {
        matches!(
            self.shutdown.recv_timeout(self.backoff),
            Err(RecvTimeoutError::Timeout)
        )
    }

    fn emit(&self, event: SubscriberEvent) {
        // UI já foi embora: nada a fazer, o stop() vem em seguida.
        let _ = self.events.send(event);
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use solar_core::protocol::{PV_TOPIC, SOC_TOPIC, VOLT_TOPIC};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Instant;

    const WAIT: Duration = Duration::from_secs(5);

    /// Link roteirizado: devolve os passos em ordem e depois bloqueia
    /// até ser fechado.
    struct ScriptedLink {
        steps: VecDeque<Result<LinkEvent, LinkError>>,
        polls: Arc<Mutex<usize>>,
        subscriptions: Arc<Mutex<Vec<String>>>,
        close_tx: Sender<()>,
        close_rx: Receiver<()>,
    }

    struct ScriptCloser(Sender<()>);

    impl LinkCloser for ScriptCloser {
        fn close(&self) -> Result<(), LinkError> {
            let _ = self.0.try_send(());
            Err(LinkError::Transport("já desconectado".into()))
        }
    }

    impl BrokerLink for ScriptedLink {
        type Closer = ScriptCloser;

        fn poll(&mut self) -> Result<LinkEvent, LinkError> {
            *self.polls.lock().unwrap() += 1;
            match self.steps.pop_front() {
                Some(step) => step,
                None => {
                    let _ = self.close_rx.recv();
                    Err(LinkError::Closed)
                }
            }
        }

        fn subscribe(&mut self, topic: &str) -> Result<(), LinkError> {
            self.subscriptions.lock().unwrap().push(topic.to_string());
            Ok(())
        }

        fn closer(&self) -> ScriptCloser {
            ScriptCloser(self.close_tx.clone())
        }
    }

    struct Probe {
        polls: Arc<Mutex<usize>>,
        subscriptions: Arc<Mutex<Vec<String>>>,
    }

    fn scripted(steps: Vec<Result<LinkEvent, LinkError>>) -> (ScriptedLink, Probe) {
        let (close_tx, close_rx) = bounded(1);
        let polls = Arc::new(Mutex::new(0));
        let subscriptions = Arc::new(Mutex::new(Vec::new()));
        let link = ScriptedLink {
            steps: steps.into(),
            polls: polls.clone(),
            subscriptions: subscriptions.clone(),
            close_tx,
            close_rx,
        };
        (link, Probe { polls, subscriptions })
    }

    fn msg(topic: &str, payload: &str) -> Result<LinkEvent, LinkError> {
        Ok(LinkEvent::Message {
            topic: topic.into(),
            payload: payload.as_bytes().to_vec(),
        })
    }

    fn fast() -> SubscriberOptions {
        SubscriberOptions {
            backoff: Duration::from_millis(1),
        }
    }

    fn next(rx: &Receiver<SubscriberEvent>) -> SubscriberEvent {
        rx.recv_timeout(WAIT).expect("evento esperado")
    }

    fn snapshot_of(event: SubscriberEvent) -> Snapshot {
        match event {
            SubscriberEvent::SnapshotUpdated(s) => s,
            other => panic!("esperado SnapshotUpdated, veio {other:?}"),
        }
    }

    #[test]
    fn keeps_retrying_until_connected() {
        let (link, probe) = scripted(vec![
            Err(LinkError::Transport("connection refused".into())),
            Err(LinkError::Transport("connection refused".into())),
            Err(LinkError::Transport("connection refused".into())),
            Ok(LinkEvent::Connected),
            msg(SOC_TOPIC, "55"),
            msg(PV_TOPIC, "garbage"),
            msg(PV_TOPIC, "1200"),
        ]);
        let (mut sub, rx) = ReconnectingSubscriber::start(link, fast()).unwrap();

        match next(&rx) {
            SubscriberEvent::ConnectionFailed(reason) => {
                assert!(reason.starts_with("Solar: connect failed:"));
                assert!(reason.contains("connection refused"));
            }
            other => panic!("esperado ConnectionFailed, veio {other:?}"),
        }
        assert_eq!(next(&rx), SubscriberEvent::Connected);
        assert_eq!(snapshot_of(next(&rx)).soc_percent, Some(55.0));

        // O payload inválido não gera evento nem altera nada.
        let s = snapshot_of(next(&rx));
        assert_eq!(s.pv_kw, Some(1.2));
        assert_eq!(s.soc_percent, Some(55.0));

        sub.stop();
        assert!(rx.try_recv().is_err());
        // 7 passos roteirizados (+1 se a thread chegou a bloquear antes do stop).
        assert!(*probe.polls.lock().unwrap() >= 7);
        assert_eq!(probe.subscriptions.lock().unwrap().len(), TOPICS.len());
    }

    #[test]
    fn resubscribes_and_keeps_snapshot_after_drop() {
        let (link, probe) = scripted(vec![
            Ok(LinkEvent::Connected),
            msg(SOC_TOPIC, "40"),
            Ok(LinkEvent::Idle),
            Err(LinkError::Transport("connection reset".into())),
            Err(LinkError::Transport("connection refused".into())),
            Ok(LinkEvent::Connected),
            msg(VOLT_TOPIC, "52.4"),
        ]);
        let (mut sub, rx) = ReconnectingSubscriber::start(link, fast()).unwrap();

        assert_eq!(next(&rx), SubscriberEvent::Connected);
        assert_eq!(snapshot_of(next(&rx)).soc_percent, Some(40.0));
        // Queda após já ter conectado não gera ConnectionFailed.
        assert_eq!(next(&rx), SubscriberEvent::Connected);
        let s = snapshot_of(next(&rx));
        assert_eq!(s.soc_percent, Some(40.0));
        assert_eq!(s.battery_volts, Some(52.4));

        sub.stop();
        let subs = probe.subscriptions.lock().unwrap();
        assert_eq!(subs.len(), 2 * TOPICS.len());
        assert_eq!(subs[0], TOPICS[0].topic);
    }

    #[test]
    fn refused_first_attempt_is_reported_once() {
        let (link, _probe) = scripted(vec![
            Err(LinkError::Refused("BadUserNamePassword".into())),
            Err(LinkError::Refused("BadUserNamePassword".into())),
            Ok(LinkEvent::Connected),
        ]);
        let (mut sub, rx) = ReconnectingSubscriber::start(link, fast()).unwrap();

        match next(&rx) {
            SubscriberEvent::ConnectionFailed(reason) => {
                assert!(reason.contains("BadUserNamePassword"));
            }
            other => panic!("esperado ConnectionFailed, veio {other:?}"),
        }
        assert_eq!(next(&rx), SubscriberEvent::Connected);
        sub.stop();
    }

    #[test]
    fn message_order_is_preserved() {
        let mut steps = vec![Ok(LinkEvent::Connected)];
        for soc in 1..=20 {
            steps.push(msg(SOC_TOPIC, &soc.to_string()));
        }
        let (link, _probe) = scripted(steps);
        let (mut sub, rx) = ReconnectingSubscriber::start(link, fast()).unwrap();

        assert_eq!(next(&rx), SubscriberEvent::Connected);
        for soc in 1..=20 {
            assert_eq!(snapshot_of(next(&rx)).soc_percent, Some(soc as f64));
        }
        sub.stop();
    }

    #[test]
    fn stop_cancels_backoff_wait() {
        let (link, _probe) = scripted(vec![Err(LinkError::Transport("unreachable".into()))]);
        let options = SubscriberOptions {
            backoff: Duration::from_secs(60),
        };
        let (mut sub, rx) = ReconnectingSubscriber::start(link, options).unwrap();
        assert!(matches!(next(&rx), SubscriberEvent::ConnectionFailed(_)));

        let started = Instant::now();
        sub.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(sub.thread.is_none());
    }

    #[test]
    fn stop_is_idempotent() {
        let (link, _probe) = scripted(vec![Ok(LinkEvent::Connected)]);
        let (mut sub, rx) = ReconnectingSubscriber::start(link, fast()).unwrap();
        assert_eq!(next(&rx), SubscriberEvent::Connected);

        sub.stop();
        sub.stop();
        drop(sub);
    }

    #[test]
    fn drop_without_stop_joins_thread() {
        let (link, _probe) = scripted(vec![]);
        let (sub, rx) = ReconnectingSubscriber::start(link, fast()).unwrap();
        drop(sub);
        // Thread encerrada: o sender foi liberado.
        assert!(rx.recv_timeout(WAIT).is_err());
    }
}
