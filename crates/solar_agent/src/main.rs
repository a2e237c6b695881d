//! # SolarTray Agent
//!
//! Agente de bandeja que acompanha um inversor solar via MQTT.
//!
//! Assina os tópicos do Solar Assistant, mantém o snapshot atualizado,
//! dispara alertas de bateria na transição dos thresholds e esconde o
//! overlay quando outra janela ocupa a tela inteira.
//!
//! ## Configuração
//! `config.ini` ao lado do executável (ou `$SOLARTRAY_CONFIG`).
//! Nível de log via `RUST_LOG` (padrão `info`).

mod mqtt_link;
mod orchestrator;
mod presenter;
mod subscriber;
mod visibility;
#[cfg(windows)]
mod win32;

use anyhow::Context;
use mqtt_link::MqttLink;
use orchestrator::{Orchestrator, VISIBILITY_POLL_INTERVAL};
use presenter::LogPresenter;
use solar_core::config::AppConfig;
use subscriber::{ReconnectingSubscriber, SubscriberOptions};
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Config ──
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);
    for problem in config.validate() {
        warn!("Config: {problem}");
    }

    let client_id = mqtt_link::client_id();
    info!(
        "Broker {}:{} – cliente {client_id}",
        config.broker.address, config.broker.port
    );

    // ── Ingestão MQTT ──
    let link = MqttLink::new(&config.broker, &client_id);
    let (mut subscriber, events) = ReconnectingSubscriber::start(link, SubscriberOptions::default())
        .context("Falha ao criar thread mqtt-subscriber")?;

    // ── Ctrl-C ──
    let (quit_tx, quit_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = quit_tx.try_send(());
    })
    .context("Falha ao instalar handler de Ctrl-C")?;

    // ── Loop principal ──
    let mut orchestrator = Orchestrator::new(&config, LogPresenter::default(), visibility::native());
    orchestrator.run(&events, &quit_rx, VISIBILITY_POLL_INTERVAL);

    subscriber.stop();
    Ok(())
}
