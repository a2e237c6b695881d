//! Orquestrador – loop principal da UI.
//!
//! Recebe os eventos do subscriber, passa o SOC pelo avaliador de alertas
//! e, a cada tick do timer, reclassifica a janela em primeiro plano para
//! decidir a visibilidade do overlay. Toda chamada ao [`Presenter`] sai
//! desta thread.

use crate::presenter::Presenter;
use crate::subscriber::SubscriberEvent;
use crate::visibility::{self, WindowSystem};
use crossbeam_channel::{Receiver, select, tick};
use solar_core::alerts::AlertEvaluator;
use solar_core::config::AppConfig;
use solar_core::format::{STATUS_CONNECTED, STATUS_STARTING};
use solar_core::types::Snapshot;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Intervalo do timer de visibilidade.
pub const VISIBILITY_POLL_INTERVAL: Duration = Duration::from_millis(500);

// ──────────────────────────────────────────
// Overlay
// ──────────────────────────────────────────

/// Regra de visibilidade do overlay.
///
/// Só reporta mudanças, para não repetir show/hide a cada tick.
#[derive(Debug, Clone)]
pub struct OverlayGate {
    enabled: bool,
    visible: bool,
}

impl OverlayGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            visible: false,
        }
    }

    /// Retorna `Some(visível)` quando a visibilidade muda.
    pub fn update(&mut self, occupied: bool) -> Option<bool> {
        let wanted = self.enabled && !occupied;
        if wanted == self.visible {
            return None;
        }
        self.visible = wanted;
        Some(wanted)
    }
}

// ──────────────────────────────────────────
// Orquestrador
// ──────────────────────────────────────────

pub struct Orchestrator<P: Presenter> {
    presenter: P,
    windows: Box<dyn WindowSystem>,
    evaluator: AlertEvaluator,
    gate: OverlayGate,
    previous_soc: Option<f64>,
}

impl<P: Presenter> Orchestrator<P> {
    pub fn new(config: &AppConfig, mut presenter: P, windows: Box<dyn WindowSystem>) -> Self {
        presenter.set_status(STATUS_STARTING);
        Self {
            presenter,
            windows,
            evaluator: AlertEvaluator::new(config.battery.clone()),
            gate: OverlayGate::new(config.show_overlay),
            previous_soc: None,
        }
    }

    pub fn handle_event(&mut self, event: SubscriberEvent) {
        match event {
            SubscriberEvent::Connected => self.presenter.set_status(STATUS_CONNECTED),
            SubscriberEvent::ConnectionFailed(reason) => self.presenter.set_status(&reason),
            SubscriberEvent::SnapshotUpdated(snapshot) => self.on_snapshot(snapshot),
        }
    }

    fn on_snapshot(&mut self, snapshot: Snapshot) {
        let alerts = self.evaluator.evaluate(self.previous_soc, snapshot.soc_percent);
        self.previous_soc = snapshot.soc_percent;
        for alert in &alerts {
            debug!("Alerta {:?} disparado em SOC {}", alert.kind, alert.soc);
            self.presenter.notify(alert);
        }

        self.presenter.show_snapshot(&snapshot);
    }

    /// Reclassifica o primeiro plano e aplica show/hide se mudou.
    pub fn poll_visibility(&mut self) {
        let own = self.presenter.overlay_window();
        let occupied = visibility::foreground_occupies_screen(self.windows.as_ref(), own);
        if let Some(visible) = self.gate.update(occupied) {
            self.presenter.set_overlay_visible(visible);
        }
    }

    /// Loop até `quit` disparar ou o subscriber encerrar.
    pub fn run(&mut self, events: &Receiver<SubscriberEvent>, quit: &Receiver<()>, interval: Duration) {
        let ticker = tick(interval);
        self.poll_visibility();

        loop {
            select! {
                recv(events) -> event => match event {
                    Ok(event) => self.handle_event(event),
                    Err(_) => {
                        warn!("Channel de eventos fechado, encerrando loop");
                        break;
                    }
                },
                recv(ticker) -> _ => self.poll_visibility(),
                recv(quit) -> _ => {
                    info!("Encerrando...");
                    break;
                }
            }
        }
    }
}
