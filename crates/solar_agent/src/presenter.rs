//! Camada de apresentação vista pelo orquestrador.
//!
//! A bandeja, o overlay e os balões de notificação ficam atrás de
//! [`Presenter`]. O binário usa [`LogPresenter`], que escreve tudo no log.

use crate::visibility::WindowId;
use solar_core::alerts::{AlertLevel, BatteryAlert};
use solar_core::format::{self, truncate_tooltip};
use solar_core::types::Snapshot;
use tracing::{debug, info, warn};

/// Título das notificações de bateria.
pub const NOTIFICATION_TITLE: &str = "Solar battery";

/// Trait para a superfície de UI. Chamada sempre da mesma thread.
pub trait Presenter {
    /// Texto de status simples (conectando, conectado, falha).
    fn set_status(&mut self, text: &str);
    /// Novo snapshot para tooltip e overlay.
    fn show_snapshot(&mut self, snapshot: &Snapshot);
    /// Balão de notificação de bateria.
    fn notify(&mut self, alert: &BatteryAlert);
    fn set_overlay_visible(&mut self, visible: bool);

    /// Janela do próprio overlay, que nunca conta como tela ocupada.
    fn overlay_window(&self) -> Option<WindowId> {
        None
    }
}

/// Apresentação em log: tooltip e overlay viram linhas `info`.
///
/// Não cria janela, então não há overlay a excluir da classificação.
#[derive(Debug, Default)]
pub struct LogPresenter {
    tooltip: String,
}

impl LogPresenter {
    fn set_tooltip(&mut self, text: &str) {
        let text = truncate_tooltip(text);
        if text != self.tooltip {
            info!("{text}");
            self.tooltip = text;
        }
    }
}

impl Presenter for LogPresenter {
    fn set_status(&mut self, text: &str) {
        self.set_tooltip(text);
    }

    fn show_snapshot(&mut self, snapshot: &Snapshot) {
        self.set_tooltip(&format::status_line(snapshot));
        debug!("\n{}", format::detail_report(snapshot));
    }

    fn notify(&mut self, alert: &BatteryAlert) {
        let soc = format::fixed(alert.soc, 0);
        match alert.level {
            AlertLevel::Warning => warn!("{NOTIFICATION_TITLE}: {} (SOC {soc}%)", alert.message),
            AlertLevel::Info => info!("{NOTIFICATION_TITLE}: {} (SOC {soc}%)", alert.message),
        }
    }

    fn set_overlay_visible(&mut self, visible: bool) {
        info!("Overlay {}", if visible { "visível" } else { "oculto" });
    }
}
