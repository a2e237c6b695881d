//! # Solar Core
//!
//! Crate compartilhada com o modelo de dados, a tabela de tópicos MQTT,
//! os alertas de bateria e a configuração do agente SolarTray.
//!
//! ## Módulos
//! - [`types`] – Snapshot com os cinco campos de telemetria
//! - [`protocol`] – Tópicos, conversões de unidade e decode de payload
//! - [`config`] – Configuração `chave = valor` em `config.ini`
//! - [`format`] – Textos de status (tooltip, overlay, detalhes)
//! - [`alerts`] – Detecção de borda nos thresholds de SOC

pub mod types;
pub mod protocol;
pub mod config;
pub mod format;
pub mod alerts;

// Re-exports convenientes
pub use types::{Snapshot, TelemetryField};
pub use protocol::{TOPICS, apply_message, decode_reading};
pub use config::{AppConfig, BatteryAlertConfig, BrokerConfig};
pub use alerts::{AlertEvaluator, BatteryAlert};
