//! Tabela de tópicos MQTT e decodificação dos payloads.
//!
//! Cada tópico publica um único número em texto UTF-8:
//!
//! ```text
//! solar_assistant/total/pv_power/state  →  "1534"   (W)
//! solar_assistant/battery_1/voltage/state  →  "52.31"  (V)
//! ```
//!
//! - Potências chegam em watts e são guardadas em kW (÷1000)
//! - SOC e tensão são guardados como recebidos
//! - Separador decimal fixo (`.`), independente de locale

use crate::types::{Snapshot, TelemetryField};

pub const PV_TOPIC: &str = "solar_assistant/total/pv_power/state";
pub const LOAD_TOPIC: &str = "solar_assistant/total/load_power/state";
pub const SOC_TOPIC: &str = "solar_assistant/total/battery_state_of_charge/state";
pub const GRID_TOPIC: &str = "solar_assistant/total/grid_power/state";
pub const VOLT_TOPIC: &str = "solar_assistant/battery_1/voltage/state";

/// Porta padrão do broker.
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Conversão de unidade aplicada ao valor recebido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// W → kW
    WattsToKilowatts,
    /// Valor guardado como recebido
    Identity,
}

impl Conversion {
    pub fn apply(self, raw: f64) -> f64 {
        match self {
            Conversion::WattsToKilowatts => raw / 1000.0,
            Conversion::Identity => raw,
        }
    }
}

/// Associação fixa tópico → campo → conversão.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicBinding {
    pub topic: &'static str,
    pub field: TelemetryField,
    pub conversion: Conversion,
}

/// Os cinco tópicos assinados, na ordem de inscrição.
pub const TOPICS: [TopicBinding; 5] = [
    TopicBinding {
        topic: PV_TOPIC,
        field: TelemetryField::PvPower,
        conversion: Conversion::WattsToKilowatts,
    },
    TopicBinding {
        topic: LOAD_TOPIC,
        field: TelemetryField::LoadPower,
        conversion: Conversion::WattsToKilowatts,
    },
    TopicBinding {
        topic: SOC_TOPIC,
        field: TelemetryField::StateOfCharge,
        conversion: Conversion::Identity,
    },
    TopicBinding {
        topic: GRID_TOPIC,
        field: TelemetryField::GridPower,
        conversion: Conversion::WattsToKilowatts,
    },
    TopicBinding {
        topic: VOLT_TOPIC,
        field: TelemetryField::BatteryVoltage,
        conversion: Conversion::Identity,
    },
];

/// Erros de decodificação de mensagem.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProtocolError {
    #[error("Tópico desconhecido: {0}")]
    UnknownTopic(String),

    #[error("Payload não é UTF-8 válido")]
    InvalidUtf8,

    #[error("Payload não numérico: {0:?}")]
    InvalidNumber(String),
}

/// Leitura decodificada e já convertida.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub field: TelemetryField,
    pub value: f64,
}

/// Procura o binding de um tópico.
pub fn binding_for(topic: &str) -> Option<&'static TopicBinding> {
    TOPICS.iter().find(|b| b.topic == topic)
}

/// Interpreta o payload como número decimal invariante.
///
/// Espaços nas pontas são ignorados. `NaN` e infinitos são rejeitados.
pub fn parse_number(payload: &[u8]) -> Result<f64, ProtocolError> {
    let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)?;
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ProtocolError::InvalidNumber(trimmed.to_string())),
    }
}

/// Decodifica uma mensagem em uma [`Reading`].
pub fn decode_reading(topic: &str, payload: &[u8]) -> Result<Reading, ProtocolError> {
    let binding = binding_for(topic).ok_or_else(|| ProtocolError::UnknownTopic(topic.to_string()))?;
    let raw = parse_number(payload)?;
    Ok(Reading {
        field: binding.field,
        value: binding.conversion.apply(raw),
    })
}

/// Aplica uma mensagem ao snapshot.
///
/// Em caso de erro o snapshot fica intacto.
pub fn apply_message(
    snapshot: &mut Snapshot,
    topic: &str,
    payload: &[u8],
) -> Result<Reading, ProtocolError> {
    let reading = decode_reading(topic, payload)?;
    snapshot.set(reading.field, reading.value);
    Ok(reading)
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
