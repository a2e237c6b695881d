//! Definição do snapshot de telemetria solar.
//!
//! Cada grandeza chega em uma mensagem MQTT separada; o snapshot é a fusão
//! do último valor conhecido de cada uma.

// ──────────────────────────────────────────────
// Campos
// ──────────────────────────────────────────────

/// Grandeza de telemetria associada a um tópico.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryField {
    /// Potência fotovoltaica (kW)
    PvPower,
    /// Potência consumida pela casa (kW)
    LoadPower,
    /// Estado de carga da bateria (%)
    StateOfCharge,
    /// Potência da rede (kW, positivo = importando)
    GridPower,
    /// Tensão da bateria (V)
    BatteryVoltage,
}

impl TelemetryField {
    pub const ALL: [TelemetryField; 5] = [
        TelemetryField::PvPower,
        TelemetryField::LoadPower,
        TelemetryField::StateOfCharge,
        TelemetryField::GridPower,
        TelemetryField::BatteryVoltage,
    ];

    pub fn unit(self) -> &'static str {
        match self {
            TelemetryField::PvPower | TelemetryField::LoadPower | TelemetryField::GridPower => "kW",
            TelemetryField::StateOfCharge => "%",
            TelemetryField::BatteryVoltage => "V",
        }
    }
}

// ──────────────────────────────────────────────
// Snapshot
// ──────────────────────────────────────────────

/// Melhor valor conhecido de cada grandeza.
///
/// `None` significa que nenhuma mensagem chegou para aquele campo nesta
/// sessão. Os campos nunca são zerados depois de preenchidos.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshot {
    pub pv_kw: Option<f64>,
    pub load_kw: Option<f64>,
    pub soc_percent: Option<f64>,
    /// Positivo = importando da rede, negativo = exportando
    pub grid_kw: Option<f64>,
    pub battery_volts: Option<f64>,
}

impl Snapshot {
    /// Sobrescreve um campo com o valor já convertido.
    pub fn set(&mut self, field: TelemetryField, value: f64) {
        let slot = match field {
            TelemetryField::PvPower => &mut self.pv_kw,
            TelemetryField::LoadPower => &mut self.load_kw,
            TelemetryField::StateOfCharge => &mut self.soc_percent,
            TelemetryField::GridPower => &mut self.grid_kw,
            TelemetryField::BatteryVoltage => &mut self.battery_volts,
        };
        *slot = Some(value);
    }

    pub fn get(&self, field: TelemetryField) -> Option<f64> {
        match field {
            TelemetryField::PvPower => self.pv_kw,
            TelemetryField::LoadPower => self.load_kw,
            TelemetryField::StateOfCharge => self.soc_percent,
            TelemetryField::GridPower => self.grid_kw,
            TelemetryField::BatteryVoltage => self.battery_volts,
        }
    }

    /// `true` enquanto nenhum campo foi recebido.
    pub fn is_empty(&self) -> bool {
        TelemetryField::ALL.iter().all(|f| self.get(*f).is_none())
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
