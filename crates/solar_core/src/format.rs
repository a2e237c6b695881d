//! Textos de status derivados do snapshot (tooltip, overlay, detalhes).

use crate::types::Snapshot;

/// Limite de caracteres do tooltip do ícone da bandeja.
pub const TOOLTIP_MAX_CHARS: usize = 63;

pub const STATUS_STARTING: &str = "Solar: starting...";
pub const STATUS_CONNECTED: &str = "Solar: connected";

const NOT_AVAILABLE: &str = "N/A";

/// Sentido do fluxo de energia da rede.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridDirection {
    Importing,
    Exporting,
    Neutral,
}

impl GridDirection {
    pub fn of(grid_kw: f64) -> Self {
        if grid_kw > 0.0 {
            GridDirection::Importing
        } else if grid_kw < 0.0 {
            GridDirection::Exporting
        } else {
            GridDirection::Neutral
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GridDirection::Importing => "Importing",
            GridDirection::Exporting => "Exporting",
            GridDirection::Neutral => "Neutral",
        }
    }
}

/// Segmentos curtos usados no overlay e no tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSegments {
    pub pv: String,
    pub load: String,
    pub soc: String,
    pub grid: String,
}

impl StatusSegments {
    pub fn from_snapshot(s: &Snapshot) -> Self {
        Self {
            pv: or_na(s.pv_kw, |v| format!("{}kW", fixed(v, 1))),
            load: or_na(s.load_kw, |v| format!("{}kW", fixed(v, 1))),
            soc: or_na(s.soc_percent, |v| format!("{}%", fixed(v, 0))),
            grid: or_na(s.grid_kw, |v| format!("{}kW", signed_one_decimal(v))),
        }
    }
}

/// Linha única de status: `☀ PV 1.2kW | 🏠 Load 0.8kW | 🔋 87% | ⚡ -0.4kW`.
pub fn status_line(s: &Snapshot) -> String {
    let seg = StatusSegments::from_snapshot(s);
    format!(
        "☀ PV {} | 🏠 Load {} | 🔋 {} | ⚡ {}",
        seg.pv, seg.load, seg.soc, seg.grid
    )
}

/// Corta o texto no limite do tooltip, respeitando fronteiras de char.
pub fn truncate_tooltip(text: &str) -> String {
    text.chars().take(TOOLTIP_MAX_CHARS).collect()
}

/// Relatório detalhado em várias linhas.
pub fn detail_report(s: &Snapshot) -> String {
    let grid = match s.grid_kw {
        Some(v) => format!("{} kW ({})", fixed(v.abs(), 2), GridDirection::of(v).label()),
        None => format!("{NOT_AVAILABLE} ({NOT_AVAILABLE})"),
    };

    [
        format!("PV Power:      {}", or_na(s.pv_kw, |v| format!("{} kW", fixed(v, 2)))),
        format!("Load Power:    {}", or_na(s.load_kw, |v| format!("{} kW", fixed(v, 2)))),
        format!("Battery SOC:   {}", or_na(s.soc_percent, |v| format!("{} %", fixed(v, 1)))),
        format!("Battery Volt:  {}", or_na(s.battery_volts, |v| format!("{} V", fixed(v, 2)))),
        format!("Grid Power:    {grid}"),
    ]
    .join("\n")
}

fn or_na(value: Option<f64>, f: impl Fn(f64) -> String) -> String {
    value.map(f).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Casas decimais fixas, com meio arredondado para longe do zero (`86.5` → `87`).
pub fn fixed(v: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    format!("{:.*}", decimals, (v * scale).round() / scale)
}

/// `+1.2`, `-0.4` ou `0.0` (valores que arredondam para zero ficam sem sinal).
fn signed_one_decimal(v: f64) -> String {
    let rounded = fixed(v.abs(), 1);
    if rounded == "0.0" {
        rounded
    } else if v > 0.0 {
        format!("+{rounded}")
    } else {
        format!("-{rounded}")
    }
}
