//! Alertas de bateria – detecção de borda nos thresholds de SOC.
//!
//! Um alerta dispara na *transição* para dentro da faixa, não a cada amostra
//! que permanece nela. O avaliador guarda o último SOC observado para quando
//! o chamador não informa o valor anterior.

use crate::config::BatteryAlertConfig;

pub const DEFAULT_LOW_MESSAGE: &str = "Battery is low.";
pub const DEFAULT_HIGH_MESSAGE: &str = "Battery is full.";

/// Nível de alerta (define o ícone da notificação).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertLevel {
    Info,
    Warning,
}

/// Qual threshold foi cruzado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Low,
    High,
}

/// Um alerta disparado.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryAlert {
    pub kind: AlertKind,
    pub message: String,
    pub level: AlertLevel,
    /// SOC que disparou o alerta
    pub soc: f64,
}

/// Avaliador de alertas de bateria.
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    config: BatteryAlertConfig,
    last_soc: Option<f64>,
}

impl AlertEvaluator {
    pub fn new(config: BatteryAlertConfig) -> Self {
        Self {
            config,
            last_soc: None,
        }
    }

    pub fn config(&self) -> &BatteryAlertConfig {
        &self.config
    }

    /// Troca os thresholds sem perder o último SOC observado.
    pub fn set_config(&mut self, config: BatteryAlertConfig) {
        self.config = config;
    }

    /// Último SOC visto por [`evaluate`](Self::evaluate).
    pub fn last_observed(&self) -> Option<f64> {
        self.last_soc
    }

    /// Avalia uma amostra de SOC.
    ///
    /// `previous` tem precedência sobre o valor lembrado. Sem `current`
    /// nada é avaliado e o estado não muda.
    pub fn evaluate(&mut self, previous: Option<f64>, current: Option<f64>) -> Vec<BatteryAlert> {
        let Some(soc) = current else {
            return Vec::new();
        };
        let prev = previous.or(self.last_soc);
        let mut alerts = Vec::new();

        if self.config.low_enabled {
            let low = self.config.low_threshold;
            if soc <= low && prev.is_none_or(|p| p > low) {
                alerts.push(BatteryAlert {
                    kind: AlertKind::Low,
                    message: message_or_default(&self.config.low_message, DEFAULT_LOW_MESSAGE),
                    level: AlertLevel::Warning,
                    soc,
                });
            }
        }

        // Avaliado de forma independente: com faixas sobrepostas os dois disparam.
        if self.config.high_enabled {
            let high = self.config.high_threshold;
            if soc >= high && prev.is_none_or(|p| p < high) {
                alerts.push(BatteryAlert {
                    kind: AlertKind::High,
                    message: message_or_default(&self.config.high_message, DEFAULT_HIGH_MESSAGE),
                    level: AlertLevel::Info,
                    soc,
                });
            }
        }

        self.last_soc = Some(soc);
        alerts
    }
}

fn message_or_default(configured: &str, default: &str) -> String {
    if configured.trim().is_empty() {
        default.to_string()
    } else {
        configured.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(low: Option<f64>, high: Option<f64>) -> BatteryAlertConfig {
        BatteryAlertConfig {
            low_enabled: low.is_some(),
            low_threshold: low.unwrap_or(20.0),
            high_enabled: high.is_some(),
            high_threshold: high.unwrap_or(95.0),
            low_message: String::new(),
            high_message: String::new(),
        }
    }

    /// Alimenta a sequência usando só o valor lembrado.
    fn feed(evaluator: &mut AlertEvaluator, samples: &[f64]) -> Vec<(usize, AlertKind)> {
        let mut fired = Vec::new();
        for (i, soc) in samples.iter().enumerate() {
            for alert in evaluator.evaluate(None, Some(*soc)) {
                fired.push((i, alert.kind));
            }
        }
        fired
    }

    #[test]
    fn low_fires_once_per_crossing() {
        let mut ev = AlertEvaluator::new(config(Some(20.0), None));
        let fired = feed(&mut ev, &[25.0, 22.0, 18.0, 19.0, 5.0]);
        assert_eq!(fired, vec![(2, AlertKind::Low)]);
    }

    #[test]
    fn high_rearms_after_dropping_below() {
        let mut ev = AlertEvaluator::new(config(None, Some(95.0)));
        let fired = feed(&mut ev, &[90.0, 96.0, 97.0, 90.0, 96.0]);
        assert_eq!(fired, vec![(1, AlertKind::High), (4, AlertKind::High)]);
    }

    #[test]
    fn first_sample_past_threshold_fires() {
        let mut ev = AlertEvaluator::new(config(Some(20.0), Some(95.0)));
        let alerts = ev.evaluate(None, Some(10.0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Low);
        assert_eq!(alerts[0].level, AlertLevel::Warning);

        let mut ev = AlertEvaluator::new(config(Some(20.0), Some(95.0)));
        let alerts = ev.evaluate(None, Some(100.0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::High);
        assert_eq!(alerts[0].level, AlertLevel::Info);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let mut ev = AlertEvaluator::new(config(Some(20.0), Some(95.0)));
        assert_eq!(ev.evaluate(Some(21.0), Some(20.0)).len(), 1);
        assert_eq!(ev.evaluate(Some(94.0), Some(95.0)).len(), 1);
    }

    #[test]
    fn missing_current_is_a_no_op() {
        let mut ev = AlertEvaluator::new(config(Some(20.0), None));
        ev.evaluate(None, Some(50.0));
        assert!(ev.evaluate(None, None).is_empty());
        assert_eq!(ev.last_observed(), Some(50.0));
    }

    #[test]
    fn explicit_previous_overrides_memory() {
        let mut ev = AlertEvaluator::new(config(Some(20.0), None));
        ev.evaluate(None, Some(10.0));
        // Lembrado = 10 (já abaixo), mas o chamador diz que veio de 30.
        assert_eq!(ev.evaluate(Some(30.0), Some(15.0)).len(), 1);
        // Lembrado = 15, chamador diz que veio de 12: sem borda.
        assert!(ev.evaluate(Some(12.0), Some(11.0)).is_empty());
    }

    #[test]
    fn memory_updates_even_without_alert() {
        let mut ev = AlertEvaluator::new(config(None, None));
        ev.evaluate(None, Some(42.0));
        ev.evaluate(None, Some(43.0));
        assert_eq!(ev.last_observed(), Some(43.0));
    }

    #[test]
    fn disabled_alerts_never_fire() {
        let mut ev = AlertEvaluator::new(config(None, None));
        assert!(feed(&mut ev, &[0.0, 100.0, 0.0]).is_empty());
    }

    #[test]
    fn overlapping_bands_fire_both() {
        let mut ev = AlertEvaluator::new(config(Some(60.0), Some(40.0)));
        let kinds: Vec<_> = ev.evaluate(None, Some(50.0)).into_iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::Low, AlertKind::High]);
    }

    #[test]
    fn blank_messages_use_defaults() {
        let mut cfg = config(Some(20.0), Some(95.0));
        cfg.low_message = "   ".into();
        cfg.high_message = "Cheia!".into();
        let mut ev = AlertEvaluator::new(cfg);

        assert_eq!(ev.evaluate(None, Some(5.0))[0].message, DEFAULT_LOW_MESSAGE);
        assert_eq!(ev.evaluate(None, Some(99.0))[0].message, "Cheia!");
    }

    #[test]
    fn set_config_keeps_memory() {
        let mut ev = AlertEvaluator::new(config(None, None));
        ev.evaluate(None, Some(10.0));
        ev.set_config(config(Some(20.0), None));
        // Já estava abaixo antes da troca: não é uma nova transição.
        assert!(ev.evaluate(None, Some(9.0)).is_empty());
    }
}
