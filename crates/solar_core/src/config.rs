//! Configuração do agente em `config.ini`.
//!
//! Formato `chave = valor`, uma por linha, `#` para comentários:
//!
//! ```text
//! # SolarTray Configuration
//! address = 192.168.0.32
//! port = 1883
//! show_overlay = true
//! battery_low_enabled = 1
//! battery_low_threshold = 20
//! ```
//!
//! Linhas inválidas são ignoradas uma a uma; o carregamento nunca aborta.

use crate::protocol::DEFAULT_BROKER_PORT;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Variável de ambiente que sobrescreve o caminho do config.
pub const CONFIG_PATH_ENV: &str = "SOLARTRAY_CONFIG";

const CONFIG_FILE_NAME: &str = "config.ini";

/// Erros de persistência da configuração.
///
/// Só a gravação falha para o chamador; erros de leitura caem nos padrões.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro ao gravar {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Endereço do broker MQTT.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerConfig {
    pub address: String,
    pub port: u16,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            address: "192.168.0.32".into(),
            port: DEFAULT_BROKER_PORT,
        }
    }
}

/// Thresholds e mensagens dos alertas de bateria.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryAlertConfig {
    pub high_enabled: bool,
    pub low_enabled: bool,
    pub high_threshold: f64,
    pub low_threshold: f64,
    pub high_message: String,
    pub low_message: String,
}

impl Default for BatteryAlertConfig {
    fn default() -> Self {
        Self {
            high_enabled: false,
            low_enabled: false,
            high_threshold: 95.0,
            low_threshold: 20.0,
            high_message: "Battery is full".into(),
            low_message: "Battery is low".into(),
        }
    }
}

/// Configuração raiz do agente.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub broker: BrokerConfig,
    /// Exibir o overlay na tela
    pub show_overlay: bool,
    pub battery: BatteryAlertConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            show_overlay: true,
            battery: BatteryAlertConfig::default(),
        }
    }
}

impl AppConfig {
    /// Interpreta o texto do arquivo partindo dos valores padrão.
    pub fn parse(content: &str) -> Self {
        let mut config = AppConfig::default();
        for (n, line) in content.lines().enumerate() {
            config.apply_line(n + 1, line);
        }
        config
    }

    fn apply_line(&mut self, line_no: usize, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            debug!("config.ini:{line_no}: linha sem '=', ignorada");
            return;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        match key.as_str() {
            "address" => self.broker.address = value.to_string(),
            "port" => parse_into(&mut self.broker.port, value, line_no, &key),
            "show_overlay" => self.show_overlay = parse_bool_loose(value, self.show_overlay),
            "battery_high_enabled" => {
                self.battery.high_enabled = parse_bool_loose(value, self.battery.high_enabled)
            }
            "battery_low_enabled" => {
                self.battery.low_enabled = parse_bool_loose(value, self.battery.low_enabled)
            }
            "battery_high_threshold" => {
                parse_into(&mut self.battery.high_threshold, value, line_no, &key)
            }
            "battery_low_threshold" => {
                parse_into(&mut self.battery.low_threshold, value, line_no, &key)
            }
            "battery_high_message" => self.battery.high_message = value.to_string(),
            "battery_low_message" => self.battery.low_message = value.to_string(),
            _ => debug!("config.ini:{line_no}: chave desconhecida '{key}'"),
        }
    }

    /// Carrega configuração de um arquivo.
    ///
    /// Se o arquivo não existe, grava os valores padrão nele.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("{} não encontrado, criando com valores padrão", path.display());
            let config = AppConfig::default();
            if let Err(e) = config.save(path) {
                warn!("Não foi possível salvar config padrão: {e}");
            }
            return config;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => {
                info!("Configuração carregada de {}", path.display());
                AppConfig::parse(&content)
            }
            Err(e) => {
                warn!("Erro ao ler {}: {e}", path.display());
                info!("Usando configuração padrão");
                AppConfig::default()
            }
        }
    }

    /// Gera o texto do arquivo.
    pub fn to_ini_string(&self) -> String {
        let lines = [
            "# SolarTray Configuration".to_string(),
            String::new(),
            format!("address = {}", self.broker.address),
            format!("port = {}", self.broker.port),
            String::new(),
            format!("show_overlay = {}", self.show_overlay),
            String::new(),
            format!("battery_high_enabled = {}", self.battery.high_enabled),
            format!("battery_low_enabled = {}", self.battery.low_enabled),
            String::new(),
            format!("battery_high_threshold = {}", self.battery.high_threshold),
            format!("battery_low_threshold = {}", self.battery.low_threshold),
            String::new(),
            format!("battery_high_message = {}", self.battery.high_message),
            format!("battery_low_message = {}", self.battery.low_message),
        ];
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Salva configuração em arquivo.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ini_string()).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Caminho do config: `$SOLARTRAY_CONFIG` ou `config.ini` ao lado do executável.
    pub fn default_path() -> PathBuf {
        if let Some(p) = std::env::var_os(CONFIG_PATH_ENV) {
            return PathBuf::from(p);
        }
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join(CONFIG_FILE_NAME)
    }

    /// Valida a configuração e retorna lista de problemas.
    ///
    /// Faixas de alerta sobrepostas são apenas sinalizadas; o avaliador
    /// continua disparando os dois alertas nesse caso.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.broker.address.trim().is_empty() {
            errors.push("Endereço do broker não pode ser vazio".into());
        }
        if self.broker.port == 0 {
            errors.push("Porta do broker não pode ser 0".into());
        }

        let b = &self.battery;
        for (name, value) in [("alto", b.high_threshold), ("baixo", b.low_threshold)] {
            if !(0.0..=100.0).contains(&value) {
                errors.push(format!("Threshold {name} fora de 0–100%: {value}"));
            }
        }
        if b.high_enabled && b.low_enabled && b.low_threshold > b.high_threshold {
            errors.push(format!(
                "Faixas sobrepostas: baixo ({}) > alto ({})",
                b.low_threshold, b.high_threshold
            ));
        }

        errors
    }
}

/// Booleano tolerante: `true`/`false`/`1`/`0`, senão mantém `fallback`.
pub fn parse_bool_loose(value: &str, fallback: bool) -> bool {
    if value.eq_ignore_ascii_case("true") || value == "1" {
        true
    } else if value.eq_ignore_ascii_case("false") || value == "0" {
        false
    } else {
        fallback
    }
}

fn parse_into<T: std::str::FromStr>(slot: &mut T, value: &str, line_no: usize, key: &str) {
    match value.parse::<T>() {
        Ok(v) => *slot = v,
        Err(_) => debug!("config.ini:{line_no}: valor inválido para '{key}': {value:?}"),
    }
}
