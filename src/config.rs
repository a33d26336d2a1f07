// Конфигурация сессии
// Уровень логирования по умолчанию зависит от режима сборки, RUST_LOG его перекрывает

use crate::peer::types::ServerConfig;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(debug_assertions)]
pub const DEFAULT_LOG_FILTER: &str = "info"; // В режиме отладки подробные логи

#[cfg(not(debug_assertions))]
pub const DEFAULT_LOG_FILTER: &str = "warn"; // В продакшене только предупреждения

/// Интервал опроса файлового бэкенда
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Пауза перед отправкой pending-кандидатов, чтобы сбор успел отработать
pub const DEFAULT_GATHER_GRACE: Duration = Duration::from_millis(100);

pub const DEFAULT_STUN_URL: &str = "stun:stun.l.google.com:19302";

pub const DATA_CHANNEL_LABEL: &str = "data";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Директория слотов файлового бэкенда
    pub root_path: PathBuf,
    pub poll_interval: Duration,
    pub gather_grace: Duration,
    pub ice_servers: Vec<ServerConfig>,
    pub data_channel_label: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("./"),
            poll_interval: DEFAULT_POLL_INTERVAL,
            gather_grace: DEFAULT_GATHER_GRACE,
            ice_servers: vec![ServerConfig::stun("default-stun", DEFAULT_STUN_URL)],
            data_channel_label: DATA_CHANNEL_LABEL.to_string(),
        }
    }
}
