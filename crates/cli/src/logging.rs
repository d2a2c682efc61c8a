use comexflow_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::Level;

/// Initialize the tracing subscriber from the effective logging config.
/// A config that fails to load falls back to defaults here; the command
/// itself reports the load error to the user.
pub fn init() {
    let logging = AppConfig::load(LoadOptions::default())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);

    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}
