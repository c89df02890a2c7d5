pub mod config;
pub mod manager;

pub use config::{ConfigError, PostProcessConfig, Settings, SynthesisConfig};
pub use manager::{SettingsManager, DEFAULT_SETTINGS_FILE};

#[cfg(test)]
mod tests;
