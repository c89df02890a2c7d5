use crate::settings::config::{Settings, SynthesisConfig};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SETTINGS_FILE: &str = "voxbatch.toml";

/// Loads the batch settings file. A missing file is created with defaults
/// so the first run leaves an editable template behind.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings_path: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Create a settings manager from a specific path
    pub fn from_path(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            write_settings(&path, &Settings::default())?;
            tracing::info!(?path, "Wrote default settings");
        }

        let settings = Self::load_from_file_with_backup(&path)?;

        Ok(Self {
            settings_path: path,
            settings,
        })
    }

    /// Parse failures move the file aside and put a fresh default in its
    /// place, but still fail: a batch must never run on settings the user
    /// did not write.
    fn load_from_file_with_backup(path: &Path) -> Result<Settings> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {path:?}"))?;

        match toml::from_str(&contents) {
            Ok(settings) => Ok(settings),
            Err(parse_error) => {
                let backup_path = path.with_extension("toml.backup");
                fs::rename(path, &backup_path).with_context(|| {
                    format!("Failed to backup corrupted settings to {backup_path:?}")
                })?;
                write_settings(path, &Settings::default())?;

                bail!(
                    "Failed to parse settings {path:?} (moved to {backup_path:?}, defaults written in its place): {parse_error}"
                )
            }
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    /// Directory that relative paths in the settings are resolved against
    pub fn base_dir(&self) -> &Path {
        match self.settings_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Validate the settings and resolve every path they name.
    pub fn synthesis_config(&self) -> Result<SynthesisConfig> {
        SynthesisConfig::resolve(&self.settings, self.base_dir())
            .with_context(|| format!("Invalid settings in {:?}", self.settings_path))
    }

    /// Save provided settings
    pub fn save_settings(&mut self, settings: Settings) -> Result<()> {
        write_settings(&self.settings_path, &settings)?;
        self.settings = settings;
        Ok(())
    }
}

fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {parent:?}"))?;
        }
    }

    let contents = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
    fs::write(path, contents).with_context(|| format!("Failed to write settings to {path:?}"))
}
