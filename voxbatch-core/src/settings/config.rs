use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::SpeedMultiplier;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynthesizerSettings {
    /// Path to the synthesizer executable. A bare name is looked up next
    /// to the settings file first, then on PATH.
    #[serde(default = "default_synthesizer")]
    pub executable: String,

    /// Voice model file
    #[serde(default = "default_voice_model")]
    pub voice_model: String,

    /// Voice model config file. Defaults to `<voice_model>.json`.
    #[serde(default)]
    pub model_config: Option<String>,

    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Seconds of silence inserted after each sentence
    #[serde(default = "default_sentence_silence")]
    pub sentence_silence: f64,
}

fn default_synthesizer() -> String {
    "piper".to_string()
}

fn default_voice_model() -> String {
    "voice_model.onnx".to_string()
}

fn default_volume() -> f64 {
    1.5
}

fn default_sentence_silence() -> f64 {
    0.2
}

impl Default for SynthesizerSettings {
    fn default() -> Self {
        Self {
            executable: default_synthesizer(),
            voice_model: default_voice_model(),
            model_config: None,
            volume: default_volume(),
            sentence_silence: default_sentence_silence(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostProcessingSettings {
    #[serde(default = "default_post_processing_enabled")]
    pub enabled: bool,

    #[serde(default = "default_post_processor")]
    pub executable: String,

    /// Playback speed multiplier; 1.0 is normal speed
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Audio filter chain. The default converts mono to stereo and
    /// normalizes loudness with a -1 dB true peak ceiling.
    #[serde(default = "default_filters")]
    pub filters: String,
}

fn default_post_processing_enabled() -> bool {
    true
}

fn default_post_processor() -> String {
    "ffmpeg".to_string()
}

fn default_speed() -> f64 {
    1.0
}

fn default_filters() -> String {
    "pan=stereo|c0=c0|c1=c0,loudnorm=I=-10:TP=-1.0:LRA=11".to_string()
}

impl Default for PostProcessingSettings {
    fn default() -> Self {
        Self {
            enabled: default_post_processing_enabled(),
            executable: default_post_processor(),
            speed: default_speed(),
            filters: default_filters(),
        }
    }
}

/// On-disk batch settings. Relative paths resolve against the directory
/// holding the settings file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Delimited input file of `id<delimiter>text` rows
    #[serde(default = "default_input_file")]
    pub input_file: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Field separator; must be a single character
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,

    /// Scratch file inside the output directory shared by every record
    #[serde(default = "default_temp_file_name")]
    pub temp_file_name: String,

    #[serde(default)]
    pub synthesizer: SynthesizerSettings,

    #[serde(default)]
    pub post_processing: PostProcessingSettings,
}

fn default_input_file() -> String {
    "voice_lines.csv".to_string()
}

fn default_output_dir() -> String {
    "PiperTTS_output".to_string()
}

fn default_delimiter() -> String {
    ";".to_string()
}

fn default_audio_extension() -> String {
    "wav".to_string()
}

fn default_temp_file_name() -> String {
    "temp_output.wav".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_file: default_input_file(),
            output_dir: default_output_dir(),
            delimiter: default_delimiter(),
            audio_extension: default_audio_extension(),
            temp_file_name: default_temp_file_name(),
            synthesizer: SynthesizerSettings::default(),
            post_processing: PostProcessingSettings::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("delimiter must be exactly one character, got {0:?}")]
    InvalidDelimiter(String),

    #[error("speed multiplier {0} is outside the supported range 0.5..=100")]
    InvalidSpeed(f64),

    #[error("{field} must be a non-negative number, got {value}")]
    InvalidNumber { field: &'static str, value: f64 },

    #[error("audio extension must not be empty")]
    EmptyAudioExtension,

    #[error("temp file name {0:?} must be a plain file name")]
    InvalidTempFileName(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessConfig {
    pub executable: PathBuf,
    pub speed: SpeedMultiplier,
    pub filters: String,
}

/// Validated, fully resolved settings for one batch run. Built once at
/// startup and shared by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisConfig {
    pub synthesizer: PathBuf,
    pub model: PathBuf,
    pub model_config: PathBuf,
    pub volume: f64,
    pub sentence_silence: f64,
    /// `None` when post-processing is disabled
    pub post_processing: Option<PostProcessConfig>,
    pub input_file: PathBuf,
    pub delimiter: char,
    pub output_dir: PathBuf,
    pub audio_extension: String,
    pub temp_file: PathBuf,
}

impl SynthesisConfig {
    pub fn resolve(settings: &Settings, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut delimiter_chars = settings.delimiter.chars();
        let delimiter = match (delimiter_chars.next(), delimiter_chars.next()) {
            (Some(c), None) => c,
            _ => return Err(ConfigError::InvalidDelimiter(settings.delimiter.clone())),
        };

        let synth = &settings.synthesizer;
        let volume = non_negative("synthesizer.volume", synth.volume)?;
        let sentence_silence = non_negative("synthesizer.sentence_silence", synth.sentence_silence)?;

        let audio_extension = settings.audio_extension.trim().trim_start_matches('.');
        if audio_extension.is_empty() {
            return Err(ConfigError::EmptyAudioExtension);
        }

        let temp_file_name = settings.temp_file_name.trim();
        if temp_file_name.is_empty() || temp_file_name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidTempFileName(
                settings.temp_file_name.clone(),
            ));
        }

        let post = &settings.post_processing;
        let post_processing = if post.enabled {
            let speed =
                SpeedMultiplier::new(post.speed).ok_or(ConfigError::InvalidSpeed(post.speed))?;
            Some(PostProcessConfig {
                executable: resolve_executable(base_dir, &post.executable),
                speed,
                filters: post.filters.trim().to_string(),
            })
        } else {
            None
        };

        let model = base_dir.join(&synth.voice_model);
        let model_config = match &synth.model_config {
            Some(path) => base_dir.join(path),
            None => base_dir.join(format!("{}.json", synth.voice_model)),
        };
        let output_dir = base_dir.join(&settings.output_dir);

        Ok(Self {
            synthesizer: resolve_executable(base_dir, &synth.executable),
            model,
            model_config,
            volume,
            sentence_silence,
            post_processing,
            input_file: base_dir.join(&settings.input_file),
            delimiter,
            temp_file: output_dir.join(temp_file_name),
            output_dir,
            audio_extension: audio_extension.to_string(),
        })
    }

    /// Final location for the audio of record `id`.
    pub fn output_path(&self, id: &str) -> PathBuf {
        self.output_dir.join(format!("{id}.{}", self.audio_extension))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidNumber { field, value })
    }
}

/// Bare program names stay bare (and are found on PATH) unless a file of
/// that name sits in `base_dir`.
fn resolve_executable(base_dir: &Path, executable: &str) -> PathBuf {
    let path = Path::new(executable);
    if is_bare_name(path) {
        let local = base_dir.join(path);
        if local.is_file() {
            local
        } else {
            path.to_path_buf()
        }
    } else {
        base_dir.join(path)
    }
}

pub(crate) fn is_bare_name(path: &Path) -> bool {
    !path.is_absolute() && path.components().count() == 1
}
