use crate::settings::config::{ConfigError, Settings, SynthesisConfig};
use crate::settings::manager::SettingsManager;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_missing_settings_file_is_created_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("nested").join("voxbatch.toml");

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    assert!(settings_path.exists());
    assert_eq!(manager.settings(), &Settings::default());

    let written: Settings = toml::from_str(&std::fs::read_to_string(&settings_path).unwrap()).unwrap();
    assert_eq!(written, Settings::default());
}

#[test]
fn test_partial_settings_fill_in_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("voxbatch.toml");
    std::fs::write(
        &settings_path,
        r#"
delimiter = "|"

[post_processing]
enabled = false
speed = 1
"#,
    )
    .unwrap();

    let manager = SettingsManager::from_path(settings_path).unwrap();
    let settings = manager.settings();

    assert_eq!(settings.delimiter, "|");
    assert!(!settings.post_processing.enabled);
    assert_eq!(settings.post_processing.speed, 1.0);
    assert_eq!(settings.input_file, "voice_lines.csv");
    assert_eq!(settings.synthesizer.volume, 1.5);
}

#[test]
fn test_corrupted_settings_are_backed_up_and_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("voxbatch.toml");
    std::fs::write(&settings_path, "delimiter = [not toml").unwrap();

    let err = SettingsManager::from_path(settings_path.clone()).unwrap_err();

    assert!(format!("{err:#}").contains("Failed to parse settings"));
    let backup = temp_dir.path().join("voxbatch.toml.backup");
    assert_eq!(
        std::fs::read_to_string(backup).unwrap(),
        "delimiter = [not toml"
    );
    let fresh: Settings = toml::from_str(&std::fs::read_to_string(&settings_path).unwrap()).unwrap();
    assert_eq!(fresh, Settings::default());
}

#[test]
fn test_save_settings_round_trips_through_disk() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("voxbatch.toml");
    let mut manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    let mut settings = Settings::default();
    settings.output_dir = "renders".to_string();
    manager.save_settings(settings.clone()).unwrap();

    assert_eq!(manager.settings(), &settings);
    let reloaded = SettingsManager::from_path(settings_path).unwrap();
    assert_eq!(reloaded.settings().output_dir, "renders");
}

#[test]
fn test_paths_resolve_against_settings_directory() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("voxbatch.toml");
    let manager = SettingsManager::from_path(settings_path).unwrap();

    let config = manager.synthesis_config().unwrap();
    let base = temp_dir.path();

    assert_eq!(config.input_file, base.join("voice_lines.csv"));
    assert_eq!(config.model, base.join("voice_model.onnx"));
    assert_eq!(config.model_config, base.join("voice_model.onnx.json"));
    assert_eq!(config.output_dir, base.join("PiperTTS_output"));
    assert_eq!(
        config.temp_file,
        base.join("PiperTTS_output").join("temp_output.wav")
    );
    assert_eq!(config.output_path("42"), base.join("PiperTTS_output").join("42.wav"));
    assert_eq!(config.delimiter, ';');
}

#[test]
fn test_bare_executables_stay_on_path_unless_local() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path();
    std::fs::write(base.join("piper"), "").unwrap();

    let config = SynthesisConfig::resolve(&Settings::default(), base).unwrap();

    assert_eq!(config.synthesizer, base.join("piper"));
    let post = config.post_processing.unwrap();
    assert_eq!(post.executable, PathBuf::from("ffmpeg"));
}

#[test]
fn test_relative_executable_paths_join_base_dir() {
    let mut settings = Settings::default();
    settings.synthesizer.executable = "tools/piper".to_string();

    let config = SynthesisConfig::resolve(&settings, Path::new("/work")).unwrap();

    assert_eq!(config.synthesizer, PathBuf::from("/work/tools/piper"));
}

#[test]
fn test_explicit_model_config_overrides_default() {
    let mut settings = Settings::default();
    settings.synthesizer.model_config = Some("configs/voice.json".to_string());

    let config = SynthesisConfig::resolve(&settings, Path::new("/work")).unwrap();

    assert_eq!(config.model_config, PathBuf::from("/work/configs/voice.json"));
}

#[test]
fn test_disabled_post_processing_ignores_speed() {
    let mut settings = Settings::default();
    settings.post_processing.enabled = false;
    settings.post_processing.speed = 0.0;

    let config = SynthesisConfig::resolve(&settings, Path::new("/work")).unwrap();

    assert!(config.post_processing.is_none());
}

#[test]
fn test_extension_leading_dot_is_ignored() {
    let mut settings = Settings::default();
    settings.audio_extension = ".flac".to_string();

    let config = SynthesisConfig::resolve(&settings, Path::new("/work")).unwrap();

    assert_eq!(config.output_path("a"), PathBuf::from("/work/PiperTTS_output/a.flac"));
}

#[test]
fn test_invalid_settings_are_rejected() {
    let resolve = |update: fn(&mut Settings)| {
        let mut settings = Settings::default();
        update(&mut settings);
        SynthesisConfig::resolve(&settings, Path::new("/work")).unwrap_err()
    };

    assert_eq!(
        resolve(|s| s.delimiter = ";;".to_string()),
        ConfigError::InvalidDelimiter(";;".to_string())
    );
    assert_eq!(
        resolve(|s| s.delimiter = String::new()),
        ConfigError::InvalidDelimiter(String::new())
    );
    assert_eq!(
        resolve(|s| s.post_processing.speed = 0.1),
        ConfigError::InvalidSpeed(0.1)
    );
    assert_eq!(
        resolve(|s| s.audio_extension = " . ".to_string()),
        ConfigError::EmptyAudioExtension
    );
    assert_eq!(
        resolve(|s| s.temp_file_name = "../scratch.wav".to_string()),
        ConfigError::InvalidTempFileName("../scratch.wav".to_string())
    );
    assert!(matches!(
        resolve(|s| s.synthesizer.volume = -1.0),
        ConfigError::InvalidNumber {
            field: "synthesizer.volume",
            ..
        }
    ));
}

#[test]
fn test_invalid_settings_error_names_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("voxbatch.toml");
    std::fs::write(&settings_path, "delimiter = \"ab\"\n").unwrap();

    let manager = SettingsManager::from_path(settings_path).unwrap();
    let err = manager.synthesis_config().unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("voxbatch.toml"), "{message}");
    assert!(message.contains("exactly one character"), "{message}");
}
