use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::formatter::EventFormatter;
use crate::parser::{parse_lines, ParsedLine};
use crate::settings::config::is_bare_name;
use crate::settings::SynthesisConfig;
use crate::synth::Synthesizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Synthesizer,
    Model,
    ModelConfig,
    InputFile,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Synthesizer => "Synthesizer executable",
            Resource::Model => "Model file",
            Resource::ModelConfig => "Model config file",
            Resource::InputFile => "Input file",
        };
        f.write_str(name)
    }
}

/// Failures that stop the run before any record is processed.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{resource} not found at {}", .path.display())]
    MissingResource { resource: Resource, path: PathBuf },

    #[error("could not create output directory {}: {source}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("could not read input file {}: {source}", .path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Physical lines in the input file, blank ones included
    pub total_lines: usize,
    pub skipped: usize,
    /// Valid records handed to the synthesizer
    pub attempted: usize,
    pub succeeded: usize,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

/// Checks every required resource, then creates the output directory.
/// Nothing is read or written when a resource is missing.
pub fn preflight(
    config: &SynthesisConfig,
    formatter: &mut dyn EventFormatter,
) -> Result<(), StartupError> {
    if !executable_exists(&config.synthesizer) {
        return Err(missing(Resource::Synthesizer, &config.synthesizer));
    }

    let required_files = [
        (Resource::Model, &config.model),
        (Resource::ModelConfig, &config.model_config),
        (Resource::InputFile, &config.input_file),
    ];
    for (resource, path) in required_files {
        if !path.is_file() {
            return Err(missing(resource, path));
        }
    }

    if !config.output_dir.is_dir() {
        std::fs::create_dir_all(&config.output_dir).map_err(|source| {
            StartupError::CreateOutputDir {
                path: config.output_dir.clone(),
                source,
            }
        })?;
        formatter.print_system(&format!(
            "Created output directory: {}",
            config.output_dir.display()
        ));
    }

    let model_name = config
        .model
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    formatter.print_system(&format!("✅ Found Model: {model_name}"));
    Ok(())
}

fn missing(resource: Resource, path: &Path) -> StartupError {
    StartupError::MissingResource {
        resource,
        path: path.to_path_buf(),
    }
}

/// Synthesizes every valid line of the input file in order. Per-record
/// failures are reported and counted; only an unreadable input aborts.
pub async fn run_batch(
    config: &SynthesisConfig,
    formatter: &mut dyn EventFormatter,
) -> Result<BatchSummary, BatchError> {
    let content = tokio::fs::read_to_string(&config.input_file)
        .await
        .map_err(|source| BatchError::ReadInput {
            path: config.input_file.clone(),
            source,
        })?;

    let mut summary = BatchSummary {
        total_lines: content.lines().count(),
        ..BatchSummary::default()
    };

    let input_name = config
        .input_file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    formatter.print_system(&format!(
        "Found {} lines to process in {input_name}...",
        summary.total_lines
    ));
    tracing::info!(input = ?config.input_file, lines = summary.total_lines, "Starting batch");

    let synthesizer = Synthesizer::new(config);
    let mut first_seen: HashMap<String, usize> = HashMap::new();

    for entry in parse_lines(&content, config.delimiter) {
        let line = match entry {
            ParsedLine::Voice(line) => line,
            ParsedLine::Skipped {
                line_number,
                reason,
            } => {
                summary.skipped += 1;
                tracing::info!(line_number, %reason, "Skipping malformed line");
                formatter.print_skip(line_number, reason);
                continue;
            }
        };

        if let Some(previous) = first_seen.get(&line.id) {
            formatter.print_warning(&format!(
                "ID {} was already used on line {previous}; its output will be overwritten",
                line.id
            ));
        } else {
            first_seen.insert(line.id.clone(), line.line_number);
        }

        summary.attempted += 1;
        formatter.print_synthesizing(&line);

        match synthesizer.synthesize(&line).await {
            Ok(path) => {
                summary.succeeded += 1;
                tracing::info!(id = %line.id, ?path, "Saved");
                formatter.print_saved(&line, &path);
            }
            Err(e) => {
                tracing::warn!(id = %line.id, line_number = line.line_number, error = %e, "Record failed");
                formatter.print_failure(&line, &e);
            }
        }
    }

    tracing::info!(?summary, "Batch complete");
    formatter.print_summary(&summary);
    Ok(summary)
}

/// Bare names are searched for on PATH; anything else must be an existing file.
fn executable_exists(executable: &Path) -> bool {
    if !is_bare_name(executable) {
        return executable.is_file();
    }

    let Some(path_var) = std::env::var_os("PATH") else {
        return false;
    };

    #[cfg(windows)]
    let extensions: Vec<String> = std::env::var_os("PATHEXT")
        .map(|v| {
            v.to_string_lossy()
                .split(';')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_else(|| vec![".exe".to_string(), ".bat".to_string(), ".cmd".to_string()]);

    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(executable);
        if candidate.is_file() {
            return true;
        }

        #[cfg(windows)]
        for ext in &extensions {
            let mut with_ext = candidate.clone().into_os_string();
            with_ext.push(ext);
            if Path::new(&with_ext).is_file() {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_is_attempted_minus_succeeded() {
        let summary = BatchSummary {
            total_lines: 10,
            skipped: 2,
            attempted: 7,
            succeeded: 5,
        };
        assert_eq!(summary.failed(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_bare_executable_found_on_path() {
        assert!(executable_exists(Path::new("sh")));
        assert!(!executable_exists(Path::new("voxbatch-no-such-program")));
    }

    #[test]
    fn test_missing_resource_message() {
        let err = missing(Resource::ModelConfig, Path::new("/models/voice.onnx.json"));
        assert_eq!(
            err.to_string(),
            "Model config file not found at /models/voice.onnx.json"
        );
    }
}
