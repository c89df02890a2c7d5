//! Per-record synthesis: synthesizer into the shared temp file, then either a
//! straight move into place or a post-processing pass that writes the final
//! file.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::filter::build_filter_chain;
use crate::parser::VoiceLine;
use crate::process::{run_command, Invocation, InvocationError};
use crate::settings::{PostProcessConfig, SynthesisConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Move,
    RemoveTemp,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileAction::Move => f.write_str("move temporary file to"),
            FileAction::RemoveTemp => f.write_str("remove temporary file"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("synthesis failed: {0}")]
    Synthesis(#[source] InvocationError),

    #[error("synthesizer exited successfully but wrote no audio to {}", .0.display())]
    NoAudioProduced(PathBuf),

    #[error("post-processing failed: {0}")]
    PostProcessing(#[source] InvocationError),

    #[error("could not {action} {}: {source}", .path.display())]
    FileSystem {
        action: FileAction,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SynthesisError {
    /// Captured output of the failing external program, if it ran at all.
    pub fn diagnostics(&self) -> Option<(&str, &str)> {
        match self {
            SynthesisError::Synthesis(e) | SynthesisError::PostProcessing(e) => e.diagnostics(),
            _ => None,
        }
    }
}

/// Outcome of one record. `Ok` carries the final output path.
pub type SynthesisResult = Result<PathBuf, SynthesisError>;

/// Drives the synthesizer and post-processor for one record at a time.
///
/// Every record reuses the same temp file, so calls must not overlap.
pub struct Synthesizer<'a> {
    config: &'a SynthesisConfig,
}

impl<'a> Synthesizer<'a> {
    pub fn new(config: &'a SynthesisConfig) -> Self {
        Self { config }
    }

    pub async fn synthesize(&self, line: &VoiceLine) -> SynthesisResult {
        let temp = &self.config.temp_file;
        let final_path = self.config.output_path(&line.id);

        // A temp file left by an interrupted run must not become this
        // record's audio.
        remove_temp_best_effort(temp).await;

        if let Err(e) = run_command(&self.synthesis_invocation(line)).await {
            remove_temp_best_effort(temp).await;
            return Err(SynthesisError::Synthesis(e));
        }

        if !tokio::fs::try_exists(temp).await.unwrap_or(false) {
            return Err(SynthesisError::NoAudioProduced(temp.clone()));
        }

        match &self.config.post_processing {
            None => self.move_into_place(temp, final_path).await,
            Some(post) => self.post_process(post, temp, final_path).await,
        }
    }

    fn synthesis_invocation(&self, line: &VoiceLine) -> Invocation {
        let config = self.config;
        Invocation::new(&config.synthesizer)
            .arg("-m")
            .arg(&config.model)
            .arg("-c")
            .arg(&config.model_config)
            .arg("--output_file")
            .arg(&config.temp_file)
            .arg("--volume")
            .arg(config.volume.to_string())
            .arg("--sentence_silence")
            .arg(config.sentence_silence.to_string())
            .stdin(line.text.as_bytes())
    }

    async fn move_into_place(&self, temp: &Path, final_path: PathBuf) -> SynthesisResult {
        // An id named after the temp file is already in place
        if temp == final_path.as_path() {
            return Ok(final_path);
        }

        match tokio::fs::rename(temp, &final_path).await {
            Ok(()) => Ok(final_path),
            Err(source) => {
                remove_temp_best_effort(temp).await;
                Err(SynthesisError::FileSystem {
                    action: FileAction::Move,
                    path: final_path,
                    source,
                })
            }
        }
    }

    async fn post_process(
        &self,
        post: &PostProcessConfig,
        temp: &Path,
        final_path: PathBuf,
    ) -> SynthesisResult {
        let mut invocation = Invocation::new(&post.executable)
            .arg("-y")
            .arg("-i")
            .arg(temp);
        if let Some(chain) = build_filter_chain(post.speed, &post.filters) {
            invocation = invocation.arg("-filter:a").arg(chain);
        }
        let invocation = invocation.arg(&final_path);

        if let Err(e) = run_command(&invocation).await {
            remove_temp_best_effort(temp).await;
            return Err(SynthesisError::PostProcessing(e));
        }

        // The output replaced the temp file, so there is nothing to remove
        if temp == final_path.as_path() {
            return Ok(final_path);
        }

        match tokio::fs::remove_file(temp).await {
            Ok(()) => Ok(final_path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(final_path),
            Err(source) => Err(SynthesisError::FileSystem {
                action: FileAction::RemoveTemp,
                path: temp.to_path_buf(),
                source,
            }),
        }
    }
}

async fn remove_temp_best_effort(temp: &Path) {
    match tokio::fs::remove_file(temp).await {
        Ok(()) => tracing::debug!(?temp, "Removed temporary file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(?temp, error = %e, "Failed to remove temporary file"),
    }
}
