use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// A single external program call: what to run, with which arguments, and
/// what to feed it on stdin.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub stdin: Option<Vec<u8>>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Shell-like rendering for logs. Not suitable for re-execution.
    pub fn display(&self) -> String {
        let mut rendered = self.program.display().to_string();
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                rendered.push_str(&format!(" \"{arg}\""));
            } else {
                rendered.push(' ');
                rendered.push_str(&arg);
            }
        }
        rendered
    }
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("executable '{}' not found", .program.display())]
    NotFound { program: PathBuf },

    #[error("failed to run '{}': {source}", .program.display())]
    Io {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{}' exited with {}", .program.display(), describe_code(.code))]
    Failed {
        program: PathBuf,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl InvocationError {
    /// Captured (stdout, stderr) when the program ran to a non-zero exit.
    pub fn diagnostics(&self) -> Option<(&str, &str)> {
        match self {
            InvocationError::Failed { stdout, stderr, .. } => Some((stdout, stderr)),
            _ => None,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("error code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Runs `invocation` to completion, capturing both output streams.
///
/// There is no timeout: a program that never exits blocks the caller.
pub async fn run_command(invocation: &Invocation) -> Result<CommandOutput, InvocationError> {
    tracing::info!(command = %invocation.display(), "Running external command");

    let program = invocation.program.clone();
    let io_error = |source: io::Error| InvocationError::Io {
        program: program.clone(),
        source,
    };

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                InvocationError::NotFound {
                    program: program.clone(),
                }
            } else {
                io_error(e)
            }
        })?;

    // Stdin is fed while the output streams drain. A child that fills its
    // stderr pipe before reading stdin would otherwise block both sides.
    let stdin = child.stdin.take();
    let input = invocation.stdin.as_deref();
    let feed = async move {
        match (input, stdin) {
            (Some(input), Some(mut stdin)) => match stdin.write_all(input).await {
                // A program that exits without reading stdin closes the pipe
                // early; its exit status is the meaningful failure.
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    };

    let (fed, output) = tokio::join!(feed, child.wait_with_output());
    let output = output.map_err(io_error)?;
    fed.map_err(io_error)?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        tracing::warn!(
            command = %invocation.display(),
            code = ?output.status.code(),
            %stderr,
            "External command failed"
        );
        return Err(InvocationError::Failed {
            program,
            code: output.status.code(),
            stdout,
            stderr,
        });
    }

    Ok(CommandOutput { stdout, stderr })
}
