use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use voxbatch_core::settings::DEFAULT_SETTINGS_FILE;
use voxbatch_core::{preflight, run_batch, EventFormatter, Formatter, SettingsManager};

#[derive(Parser, Debug)]
#[command(name = "voxbatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch-synthesize voice lines from a delimited text file")]
struct Args {
    /// Settings file; created with defaults when missing
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// Disable ANSI colors in console output
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut formatter = if args.no_color {
        Formatter::without_colors()
    } else {
        Formatter::new()
    };

    if let Err(e) = setup_tracing() {
        formatter.print_warning(&format!("Logging disabled: {e:#}"));
    }

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
        .and_then(|runtime| runtime.block_on(async_main(args, &mut formatter)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Batch aborted: {e:#}");
            formatter.print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn async_main(args: Args, formatter: &mut Formatter) -> Result<()> {
    info!("CLI startup: settings={:?}", args.settings);

    formatter.print_banner("Starting voxbatch...");

    let settings = SettingsManager::from_path(args.settings)?;
    let config = settings.synthesis_config()?;
    info!(?config, "Resolved synthesis config");

    preflight(&config, formatter)?;
    run_batch(&config, formatter).await?;
    Ok(())
}

fn setup_tracing() -> Result<()> {
    use std::fs;
    use tracing_subscriber::fmt;

    // Create trace directory in user's home
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
    let trace_dir = home.join(".voxbatch").join("trace");
    fs::create_dir_all(&trace_dir)?;

    let log_file = trace_dir.join("voxbatch.log");
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Tracing initialized to {:?}", log_file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_settings_defaults_to_working_directory_file() {
        let args = Args::parse_from(["voxbatch"]);
        assert_eq!(args.settings, PathBuf::from(DEFAULT_SETTINGS_FILE));
        assert!(!args.no_color);
    }

    #[test]
    fn test_settings_override() {
        let args = Args::parse_from(["voxbatch", "--settings", "lines/batch.toml", "--no-color"]);
        assert_eq!(args.settings, PathBuf::from("lines/batch.toml"));
        assert!(args.no_color);
    }
}
