use std::path::Path;

use crate::batch::BatchSummary;
use crate::parser::{SkipReason, VoiceLine};
use crate::synth::SynthesisError;

/// Trait for formatting and displaying batch progress in the terminal
pub trait EventFormatter {
    fn print_system(&mut self, msg: &str);

    fn print_warning(&mut self, msg: &str);

    fn print_error(&mut self, msg: &str);

    fn print_skip(&mut self, line_number: usize, reason: SkipReason);

    fn print_synthesizing(&mut self, line: &VoiceLine);

    fn print_saved(&mut self, line: &VoiceLine, path: &Path);

    fn print_failure(&mut self, line: &VoiceLine, error: &SynthesisError);

    fn print_summary(&mut self, summary: &BatchSummary);
}

const RULE: &str = "===========================================";

#[derive(Clone)]
pub struct Formatter {
    use_colors: bool,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn print_banner(&self, title: &str) {
        println!("{RULE}");
        println!("{}", self.paint("1;35", title));
        println!("{RULE}");
    }
}

impl EventFormatter for Formatter {
    fn print_system(&mut self, msg: &str) {
        println!("{} {msg}", self.paint("33", "[System]"));
    }

    fn print_warning(&mut self, msg: &str) {
        println!("{} {msg}", self.paint("33", "[Warning]"));
    }

    fn print_error(&mut self, msg: &str) {
        eprintln!("{} {msg}", self.paint("31", "[Error]"));
    }

    fn print_skip(&mut self, line_number: usize, reason: SkipReason) {
        println!(
            "{} Skipping line: invalid format ({reason}).",
            self.paint("90", &format!("[{line_number}]"))
        );
    }

    fn print_synthesizing(&mut self, line: &VoiceLine) {
        println!();
        println!(
            "{} Synthesizing ID: {}...",
            self.paint("36", &format!("[{}]", line.line_number)),
            line.id
        );
    }

    fn print_saved(&mut self, _line: &VoiceLine, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        println!("    {} Saved: {name}", self.paint("32", "✅"));
    }

    fn print_failure(&mut self, line: &VoiceLine, error: &SynthesisError) {
        eprintln!("    {} ID {}: {error}", self.paint("31", "❌"), line.id);
        if let Some((stdout, stderr)) = error.diagnostics() {
            eprintln!("       STDOUT: {}", stdout.trim_end());
            eprintln!("       STDERR: {}", stderr.trim_end());
        }
    }

    fn print_summary(&mut self, summary: &BatchSummary) {
        println!();
        println!("{RULE}");
        println!("📢 Batch synthesis complete.");
        println!("Lines in File:         {}", summary.total_lines);
        println!("Skipped (malformed):   {}", summary.skipped);
        println!("Total Lines Attempted: {}", summary.attempted);
        println!(
            "Successfully Saved:    {}",
            self.paint("32", &summary.succeeded.to_string())
        );
        let failed = summary.failed();
        if failed > 0 {
            println!("Failed:                {}", self.paint("31", &failed.to_string()));
        } else {
            println!("Failed:                {failed}");
        }
        println!("{RULE}");
    }
}
