pub mod batch;
pub mod filter;
pub mod formatter;
pub mod parser;
pub mod process;
pub mod settings;
pub mod synth;

// Public library API
pub use batch::{preflight, run_batch, BatchError, BatchSummary, StartupError};
pub use formatter::{EventFormatter, Formatter};
pub use parser::{parse_lines, ParsedLine, SkipReason, VoiceLine};
pub use settings::{Settings, SettingsManager, SynthesisConfig};
pub use synth::{SynthesisError, SynthesisResult, Synthesizer};
