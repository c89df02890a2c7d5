use std::fmt;

/// Tempo range accepted by a single `atempo` filter stage.
pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 100.0;

/// Playback speed applied during post-processing. 1.0 leaves tempo untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedMultiplier(f64);

impl SpeedMultiplier {
    pub const IDENTITY: SpeedMultiplier = SpeedMultiplier(1.0);

    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (MIN_SPEED..=MAX_SPEED).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_identity(self) -> bool {
        self.0 == 1.0
    }
}

impl Default for SpeedMultiplier {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for SpeedMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Assembles the audio filter expression passed to the post-processor.
///
/// A tempo stage is prepended only when `speed` differs from 1.0. Returns
/// `None` when there is nothing to filter.
pub fn build_filter_chain(speed: SpeedMultiplier, configured: &str) -> Option<String> {
    let configured = configured.trim();
    let tempo = (!speed.is_identity()).then(|| format!("atempo={speed}"));

    match (tempo, configured.is_empty()) {
        (Some(tempo), true) => Some(tempo),
        (Some(tempo), false) => Some(format!("{tempo},{configured}")),
        (None, true) => None,
        (None, false) => Some(configured.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN: &str = "pan=stereo|c0=c0|c1=c0,loudnorm=I=-10:TP=-1.0:LRA=11";

    fn speed(value: f64) -> SpeedMultiplier {
        SpeedMultiplier::new(value).unwrap()
    }

    #[test]
    fn test_identity_speed_leaves_chain_unchanged() {
        assert_eq!(build_filter_chain(speed(1.0), CHAIN).as_deref(), Some(CHAIN));
    }

    #[test]
    fn test_speed_prepends_tempo_stage() {
        assert_eq!(
            build_filter_chain(speed(1.5), CHAIN),
            Some(format!("atempo=1.5,{CHAIN}"))
        );
    }

    #[test]
    fn test_tempo_alone_when_chain_empty() {
        assert_eq!(
            build_filter_chain(speed(0.75), "  ").as_deref(),
            Some("atempo=0.75")
        );
    }

    #[test]
    fn test_nothing_to_filter() {
        assert_eq!(build_filter_chain(SpeedMultiplier::IDENTITY, ""), None);
    }

    #[test]
    fn test_whole_number_speed_formatting() {
        assert_eq!(build_filter_chain(speed(2.0), "").as_deref(), Some("atempo=2"));
    }

    #[test]
    fn test_rejects_out_of_range_speeds() {
        assert!(SpeedMultiplier::new(0.25).is_none());
        assert!(SpeedMultiplier::new(150.0).is_none());
        assert!(SpeedMultiplier::new(f64::NAN).is_none());
        assert!(SpeedMultiplier::new(0.5).is_some());
    }
}
