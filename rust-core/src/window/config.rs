//! Window framing configuration

/// Default analysis frame length in milliseconds
pub const DEFAULT_FRAME_DURATION_MS: u32 = 25;

/// Default hop between frames in milliseconds
pub const DEFAULT_STEP_DURATION_MS: u32 = 10;

/// Framing parameters in user-facing time units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Frame length in milliseconds (default: 25)
    pub frame_duration_ms: u32,

    /// Hop between consecutive frames in milliseconds (default: 10)
    pub step_duration_ms: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            frame_duration_ms: DEFAULT_FRAME_DURATION_MS,
            step_duration_ms: DEFAULT_STEP_DURATION_MS,
        }
    }
}

impl WindowConfig {
    pub fn new(frame_duration_ms: u32, step_duration_ms: u32) -> Self {
        Self {
            frame_duration_ms,
            step_duration_ms,
        }
    }

    /// Overwrite every field with its default
    pub fn fill_with_defaults(&mut self) {
        *self = Self::default();
    }

    /// Frame length in samples at `sample_rate`
    pub fn frame_samples(&self, sample_rate: u32) -> usize {
        duration_to_samples(self.frame_duration_ms, sample_rate)
    }

    /// Hop length in samples at `sample_rate`
    pub fn step_samples(&self, sample_rate: u32) -> usize {
        duration_to_samples(self.step_duration_ms, sample_rate)
    }
}

/// `duration_ms * sample_rate / 1000`, truncated
pub fn duration_to_samples(duration_ms: u32, sample_rate: u32) -> usize {
    (u64::from(duration_ms) * u64::from(sample_rate) / 1000) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_with_defaults() {
        let mut config = WindowConfig::new(64, 32);
        config.fill_with_defaults();

        assert_eq!(config.frame_duration_ms, 25);
        assert_eq!(config.step_duration_ms, 10);
        assert_eq!(config, WindowConfig::default());
    }

    #[test]
    fn test_sample_counts() {
        let config = WindowConfig::default();
        assert_eq!(config.frame_samples(16000), 400);
        assert_eq!(config.step_samples(16000), 160);

        // 551.25 and 220.5 truncate
        assert_eq!(config.frame_samples(22050), 551);
        assert_eq!(config.step_samples(22050), 220);
    }

    #[test]
    fn test_truncation_matches_floor() {
        for sample_rate in [8000, 11025, 16000, 22050, 44100, 48000] {
            for ms in [1, 10, 25, 30, 64] {
                let expected = (ms as f64 * sample_rate as f64 / 1000.0).floor() as usize;
                assert_eq!(duration_to_samples(ms, sample_rate), expected);
            }
        }
    }

    #[test]
    fn test_no_overflow_on_large_values() {
        assert_eq!(duration_to_samples(u32::MAX, 1000), u32::MAX as usize);
    }
}
