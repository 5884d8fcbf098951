//! Breaker thresholds (spec §4.F, §8 boundary behaviors). Kept as a small
//! `Default`-able config struct rather than hardcoded constants so a
//! deployment can tune loop patience without a code change.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive zero-progress loops in `closed` before tripping to `half_open`.
    pub zero_progress_to_half_open: u32,
    /// Consecutive identical-error-signature loops in `closed` before tripping
    /// straight to `open`.
    pub identical_error_to_open: u32,
    /// Consecutive zero-progress loops in `half_open` before tripping to `open`.
    pub half_open_zero_progress_to_open: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            zero_progress_to_half_open: 2,
            identical_error_to_open: 5,
            half_open_zero_progress_to_open: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_thresholds() {
        let cfg = BreakerConfig::default();
        assert_eq!(cfg.zero_progress_to_half_open, 2);
        assert_eq!(cfg.identical_error_to_open, 5);
        assert_eq!(cfg.half_open_zero_progress_to_open, 3);
    }
}
