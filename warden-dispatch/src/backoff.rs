//! Exponential backoff with full jitter (spec §5 "Retry & backoff": message
//! retries start at 2s, capped at 5 min, with full jitter).

use std::time::Duration;

use rand::Rng;

pub const INITIAL_BACKOFF: Duration = Duration::from_secs(2);
pub const MAX_BACKOFF: Duration = Duration::from_secs(5 * 60);

/// Full-jitter backoff: `random(0, min(cap, base * 2^attempt))` (AWS
/// architecture blog's "full jitter" algorithm, the standard choice when a
/// fleet of workers must avoid retrying in lockstep).
pub fn full_jitter_backoff(attempt: u32) -> Duration {
    let exp = INITIAL_BACKOFF
        .as_millis()
        .saturating_mul(1u128 << attempt.min(20));
    let capped = exp.min(MAX_BACKOFF.as_millis());
    let capped = capped.max(1) as u64;
    let jittered = rand::thread_rng().gen_range(0..=capped);
    Duration::from_millis(jittered)
}
