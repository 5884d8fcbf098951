//! Circuit breaker / progress analyzer (spec §4.F): a pure state machine
//! governing autonomous-loop termination, plus the two input extractors it
//! consumes (the strategy's structured status block, and a loop's error
//! signature).

pub mod breaker;
pub mod config;
pub mod error_signature;
pub mod status_block;

pub use breaker::{Breaker, CircuitState, Decision, LoopOutcome};
pub use config::BreakerConfig;
pub use error_signature::extract_error_signature;
pub use status_block::{parse_status, LoopStatus, ParseConfidence, StatusBlock};
