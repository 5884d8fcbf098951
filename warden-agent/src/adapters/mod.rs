//! Concrete `Strategy` implementations. Each adapter owns its own session
//! blob format (spec §4.E(4): "Blob format is private to the strategy; the
//! engine never parses it").

pub mod claude_code;
pub mod mock;
