//! Value types shared by events, envelopes and converters
//!
//! These are plain values with no knowledge of the event tree.

pub mod duration;
pub mod parameters;
pub mod tempo;

// Re-export commonly used types
pub use duration::{Duration, ROUND_DURATION_TO_N_DIGITS};
pub use parameters::{ParameterLookup, ParameterMap, ParameterValue, DURATION_PARAMETER};
pub use tempo::{TempoPoint, DEFAULT_BEATS_PER_MINUTE};
