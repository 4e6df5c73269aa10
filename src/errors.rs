//! Error types for event tree operations
//!
//! Every structural edit and query on events, envelopes and tempo transforms
//! reports failures through [`EventError`]. The variants fall into four
//! groups that callers commonly need to tell apart:
//!
//! - structural-contract violations (negative durations, bad split times,
//!   edits on empty trees)
//! - queries on empty envelopes
//! - ambiguous lookups (tag collisions, flat parameter lookups with
//!   more than one value)
//! - not-found lookups (missing tags, missing control points)

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, EventError>;

/// Top-level error type for event, envelope and tempo operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    /// Duration construction or arithmetic produced a negative or non-finite value
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// Division of a duration by zero
    #[error("Division of duration {0} by zero")]
    DivisionByZero(String),

    /// `split_at` was called without any split time
    #[error("No split time given")]
    NoSplitTime,

    /// Split times are not strictly increasing or exceed the event's duration
    #[error("Invalid split time {time} for event with duration {duration}: {reason}")]
    InvalidSplitTime {
        time: String,
        duration: String,
        reason: &'static str,
    },

    /// `split_child_at` found no child at the requested time
    #[error("Can't split child at absolute time {0}: no child event is active there")]
    SplitUnavailableChild(String),

    /// Range queries need `start <= end`
    #[error("Invalid values for start = {start} and end = {end}: end has to be bigger than start")]
    InvalidStartAndEnd { start: String, end: String },

    /// A leaf can't be cut out from a range it doesn't overlap
    #[error("Can't cut out chronon with duration {duration} from start = {start} to end = {end}")]
    InvalidCutOut {
        start: String,
        end: String,
        duration: String,
    },

    /// Insert position lies behind the end of the event
    #[error("Invalid start = {start} in insert for event with duration = {duration}: start has to be smaller or equal than the duration")]
    InvalidStartValue { start: String, duration: String },

    /// Any query on an envelope without control points
    #[error("Can't call '{operation}' on an envelope without any points")]
    EmptyEnvelope { operation: &'static str },

    /// Structural operation that needs at least one child
    #[error("Can't call '{operation}' on a compound event without children")]
    EmptyComplexEvent { operation: &'static str },

    /// Compound duration can only be rescaled when there are children to scale
    #[error("Can't set duration of a compound event without children")]
    CannotSetDurationOfEmptyCompound,

    /// More than one sibling carries the requested tag
    #[error("Tag '{tag}' is ambiguous: {count} sibling events carry it")]
    AmbiguousTag { tag: String, count: usize },

    /// No sibling carries the requested tag
    #[error("No event found with tag = '{0}'")]
    TagNotFound(String),

    /// Insertion would create a second sibling with the same tag
    #[error("An event with tag = '{0}' is already present among the siblings")]
    DuplicateTag(String),

    /// Tag-based concatenation met an untagged event
    #[error("Event at index {0} has no tag and can't be concatenated by tag")]
    NoTag(usize),

    /// A flat parameter lookup collected more than one value
    #[error("Flat lookup of parameter '{name}' is ambiguous: found {count} values")]
    AmbiguousParameter { name: String, count: usize },

    /// A parameter value can't be interpreted as the required type
    #[error("Parameter '{name}' has an invalid value: expected {expected}")]
    InvalidParameterType { name: String, expected: &'static str },

    /// No envelope control point exists at exactly the requested time
    #[error("No point found at absolute time {0}")]
    PointNotFound(String),

    /// Envelope points must be ordered by time
    #[error("Invalid envelope point: {0}")]
    InvalidPoint(String),

    /// Average value is undefined on an empty interval
    #[error("Can't calculate average value for an empty range (start = end = {0})")]
    InvalidAverageRange(String),

    /// A tempo must be positive and finite
    #[error("Invalid tempo: {0} beats per minute")]
    InvalidTempo(f64),

    /// `squash_in` on a leaf or on a concurrence holding leaves
    #[error("Can't squash an event into a {0}: only compound events accept squash_in")]
    ImpossibleToSquashIn(&'static str),

    /// `slide_in` on a leaf or on a concurrence holding leaves
    #[error("Can't slide an event into a {0}: only compound events accept slide_in")]
    ImpossibleToSlideIn(&'static str),

    /// `extend_until` on a leaf where prolonging leaves is disabled
    #[error("Can't extend a {0} until the requested duration")]
    ImpossibleToExtendUntil(&'static str),

    /// Concatenation target can't take the children of the source
    #[error("Can't concatenate a {source_kind} onto a {target_kind}")]
    Concatenation {
        target_kind: &'static str,
        source_kind: &'static str,
    },

    /// Index based access behind the end of the children
    #[error("Index {index} out of range for compound event with {len} children")]
    IndexOutOfRange { index: usize, len: usize },

    /// Invalid configuration document
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EventError {
    /// Whether this error signals that nothing matched a lookup
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EventError::TagNotFound(_)
                | EventError::PointNotFound(_)
                | EventError::SplitUnavailableChild(_)
        )
    }

    /// Whether this error signals that more than one candidate matched a lookup
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            EventError::AmbiguousTag { .. } | EventError::AmbiguousParameter { .. }
        )
    }

    /// Whether this error signals an operation on something without content
    pub fn is_empty_error(&self) -> bool {
        matches!(
            self,
            EventError::EmptyEnvelope { .. }
                | EventError::EmptyComplexEvent { .. }
                | EventError::CannotSetDurationOfEmptyCompound
        )
    }
}

impl From<serde_yaml::Error> for EventError {
    fn from(error: serde_yaml::Error) -> Self {
        EventError::Config(error.to_string())
    }
}
