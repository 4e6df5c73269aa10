//! Tempo based time transforms
//!
//! Durations in an event tree are counted in beats. These converters
//! turn beats into seconds by integrating the length of a beat over the
//! span of every leaf.
//!
//! # Architecture
//!
//! ```text
//! tempo envelope (BPM) ──► beat length envelope (seconds per beat)
//!                                   │  integrate over each leaf's span
//!                                   ▼
//!                 TempoConverter: one envelope, whole tree
//!                                   │  per node, depth by depth
//!                                   ▼
//!                 Metrizer: every node's own tempo envelope
//! ```

pub mod metrize;
pub mod tempo;

pub use metrize::Metrizer;
pub use tempo::{is_effectless, TempoConverter};
