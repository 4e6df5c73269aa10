//! Chronon
//!
//! Hierarchical, time-based event trees. Leaves ([`Chronon`]) carry a
//! duration in beats and a parameter bag; compounds play their children
//! one after another ([`Consecution`]) or all at once ([`Concurrence`]).
//! [`Envelope`]s describe values changing over time, and tempo envelopes
//! attached to events turn beats into seconds through [`Event::metrize`].
//!
//! ```
//! use chronon::{Chronon, Compound, Consecution, Duration, Event};
//!
//! let mut melody = Consecution::new();
//! for beats in [1u32, 2, 3] {
//!     melody.append(Event::from(Chronon::new(beats))).unwrap();
//! }
//! let melody = Event::from(melody);
//! assert_eq!(melody.duration(), Duration::from(6u32));
//!
//! let pieces = melody.split_at(&[Duration::from(1u32), Duration::from(3u32)]).unwrap();
//! assert_eq!(pieces.len(), 3);
//! ```

pub mod config;
pub mod converters;
pub mod envelope;
pub mod errors;
pub mod events;
pub mod models;

// Re-export commonly used types
pub use config::{EventConfig, Padding};
pub use converters::{Metrizer, TempoConverter};
pub use envelope::{Envelope, Point};
pub use errors::{EventError, Result};
pub use events::{Chronon, Compound, Concurrence, Consecution, Event};
pub use models::{Duration, ParameterLookup, ParameterMap, ParameterValue, TempoPoint};
