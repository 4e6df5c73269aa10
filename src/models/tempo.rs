//! Tempo points
//!
//! A tempo is given in beats per minute relative to a reference note value.
//! `TempoPoint::new(60.0, 2.0)` means 60 beats per minute where one beat is
//! half the reference, so the absolute tempo is 120 BPM.

use crate::errors::{EventError, Result};
use serde::{Deserialize, Serialize};

/// Tempo used when nothing else is given
pub const DEFAULT_BEATS_PER_MINUTE: f64 = 60.0;

/// A tempo value with a reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoPoint {
    /// Beats per minute relative to `reference`
    pub beats_per_minute: f64,

    /// Reference factor (1 = quarter note in the usual reading)
    #[serde(default = "default_reference")]
    pub reference: f64,
}

fn default_reference() -> f64 {
    1.0
}

impl TempoPoint {
    /// Create a tempo point; both values must be positive and finite
    pub fn new(beats_per_minute: f64, reference: f64) -> Result<Self> {
        let point = TempoPoint {
            beats_per_minute,
            reference,
        };
        let absolute = point.absolute_tempo_in_beats_per_minute();
        if !(absolute.is_finite() && absolute > 0.0) || reference <= 0.0 {
            return Err(EventError::InvalidTempo(absolute));
        }
        Ok(point)
    }

    /// Tempo with reference 1
    pub fn from_beats_per_minute(beats_per_minute: f64) -> Result<Self> {
        Self::new(beats_per_minute, 1.0)
    }

    /// `beats_per_minute * reference`
    pub fn absolute_tempo_in_beats_per_minute(&self) -> f64 {
        self.beats_per_minute * self.reference
    }

    /// Length of one beat in seconds at this tempo
    pub fn beat_length_in_seconds(&self) -> f64 {
        60.0 / self.absolute_tempo_in_beats_per_minute()
    }

    /// Whether one beat lasts exactly one second
    pub fn is_identity(&self) -> bool {
        self.absolute_tempo_in_beats_per_minute() == DEFAULT_BEATS_PER_MINUTE
    }
}

impl Default for TempoPoint {
    fn default() -> Self {
        TempoPoint {
            beats_per_minute: DEFAULT_BEATS_PER_MINUTE,
            reference: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_tempo_uses_reference() {
        let tempo = TempoPoint::new(60.0, 2.0).unwrap();
        assert_eq!(tempo.absolute_tempo_in_beats_per_minute(), 120.0);
        assert_eq!(tempo.beat_length_in_seconds(), 0.5);
    }

    #[test]
    fn test_beat_length() {
        assert_eq!(TempoPoint::default().beat_length_in_seconds(), 1.0);
        assert_eq!(
            TempoPoint::from_beats_per_minute(30.0)
                .unwrap()
                .beat_length_in_seconds(),
            2.0
        );
    }

    #[test]
    fn test_invalid_tempo() {
        assert!(TempoPoint::from_beats_per_minute(0.0).is_err());
        assert!(TempoPoint::from_beats_per_minute(-10.0).is_err());
        assert!(TempoPoint::from_beats_per_minute(f64::INFINITY).is_err());
        assert!(TempoPoint::new(60.0, -1.0).is_err());
    }

    #[test]
    fn test_identity() {
        assert!(TempoPoint::default().is_identity());
        assert!(TempoPoint::new(30.0, 2.0).unwrap().is_identity());
        assert!(!TempoPoint::from_beats_per_minute(120.0).unwrap().is_identity());
    }
}
