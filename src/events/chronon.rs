//! Leaf event
//!
//! A [`Chronon`] owns a duration and a free-form parameter bag. It has no
//! children, so every structural edit on it only changes its duration.

use crate::envelope::Envelope;
use crate::errors::{EventError, Result};
use crate::models::{Duration, ParameterMap, ParameterValue, DURATION_PARAMETER};
use serde::{Deserialize, Serialize};

use super::split_ranges;

/// Atomic timed unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chronon {
    duration: Duration,

    #[serde(default, skip_serializing_if = "ParameterMap::is_empty")]
    parameters: ParameterMap,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    tempo_envelope: Option<Box<Envelope>>,
}

impl Chronon {
    pub fn new(duration: impl Into<Duration>) -> Self {
        Self::with_parameters(duration, ParameterMap::new())
    }

    pub fn with_parameters(duration: impl Into<Duration>, parameters: ParameterMap) -> Self {
        Self {
            duration: duration.into(),
            parameters,
            tag: None,
            tempo_envelope: None,
        }
    }

    /// Builder: set one parameter
    pub fn with_parameter(mut self, name: &str, value: impl Into<ParameterValue>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    /// Builder: set the tag
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    /// Builder: set the tempo envelope
    pub fn with_tempo_envelope(mut self, tempo_envelope: Envelope) -> Self {
        self.tempo_envelope = Some(Box::new(tempo_envelope));
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn set_duration(&mut self, duration: impl Into<Duration>) {
        self.duration = duration.into();
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn set_tag(&mut self, tag: Option<String>) {
        self.tag = tag;
    }

    pub fn tempo_envelope(&self) -> Option<&Envelope> {
        self.tempo_envelope.as_deref()
    }

    pub fn tempo_envelope_mut(&mut self) -> Option<&mut Envelope> {
        self.tempo_envelope.as_deref_mut()
    }

    pub fn set_tempo_envelope(&mut self, tempo_envelope: Option<Envelope>) {
        self.tempo_envelope = tempo_envelope.map(Box::new);
    }

    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterMap {
        &mut self.parameters
    }

    /// Stored parameter by name (the duration is not part of the bag)
    pub fn parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters.get(name)
    }

    /// Parameter by name, with `"duration"` answering the duration
    pub fn get_parameter(&self, name: &str) -> Option<ParameterValue> {
        if name == DURATION_PARAMETER {
            return Some(ParameterValue::Duration(self.duration));
        }
        self.parameters.get(name).cloned()
    }

    /// Whether a parameter is defined; `"duration"` always is
    pub fn has_parameter(&self, name: &str) -> bool {
        name == DURATION_PARAMETER || self.parameters.contains_key(name)
    }

    /// Set a parameter by name, with `"duration"` writing the duration
    pub fn set_parameter(&mut self, name: &str, value: impl Into<ParameterValue>) -> Result<()> {
        let value = value.into();
        if name == DURATION_PARAMETER {
            let duration = value
                .as_duration()
                .ok_or_else(|| EventError::InvalidParameterType {
                    name: name.to_string(),
                    expected: "non-negative duration",
                })?;
            self.duration = duration;
        } else {
            self.parameters.insert(name.to_string(), value);
        }
        Ok(())
    }

    pub fn remove_parameter(&mut self, name: &str) -> Option<ParameterValue> {
        self.parameters.remove(name)
    }

    /// Keep only the part between `start` and `end`
    pub fn cut_out(&mut self, start: impl Into<Duration>, end: impl Into<Duration>) -> Result<()> {
        let (start, end) = (start.into(), end.into());
        if start >= end {
            return Err(EventError::InvalidStartAndEnd {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        if start >= self.duration {
            return Err(EventError::InvalidCutOut {
                start: start.to_string(),
                end: end.to_string(),
                duration: self.duration.to_string(),
            });
        }
        self.duration = end.min(self.duration).checked_sub(start)?;
        Ok(())
    }

    /// Remove the part between `start` and `end`
    pub fn cut_off(&mut self, start: impl Into<Duration>, end: impl Into<Duration>) -> Result<()> {
        let (start, end) = (start.into(), end.into());
        if start > end {
            return Err(EventError::InvalidStartAndEnd {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        if start < self.duration {
            let removed = end.min(self.duration).checked_sub(start)?;
            self.duration = self.duration.checked_sub(removed)?;
        }
        Ok(())
    }

    /// Split into one chronon per span between consecutive split times
    pub fn split_at(&self, times: &[Duration]) -> Result<Vec<Chronon>> {
        let ranges = split_ranges(times, self.duration)?;
        if ranges.is_empty() {
            return Ok(vec![self.clone()]);
        }
        ranges
            .into_iter()
            .map(|(start, end)| {
                let mut piece = self.clone();
                piece.cut_out(start, end)?;
                Ok(piece)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: u32) -> Duration {
        Duration::from(value)
    }

    #[test]
    fn test_duration_parameter_is_reserved() {
        let mut chronon = Chronon::new(2u32).with_parameter("pitch", "c");
        assert_eq!(
            chronon.get_parameter("duration"),
            Some(ParameterValue::Duration(d(2)))
        );

        chronon.set_parameter("duration", 5).unwrap();
        assert_eq!(chronon.duration(), d(5));
        assert!(chronon.parameter("duration").is_none());

        let error = chronon.set_parameter("duration", "long").unwrap_err();
        assert!(matches!(error, EventError::InvalidParameterType { .. }));
        assert_eq!(chronon.duration(), d(5));
    }

    #[test]
    fn test_cut_out() {
        let mut chronon = Chronon::new(4u32);
        chronon.cut_out(1u32, 3u32).unwrap();
        assert_eq!(chronon.duration(), d(2));

        let mut chronon = Chronon::new(4u32);
        chronon.cut_out(2u32, 10u32).unwrap();
        assert_eq!(chronon.duration(), d(2));
    }

    #[test]
    fn test_cut_out_outside_fails() {
        let mut chronon = Chronon::new(2u32);
        assert!(matches!(
            chronon.cut_out(3u32, 4u32),
            Err(EventError::InvalidCutOut { .. })
        ));
        assert!(matches!(
            chronon.cut_out(1u32, 1u32),
            Err(EventError::InvalidStartAndEnd { .. })
        ));
        assert_eq!(chronon.duration(), d(2));
    }

    #[test]
    fn test_cut_off() {
        let mut chronon = Chronon::new(4u32);
        chronon.cut_off(1u32, 2u32).unwrap();
        assert_eq!(chronon.duration(), d(3));

        chronon.cut_off(2u32, 10u32).unwrap();
        assert_eq!(chronon.duration(), d(2));

        chronon.cut_off(5u32, 6u32).unwrap();
        assert_eq!(chronon.duration(), d(2));
    }

    #[test]
    fn test_split_at() {
        let chronon = Chronon::new(4u32).with_parameter("pitch", "c");
        let pieces = chronon.split_at(&[d(1), d(3)]).unwrap();
        let durations: Vec<Duration> = pieces.iter().map(Chronon::duration).collect();
        assert_eq!(durations, vec![d(1), d(2), d(1)]);
        assert!(pieces.iter().all(|piece| piece.parameter("pitch").is_some()));
    }

    #[test]
    fn test_split_at_boundaries() {
        let chronon = Chronon::new(4u32);
        assert_eq!(chronon.split_at(&[d(0)]).unwrap().len(), 1);
        assert_eq!(chronon.split_at(&[d(4)]).unwrap().len(), 1);
        assert!(matches!(chronon.split_at(&[]), Err(EventError::NoSplitTime)));
        assert!(matches!(
            chronon.split_at(&[d(5)]),
            Err(EventError::InvalidSplitTime { .. })
        ));
        assert!(matches!(
            chronon.split_at(&[d(3), d(1)]),
            Err(EventError::InvalidSplitTime { .. })
        ));
    }
}
