//! Parameter bag attached to leaf events
//!
//! Converters and renderers read and write event data by name instead of
//! through typed fields, so values are dynamically typed.

use super::duration::Duration;
use super::tempo::TempoPoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter name that always refers to an event's duration
pub const DURATION_PARAMETER: &str = "duration";

/// Named parameters of a leaf event
pub type ParameterMap = BTreeMap<String, ParameterValue>;

/// A dynamically typed parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterValue {
    Number(f64),
    Integer(i64),
    Text(String),
    Boolean(bool),
    Duration(Duration),
    Tempo(TempoPoint),
    List(Vec<ParameterValue>),
}

impl ParameterValue {
    /// Numeric view of the value
    ///
    /// Tempo points read as their absolute tempo in beats per minute.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterValue::Number(value) => Some(*value),
            ParameterValue::Integer(value) => Some(*value as f64),
            ParameterValue::Duration(duration) => Some(duration.to_f64()),
            ParameterValue::Tempo(tempo) => Some(tempo.absolute_tempo_in_beats_per_minute()),
            _ => None,
        }
    }

    /// Duration view of the value; integers stay exact
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            ParameterValue::Duration(duration) => Some(*duration),
            ParameterValue::Integer(value) => Duration::from_integer(*value).ok(),
            ParameterValue::Number(value) => Duration::from_f64(*value).ok(),
            _ => None,
        }
    }

    /// Tempo view of the value
    ///
    /// A bare number is read as beats per minute with reference 1.
    pub fn as_tempo(&self) -> Option<TempoPoint> {
        match self {
            ParameterValue::Tempo(tempo) => Some(*tempo),
            ParameterValue::Number(_) | ParameterValue::Integer(_) => {
                let beats_per_minute = self.as_f64()?;
                log::warn!(
                    "Reading plain number {} as tempo point with reference 1",
                    beats_per_minute
                );
                TempoPoint::from_beats_per_minute(beats_per_minute).ok()
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Boolean(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Short name of the value's variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ParameterValue::Number(_) => "number",
            ParameterValue::Integer(_) => "integer",
            ParameterValue::Text(_) => "text",
            ParameterValue::Boolean(_) => "boolean",
            ParameterValue::Duration(_) => "duration",
            ParameterValue::Tempo(_) => "tempo",
            ParameterValue::List(_) => "list",
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Number(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Integer(value)
    }
}

impl From<i32> for ParameterValue {
    fn from(value: i32) -> Self {
        ParameterValue::Integer(value as i64)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Boolean(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Text(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::Text(value)
    }
}

impl From<Duration> for ParameterValue {
    fn from(value: Duration) -> Self {
        ParameterValue::Duration(value)
    }
}

impl From<TempoPoint> for ParameterValue {
    fn from(value: TempoPoint) -> Self {
        ParameterValue::Tempo(value)
    }
}

impl<T: Into<ParameterValue>> From<Vec<T>> for ParameterValue {
    fn from(values: Vec<T>) -> Self {
        ParameterValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Result of a parameter query on an event
///
/// Leaves answer with `Value`; compounds answer with `Nested`, one entry per
/// child in child order, mirroring the shape of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterLookup {
    Value(Option<ParameterValue>),
    Nested(Vec<ParameterLookup>),
}

impl ParameterLookup {
    /// The value of a leaf answer, `None` for nested answers
    pub fn as_value(&self) -> Option<&ParameterValue> {
        match self {
            ParameterLookup::Value(value) => value.as_ref(),
            ParameterLookup::Nested(_) => None,
        }
    }

    /// Consume the lookup and return the contained value of a leaf answer
    pub fn into_value(self) -> Option<ParameterValue> {
        match self {
            ParameterLookup::Value(value) => value,
            ParameterLookup::Nested(_) => None,
        }
    }

    /// All leaf answers in depth-first order
    pub fn into_flat(self) -> Vec<Option<ParameterValue>> {
        let mut flat = Vec::new();
        let mut stack = vec![self];
        while let Some(lookup) = stack.pop() {
            match lookup {
                ParameterLookup::Value(value) => flat.push(value),
                ParameterLookup::Nested(children) => stack.extend(children.into_iter().rev()),
            }
        }
        flat
    }
}
