//! Explicit configuration for event operations
//!
//! Operations that need a policy (how to pad a compound, which curve shape
//! to use for envelope points given without one, which tempo counts as
//! "no tempo change") take an [`EventConfig`] through their `*_with`
//! variant. The plain variants use `EventConfig::default()`.
//!
//! ```yaml
//! padding: prolong
//! prolong_chronons: false
//! default_curve_shape: 0.0
//! reference_tempo:
//!   beats_per_minute: 60.0
//!   reference: 1.0
//! ```

use crate::errors::Result;
use crate::events::Chronon;
use crate::models::{Duration, ParameterMap, TempoPoint};
use serde::{Deserialize, Serialize};

/// How a compound is filled up when it has to reach a longer duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// Append a parameterless chronon (a rest)
    Rest,
    /// Append a chronon carrying a copy of these parameters
    Template(ParameterMap),
    /// Lengthen the last child instead of appending
    Prolong,
}

impl Default for Padding {
    fn default() -> Self {
        Padding::Rest
    }
}

/// Configuration threaded through event operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Padding policy of `extend_until` and concatenation
    pub padding: Padding,

    /// Whether a concurrence may lengthen leaf children in `extend_until`
    pub prolong_chronons: bool,

    /// Curve shape of envelope points given without one
    pub default_curve_shape: f64,

    /// Tempo at which one beat lasts one second
    pub reference_tempo: TempoPoint,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            padding: Padding::Rest,
            prolong_chronons: true,
            default_curve_shape: 0.0,
            reference_tempo: TempoPoint::default(),
        }
    }
}

impl EventConfig {
    /// Parse a YAML document; missing keys take their defaults
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let config: EventConfig = serde_yaml::from_str(source)?;
        log::debug!("Loaded event config: {:?}", config);
        Ok(config)
    }

    /// Serialize to YAML
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Chronon used to pad a compound by `duration`
    ///
    /// Returns `None` when the policy is [`Padding::Prolong`].
    pub fn padding_chronon(&self, duration: Duration) -> Option<Chronon> {
        match &self.padding {
            Padding::Rest => Some(Chronon::new(duration)),
            Padding::Template(parameters) => {
                Some(Chronon::with_parameters(duration, parameters.clone()))
            }
            Padding::Prolong => None,
        }
    }
}
