//! Resolve the tempo envelopes of an event tree

use crate::config::EventConfig;
use crate::errors::Result;
use crate::events::Event;

use super::tempo::{is_effectless, TempoConverter};

/// Applies every event's own tempo envelope to the event and its descendants
///
/// Nodes are visited from the root downwards. A node's tempo envelope is
/// applied to its whole subtree and then reset, so envelopes further down
/// work on the time axis their ancestors already converted. `skip_level_count`
/// leaves the envelopes of the first levels (depth `0..=skip_level_count`)
/// alone; `maxima_depth_count` stops applying envelopes from that depth on.
///
/// # Examples
/// ```
/// use chronon::{Chronon, Duration, Envelope, Event, Metrizer};
///
/// let slow = Envelope::from_points(vec![(Duration::from(0u32), 30.0)]).unwrap();
/// let event = Event::from(Chronon::new(2u32).with_tempo_envelope(slow));
/// let metrized = Metrizer::default().convert(&event).unwrap();
/// assert_eq!(metrized.duration(), Duration::from(4u32));
/// assert!(metrized.tempo_envelope().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Metrizer {
    pub skip_level_count: Option<usize>,
    pub maxima_depth_count: Option<usize>,
    config: EventConfig,
}

impl Metrizer {
    pub fn new(skip_level_count: Option<usize>, maxima_depth_count: Option<usize>) -> Self {
        Self {
            skip_level_count,
            maxima_depth_count,
            config: EventConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EventConfig) -> Self {
        self.config = config;
        self
    }

    fn applies_at(&self, depth: usize) -> bool {
        self.skip_level_count.map_or(true, |skip| skip < depth)
            && self.maxima_depth_count.map_or(true, |maxima| depth < maxima)
    }

    /// Metrized deep copy of `event`
    pub fn convert(&self, event: &Event) -> Result<Event> {
        let mut converted = event.clone();
        self.convert_in_place(&mut converted)?;
        Ok(converted)
    }

    /// Metrize `event`; on failure it may be partially converted
    pub fn convert_in_place(&self, event: &mut Event) -> Result<()> {
        let mut stack: Vec<(&mut Event, usize)> = vec![(event, 0)];
        while let Some((node, depth)) = stack.pop() {
            if self.applies_at(depth) {
                let converter = match node.tempo_envelope() {
                    Some(tempo_envelope) if !is_effectless(tempo_envelope, &self.config) => {
                        Some(TempoConverter::with_config(tempo_envelope, &self.config)?)
                    }
                    Some(_) => {
                        log::debug!("Skipping effect-less tempo envelope at depth {}", depth);
                        None
                    }
                    None => None,
                };
                if let Some(converter) = converter {
                    converter.convert_in_place(node)?;
                }
                node.reset_tempo_envelope();
            }
            if let Some(children) = node.child_list_mut() {
                for child in children.iter_mut() {
                    stack.push((child, depth + 1));
                }
            }
        }
        Ok(())
    }
}
