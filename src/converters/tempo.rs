//! Apply one tempo envelope to an event tree

use crate::config::EventConfig;
use crate::envelope::Envelope;
use crate::errors::{EventError, Result};
use crate::events::{Compound, Event};
use crate::models::{Duration, TempoPoint};

/// Whether applying `tempo_envelope` would leave every duration as it is
///
/// That is the case for an envelope without points and for a static
/// envelope at the reference tempo.
pub fn is_effectless(tempo_envelope: &Envelope, config: &EventConfig) -> bool {
    if tempo_envelope.is_empty() {
        return true;
    }
    let reference = config.reference_tempo.absolute_tempo_in_beats_per_minute();
    tempo_envelope.is_static()
        && tempo_envelope
            .value_at(Duration::zero())
            .is_ok_and(|value| value == reference)
}

/// Converts durations in beats into durations in seconds
///
/// The tempo envelope starts at the beginning of the converted event.
/// Behind its end the last tempo holds.
#[derive(Debug, Clone)]
pub struct TempoConverter {
    beat_length_envelope: Envelope,
    config: EventConfig,
}

impl TempoConverter {
    pub fn new(tempo_envelope: &Envelope) -> Result<Self> {
        Self::with_config(tempo_envelope, &EventConfig::default())
    }

    pub fn with_config(tempo_envelope: &Envelope, config: &EventConfig) -> Result<Self> {
        if tempo_envelope.is_empty() {
            return Err(EventError::EmptyEnvelope {
                operation: "TempoConverter::new",
            });
        }
        let reference = config.reference_tempo.absolute_tempo_in_beats_per_minute();
        let beat_lengths = tempo_envelope
            .points()
            .into_iter()
            .map(|point| {
                // Validates the tempo; numbers count as beats per minute
                let tempo = TempoPoint::from_beats_per_minute(point.value)?;
                let beat_length = reference / tempo.absolute_tempo_in_beats_per_minute();
                Ok((point.time, beat_length, point.curve_shape))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            beat_length_envelope: Envelope::from_shaped_points(beat_lengths)?,
            config: config.clone(),
        })
    }

    /// Seconds per beat over time
    pub fn beat_length_envelope(&self) -> &Envelope {
        &self.beat_length_envelope
    }

    /// Seconds elapsing between beat `start` and beat `end`
    pub fn integrate(&self, start: impl Into<Duration>, end: impl Into<Duration>) -> Result<Duration> {
        let seconds = self.beat_length_envelope.integrate_interval(start, end)?;
        Duration::from_f64(seconds)
    }

    /// Converted deep copy of `event`
    pub fn convert(&self, event: &Event) -> Result<Event> {
        let mut converted = event.clone();
        self.convert_in_place(&mut converted)?;
        Ok(converted)
    }

    /// Convert every leaf duration of `event`
    ///
    /// Tempo envelopes of the visited events are converted as well: their
    /// points move to the time in seconds at which they are reached. On
    /// failure `event` may be partially converted; use [`convert`] to keep
    /// the input intact.
    ///
    /// [`convert`]: TempoConverter::convert
    pub fn convert_in_place(&self, event: &mut Event) -> Result<()> {
        let mut stack: Vec<(&mut Event, Duration)> = vec![(event, Duration::zero())];
        while let Some((node, offset)) = stack.pop() {
            let duration = node.duration();
            if let Some(tempo_envelope) = node.tempo_envelope_mut() {
                if !is_effectless(tempo_envelope, &self.config) {
                    let local = self.local(offset, duration)?;
                    *tempo_envelope = local.convert_envelope(tempo_envelope)?;
                }
            }
            match node {
                Event::Chronon(chronon) => {
                    chronon.set_duration(self.integrate(offset, offset + duration)?);
                }
                Event::Consecution(consecution) => {
                    let mut start = offset;
                    for child in consecution.children_mut().iter_mut() {
                        let child_duration = child.duration();
                        stack.push((child, start));
                        start += child_duration;
                    }
                }
                Event::Concurrence(concurrence) => {
                    for child in concurrence.children_mut().iter_mut() {
                        stack.push((child, offset));
                    }
                }
            }
        }
        Ok(())
    }

    /// Converter for the part of the curve an event starting at `offset` covers
    fn local(&self, offset: Duration, duration: Duration) -> Result<TempoConverter> {
        let beat_length_envelope = if duration.is_zero() {
            let beat_length = self.beat_length_envelope.value_at(offset)?;
            Envelope::from_points(vec![(Duration::zero(), beat_length)])?
        } else {
            let mut slice = self.beat_length_envelope.clone();
            slice.cut_out(offset, offset + duration)?;
            slice
        };
        Ok(TempoConverter {
            beat_length_envelope,
            config: self.config.clone(),
        })
    }

    /// Move the points of `envelope` to their times in seconds
    fn convert_envelope(&self, envelope: &Envelope) -> Result<Envelope> {
        let mut points = envelope.clone().into_consecution();
        let mut time = Duration::zero();
        for point in points.children_mut().iter_mut() {
            let length = point.duration();
            point.set_duration(self.integrate(time, time + length)?)?;
            time += length;
        }
        Envelope::try_from(points)
    }
}
