//! Sequential compound event
//!
//! Children of a [`Consecution`] follow each other without gaps, so the
//! duration is always the sum of the children's durations and the start of
//! a child is the sum of the durations before it. Nothing is cached: every
//! query recomputes from the children.

use crate::config::EventConfig;
use crate::envelope::Envelope;
use crate::errors::{EventError, Result};
use crate::models::Duration;
use serde::{Deserialize, Serialize};

use super::{transact, Compound, Event};

/// Children laid end to end
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Consecution {
    #[serde(default)]
    children: Vec<Event>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    tempo_envelope: Option<Box<Envelope>>,
}

impl Compound for Consecution {
    const KIND: &'static str = "consecution";

    fn children(&self) -> &[Event] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Event> {
        &mut self.children
    }
}

impl Consecution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the events as they are (tags are not checked)
    pub fn from_events(children: Vec<Event>) -> Self {
        Self {
            children,
            tag: None,
            tempo_envelope: None,
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn with_tempo_envelope(mut self, tempo_envelope: Envelope) -> Self {
        self.tempo_envelope = Some(Box::new(tempo_envelope));
        self
    }

    /// Same tag and tempo envelope, no children
    pub fn empty_copy(&self) -> Self {
        Self {
            children: Vec::new(),
            tag: self.tag.clone(),
            tempo_envelope: self.tempo_envelope.clone(),
        }
    }

    pub fn into_children(self) -> Vec<Event> {
        self.children
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

    /// Sum of the children's durations
    pub fn duration(&self) -> Duration {
        self.children.iter().map(Event::duration).sum()
    }

    /// Start time of every child
    pub fn absolute_times(&self) -> Vec<Duration> {
        let mut time = Duration::zero();
        self.children
            .iter()
            .map(|child| {
                let start = time;
                time += child.duration();
                start
            })
            .collect()
    }

    /// `(start, end)` of every child
    pub fn start_and_end_time_per_event(&self) -> Vec<(Duration, Duration)> {
        let mut time = Duration::zero();
        self.children
            .iter()
            .map(|child| {
                let start = time;
                time += child.duration();
                (start, time)
            })
            .collect()
    }

    /// Index of the child active at `time`
    ///
    /// Spans are half-open, so zero-duration children are never returned
    /// and nothing is active at or after the end.
    pub fn get_event_index_at(&self, time: impl Into<Duration>) -> Option<usize> {
        let time = time.into();
        if time >= self.duration() {
            return None;
        }
        let times = self.absolute_times();
        times
            .partition_point(|start| *start <= time)
            .checked_sub(1)
    }

    pub fn get_event_at(&self, time: impl Into<Duration>) -> Option<&Event> {
        self.get_event_index_at(time)
            .and_then(|index| self.children.get(index))
    }

    /// Keep only the part between `start` and `end`, re-based to start at 0
    ///
    /// A zero-duration child at time `t` survives if `start <= t < end`,
    /// or if `t == end` and `end` is the end of the consecution, so that
    /// [`Event::split_at`] hands every marker to exactly one piece.
    pub fn cut_out(&mut self, start: impl Into<Duration>, end: impl Into<Duration>) -> Result<()> {
        let (start, end) = (start.into(), end.into());
        if start >= end {
            return Err(EventError::InvalidStartAndEnd {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        let total = self.duration();
        let spans = self.start_and_end_time_per_event();
        let mut survivors = Vec::with_capacity(spans.len());
        for (child, (event_start, event_end)) in self.children.iter_mut().zip(spans) {
            let child_duration = event_end.saturating_sub(event_start);
            let cut_start = start.saturating_sub(event_start);
            let cut_end = child_duration.saturating_sub(event_end.saturating_sub(end));
            if cut_start < cut_end {
                child.cut_out(cut_start, cut_end)?;
                survivors.push(true);
            } else {
                let inside = start <= event_start && event_start < end;
                let at_end = event_start == end && end == total;
                survivors.push(child_duration.is_zero() && (inside || at_end));
            }
        }
        let mut survivors = survivors.into_iter();
        self.children.retain(|_| survivors.next().unwrap_or(false));
        Ok(())
    }

    /// Remove the part between `start` and `end` and close the gap
    ///
    /// Zero-duration children at `start` or `end` are kept.
    pub fn cut_off(&mut self, start: impl Into<Duration>, end: impl Into<Duration>) -> Result<()> {
        let (start, end) = (start.into(), end.into());
        if start > end {
            return Err(EventError::InvalidStartAndEnd {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        if start == end {
            return Ok(());
        }
        self.cut_off_range(start, end)
    }

    fn cut_off_range(&mut self, start: Duration, end: Duration) -> Result<()> {
        let cut_off_duration = end.saturating_sub(start);
        let spans = self.start_and_end_time_per_event();
        let mut survivors = Vec::with_capacity(spans.len());
        for (child, (event_start, event_end)) in self.children.iter_mut().zip(spans) {
            // Markers on either edge of the range survive
            if event_start == event_end {
                survivors.push(event_start <= start || event_start >= end);
                continue;
            }
            if event_start >= start && event_end <= end {
                survivors.push(false);
                continue;
            }
            if event_start <= start && event_end >= start {
                let offset = start.saturating_sub(event_start);
                child.cut_off(offset, offset + cut_off_duration)?;
            } else if event_start < end && event_end > end {
                child.cut_off(Duration::zero(), end.saturating_sub(event_start))?;
            }
            survivors.push(true);
        }
        let mut survivors = survivors.into_iter();
        self.children.retain(|_| survivors.next().unwrap_or(false));
        Ok(())
    }

    /// Index at which an event starting at `time` goes
    ///
    /// The child active at `time` is split in two when `time` falls inside
    /// it. When children already start at `time` the index is the first of
    /// them, so new events land before existing same-time events.
    fn boundary_index(&mut self, time: Duration) -> Result<usize> {
        let times = self.absolute_times();
        if let Some(index) = times.iter().position(|start| *start == time) {
            return Ok(index);
        }
        let active = match self.get_event_index_at(time) {
            Some(active) => active,
            None => return Ok(self.children.len()),
        };
        let offset = time.saturating_sub(times[active]);
        log::debug!(
            "Splitting child {} of consecution at offset {}",
            active,
            offset
        );
        let halves = self.children[active].split_at(&[offset])?;
        let count = halves.len();
        self.children.splice(active..=active, halves);
        Ok(active + count - 1)
    }

    fn assert_start_in_range(&self, start: Duration) -> Result<()> {
        let duration = self.duration();
        if start > duration {
            return Err(EventError::InvalidStartValue {
                start: start.to_string(),
                duration: duration.to_string(),
            });
        }
        Ok(())
    }

    /// Insert `event` at `start`, overwriting the span it occupies
    ///
    /// The duration only grows when the event runs past the end.
    pub fn squash_in(&mut self, start: impl Into<Duration>, event: Event) -> Result<()> {
        let start = start.into();
        self.assert_start_in_range(start)?;
        transact(self, |consecution| {
            let event_duration = event.duration();
            if !event_duration.is_zero() {
                consecution.cut_off_range(start, start + event_duration)?;
            }
            let index = consecution.boundary_index(start)?;
            consecution.insert(index, event)
        })
    }

    /// Insert `event` at `start` and shift everything after it
    pub fn slide_in(&mut self, start: impl Into<Duration>, event: Event) -> Result<()> {
        let start = start.into();
        self.assert_start_in_range(start)?;
        transact(self, |consecution| {
            let index = consecution.boundary_index(start)?;
            consecution.insert(index, event)
        })
    }

    /// Split the child active at `time` into two children
    pub fn split_child_at(&mut self, time: impl Into<Duration>) -> Result<()> {
        let time = time.into();
        if self.get_event_index_at(time).is_none() {
            return Err(EventError::SplitUnavailableChild(time.to_string()));
        }
        transact(self, |consecution| consecution.boundary_index(time).map(|_| ()))
    }

    pub fn extend_until(&mut self, duration: impl Into<Duration>) -> Result<()> {
        self.extend_until_with(duration, &EventConfig::default())
    }

    /// Pad the end until the consecution lasts `duration`
    pub fn extend_until_with(
        &mut self,
        duration: impl Into<Duration>,
        config: &EventConfig,
    ) -> Result<()> {
        let duration = duration.into();
        let difference = match duration.checked_sub(self.duration()) {
            Ok(difference) if !difference.is_zero() => difference,
            _ => return Ok(()),
        };
        match config.padding_chronon(difference) {
            Some(padding) => {
                self.children.push(Event::from(padding));
                Ok(())
            }
            None => {
                let last = self
                    .children
                    .last_mut()
                    .ok_or(EventError::EmptyComplexEvent {
                        operation: "extend_until",
                    })?;
                let prolonged = last.duration() + difference;
                last.set_duration(prolonged)
            }
        }
    }

    /// Rescale all children so the consecution lasts `duration`
    ///
    /// Children keep their proportions; when all children last zero, every
    /// child gets an equal share.
    pub fn set_duration(&mut self, duration: impl Into<Duration>) -> Result<()> {
        if self.children.is_empty() {
            return Err(EventError::CannotSetDurationOfEmptyCompound);
        }
        let duration = duration.into();
        let old_duration = self.duration();
        transact(self, |consecution| {
            if old_duration.is_zero() {
                let share = duration.checked_div(Duration::from(consecution.children.len() as u32))?;
                for child in consecution.children.iter_mut() {
                    child.set_duration(share)?;
                }
            } else {
                let factor = duration.checked_div(old_duration)?;
                for child in consecution.children.iter_mut() {
                    let scaled = child.duration() * factor;
                    if scaled != child.duration() {
                        child.set_duration(scaled)?;
                    }
                }
            }
            Ok(())
        })
    }

    pub fn concatenate(&mut self, other: Consecution) -> Result<()> {
        self.concatenate_with(other, &EventConfig::default())
    }

    /// Append the children of `other`, which is consumed
    ///
    /// Tempo envelopes are concatenated as well: the receiver's envelope
    /// is first fitted to the receiver's duration so the other envelope
    /// starts where the other's children start.
    pub fn concatenate_with(&mut self, other: Consecution, config: &EventConfig) -> Result<()> {
        transact(self, |consecution| {
            consecution.concatenate_tempo_envelope(&other, config)?;
            consecution.children.extend(other.children);
            Ok(())
        })
    }

    fn concatenate_tempo_envelope(&mut self, other: &Consecution, config: &EventConfig) -> Result<()> {
        if self.tempo_envelope.is_none() && other.tempo_envelope.is_none() {
            return Ok(());
        }
        let identity = || Envelope::identity_tempo_with(config);
        let mut own = self
            .tempo_envelope
            .take()
            .map(|envelope| *envelope)
            .unwrap_or_else(identity);
        let following = other
            .tempo_envelope
            .as_deref()
            .cloned()
            .unwrap_or_else(identity);
        own.concatenate_at(self.duration(), following)?;
        self.tempo_envelope = Some(Box::new(own));
        Ok(())
    }
}
