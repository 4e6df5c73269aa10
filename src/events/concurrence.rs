//! Simultaneous compound event
//!
//! All children of a [`Concurrence`] start at time 0, so its duration is
//! the longest child (0 without children). Time based edits are forwarded
//! to every child with the same arguments.

use crate::config::EventConfig;
use crate::envelope::Envelope;
use crate::errors::{EventError, Result};
use crate::models::Duration;
use serde::{Deserialize, Serialize};

use super::{transact, Chronon, Compound, Consecution, Event};

/// Children starting together
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Concurrence {
    #[serde(default)]
    children: Vec<Event>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    tempo_envelope: Option<Box<Envelope>>,
}

impl Compound for Concurrence {
    const KIND: &'static str = "concurrence";

    fn children(&self) -> &[Event] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Event> {
        &mut self.children
    }
}

impl Concurrence {
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

    /// Duration of the longest child
    pub fn duration(&self) -> Duration {
        self.children
            .iter()
            .map(Event::duration)
            .max()
            .unwrap_or_default()
    }

    /// Keep only the part between `start` and `end` of every child
    ///
    /// Chronons starting behind the cut are dropped; a zero-duration
    /// chronon survives a cut starting at 0.
    pub fn cut_out(&mut self, start: impl Into<Duration>, end: impl Into<Duration>) -> Result<()> {
        let (start, end) = (start.into(), end.into());
        if start >= end {
            return Err(EventError::InvalidStartAndEnd {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        let mut survivors = Vec::with_capacity(self.children.len());
        for child in self.children.iter_mut() {
            let child_duration = child.duration();
            let survives = match child {
                Event::Chronon(chronon) if start < child_duration => {
                    chronon.cut_out(start, end)?;
                    true
                }
                Event::Chronon(_) => child_duration.is_zero() && start.is_zero(),
                compound => {
                    compound.cut_out(start, end)?;
                    true
                }
            };
            survivors.push(survives);
        }
        let mut survivors = survivors.into_iter();
        self.children.retain(|_| survivors.next().unwrap_or(false));
        Ok(())
    }

    /// Remove the part between `start` and `end` from every child
    pub fn cut_off(&mut self, start: impl Into<Duration>, end: impl Into<Duration>) -> Result<()> {
        let (start, end) = (start.into(), end.into());
        if start > end {
            return Err(EventError::InvalidStartAndEnd {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        for child in self.children.iter_mut() {
            child.cut_off(start, end)?;
        }
        Ok(())
    }

    fn assert_accepts_insert(&self, start: Duration, leaf_error: fn(&'static str) -> EventError) -> Result<()> {
        let duration = self.duration();
        if start > duration {
            return Err(EventError::InvalidStartValue {
                start: start.to_string(),
                duration: duration.to_string(),
            });
        }
        if self.children.iter().any(Event::is_leaf) {
            return Err(leaf_error("chronon"));
        }
        Ok(())
    }

    /// Squash a copy of `event` into every child
    pub fn squash_in(&mut self, start: impl Into<Duration>, event: Event) -> Result<()> {
        let start = start.into();
        self.assert_accepts_insert(start, EventError::ImpossibleToSquashIn)?;
        transact(self, |concurrence| {
            for child in concurrence.children.iter_mut() {
                child.squash_in(start, event.clone())?;
            }
            Ok(())
        })
    }

    /// Slide a copy of `event` into every child
    pub fn slide_in(&mut self, start: impl Into<Duration>, event: Event) -> Result<()> {
        let start = start.into();
        self.assert_accepts_insert(start, EventError::ImpossibleToSlideIn)?;
        transact(self, |concurrence| {
            for child in concurrence.children.iter_mut() {
                child.slide_in(start, event.clone())?;
            }
            Ok(())
        })
    }

    /// Split every child active at `time`
    ///
    /// A chronon child becomes a consecution of its two halves; the
    /// consecution takes over the chronon's tag. Children that already
    /// ended are left alone.
    pub fn split_child_at(&mut self, time: impl Into<Duration>) -> Result<()> {
        let time = time.into();
        if time >= self.duration() {
            return Err(EventError::SplitUnavailableChild(time.to_string()));
        }
        transact(self, |concurrence| {
            for child in concurrence.children.iter_mut() {
                if child.duration() <= time {
                    continue;
                }
                let replacement = match child {
                    Event::Chronon(chronon) => split_chronon(chronon, time)?,
                    Event::Consecution(consecution) => {
                        consecution.split_child_at(time)?;
                        None
                    }
                    Event::Concurrence(concurrence) => {
                        concurrence.split_child_at(time)?;
                        None
                    }
                };
                if let Some(replacement) = replacement {
                    *child = replacement;
                }
            }
            Ok(())
        })
    }

    pub fn extend_until(&mut self, duration: impl Into<Duration>) -> Result<()> {
        self.extend_until_with(duration, &EventConfig::default())
    }

    /// Extend every child until it lasts `duration`
    ///
    /// Chronon children are lengthened when `prolong_chronons` is set.
    pub fn extend_until_with(
        &mut self,
        duration: impl Into<Duration>,
        config: &EventConfig,
    ) -> Result<()> {
        if self.children.is_empty() {
            return Err(EventError::EmptyComplexEvent {
                operation: "extend_until",
            });
        }
        let duration = duration.into();
        transact(self, |concurrence| {
            for child in concurrence.children.iter_mut() {
                match child {
                    Event::Chronon(chronon) => {
                        if chronon.duration() >= duration {
                            continue;
                        }
                        if !config.prolong_chronons {
                            return Err(EventError::ImpossibleToExtendUntil("chronon"));
                        }
                        chronon.set_duration(duration);
                    }
                    compound => compound.extend_until_with(duration, config)?,
                }
            }
            Ok(())
        })
    }

    /// Rescale all children so the longest lasts `duration`
    pub fn set_duration(&mut self, duration: impl Into<Duration>) -> Result<()> {
        if self.children.is_empty() {
            return Err(EventError::CannotSetDurationOfEmptyCompound);
        }
        let duration = duration.into();
        let old_duration = self.duration();
        transact(self, |concurrence| {
            if old_duration.is_zero() {
                for child in concurrence.children.iter_mut() {
                    child.set_duration(duration)?;
                }
            } else {
                let factor = duration.checked_div(old_duration)?;
                for child in concurrence.children.iter_mut() {
                    let scaled = child.duration() * factor;
                    if scaled != child.duration() {
                        child.set_duration(scaled)?;
                    }
                }
            }
            Ok(())
        })
    }

    pub fn concatenate_by_index(&mut self, other: Concurrence) -> Result<()> {
        self.concatenate_by_index_with(other, &EventConfig::default())
    }

    /// Continue the n-th child with the n-th child of `other`
    ///
    /// All children are first extended to the current duration. Children
    /// of `other` without counterpart are delayed by a rest and appended.
    pub fn concatenate_by_index_with(&mut self, other: Concurrence, config: &EventConfig) -> Result<()> {
        transact(self, |concurrence| concurrence.merge_by_index(other, config))
    }

    pub fn concatenate_by_tag(&mut self, other: Concurrence) -> Result<()> {
        self.concatenate_by_tag_with(other, &EventConfig::default())
    }

    /// Continue each child with the child of `other` carrying the same tag
    ///
    /// Every child of `other` needs a tag, otherwise [`EventError::NoTag`]
    /// names the first untagged one.
    pub fn concatenate_by_tag_with(&mut self, other: Concurrence, config: &EventConfig) -> Result<()> {
        transact(self, |concurrence| concurrence.merge_by_tag(other, config))
    }

    fn pad_children(&mut self, config: &EventConfig) -> Result<Duration> {
        let duration = self.duration();
        if !self.children.is_empty() && !duration.is_zero() {
            self.extend_until_with(duration, config)?;
        }
        Ok(duration)
    }

    fn merge_by_index(&mut self, other: Concurrence, config: &EventConfig) -> Result<()> {
        let duration = self.pad_children(config)?;
        for (index, event) in other.children.into_iter().enumerate() {
            match self.children.get_mut(index) {
                Some(ancestor) => continue_ancestor(ancestor, event, config)?,
                None => {
                    let delayed = delay(event, duration, config)?;
                    self.append(delayed)?;
                }
            }
        }
        Ok(())
    }

    fn merge_by_tag(&mut self, other: Concurrence, config: &EventConfig) -> Result<()> {
        if let Some(index) = other.children.iter().position(|event| event.tag().is_none()) {
            return Err(EventError::NoTag(index));
        }
        let duration = self.pad_children(config)?;
        for event in other.children {
            let tag = event.tag().map(str::to_string).unwrap_or_default();
            match self.index_of_tag(&tag) {
                Ok(index) => continue_ancestor(&mut self.children[index], event, config)?,
                Err(EventError::TagNotFound(_)) => {
                    let delayed = delay(event, duration, config)?;
                    self.append(delayed)?;
                }
                Err(error) => return Err(error),
            }
        }
        Ok(())
    }
}

fn split_chronon(chronon: &Chronon, time: Duration) -> Result<Option<Event>> {
    let mut halves = chronon.split_at(&[time])?;
    if halves.len() < 2 {
        return Ok(None);
    }
    for half in halves.iter_mut() {
        half.set_tag(None);
    }
    let mut consecution = Consecution::from_events(halves.into_iter().map(Event::from).collect());
    consecution.set_tag(chronon.tag().map(str::to_string));
    Ok(Some(Event::from(consecution)))
}

/// Let `event` follow `ancestor` in time
fn continue_ancestor(ancestor: &mut Event, event: Event, config: &EventConfig) -> Result<()> {
    match ancestor {
        Event::Consecution(consecution) => {
            match event {
                Event::Consecution(source) => consecution.children_mut().extend(source.into_children()),
                other => consecution.children_mut().push(other),
            }
            Ok(())
        }
        Event::Concurrence(concurrence) => match event {
            Event::Concurrence(source) => {
                if source.children.iter().all(|child| child.tag().is_some()) {
                    concurrence.merge_by_tag(source, config)
                } else {
                    log::debug!("Untagged children, concatenating nested concurrence by index");
                    concurrence.merge_by_index(source, config)
                }
            }
            other => Err(EventError::Concatenation {
                target_kind: Concurrence::KIND,
                source_kind: other.kind(),
            }),
        },
        Event::Chronon(_) => Err(EventError::Concatenation {
            target_kind: "chronon",
            source_kind: event.kind(),
        }),
    }
}

/// Slide a rest of `duration` in front of `event`
fn delay(mut event: Event, duration: Duration, config: &EventConfig) -> Result<Event> {
    if duration.is_zero() {
        return Ok(event);
    }
    let rest = config
        .padding_chronon(duration)
        .unwrap_or_else(|| Chronon::new(duration));
    event.slide_in(Duration::zero(), Event::from(rest))?;
    Ok(event)
}
