//! Event tree
//!
//! An [`Event`] is either a leaf ([`Chronon`]) or a compound holding child
//! events: a [`Consecution`] lays its children end to end, a
//! [`Concurrence`] lets them start together. Every variant answers the same
//! contract (duration, tag, tempo envelope, parameters, cutting and
//! splitting), so tree algorithms recurse without caring which kind of node
//! they visit.
//!
//! # Architecture
//!
//! ```text
//! Event
//! ├── Chronon       duration + parameter bag
//! ├── Consecution   duration = sum of children
//! └── Concurrence   duration = max of children (0 if empty)
//! ```
//!
//! Edits either succeed completely or leave the receiver untouched.
//! Range based edits validate their input before changing any child;
//! edits whose failure depends on the content of the tree run on a copy
//! that replaces the receiver only on success.

pub mod chronon;
pub mod compound;
pub mod concurrence;
pub mod consecution;
pub mod walk;

pub use chronon::Chronon;
pub use compound::{add_duration_of_removed, Compound};
pub use concurrence::Concurrence;
pub use consecution::Consecution;
pub use walk::{Leaves, LeavesMut};

use crate::config::EventConfig;
use crate::converters::Metrizer;
use crate::envelope::Envelope;
use crate::errors::{EventError, Result};
use crate::models::{Duration, ParameterLookup, ParameterValue, DURATION_PARAMETER};
use serde::{Deserialize, Serialize};

/// Any node of the event tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Chronon(Chronon),
    Consecution(Consecution),
    Concurrence(Concurrence),
}

impl From<Chronon> for Event {
    fn from(chronon: Chronon) -> Self {
        Event::Chronon(chronon)
    }
}

impl From<Consecution> for Event {
    fn from(consecution: Consecution) -> Self {
        Event::Consecution(consecution)
    }
}

impl From<Concurrence> for Event {
    fn from(concurrence: Concurrence) -> Self {
        Event::Concurrence(concurrence)
    }
}

impl From<Envelope> for Event {
    fn from(envelope: Envelope) -> Self {
        Event::Consecution(envelope.into_consecution())
    }
}

/// Run `edit` on a copy of `target`; the copy replaces `target` only on success
pub(crate) fn transact<T, R, F>(target: &mut T, edit: F) -> Result<R>
where
    T: Clone,
    F: FnOnce(&mut T) -> Result<R>,
{
    let mut candidate = target.clone();
    let output = edit(&mut candidate)?;
    *target = candidate;
    Ok(output)
}

/// Turn split times into the consecutive `(start, end)` ranges to cut out
///
/// Times have to be strictly increasing and must not exceed `duration`.
/// The event's start and end are added when missing.
pub(crate) fn split_ranges(
    times: &[Duration],
    duration: Duration,
) -> Result<Vec<(Duration, Duration)>> {
    let (first, last) = match (times.first(), times.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(EventError::NoSplitTime),
    };
    for pair in times.windows(2) {
        if pair[1] <= pair[0] {
            return Err(EventError::InvalidSplitTime {
                time: pair[1].to_string(),
                duration: duration.to_string(),
                reason: "split times have to be strictly increasing",
            });
        }
    }
    if last > duration {
        return Err(EventError::InvalidSplitTime {
            time: last.to_string(),
            duration: duration.to_string(),
            reason: "split time is behind the end of the event",
        });
    }

    let mut boundaries = Vec::with_capacity(times.len() + 2);
    if !first.is_zero() {
        boundaries.push(Duration::zero());
    }
    boundaries.extend_from_slice(times);
    if last != duration {
        boundaries.push(duration);
    }
    Ok(boundaries
        .windows(2)
        .map(|pair| (pair[0], pair[1]))
        .collect())
}

impl Event {
    /// Name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Chronon(_) => "chronon",
            Event::Consecution(_) => Consecution::KIND,
            Event::Concurrence(_) => Concurrence::KIND,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Event::Chronon(_))
    }

    pub fn as_chronon(&self) -> Option<&Chronon> {
        match self {
            Event::Chronon(chronon) => Some(chronon),
            _ => None,
        }
    }

    pub fn as_consecution(&self) -> Option<&Consecution> {
        match self {
            Event::Consecution(consecution) => Some(consecution),
            _ => None,
        }
    }

    pub fn as_concurrence(&self) -> Option<&Concurrence> {
        match self {
            Event::Concurrence(concurrence) => Some(concurrence),
            _ => None,
        }
    }

    pub fn as_consecution_mut(&mut self) -> Option<&mut Consecution> {
        match self {
            Event::Consecution(consecution) => Some(consecution),
            _ => None,
        }
    }

    pub fn as_concurrence_mut(&mut self) -> Option<&mut Concurrence> {
        match self {
            Event::Concurrence(concurrence) => Some(concurrence),
            _ => None,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Event::Chronon(chronon) => chronon.duration(),
            Event::Consecution(consecution) => consecution.duration(),
            Event::Concurrence(concurrence) => concurrence.duration(),
        }
    }

    /// Set the duration; compounds rescale their children
    pub fn set_duration(&mut self, duration: impl Into<Duration>) -> Result<()> {
        match self {
            Event::Chronon(chronon) => {
                chronon.set_duration(duration);
                Ok(())
            }
            Event::Consecution(consecution) => consecution.set_duration(duration),
            Event::Concurrence(concurrence) => concurrence.set_duration(duration),
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Event::Chronon(chronon) => chronon.tag(),
            Event::Consecution(consecution) => consecution.tag(),
            Event::Concurrence(concurrence) => concurrence.tag(),
        }
    }

    pub fn set_tag(&mut self, tag: Option<String>) {
        match self {
            Event::Chronon(chronon) => chronon.set_tag(tag),
            Event::Consecution(consecution) => consecution.set_tag(tag),
            Event::Concurrence(concurrence) => concurrence.set_tag(tag),
        }
    }

    /// Local tempo envelope; `None` means the identity tempo
    pub fn tempo_envelope(&self) -> Option<&Envelope> {
        match self {
            Event::Chronon(chronon) => chronon.tempo_envelope(),
            Event::Consecution(consecution) => consecution.tempo_envelope(),
            Event::Concurrence(concurrence) => concurrence.tempo_envelope(),
        }
    }

    pub fn tempo_envelope_mut(&mut self) -> Option<&mut Envelope> {
        match self {
            Event::Chronon(chronon) => chronon.tempo_envelope_mut(),
            Event::Consecution(consecution) => consecution.tempo_envelope_mut(),
            Event::Concurrence(concurrence) => concurrence.tempo_envelope_mut(),
        }
    }

    pub fn set_tempo_envelope(&mut self, tempo_envelope: Option<Envelope>) {
        match self {
            Event::Chronon(chronon) => chronon.set_tempo_envelope(tempo_envelope),
            Event::Consecution(consecution) => consecution.set_tempo_envelope(tempo_envelope),
            Event::Concurrence(concurrence) => concurrence.set_tempo_envelope(tempo_envelope),
        }
    }

    /// Drop the local tempo envelope (back to the identity tempo)
    pub fn reset_tempo_envelope(&mut self) {
        self.set_tempo_envelope(None);
    }

    /// Direct children; empty for a chronon
    pub fn children(&self) -> &[Event] {
        match self {
            Event::Chronon(_) => &[],
            Event::Consecution(consecution) => consecution.children(),
            Event::Concurrence(concurrence) => concurrence.children(),
        }
    }

    pub(crate) fn child_list_mut(&mut self) -> Option<&mut Vec<Event>> {
        match self {
            Event::Chronon(_) => None,
            Event::Consecution(consecution) => Some(consecution.children_mut()),
            Event::Concurrence(concurrence) => Some(concurrence.children_mut()),
        }
    }

    /// Depth-first iterator over all chronons, in child order
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves::new(self)
    }

    pub fn leaves_mut(&mut self) -> LeavesMut<'_> {
        LeavesMut::new(self)
    }

    /// Follow child indices from this event; an empty path returns `self`
    pub fn get_event_from_index_sequence(&self, indices: &[usize]) -> Result<&Event> {
        let mut event = self;
        for index in indices {
            let children = event.children();
            event = children.get(*index).ok_or(EventError::IndexOutOfRange {
                index: *index,
                len: children.len(),
            })?;
        }
        Ok(event)
    }

    /// Collect the named parameter from every leaf
    ///
    /// Without `flat` the answer mirrors the tree. With `flat` the leaf
    /// values are collected depth-first and exactly one value is expected:
    /// none yields `Value(None)`, more than one fails with
    /// [`EventError::AmbiguousParameter`]. `filter_undefined` skips leaves
    /// lacking the parameter.
    pub fn get_parameter(
        &self,
        name: &str,
        flat: bool,
        filter_undefined: bool,
    ) -> Result<ParameterLookup> {
        if !flat {
            return Ok(self.parameter_tree(name, filter_undefined));
        }
        let mut values: Vec<Option<ParameterValue>> = self
            .leaves()
            .map(|leaf| leaf.get_parameter(name))
            .filter(|value| !filter_undefined || value.is_some())
            .collect();
        match values.len() {
            0 => Ok(ParameterLookup::Value(None)),
            1 => Ok(ParameterLookup::Value(values.pop().flatten())),
            count => Err(EventError::AmbiguousParameter {
                name: name.to_string(),
                count,
            }),
        }
    }

    fn parameter_tree(&self, name: &str, filter_undefined: bool) -> ParameterLookup {
        match self {
            Event::Chronon(chronon) => ParameterLookup::Value(chronon.get_parameter(name)),
            _ => ParameterLookup::Nested(
                self.children()
                    .iter()
                    .map(|child| child.parameter_tree(name, filter_undefined))
                    .filter(|lookup| {
                        !(filter_undefined && matches!(lookup, ParameterLookup::Value(None)))
                    })
                    .collect(),
            ),
        }
    }

    /// Set a parameter on every leaf
    pub fn set_parameter(&mut self, name: &str, value: impl Into<ParameterValue>) -> Result<()> {
        let value = value.into();
        self.set_parameter_by(name, |_| value.clone(), true)
    }

    /// Set a parameter on every leaf from its previous value
    ///
    /// `function` receives the old value (`None` if unset). Leaves lacking
    /// the parameter are skipped unless `set_unassigned_parameter` is set.
    pub fn set_parameter_by<F>(
        &mut self,
        name: &str,
        mut function: F,
        set_unassigned_parameter: bool,
    ) -> Result<()>
    where
        F: FnMut(Option<&ParameterValue>) -> ParameterValue,
    {
        transact(self, |event| {
            for leaf in event.leaves_mut() {
                if !set_unassigned_parameter && !leaf.has_parameter(name) {
                    continue;
                }
                let old = leaf.get_parameter(name);
                let new = function(old.as_ref());
                leaf.set_parameter(name, new)?;
            }
            Ok(())
        })
    }

    /// Mutate a parameter in place on every leaf that defines it
    pub fn mutate_parameter<F>(&mut self, name: &str, mut function: F) -> Result<()>
    where
        F: FnMut(&mut ParameterValue),
    {
        transact(self, |event| {
            for leaf in event.leaves_mut() {
                if name == DURATION_PARAMETER {
                    let mut value = ParameterValue::Duration(leaf.duration());
                    function(&mut value);
                    leaf.set_parameter(name, value)?;
                } else if let Some(value) = leaf.parameters_mut().get_mut(name) {
                    function(value);
                }
            }
            Ok(())
        })
    }

    /// Keep only the part between `start` and `end`, re-based to start at 0
    pub fn cut_out(&mut self, start: impl Into<Duration>, end: impl Into<Duration>) -> Result<()> {
        match self {
            Event::Chronon(chronon) => chronon.cut_out(start, end),
            Event::Consecution(consecution) => consecution.cut_out(start, end),
            Event::Concurrence(concurrence) => concurrence.cut_out(start, end),
        }
    }

    /// Remove the part between `start` and `end`
    pub fn cut_off(&mut self, start: impl Into<Duration>, end: impl Into<Duration>) -> Result<()> {
        match self {
            Event::Chronon(chronon) => chronon.cut_off(start, end),
            Event::Consecution(consecution) => consecution.cut_off(start, end),
            Event::Concurrence(concurrence) => concurrence.cut_off(start, end),
        }
    }

    /// Split into one event per span between consecutive split times
    pub fn split_at(&self, times: &[Duration]) -> Result<Vec<Event>> {
        match self {
            Event::Chronon(chronon) => Ok(chronon
                .split_at(times)?
                .into_iter()
                .map(Event::from)
                .collect()),
            _ => {
                let ranges = split_ranges(times, self.duration())?;
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
    }

    pub fn squash_in(&mut self, start: impl Into<Duration>, event: Event) -> Result<()> {
        match self {
            Event::Chronon(_) => Err(EventError::ImpossibleToSquashIn("chronon")),
            Event::Consecution(consecution) => consecution.squash_in(start, event),
            Event::Concurrence(concurrence) => concurrence.squash_in(start, event),
        }
    }

    pub fn slide_in(&mut self, start: impl Into<Duration>, event: Event) -> Result<()> {
        match self {
            Event::Chronon(_) => Err(EventError::ImpossibleToSlideIn("chronon")),
            Event::Consecution(consecution) => consecution.slide_in(start, event),
            Event::Concurrence(concurrence) => concurrence.slide_in(start, event),
        }
    }

    pub fn extend_until(&mut self, duration: impl Into<Duration>) -> Result<()> {
        self.extend_until_with(duration, &EventConfig::default())
    }

    pub fn extend_until_with(
        &mut self,
        duration: impl Into<Duration>,
        config: &EventConfig,
    ) -> Result<()> {
        match self {
            Event::Chronon(_) => Err(EventError::ImpossibleToExtendUntil("chronon")),
            Event::Consecution(consecution) => consecution.extend_until_with(duration, config),
            Event::Concurrence(concurrence) => concurrence.extend_until_with(duration, config),
        }
    }

    /// See [`Compound::remove_by`]; a chronon has nothing to remove
    pub fn remove_by<F>(&mut self, mut predicate: F, nested: bool, only_leaves: bool) -> Vec<Event>
    where
        F: FnMut(&Event) -> bool,
    {
        let mut removed = Vec::new();
        if let Some(children) = self.child_list_mut() {
            compound::remove_children_by(children, &mut predicate, nested, only_leaves, &mut removed);
        }
        removed
    }

    /// Resolve all tempo envelopes into durations in seconds
    ///
    /// Afterwards every tempo envelope is the identity, so metrizing again
    /// changes nothing.
    pub fn metrize(&mut self) -> Result<()> {
        let metrized = Metrizer::default().convert(self)?;
        *self = metrized;
        Ok(())
    }
}
