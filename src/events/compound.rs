//! Behaviour shared by compound events
//!
//! [`Consecution`](super::Consecution) and [`Concurrence`](super::Concurrence)
//! only differ in how they lay out their children in time. Child
//! management, tag lookups and condition-based removal live here.
//!
//! # Tags
//!
//! Construction from a `Vec` takes the children as they are. `append`,
//! `insert` and `extend` reject an event whose tag is already carried by a
//! sibling. Lookups report [`EventError::AmbiguousTag`] when more than one
//! sibling carries the tag and [`EventError::TagNotFound`] when none does.

use crate::errors::{EventError, Result};

use super::Event;

/// A node of the event tree that owns child events
pub trait Compound {
    /// Name of the compound kind in error messages
    const KIND: &'static str;

    fn children(&self) -> &[Event];

    /// Direct access to the child list; tag uniqueness is not checked
    fn children_mut(&mut self) -> &mut Vec<Event>;

    fn len(&self) -> usize {
        self.children().len()
    }

    fn is_empty(&self) -> bool {
        self.children().is_empty()
    }

    fn get(&self, index: usize) -> Option<&Event> {
        self.children().get(index)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut Event> {
        self.children_mut().get_mut(index)
    }

    /// Index of the only child carrying `tag`
    fn index_of_tag(&self, tag: &str) -> Result<usize> {
        let mut matches = self
            .children()
            .iter()
            .enumerate()
            .filter(|(_, child)| child.tag() == Some(tag))
            .map(|(index, _)| index);
        let first = matches
            .next()
            .ok_or_else(|| EventError::TagNotFound(tag.to_string()))?;
        let others = matches.count();
        if others > 0 {
            return Err(EventError::AmbiguousTag {
                tag: tag.to_string(),
                count: others + 1,
            });
        }
        Ok(first)
    }

    fn get_by_tag(&self, tag: &str) -> Result<&Event> {
        let index = self.index_of_tag(tag)?;
        Ok(&self.children()[index])
    }

    fn get_mut_by_tag(&mut self, tag: &str) -> Result<&mut Event> {
        let index = self.index_of_tag(tag)?;
        Ok(&mut self.children_mut()[index])
    }

    fn remove_by_tag(&mut self, tag: &str) -> Result<Event> {
        let index = self.index_of_tag(tag)?;
        Ok(self.children_mut().remove(index))
    }

    fn append(&mut self, event: Event) -> Result<()> {
        check_tag_is_free(self.children(), &event)?;
        self.children_mut().push(event);
        Ok(())
    }

    fn insert(&mut self, index: usize, event: Event) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(EventError::IndexOutOfRange { index, len });
        }
        check_tag_is_free(self.children(), &event)?;
        self.children_mut().insert(index, event);
        Ok(())
    }

    /// Append all events; nothing is appended if any tag collides
    fn extend<I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = Event>,
        Self: Sized,
    {
        let events: Vec<Event> = events.into_iter().collect();
        for (position, event) in events.iter().enumerate() {
            check_tag_is_free(self.children(), event)?;
            check_tag_is_free(&events[..position], event)?;
        }
        self.children_mut().extend(events);
        Ok(())
    }

    fn remove(&mut self, index: usize) -> Result<Event> {
        let len = self.len();
        if index >= len {
            return Err(EventError::IndexOutOfRange { index, len });
        }
        Ok(self.children_mut().remove(index))
    }

    /// Remove every child for which `predicate` returns `true`
    ///
    /// With `nested` the removal first recurses into compound children.
    /// With `only_leaves` only chronons are tested; compound children
    /// always survive. Returns the removed events, nested ones first.
    fn remove_by<F>(&mut self, mut predicate: F, nested: bool, only_leaves: bool) -> Vec<Event>
    where
        F: FnMut(&Event) -> bool,
        Self: Sized,
    {
        let mut removed = Vec::new();
        remove_children_by(
            self.children_mut(),
            &mut predicate,
            nested,
            only_leaves,
            &mut removed,
        );
        removed
    }

    /// Merge neighbouring children for which `condition` holds
    ///
    /// The left child survives and `process_surviving` receives it together
    /// with the removed right child. With `only_leaves` only pairs of
    /// chronons are compared and the search descends into compound
    /// children instead.
    fn tie_by<C, P>(&mut self, mut condition: C, mut process_surviving: P, only_leaves: bool) -> Result<()>
    where
        C: FnMut(&Event, &Event) -> bool,
        P: FnMut(&mut Event, Event) -> Result<()>,
        Self: Sized,
    {
        let mut children = self.children().to_vec();
        tie_children_by(&mut children, &mut condition, &mut process_surviving, only_leaves)?;
        *self.children_mut() = children;
        Ok(())
    }
}

/// Default processing for [`Compound::tie_by`]: the survivor takes over the duration of the removed event
pub fn add_duration_of_removed(survivor: &mut Event, removed: Event) -> Result<()> {
    let duration = survivor.duration() + removed.duration();
    survivor.set_duration(duration)
}

fn check_tag_is_free(siblings: &[Event], event: &Event) -> Result<()> {
    if let Some(tag) = event.tag() {
        if siblings.iter().any(|sibling| sibling.tag() == Some(tag)) {
            return Err(EventError::DuplicateTag(tag.to_string()));
        }
    }
    Ok(())
}

pub(crate) fn remove_children_by(
    children: &mut Vec<Event>,
    predicate: &mut dyn FnMut(&Event) -> bool,
    nested: bool,
    only_leaves: bool,
    removed: &mut Vec<Event>,
) {
    if nested {
        for child in children.iter_mut() {
            if let Some(grandchildren) = child.child_list_mut() {
                remove_children_by(grandchildren, predicate, nested, only_leaves, removed);
            }
        }
    }
    let (dropped, kept): (Vec<Event>, Vec<Event>) =
        std::mem::take(children).into_iter().partition(|child| {
            let examined = !only_leaves || child.is_leaf();
            examined && predicate(child)
        });
    *children = kept;
    removed.extend(dropped);
}

fn tie_children_by(
    children: &mut Vec<Event>,
    condition: &mut dyn FnMut(&Event, &Event) -> bool,
    process_surviving: &mut dyn FnMut(&mut Event, Event) -> Result<()>,
    only_leaves: bool,
) -> Result<()> {
    let mut pointer = 0;
    while pointer + 1 < children.len() {
        let examined =
            !only_leaves || (children[pointer].is_leaf() && children[pointer + 1].is_leaf());
        if examined {
            if condition(&children[pointer], &children[pointer + 1]) {
                let removed = children.remove(pointer + 1);
                process_surviving(&mut children[pointer], removed)?;
            } else {
                pointer += 1;
            }
        } else {
            if let Some(grandchildren) = children[pointer].child_list_mut() {
                tie_children_by(grandchildren, condition, process_surviving, only_leaves)?;
            }
            pointer += 1;
        }
    }
    // The loop only descends into the left event of each pair
    if only_leaves {
        if let Some(grandchildren) = children.last_mut().and_then(Event::child_list_mut) {
            tie_children_by(grandchildren, condition, process_surviving, only_leaves)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Chronon, Consecution};
    use crate::models::Duration;

    fn leaf(duration: u32) -> Event {
        Event::from(Chronon::new(duration))
    }

    fn tagged(duration: u32, tag: &str) -> Event {
        Event::from(Chronon::new(duration).with_tag(tag))
    }

    fn durations(compound: &impl Compound) -> Vec<Duration> {
        compound.children().iter().map(Event::duration).collect()
    }

    #[test]
    fn test_tag_lookup() {
        let consecution = Consecution::from_events(vec![tagged(1, "a"), tagged(2, "b")]);
        assert_eq!(consecution.index_of_tag("b").unwrap(), 1);
        assert_eq!(consecution.get_by_tag("a").unwrap().duration(), Duration::from(1u32));

        let error = consecution.get_by_tag("c").unwrap_err();
        assert!(error.is_not_found());
    }

    #[test]
    fn test_ambiguous_tag_lookup() {
        let consecution = Consecution::from_events(vec![tagged(1, "a"), tagged(2, "a")]);
        let error = consecution.index_of_tag("a").unwrap_err();
        assert_eq!(
            error,
            EventError::AmbiguousTag {
                tag: "a".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn test_append_rejects_duplicate_tag() {
        let mut consecution = Consecution::from_events(vec![tagged(1, "a")]);
        assert!(matches!(
            consecution.append(tagged(2, "a")),
            Err(EventError::DuplicateTag(_))
        ));
        assert_eq!(consecution.len(), 1);

        consecution.append(leaf(2)).unwrap();
        consecution.append(leaf(3)).unwrap();
        assert_eq!(consecution.len(), 3);
    }

    #[test]
    fn test_extend_is_all_or_nothing() {
        let mut consecution = Consecution::from_events(vec![tagged(1, "a")]);
        let result = consecution.extend(vec![tagged(2, "b"), tagged(3, "b")]);
        assert!(matches!(result, Err(EventError::DuplicateTag(_))));
        assert_eq!(consecution.len(), 1);
    }

    #[test]
    fn test_insert_out_of_range() {
        let mut consecution = Consecution::from_events(vec![leaf(1)]);
        assert!(matches!(
            consecution.insert(3, leaf(1)),
            Err(EventError::IndexOutOfRange { index: 3, len: 1 })
        ));
        consecution.insert(0, leaf(2)).unwrap();
        assert_eq!(durations(&consecution), vec![Duration::from(2u32), Duration::from(1u32)]);
    }

    #[test]
    fn test_remove_by() {
        let mut consecution = Consecution::from_events(vec![leaf(1), leaf(3), leaf(2)]);
        let removed =
            consecution.remove_by(|event| event.duration() > Duration::from(2u32), false, false);
        assert_eq!(durations(&consecution), vec![Duration::from(1u32), Duration::from(2u32)]);
        assert_eq!(removed, vec![leaf(3)]);

        let nothing = consecution.remove_by(|_| false, true, false);
        assert!(nothing.is_empty());
        assert_eq!(consecution.len(), 2);
    }

    #[test]
    fn test_remove_by_nested_only_leaves() {
        let inner = Consecution::from_events(vec![leaf(1), leaf(5)]);
        let mut outer = Consecution::from_events(vec![Event::from(inner), leaf(5), leaf(2)]);
        let removed =
            outer.remove_by(|event| event.duration() == Duration::from(5u32), true, true);
        assert_eq!(removed.len(), 2);
        assert!(removed.iter().all(Event::is_leaf));
        assert_eq!(outer.len(), 2);
        assert_eq!(outer.children()[0].children().len(), 1);
        assert_eq!(outer.duration(), Duration::from(3u32));
    }

    #[test]
    fn test_tie_by_adds_durations() {
        let mut consecution = Consecution::from_events(vec![
            Event::from(Chronon::new(1u32).with_parameter("pitch", "c")),
            Event::from(Chronon::new(2u32).with_parameter("pitch", "c")),
            Event::from(Chronon::new(3u32).with_parameter("pitch", "d")),
        ]);
        consecution
            .tie_by(
                |left, right| {
                    left.get_parameter("pitch", true, false).ok()
                        == right.get_parameter("pitch", true, false).ok()
                },
                add_duration_of_removed,
                false,
            )
            .unwrap();
        assert_eq!(durations(&consecution), vec![Duration::from(3u32), Duration::from(3u32)]);
    }

    #[test]
    fn test_tie_by_only_leaves_descends() {
        let inner = Consecution::from_events(vec![leaf(1), leaf(1)]);
        let mut outer = Consecution::from_events(vec![leaf(1), Event::from(inner)]);
        outer
            .tie_by(|_, _| true, add_duration_of_removed, true)
            .unwrap();
        assert_eq!(outer.len(), 2);
        assert_eq!(outer.children()[1].children().len(), 1);
        assert_eq!(outer.duration(), Duration::from(3u32));
    }
}
