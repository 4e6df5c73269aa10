//! Iterative traversal of event trees
//!
//! Both iterators keep an explicit stack instead of recursing, so arbitrarily
//! deep trees can't exhaust the call stack. Leaves come out depth-first in
//! child order.

use super::{Chronon, Compound, Event};

/// Iterator over all chronons of a tree
pub struct Leaves<'a> {
    stack: Vec<&'a Event>,
}

impl<'a> Leaves<'a> {
    pub(crate) fn new(root: &'a Event) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a Chronon;

    fn next(&mut self) -> Option<&'a Chronon> {
        while let Some(event) = self.stack.pop() {
            match event {
                Event::Chronon(chronon) => return Some(chronon),
                Event::Consecution(consecution) => {
                    self.stack.extend(consecution.children().iter().rev())
                }
                Event::Concurrence(concurrence) => {
                    self.stack.extend(concurrence.children().iter().rev())
                }
            }
        }
        None
    }
}

/// Mutable iterator over all chronons of a tree
pub struct LeavesMut<'a> {
    stack: Vec<&'a mut Event>,
}

impl<'a> LeavesMut<'a> {
    pub(crate) fn new(root: &'a mut Event) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for LeavesMut<'a> {
    type Item = &'a mut Chronon;

    fn next(&mut self) -> Option<&'a mut Chronon> {
        while let Some(event) = self.stack.pop() {
            match event {
                Event::Chronon(chronon) => return Some(chronon),
                Event::Consecution(consecution) => {
                    self.stack.extend(consecution.children_mut().iter_mut().rev())
                }
                Event::Concurrence(concurrence) => {
                    self.stack.extend(concurrence.children_mut().iter_mut().rev())
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Concurrence, Consecution};
    use crate::models::Duration;

    fn leaf(duration: u32) -> Event {
        Event::from(Chronon::new(duration))
    }

    #[test]
    fn test_leaves_are_depth_first() {
        let inner = Concurrence::from_events(vec![leaf(2), leaf(3)]);
        let tree = Event::from(Consecution::from_events(vec![
            leaf(1),
            Event::from(inner),
            leaf(4),
        ]));
        let durations: Vec<Duration> = tree.leaves().map(Chronon::duration).collect();
        assert_eq!(
            durations,
            vec![
                Duration::from(1u32),
                Duration::from(2u32),
                Duration::from(3u32),
                Duration::from(4u32)
            ]
        );
    }

    #[test]
    fn test_leaves_of_a_leaf() {
        let tree = leaf(5);
        assert_eq!(tree.leaves().count(), 1);
    }

    #[test]
    fn test_leaves_mut() {
        let mut tree = Event::from(Consecution::from_events(vec![leaf(1), leaf(2)]));
        for chronon in tree.leaves_mut() {
            chronon.set_duration(3u32);
        }
        assert_eq!(tree.duration(), Duration::from(6u32));
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let mut tree = leaf(1);
        for _ in 0..5_000 {
            tree = Event::from(Consecution::from_events(vec![tree]));
        }
        assert_eq!(tree.leaves().count(), 1);
        // Drop iteratively as well: the derived drop glue recurses
        let mut current = tree;
        while let Some(children) = current.child_list_mut() {
            match children.pop() {
                Some(child) => current = child,
                None => break,
            }
        }
    }
}
