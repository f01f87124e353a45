//! The ordered work queue of pending search units.

use crate::strategy::SearchStrategy;
use crate::unit::SearchUnit;
use std::collections::{HashSet, VecDeque};

/// An ordered queue of pending [`SearchUnit`]s.
///
/// Built from a strategy and the persisted completed-set; a designated
/// in-progress unit can be relocated to the head so an interrupted run
/// continues where it left off instead of starting over.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<SearchUnit>,
}

impl Frontier {
    /// Build a frontier from a strategy's initial plan.
    ///
    /// If `resume_key` names a unit present in the plan, that unit is
    /// de-duplicated and moved to the front.
    #[must_use]
    pub fn build(
        strategy: &SearchStrategy,
        completed: &HashSet<String>,
        resume_key: Option<&str>,
    ) -> Self {
        let mut queue: VecDeque<SearchUnit> = strategy.initial_units(completed).into();

        if let Some(key) = resume_key {
            if let Some(pos) = queue.iter().position(|u| u.key() == key) {
                let unit = queue.remove(pos).expect("position came from iter");
                queue.push_front(unit);
                tracing::info!(unit = %key, "resuming at in-progress unit");
            }
        }

        tracing::info!(pending = queue.len(), "frontier initialized");
        Self { queue }
    }

    /// Dequeue the next unit to search.
    pub fn pop(&mut self) -> Option<SearchUnit> {
        self.queue.pop_front()
    }

    /// Push expansion children to the head, preserving their order.
    ///
    /// Head insertion gives depth-first priority: a deep, high-cardinality
    /// branch is fully resolved before its siblings, which bounds how many
    /// pending units exist at once.
    pub fn push_children(&mut self, children: Vec<SearchUnit>) {
        for child in children.into_iter().rev() {
            self.queue.push_front(child);
        }
    }

    /// Re-enqueue a failed unit at the tail for a later retry.
    ///
    /// Tail placement keeps one bad unit from blocking the whole queue.
    pub fn push_retry(&mut self, unit: SearchUnit) {
        self.queue.push_back(unit);
    }

    /// Number of pending units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the frontier is drained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
