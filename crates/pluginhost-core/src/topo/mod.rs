//! Generic topological sort kernel.
//!
//! Sorts an arbitrary node set under a "requires" relation (`u` requires `v`
//! means `v` must precede `u` in the emitted order), with a pluggable policy
//! for breaking ties between nodes that have no ordering constraint between
//! them. Used by the plugin dependency resolver ([`crate::plugin_system`])
//! but has no knowledge of plugins itself.

mod error;
mod policy;

pub use error::TopoError;
pub use policy::TiePolicy;

use std::collections::HashSet;

struct Node<T> {
    value: T,
    insertion_order: usize,
    requires: HashSet<usize>,
}

/// A topological sort over nodes of type `T`, ordered under `requires`
/// edges, with ties between unconstrained nodes broken by `policy`.
pub struct TopoSort<T> {
    nodes: Vec<Node<T>>,
    policy: TiePolicy<T>,
    cache: Option<Vec<usize>>,
    next_insertion_order: usize,
}

impl<T: Clone + Ord + std::fmt::Debug> TopoSort<T> {
    pub fn new(policy: TiePolicy<T>) -> Self {
        Self {
            nodes: Vec::new(),
            policy,
            cache: None,
            next_insertion_order: 0,
        }
    }

    /// Adds a new node, returning a handle used by [`Self::add_edge`].
    pub fn add_node(&mut self, value: T) -> usize {
        let handle = self.nodes.len();
        self.nodes.push(Node {
            value,
            insertion_order: self.next_insertion_order,
            requires: HashSet::new(),
        });
        self.next_insertion_order += 1;
        self.cache = None;
        handle
    }

    /// Records that `dependent` requires `dependency` to precede it.
    ///
    /// # Panics
    /// Panics if either handle is out of range — both must have come from
    /// [`Self::add_node`] on this same instance.
    pub fn add_edge(&mut self, dependent: usize, dependency: usize) {
        assert!(dependent < self.nodes.len(), "unknown node handle");
        assert!(dependency < self.nodes.len(), "unknown node handle");
        self.nodes[dependent].requires.insert(dependency);
        self.cache = None;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn value(&self, handle: usize) -> &T {
        &self.nodes[handle].value
    }

    /// Computes (or returns the memoized) topological order as node handles.
    pub fn sort(&mut self) -> Result<&[usize], TopoError> {
        if self.cache.is_none() {
            self.cache = Some(self.compute()?);
        }
        Ok(self.cache.as_deref().unwrap())
    }

    fn compute(&self) -> Result<Vec<usize>, TopoError> {
        let mut remaining: HashSet<usize> = (0..self.nodes.len()).collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while !remaining.is_empty() {
            let ready: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&n| self.nodes[n].requires.iter().all(|r| !remaining.contains(r)))
                .collect();

            if ready.is_empty() {
                let mut cycle: Vec<usize> = remaining.into_iter().collect();
                cycle.sort_by_key(|&n| self.nodes[n].insertion_order);
                return Err(TopoError::CycleDetected {
                    cycle: cycle.iter().map(|&n| format!("{:?}", self.nodes[n].value)).collect(),
                });
            }

            let chosen = self.policy.pick(&ready, &self.nodes);
            remaining.remove(&chosen);
            order.push(chosen);
        }

        Ok(order)
    }
}
