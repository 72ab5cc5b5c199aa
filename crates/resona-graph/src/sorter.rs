//! Incremental topological sorter.
//!
//! Maintains an ordinal (execution rank) per operator and repairs the
//! ordering locally when an edge insertion violates it, instead of
//! re-sorting the whole graph. The repair touches only the operators
//! actually implicated in the new dependency: everything reachable
//! backward from the edge's source that currently sorts after the
//! destination, and everything reachable forward from the destination
//! that currently sorts before the source. Those two groups swap into the
//! ordinal slots they jointly occupy, each group keeping its internal
//! relative order.
//!
//! Removing an edge only loosens constraints, so it never triggers a
//! re-sort.

use std::collections::HashMap;

use crate::node::NodeId;

/// A recorded ordinal reassignment from an incremental re-sort.
///
/// A batch of swaps is internally consistent: each original ordinal maps
/// to exactly one new ordinal, and the mapping preserves the relative
/// order within each moved group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrdinalSwap {
    /// The operator whose rank changed.
    pub operator: NodeId,
    /// Rank before the re-sort.
    pub original: i64,
    /// Rank after the re-sort.
    pub new: i64,
}

/// Where a newly inserted, unconnected operator is ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertLocation {
    /// Before every existing operator.
    First,
    /// After every existing operator.
    Last,
}

#[derive(Debug, Default)]
struct SortEntry {
    ordinal: i64,
    /// Upstream neighbors; parallel edges appear as repeated entries.
    inputs: Vec<NodeId>,
    /// Downstream neighbors; parallel edges appear as repeated entries.
    outputs: Vec<NodeId>,
}

/// Ordinal bookkeeping for a live graph.
#[derive(Debug, Default)]
pub struct IncrementalSorter {
    entries: HashMap<NodeId, SortEntry>,
    min_ordinal: i64,
    max_ordinal: i64,
}

impl IncrementalSorter {
    /// Creates an empty sorter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tracked operators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no operators are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the operator is tracked.
    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Returns the operator's current ordinal.
    pub fn ordinal(&self, id: NodeId) -> Option<i64> {
        self.entries.get(&id).map(|e| e.ordinal)
    }

    /// Returns a snapshot of every operator's ordinal.
    pub fn ordinals(&self) -> HashMap<NodeId, i64> {
        self.entries
            .iter()
            .map(|(id, e)| (*id, e.ordinal))
            .collect()
    }

    /// Inserts an unconnected operator at an extreme rank. O(1).
    ///
    /// Returns the assigned ordinal.
    pub fn insert_operator(&mut self, id: NodeId, location: InsertLocation) -> i64 {
        let ordinal = if self.entries.is_empty() {
            self.min_ordinal = 0;
            self.max_ordinal = 0;
            0
        } else {
            match location {
                InsertLocation::First => {
                    self.min_ordinal -= 1;
                    self.min_ordinal
                }
                InsertLocation::Last => {
                    self.max_ordinal += 1;
                    self.max_ordinal
                }
            }
        };
        self.entries.insert(
            id,
            SortEntry {
                ordinal,
                ..SortEntry::default()
            },
        );
        ordinal
    }

    /// Inserts an operator at an explicit ordinal; used to seed the sorter
    /// from a freshly built (already sorted) graph.
    pub fn insert_with_ordinal(&mut self, id: NodeId, ordinal: i64) {
        if self.entries.is_empty() {
            self.min_ordinal = ordinal;
            self.max_ordinal = ordinal;
        } else {
            self.min_ordinal = self.min_ordinal.min(ordinal);
            self.max_ordinal = self.max_ordinal.max(ordinal);
        }
        self.entries.insert(
            id,
            SortEntry {
                ordinal,
                ..SortEntry::default()
            },
        );
    }

    /// Removes an operator and strips it from its neighbors' adjacency
    /// lists. O(degree).
    pub fn remove_operator(&mut self, id: NodeId) {
        let Some(entry) = self.entries.remove(&id) else {
            return;
        };
        for neighbor in entry.inputs.iter().chain(entry.outputs.iter()) {
            if let Some(other) = self.entries.get_mut(neighbor) {
                other.inputs.retain(|n| *n != id);
                other.outputs.retain(|n| *n != id);
            }
        }
    }

    /// Records a new edge and repairs the ordering if it is violated.
    ///
    /// Returns the ordinal reassignments the repair produced; empty when
    /// the edge already agreed with the current order. Both endpoints must
    /// be tracked.
    pub fn add_data_edge(&mut self, from: NodeId, to: NodeId) -> Vec<OrdinalSwap> {
        debug_assert!(self.entries.contains_key(&from), "unknown source {from}");
        debug_assert!(self.entries.contains_key(&to), "unknown destination {to}");
        if !self.entries.contains_key(&from) || !self.entries.contains_key(&to) {
            return Vec::new();
        }

        if let Some(entry) = self.entries.get_mut(&from) {
            entry.outputs.push(to);
        }
        if let Some(entry) = self.entries.get_mut(&to) {
            entry.inputs.push(from);
        }

        let from_ordinal = self.entries[&from].ordinal;
        let to_ordinal = self.entries[&to].ordinal;
        if from_ordinal < to_ordinal {
            return Vec::new();
        }

        // Everything upstream of `from` that currently sorts after `to`
        // has to move earlier; everything downstream of `to` that sorts
        // before `from` has to move later.
        let mut move_earlier = self.collect_backward(from, to_ordinal);
        let mut move_later = self.collect_forward(to, from_ordinal);
        debug_assert!(
            move_earlier.iter().all(|id| !move_later.contains(id)),
            "overlapping re-sort groups: the new edge {from} -> {to} closes a cycle"
        );
        move_earlier.sort_by_key(|id| self.entries[id].ordinal);
        move_later.sort_by_key(|id| self.entries[id].ordinal);

        // The two groups redistribute over the ordinal slots they jointly
        // occupy, earlier group first. Operators outside the groups keep
        // their ranks untouched.
        let mut slots: Vec<i64> = move_earlier
            .iter()
            .chain(move_later.iter())
            .map(|id| self.entries[id].ordinal)
            .collect();
        slots.sort_unstable();

        let mut swaps = Vec::new();
        for (id, new_ordinal) in move_earlier
            .iter()
            .chain(move_later.iter())
            .zip(slots.into_iter())
        {
            let entry = self
                .entries
                .get_mut(id)
                .expect("group member disappeared during re-sort");
            if entry.ordinal != new_ordinal {
                swaps.push(OrdinalSwap {
                    operator: *id,
                    original: entry.ordinal,
                    new: new_ordinal,
                });
                entry.ordinal = new_ordinal;
            }
        }

        #[cfg(debug_assertions)]
        self.debug_validate();

        swaps
    }

    /// Removes one instance of an edge from the adjacency lists.
    ///
    /// Dropping a constraint can only leave the order more valid than
    /// necessary, so no re-sort is triggered.
    pub fn remove_data_edge(&mut self, from: NodeId, to: NodeId) {
        if let Some(entry) = self.entries.get_mut(&from)
            && let Some(position) = entry.outputs.iter().position(|n| *n == to)
        {
            entry.outputs.remove(position);
        }
        if let Some(entry) = self.entries.get_mut(&to)
            && let Some(position) = entry.inputs.iter().position(|n| *n == from)
        {
            entry.inputs.remove(position);
        }
    }

    /// Walks backward from `start` along input edges, collecting every
    /// reachable operator whose ordinal exceeds `bound`.
    fn collect_backward(&self, start: NodeId, bound: i64) -> Vec<NodeId> {
        let mut collected = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if collected.contains(&current) {
                continue;
            }
            let Some(entry) = self.entries.get(&current) else {
                continue;
            };
            if entry.ordinal <= bound {
                continue;
            }
            collected.push(current);
            stack.extend(entry.inputs.iter().copied());
        }
        collected
    }

    /// Walks forward from `start` along output edges, collecting every
    /// reachable operator whose ordinal is less than `bound`.
    fn collect_forward(&self, start: NodeId, bound: i64) -> Vec<NodeId> {
        let mut collected = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if collected.contains(&current) {
                continue;
            }
            let Some(entry) = self.entries.get(&current) else {
                continue;
            };
            if entry.ordinal >= bound {
                continue;
            }
            collected.push(current);
            stack.extend(entry.outputs.iter().copied());
        }
        collected
    }

    /// Returns every tracked edge as `(from, to)` pairs, parallel edges
    /// repeated; used by the transactor's cross-representation validator.
    #[cfg(debug_assertions)]
    pub(crate) fn edge_pairs(&self) -> Vec<(NodeId, NodeId)> {
        self.entries
            .iter()
            .flat_map(|(id, entry)| entry.outputs.iter().map(move |output| (*id, *output)))
            .collect()
    }

    /// Asserts the topological invariant over every tracked edge.
    #[cfg(debug_assertions)]
    pub(crate) fn debug_validate(&self) {
        for (id, entry) in &self.entries {
            for output in &entry.outputs {
                if let Some(downstream) = self.entries.get(output) {
                    debug_assert!(
                        entry.ordinal < downstream.ordinal,
                        "ordinal invariant violated: {id} ({}) -> {output} ({})",
                        entry.ordinal,
                        downstream.ordinal,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ordered(sorter: &IncrementalSorter, before: NodeId, after: NodeId) {
        assert!(
            sorter.ordinal(before).unwrap() < sorter.ordinal(after).unwrap(),
            "expected {before} < {after} (got {:?} vs {:?})",
            sorter.ordinal(before),
            sorter.ordinal(after),
        );
    }

    #[test]
    fn test_insert_first_and_last() {
        let mut sorter = IncrementalSorter::new();
        let a = NodeId(1);
        let b = NodeId(2);
        let c = NodeId(3);
        sorter.insert_operator(a, InsertLocation::Last);
        sorter.insert_operator(b, InsertLocation::Last);
        sorter.insert_operator(c, InsertLocation::First);
        assert_ordered(&sorter, c, a);
        assert_ordered(&sorter, a, b);
    }

    #[test]
    fn test_agreeing_edge_causes_no_swaps() {
        let mut sorter = IncrementalSorter::new();
        let a = NodeId(1);
        let b = NodeId(2);
        sorter.insert_operator(a, InsertLocation::Last);
        sorter.insert_operator(b, InsertLocation::Last);
        assert!(sorter.add_data_edge(a, b).is_empty());
        assert_ordered(&sorter, a, b);
    }

    #[test]
    fn test_violating_edge_repairs_locally() {
        // A → B built first, then C appended last and spliced between:
        // the repair must touch only B and C.
        let mut sorter = IncrementalSorter::new();
        let a = NodeId(1);
        let b = NodeId(2);
        let c = NodeId(3);
        sorter.insert_operator(a, InsertLocation::Last);
        sorter.insert_operator(b, InsertLocation::Last);
        sorter.insert_operator(c, InsertLocation::Last);
        assert!(sorter.add_data_edge(a, b).is_empty());
        assert!(sorter.add_data_edge(a, c).is_empty());

        let a_before = sorter.ordinal(a).unwrap();
        let swaps = sorter.add_data_edge(c, b);
        assert_eq!(swaps.len(), 2);
        assert!(swaps.iter().all(|s| s.operator != a));
        assert_eq!(sorter.ordinal(a).unwrap(), a_before);
        assert_ordered(&sorter, a, c);
        assert_ordered(&sorter, c, b);
    }

    #[test]
    fn test_swap_batch_is_consistent() {
        // Two disjoint chains 0→1→2 and 3→4→5, then a cross edge 4→1
        // that forces both chains to interleave.
        let mut sorter = IncrementalSorter::new();
        let ids: Vec<NodeId> = (0..6).map(NodeId).collect();
        for &id in &ids {
            sorter.insert_operator(id, InsertLocation::Last);
        }
        for pair in ids[..3].windows(2) {
            sorter.add_data_edge(pair[0], pair[1]);
        }
        for pair in ids[3..].windows(2) {
            sorter.add_data_edge(pair[0], pair[1]);
        }
        let swaps = sorter.add_data_edge(ids[4], ids[1]);
        assert!(!swaps.is_empty());
        let mut originals: Vec<i64> = swaps.iter().map(|s| s.original).collect();
        let mut news: Vec<i64> = swaps.iter().map(|s| s.new).collect();
        originals.sort_unstable();
        originals.dedup();
        news.sort_unstable();
        news.dedup();
        assert_eq!(originals.len(), swaps.len(), "original ordinals not unique");
        assert_eq!(news.len(), swaps.len(), "new ordinals not unique");
    }

    #[test]
    fn test_remove_edge_is_adjacency_only() {
        let mut sorter = IncrementalSorter::new();
        let a = NodeId(1);
        let b = NodeId(2);
        sorter.insert_operator(a, InsertLocation::Last);
        sorter.insert_operator(b, InsertLocation::Last);
        sorter.add_data_edge(a, b);
        let a_ord = sorter.ordinal(a).unwrap();
        let b_ord = sorter.ordinal(b).unwrap();
        sorter.remove_data_edge(a, b);
        assert_eq!(sorter.ordinal(a).unwrap(), a_ord);
        assert_eq!(sorter.ordinal(b).unwrap(), b_ord);
        // The reversed edge is now legal and re-sorts.
        let swaps = sorter.add_data_edge(b, a);
        assert!(!swaps.is_empty());
        assert_ordered(&sorter, b, a);
    }

    #[test]
    fn test_parallel_edges_tolerated() {
        let mut sorter = IncrementalSorter::new();
        let a = NodeId(1);
        let b = NodeId(2);
        sorter.insert_operator(a, InsertLocation::Last);
        sorter.insert_operator(b, InsertLocation::Last);
        sorter.add_data_edge(a, b);
        sorter.add_data_edge(a, b);
        // One removal leaves the second edge's constraint in force.
        sorter.remove_data_edge(a, b);
        assert_ordered(&sorter, a, b);
        sorter.remove_data_edge(a, b);
    }

    #[test]
    fn test_remove_operator_strips_adjacency() {
        let mut sorter = IncrementalSorter::new();
        let a = NodeId(1);
        let b = NodeId(2);
        let c = NodeId(3);
        for id in [a, b, c] {
            sorter.insert_operator(id, InsertLocation::Last);
        }
        sorter.add_data_edge(a, b);
        sorter.add_data_edge(b, c);
        sorter.remove_operator(b);
        assert!(!sorter.contains(b));
        // a → c is now unconstrained; the reverse edge re-sorts cleanly.
        let swaps = sorter.add_data_edge(c, a);
        assert!(!swaps.is_empty());
        assert_ordered(&sorter, c, a);
    }

    #[test]
    fn test_diamond_insert_between() {
        // a → d, then b and c spliced in parallel between them.
        let mut sorter = IncrementalSorter::new();
        let a = NodeId(1);
        let d = NodeId(2);
        let b = NodeId(3);
        let c = NodeId(4);
        sorter.insert_operator(a, InsertLocation::Last);
        sorter.insert_operator(d, InsertLocation::Last);
        sorter.add_data_edge(a, d);
        sorter.insert_operator(b, InsertLocation::Last);
        sorter.insert_operator(c, InsertLocation::Last);
        sorter.add_data_edge(a, b);
        sorter.add_data_edge(a, c);
        sorter.add_data_edge(b, d);
        sorter.add_data_edge(c, d);
        assert_ordered(&sorter, a, b);
        assert_ordered(&sorter, a, c);
        assert_ordered(&sorter, b, d);
        assert_ordered(&sorter, c, d);
    }
}
