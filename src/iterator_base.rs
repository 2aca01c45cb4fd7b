// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! The single-threaded depth-first search engine: a Felsch graph plus a
//! stack of suspended [`PendingDef`]s.

use std::sync::Arc;

use log::trace;

use crate::felsch_graph::{FelschGraph, FelschTree};
use crate::pending::PendingDef;
use crate::propagate::propagate_to_fixpoint;
use crate::settings::Settings;
use crate::word::{Node, Word};

fn seed(settings: &Settings, felsch_tree: Arc<FelschTree>, max_classes: Node) -> (FelschGraph, Node) {
    let num_letters = settings.presentation().num_letters();
    if max_classes == 0 {
        (FelschGraph::new(num_letters, 0, felsch_tree), 0)
    } else {
        (FelschGraph::new(num_letters, 1, felsch_tree), 1)
    }
}

/// Depth-first enumerator of one-sided (right-congruence) word graphs for a
/// presentation, bounded by `max_classes` active nodes. Behaves as a forward
/// iterator: each call to `next` searches for, and if found yields, the next
/// complete word graph satisfying every included pair, every pruner, and
/// every relation of the presentation.
pub struct IteratorBase {
    graph: FelschGraph,
    pending: Vec<PendingDef>,
    settings: Arc<Settings>,
    max_classes: Node,
    min_target: Node,
}

impl IteratorBase {
    /// Builds the initial search state for `settings` bounded by
    /// `max_classes` active nodes. A fresh graph has one active node (the
    /// root) and an undefined edge `(0, 0)`; the constructor runs one round
    /// of [`install_descendants`](Self::install_descendants) over it so the
    /// very first step of the search — reuse the root as its own target, or
    /// grow a new node — is governed by the same rule as every later step,
    /// rather than a special case. `max_classes == 0` yields an
    /// already-exhausted iterator with no active nodes at all.
    pub fn new(settings: Arc<Settings>, felsch_tree: Arc<FelschTree>, max_classes: Node) -> IteratorBase {
        let (graph, num_active_nodes) = seed(&settings, felsch_tree, max_classes);
        let mut it = IteratorBase {
            graph,
            pending: Vec::new(),
            settings,
            max_classes,
            min_target: 0,
        };
        if num_active_nodes > 0 {
            it.install_descendants();
        }
        it
    }

    /// Builds a worker's starting state bound by `max_classes` but with no
    /// active nodes and an empty pending stack: used for every worker but
    /// the first, each of which starts with nothing of its own and can only
    /// acquire real work by stealing. Carries the same `max_classes` bound
    /// as a seeded worker so that once it adopts stolen work, its own later
    /// calls to `install_descendants` push the new-node alternative
    /// correctly instead of treating the budget as exhausted.
    pub fn idle(settings: Arc<Settings>, felsch_tree: Arc<FelschTree>, max_classes: Node) -> IteratorBase {
        let num_letters = settings.presentation().num_letters();
        IteratorBase {
            graph: FelschGraph::new(num_letters, 0, felsch_tree),
            pending: Vec::new(),
            settings,
            max_classes,
            min_target: 0,
        }
    }

    /// Constructs an iterator state that continues a search from an
    /// explicit graph and pending stack, used by the work-stealing
    /// scheduler to hand a stolen half of a stack to a new worker.
    pub fn from_parts(
        graph: FelschGraph,
        pending: Vec<PendingDef>,
        settings: Arc<Settings>,
        max_classes: Node,
        min_target: Node,
    ) -> IteratorBase {
        IteratorBase {
            graph,
            pending,
            settings,
            max_classes,
            min_target,
        }
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn max_classes(&self) -> Node {
        self.max_classes
    }

    pub fn min_target(&self) -> Node {
        self.min_target
    }

    pub fn graph(&self) -> &FelschGraph {
        &self.graph
    }

    pub fn pending(&self) -> &[PendingDef] {
        &self.pending
    }

    pub fn pending_mut(&mut self) -> &mut Vec<PendingDef> {
        &mut self.pending
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }

    /// Finds the smallest active node and smallest letter with an undefined
    /// edge, and pushes every feasible `PendingDef` for it: the new-node
    /// alternative (if under budget) first, so it is tried last, then the
    /// existing targets in decreasing order, so they are tried in
    /// increasing order (smallest target first).
    fn install_descendants(&mut self) {
        let (n, a) = self
            .graph
            .first_undefined()
            .expect("install_descendants called on a complete graph");
        let edges_before = self.graph.definition_log_len();
        let nodes_before = self.graph.num_active_nodes();
        if nodes_before < self.max_classes {
            self.pending
                .push(PendingDef::new(n, a, nodes_before, edges_before, nodes_before, true));
        }
        if nodes_before > self.min_target {
            for t in (self.min_target..nodes_before).rev() {
                self.pending
                    .push(PendingDef::new(n, a, t, edges_before, nodes_before, false));
            }
        }
    }

    fn long_rule_pairs(&self) -> Vec<(Word, Word)> {
        self.settings
            .presentation()
            .long_rules()
            .iter()
            .map(|r| (r.lhs.clone(), r.rhs.clone()))
            .collect()
    }

    /// Pops and attempts exactly one `PendingDef`. `None` if the stack was
    /// already empty; `Some(true)` if this attempt completed a valid
    /// candidate graph (held in `self.graph`); `Some(false)` if it failed
    /// (propagation conflict, pruner rejection, long-rule conflict) or
    /// merely grew the frontier (`install_descendants` pushed more work) —
    /// either way the caller should try again.
    fn try_step(&mut self) -> Option<bool> {
        let current = self.pending.pop()?;
        self.graph.reduce_to(current.num_edges_before);
        self.graph.truncate_nodes(current.num_nodes_before);
        if current.target_is_new_node {
            let new_id = self.graph.add_node();
            debug_assert_eq!(new_id, current.target);
        }
        self.graph
            .register_target(current.source, current.letter, current.target);

        let include = self.settings.include_pairs();
        if !propagate_to_fixpoint(&mut self.graph, current.num_edges_before, &[include]) {
            trace!("propagation conflict at ({}, {})", current.source, current.letter);
            return Some(false);
        }
        if !self.settings.pruners().all_valid(&self.graph) {
            trace!("pruner rejected candidate");
            return Some(false);
        }
        if self.graph.first_undefined().is_some() {
            self.install_descendants();
            return Some(false);
        }
        let long_rules = self.long_rule_pairs();
        if self
            .graph
            .make_compatible(0, self.graph.num_active_nodes(), &long_rules)
        {
            return Some(true);
        }
        trace!("long rule conflict at a leaf candidate");
        Some(false)
    }

    /// Repeatedly calls [`try_step`](Self::try_step) until either a complete,
    /// valid candidate graph is found (returns `true`, with `self.graph`
    /// holding it) or the stack is exhausted (returns `false`). Used by the
    /// single-threaded `Iterator` implementation; the work-stealing
    /// scheduler instead calls `try_step` once per lock acquisition.
    pub fn advance(&mut self) -> bool {
        loop {
            match self.try_step() {
                None => return false,
                Some(true) => return true,
                Some(false) => continue,
            }
        }
    }
}

/// The operations the work-stealing scheduler needs from a one-sided or
/// two-sided search state, without caring which. `Snapshot` is whatever a
/// state needs cloned from a victim at the point of a steal to keep
/// advancing correctly — a bare `FelschGraph` for the one-sided engine, the
/// richer `Sims2Graph` (graph plus witness words and two-sided pair log) for
/// the two-sided one.
pub trait SearchState: Send {
    type Snapshot: Clone + Send;

    /// Builds the seeded initial state for worker 0: one active node and
    /// the first round of `install_descendants` already run against the
    /// real `max_classes` bound.
    fn new(settings: Arc<Settings>, felsch_tree: Arc<FelschTree>, max_classes: Node) -> Self;

    /// Builds the starting state for every worker but the first: zero
    /// active nodes and an empty pending stack, but still carrying the real
    /// `max_classes` bound, so that work adopted later via a steal is
    /// installed against the correct budget rather than a permanent zero.
    fn idle(settings: Arc<Settings>, felsch_tree: Arc<FelschTree>, max_classes: Node) -> Self;

    fn try_step(&mut self) -> Option<bool>;
    fn graph(&self) -> &FelschGraph;
    fn snapshot(&self) -> Self::Snapshot;
    fn pending_len(&self) -> usize;
    /// Removes and returns the odd-indexed half of the pending stack (the
    /// "unzipped halves" steal strategy), leaving the even-indexed entries
    /// as the victim's contiguous remaining spine.
    fn split_off_half(&mut self) -> Vec<PendingDef>;
    /// Installs a stolen half-stack and the victim's snapshot, cloned at the
    /// point of the split, as this (previously empty) state's own work.
    fn adopt(&mut self, snapshot: Self::Snapshot, pending: Vec<PendingDef>);
}

impl SearchState for IteratorBase {
    type Snapshot = FelschGraph;

    fn new(settings: Arc<Settings>, felsch_tree: Arc<FelschTree>, max_classes: Node) -> IteratorBase {
        IteratorBase::new(settings, felsch_tree, max_classes)
    }

    fn idle(settings: Arc<Settings>, felsch_tree: Arc<FelschTree>, max_classes: Node) -> IteratorBase {
        IteratorBase::idle(settings, felsch_tree, max_classes)
    }

    fn try_step(&mut self) -> Option<bool> {
        IteratorBase::try_step(self)
    }

    fn graph(&self) -> &FelschGraph {
        &self.graph
    }

    fn snapshot(&self) -> FelschGraph {
        self.graph.clone()
    }

    fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn split_off_half(&mut self) -> Vec<PendingDef> {
        let mut stolen = Vec::new();
        let mut i = 0;
        self.pending.retain(|def| {
            let mine = i % 2 == 0;
            if !mine {
                stolen.push(*def);
            }
            i += 1;
            mine
        });
        stolen
    }

    fn adopt(&mut self, graph: FelschGraph, pending: Vec<PendingDef>) {
        self.graph = graph;
        self.pending = pending;
    }
}

impl Iterator for IteratorBase {
    type Item = FelschGraph;

    fn next(&mut self) -> Option<FelschGraph> {
        if self.advance() {
            Some(self.graph.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::Presentation;

    fn make_iterator(num_letters: u32, rules: Vec<(Word, Word)>, max_classes: Node) -> IteratorBase {
        let presentation = Presentation::new(num_letters, rules).unwrap();
        let settings = Arc::new(Settings::new(presentation));
        let tree = Arc::new(FelschTree::new(settings.presentation()));
        IteratorBase::new(settings, tree, max_classes)
    }

    #[test]
    fn max_classes_zero_is_immediately_exhausted() {
        let mut it = make_iterator(1, vec![], 0);
        assert!(it.next().is_none());
    }

    #[test]
    fn scenario_a_squared_eq_a_yields_two_graphs() {
        // ⟨a | a^2 = a⟩, max_classes = 2: trivial graph and the two-class
        // quotient with (0,a)=1, (1,a)=1 (distilled spec §8 scenario 4).
        let mut it = make_iterator(1, vec![(vec![0, 0], vec![0])], 2);
        let first = it.next().expect("first graph");
        assert_eq!(first.num_active_nodes(), 1);
        assert_eq!(first.target(0, 0), Some(0));

        let second = it.next().expect("second graph");
        assert_eq!(second.num_active_nodes(), 2);
        assert_eq!(second.target(0, 0), Some(1));
        assert_eq!(second.target(1, 0), Some(1));

        assert!(it.next().is_none());
    }

    #[test]
    fn scenario_a4_eq_a_with_empty_word_yields_three_graphs() {
        // ⟨a | a^4 = a⟩ with the empty word included (so reusing node 0 at
        // the seed is on the table), max_classes = 3 (distilled spec §8
        // scenario 3): trivial, two-class, and three-class faithful
        // quotient.
        let mut it = make_iterator(1, vec![(vec![0, 0, 0, 0], vec![0]), (vec![], vec![])], 3);
        let mut counts = Vec::new();
        while let Some(g) = it.next() {
            counts.push(g.num_active_nodes());
        }
        assert_eq!(counts, vec![1, 2, 3]);
    }
}
