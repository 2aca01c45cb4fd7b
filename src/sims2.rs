// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! The two-sided extension: a [`FelschGraph`] augmented with a per-node
//! witness word and a two-sided pair log, so the enumerated word graph is
//! compatible under left as well as right multiplication.

use std::sync::Arc;

use log::trace;

use crate::felsch_graph::{FelschGraph, FelschTree};
use crate::iterator_base::SearchState;
use crate::pending::PendingDef;
use crate::settings::Settings;
use crate::word::{Letter, Node, Word};

/// A [`FelschGraph`] paired with the bookkeeping needed to enforce
/// two-sidedness: `witness[n]` is a word `w` with `follow(0, w) == n`, and
/// `two_sided_log[i]` is the pair forced by the `i`th logged definition
/// (`None` when that definition allocated a new node — a fresh node has no
/// constraint to contribute, only a witness).
#[derive(Debug, Clone)]
pub struct Sims2Graph {
    graph: FelschGraph,
    witness: Vec<Word>,
    two_sided_log: Vec<Option<(Word, Word)>>,
}

impl Sims2Graph {
    pub fn new(graph: FelschGraph) -> Sims2Graph {
        let witness = vec![Vec::new(); graph.num_active_nodes() as usize];
        Sims2Graph {
            graph,
            witness,
            two_sided_log: Vec::new(),
        }
    }

    pub fn graph(&self) -> &FelschGraph {
        &self.graph
    }

    pub fn num_active_nodes(&self) -> Node {
        self.graph.num_active_nodes()
    }

    pub fn definition_log_len(&self) -> usize {
        self.graph.definition_log_len()
    }

    pub fn witness(&self, node: Node) -> &Word {
        &self.witness[node as usize]
    }

    pub fn num_letters(&self) -> u32 {
        self.graph.num_letters()
    }

    pub fn first_undefined(&self) -> Option<(Node, Letter)> {
        self.graph.first_undefined()
    }

    /// Registers `edges[source][letter] := target` and records the witness
    /// (if `target` is a fresh node) or the two-sided pair it forces (if
    /// `target` reuses an existing node), as described in the distilled
    /// spec's two-sided extension.
    pub fn register(&mut self, source: Node, letter: Letter, target: Node, target_is_new_node: bool) {
        if target_is_new_node {
            debug_assert_eq!(target, self.graph.num_active_nodes());
            let mut w = self.witness[source as usize].clone();
            w.push(letter);
            self.graph.add_node();
            self.witness.push(w);
            self.two_sided_log.push(None);
        } else {
            let mut u = self.witness[source as usize].clone();
            u.push(letter);
            let v = self.witness[target as usize].clone();
            self.two_sided_log.push(Some((u, v)));
        }
        self.graph.register_target(source, letter, target);
    }

    pub fn reduce_to(&mut self, k: usize) {
        self.graph.reduce_to(k);
        self.two_sided_log.truncate(k);
    }

    pub fn truncate_nodes(&mut self, n: Node) {
        self.graph.truncate_nodes(n);
        self.witness.truncate(n as usize);
    }

    /// Replays every definition logged since the last sync into the
    /// two-sided pair log. Definitions registered directly by
    /// [`FelschGraph::process_definitions`] or
    /// [`FelschGraph::make_compatible`] (rather than through
    /// [`Sims2Graph::register`]) never allocate a new node, so both
    /// endpoints already have a witness by the time this runs.
    fn sync_two_sided_log(&mut self) {
        while self.two_sided_log.len() < self.graph.definition_log_len() {
            let i = self.two_sided_log.len();
            let (s, a) = self.graph.log_entry(i);
            let t = self
                .graph
                .target(s, a)
                .expect("just-logged definition must be defined");
            let mut u = self.witness[s as usize].clone();
            u.push(a);
            let v = self.witness[t as usize].clone();
            self.two_sided_log.push(Some((u, v)));
        }
    }

    /// Checks (and, where forced, registers) `pairs` at every active node,
    /// keeping the witness/two-sided bookkeeping in sync with any
    /// registration it makes. Used for the one-shot long-rule check at a
    /// leaf candidate, which — unlike `propagate` — never loops to a
    /// fixpoint.
    pub fn check_long_rules(&mut self, pairs: &[(Word, Word)]) -> bool {
        let ok = self
            .graph
            .make_compatible(0, self.graph.num_active_nodes(), pairs);
        self.sync_two_sided_log();
        ok
    }

    fn two_sided_pairs(&self) -> Vec<(Word, Word)> {
        self.two_sided_log.iter().flatten().cloned().collect()
    }

    /// The two-sided analogue of [`propagate_to_fixpoint`](crate::propagate::propagate_to_fixpoint):
    /// alternates short-rule propagation, `include`-pair propagation, and a
    /// pass over the two-sided pair log closing it under left
    /// multiplication, until none of the three registers a new definition.
    /// Returns `false` on the first conflict.
    pub fn propagate(&mut self, start: usize, include: &[(Word, Word)]) -> bool {
        let mut cursor = start;
        loop {
            if !self.graph.process_definitions(cursor) {
                return false;
            }
            self.sync_two_sided_log();
            cursor = self.graph.definition_log_len();

            let before = cursor;
            if !self
                .graph
                .make_compatible(0, self.graph.num_active_nodes(), include)
            {
                return false;
            }
            self.sync_two_sided_log();

            let two_sided = self.two_sided_pairs();
            if !self
                .graph
                .make_compatible(0, self.graph.num_active_nodes(), &two_sided)
            {
                return false;
            }
            self.sync_two_sided_log();

            if self.graph.definition_log_len() == before {
                break;
            }
        }
        true
    }
}

fn seed(settings: &Settings, felsch_tree: Arc<FelschTree>, max_classes: Node) -> (Sims2Graph, Node) {
    let num_letters = settings.presentation().num_letters();
    let initial_nodes = if max_classes == 0 { 0 } else { 1 };
    (
        Sims2Graph::new(FelschGraph::new(num_letters, initial_nodes, felsch_tree)),
        initial_nodes,
    )
}

/// The two-sided analogue of [`IteratorBase`](crate::iterator_base::IteratorBase):
/// the same seed/advance/push-descendants engine, over a [`Sims2Graph`]
/// instead of a bare [`FelschGraph`], so every yielded candidate is already
/// closed under left multiplication as well as right.
pub struct TwoSidedIteratorState {
    graph: Sims2Graph,
    pending: Vec<PendingDef>,
    settings: Arc<Settings>,
    max_classes: Node,
    min_target: Node,
}

impl TwoSidedIteratorState {
    pub fn new(settings: Arc<Settings>, felsch_tree: Arc<FelschTree>, max_classes: Node) -> TwoSidedIteratorState {
        let (graph, num_active_nodes) = seed(&settings, felsch_tree, max_classes);
        let mut it = TwoSidedIteratorState {
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
    /// active nodes and an empty pending stack; see
    /// [`IteratorBase::idle`](crate::iterator_base::IteratorBase::idle) for
    /// why the bound must still be real rather than zero.
    pub fn idle(settings: Arc<Settings>, felsch_tree: Arc<FelschTree>, max_classes: Node) -> TwoSidedIteratorState {
        let num_letters = settings.presentation().num_letters();
        TwoSidedIteratorState {
            graph: Sims2Graph::new(FelschGraph::new(num_letters, 0, felsch_tree)),
            pending: Vec::new(),
            settings,
            max_classes,
            min_target: 0,
        }
    }

    pub fn sims2_graph(&self) -> &Sims2Graph {
        &self.graph
    }

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

    fn try_step(&mut self) -> Option<bool> {
        let current = self.pending.pop()?;
        self.graph.reduce_to(current.num_edges_before);
        self.graph.truncate_nodes(current.num_nodes_before);
        self.graph.register(
            current.source,
            current.letter,
            current.target,
            current.target_is_new_node,
        );

        let include = self.settings.include_pairs();
        if !self.graph.propagate(current.num_edges_before, include) {
            trace!("two-sided propagation conflict at ({}, {})", current.source, current.letter);
            return Some(false);
        }
        if !self.settings.pruners().all_valid(self.graph.graph()) {
            trace!("pruner rejected two-sided candidate");
            return Some(false);
        }
        if self.graph.first_undefined().is_some() {
            self.install_descendants();
            return Some(false);
        }
        let long_rules = self.long_rule_pairs();
        if self.graph.check_long_rules(&long_rules) {
            return Some(true);
        }
        trace!("long rule conflict at a two-sided leaf candidate");
        Some(false)
    }
}

impl SearchState for TwoSidedIteratorState {
    type Snapshot = Sims2Graph;

    fn new(settings: Arc<Settings>, felsch_tree: Arc<FelschTree>, max_classes: Node) -> TwoSidedIteratorState {
        TwoSidedIteratorState::new(settings, felsch_tree, max_classes)
    }

    fn idle(settings: Arc<Settings>, felsch_tree: Arc<FelschTree>, max_classes: Node) -> TwoSidedIteratorState {
        TwoSidedIteratorState::idle(settings, felsch_tree, max_classes)
    }

    fn try_step(&mut self) -> Option<bool> {
        TwoSidedIteratorState::try_step(self)
    }

    fn graph(&self) -> &FelschGraph {
        self.graph.graph()
    }

    fn snapshot(&self) -> Sims2Graph {
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

    fn adopt(&mut self, snapshot: Sims2Graph, pending: Vec<PendingDef>) {
        self.graph = snapshot;
        self.pending = pending;
    }
}
