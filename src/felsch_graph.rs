// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! The partial deterministic edge-labelled graph under construction, and the
//! definition-propagation (Felsch) engine that deduces forced edges from it.

use std::sync::Arc;

use crate::presentation::{Presentation, Relation};
use crate::word::{Letter, Node, Word};

/// An index over the short rules of a presentation, letting
/// [`FelschGraph::process_definitions`] restrict its rule re-checks to only
/// those rules that mention the letter of a freshly logged definition.
///
/// The original algorithm builds a single Aho–Corasick automaton over the
/// left- and right-hand sides of the short rules; here the same role is
/// played by a per-letter rule index, which is cheaper to build and, because
/// `num_active_nodes` stays small for the nodes bounds this crate targets,
/// just as effective in practice. It is built once per run and never
/// mutated, matching the "one owner, immutable for the search" design in
/// the distilled spec's design notes.
#[derive(Debug)]
pub struct FelschTree {
    rules: Vec<Relation>,
    by_letter: Vec<Vec<usize>>,
}

impl FelschTree {
    pub fn new(presentation: &Presentation) -> FelschTree {
        let rules = presentation.short_rules().to_vec();
        let mut by_letter = vec![Vec::new(); presentation.num_letters() as usize];
        for (idx, rule) in rules.iter().enumerate() {
            let mut seen = vec![false; by_letter.len()];
            for &letter in rule.lhs.iter().chain(rule.rhs.iter()) {
                let slot = &mut seen[letter as usize];
                if !*slot {
                    *slot = true;
                    by_letter[letter as usize].push(idx);
                }
            }
        }
        FelschTree { rules, by_letter }
    }

    fn rules_touching(&self, letter: Letter) -> &[usize] {
        &self.by_letter[letter as usize]
    }
}

/// The result of following a word from a node as far as the currently
/// defined edges permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Follow {
    /// Every letter of the word was defined; the walk ends at this node.
    Complete(Node),
    /// The walk is defined up to (but not including) position `1`, where
    /// `edges[0][word[1]]` is undefined.
    Gap(Node, usize),
}

/// Outcome of checking a single rule/pair at a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleOutcome {
    /// Nothing forced yet, or the rule was already satisfied.
    Ok,
    /// A previously undefined edge was registered.
    Registered,
    /// Both sides were fully defined and disagreed.
    Conflict,
}

/// The partial word graph under construction during a low-index search.
///
/// `edges[node][letter]` is the transition table. Definitions are appended
/// to `definition_log` in the order they are made, which is the only
/// information needed to roll back to any earlier state via
/// [`FelschGraph::reduce_to`] and [`FelschGraph::truncate_nodes`].
#[derive(Debug, Clone)]
pub struct FelschGraph {
    num_letters: u32,
    edges: Vec<Vec<Option<Node>>>,
    num_active_nodes: Node,
    definition_log: Vec<(Node, Letter)>,
    felsch_tree: Arc<FelschTree>,
}

impl FelschGraph {
    /// Creates a graph with `initial_nodes` active nodes and no edges
    /// defined, sharing `felsch_tree` with every other graph in the search.
    pub fn new(num_letters: u32, initial_nodes: Node, felsch_tree: Arc<FelschTree>) -> FelschGraph {
        FelschGraph {
            num_letters,
            edges: vec![vec![None; num_letters as usize]; initial_nodes as usize],
            num_active_nodes: initial_nodes,
            definition_log: Vec::new(),
            felsch_tree,
        }
    }

    pub fn num_active_nodes(&self) -> Node {
        self.num_active_nodes
    }

    pub fn num_letters(&self) -> u32 {
        self.num_letters
    }

    pub fn definition_log_len(&self) -> usize {
        self.definition_log.len()
    }

    pub fn target(&self, source: Node, letter: Letter) -> Option<Node> {
        self.edges[source as usize][letter as usize]
    }

    /// The `(source, letter)` of the `i`th logged definition, for callers
    /// (the two-sided extension) that need to replay definitions registered
    /// since a given point rather than just know how many there were.
    pub fn log_entry(&self, i: usize) -> (Node, Letter) {
        self.definition_log[i]
    }

    /// `true` iff every active node has every out-edge defined.
    pub fn is_complete(&self) -> bool {
        self.edges[..self.num_active_nodes as usize]
            .iter()
            .all(|row| row.iter().all(|e| e.is_some()))
    }

    /// Returns the first `(node, letter)` with an undefined edge, in
    /// node-major, letter-major order.
    pub fn first_undefined(&self) -> Option<(Node, Letter)> {
        for node in 0..self.num_active_nodes {
            for letter in 0..self.num_letters {
                if self.edges[node as usize][letter as usize].is_none() {
                    return Some((node, letter));
                }
            }
        }
        None
    }

    /// Allocates a new active node and returns its id.
    pub fn add_node(&mut self) -> Node {
        let id = self.num_active_nodes;
        self.edges.push(vec![None; self.num_letters as usize]);
        self.num_active_nodes += 1;
        id
    }

    /// Defines `edges[source][letter] := target`. The caller must ensure the
    /// edge is currently undefined and that `target` is an active node;
    /// these are internal invariants, not recoverable errors.
    pub fn register_target(&mut self, source: Node, letter: Letter, target: Node) {
        debug_assert!(
            self.edges[source as usize][letter as usize].is_none(),
            "attempted to redefine edges[{source}][{letter}]"
        );
        debug_assert!(
            target < self.num_active_nodes,
            "target {target} is not an active node"
        );
        self.edges[source as usize][letter as usize] = Some(target);
        self.definition_log.push((source, letter));
    }

    /// Undoes every definition at index `>= k`, truncating the log to
    /// length `k`.
    pub fn reduce_to(&mut self, k: usize) {
        while self.definition_log.len() > k {
            let (s, a) = self.definition_log.pop().expect("log just checked non-empty");
            self.edges[s as usize][a as usize] = None;
        }
    }

    /// Shrinks the active node count back to `n`, discarding the rows for
    /// every node `>= n`. Must be called with `reduce_to` so that no
    /// dangling edge (logged after the nodes it touches were allocated)
    /// survives the rollback.
    pub fn truncate_nodes(&mut self, n: Node) {
        self.edges.truncate(n as usize);
        self.num_active_nodes = n;
    }

    fn follow_from(&self, n: Node, word: &[Letter]) -> Follow {
        let mut cur = n;
        for (i, &a) in word.iter().enumerate() {
            match self.edges[cur as usize][a as usize] {
                Some(t) => cur = t,
                None => return Follow::Gap(cur, i),
            }
        }
        Follow::Complete(cur)
    }

    fn check_rule_at(&mut self, n: Node, lhs: &[Letter], rhs: &[Letter]) -> RuleOutcome {
        match (self.follow_from(n, lhs), self.follow_from(n, rhs)) {
            (Follow::Complete(a), Follow::Complete(b)) => {
                if a == b {
                    RuleOutcome::Ok
                } else {
                    RuleOutcome::Conflict
                }
            }
            (Follow::Complete(a), Follow::Gap(p, pos)) if pos + 1 == rhs.len() => {
                self.register_target(p, rhs[pos], a);
                RuleOutcome::Registered
            }
            (Follow::Gap(p, pos), Follow::Complete(b)) if pos + 1 == lhs.len() => {
                self.register_target(p, lhs[pos], b);
                RuleOutcome::Registered
            }
            _ => RuleOutcome::Ok,
        }
    }

    /// Consumes every definition logged from index `start` onward, deducing
    /// and registering every edge forced by a short rule, to fixpoint
    /// (definitions registered along the way are themselves consumed).
    /// Returns `false` on the first conflict found.
    pub fn process_definitions(&mut self, start: usize) -> bool {
        let mut cursor = start;
        while cursor < self.definition_log.len() {
            let (_, letter) = self.definition_log[cursor];
            cursor += 1;
            let rule_indices = self.felsch_tree.rules_touching(letter).to_vec();
            for rule_idx in rule_indices {
                let (lhs, rhs) = {
                    let rule = &self.felsch_tree.rules[rule_idx];
                    (rule.lhs.clone(), rule.rhs.clone())
                };
                for n in 0..self.num_active_nodes {
                    match self.check_rule_at(n, &lhs, &rhs) {
                        RuleOutcome::Conflict => return false,
                        RuleOutcome::Ok | RuleOutcome::Registered => {}
                    }
                }
            }
        }
        true
    }

    /// Checks (and, where forced, registers) every pair in `pairs` at every
    /// node in `[first_node, last_node)`. Returns `false` on the first
    /// conflict found.
    pub fn make_compatible(
        &mut self,
        first_node: Node,
        last_node: Node,
        pairs: &[(Word, Word)],
    ) -> bool {
        for n in first_node..last_node {
            for (u, v) in pairs {
                match self.check_rule_at(n, u, v) {
                    RuleOutcome::Conflict => return false,
                    RuleOutcome::Ok | RuleOutcome::Registered => {}
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presentation_a_squared_eq_a() -> Presentation {
        Presentation::new(1, vec![(vec![0, 0], vec![0])]).unwrap()
    }

    #[test]
    fn register_and_reduce_round_trips() {
        let tree = Arc::new(FelschTree::new(&presentation_a_squared_eq_a()));
        let mut g = FelschGraph::new(1, 1, tree);
        g.add_node();
        g.register_target(0, 0, 1);
        assert_eq!(g.target(0, 0), Some(1));
        let mark = g.definition_log_len();
        g.register_target(1, 0, 1);
        assert_eq!(g.target(1, 0), Some(1));
        g.reduce_to(mark);
        assert_eq!(g.target(1, 0), None);
        assert_eq!(g.target(0, 0), Some(1));
    }

    #[test]
    fn process_definitions_forces_idempotent_loop() {
        // a^2 = a at node 0: define (0,a)->1 then process_definitions should
        // force (1,a)->1 since follow(0,aa) and follow(0,a) must agree.
        let tree = Arc::new(FelschTree::new(&presentation_a_squared_eq_a()));
        let mut g = FelschGraph::new(1, 2, tree);
        g.register_target(0, 0, 1);
        assert!(g.process_definitions(0));
        assert_eq!(g.target(1, 0), Some(1));
    }

    #[test]
    fn process_definitions_detects_conflict() {
        let tree = Arc::new(FelschTree::new(&presentation_a_squared_eq_a()));
        let mut g = FelschGraph::new(1, 3, tree);
        g.register_target(0, 0, 1);
        g.register_target(1, 0, 2);
        // follow(0, "aa") = 2 but follow(0, "a") = 1: conflict.
        assert!(!g.process_definitions(0));
    }

    #[test]
    fn make_compatible_enforces_include_pairs() {
        let tree = Arc::new(FelschTree::new(&Presentation::new(1, vec![]).unwrap()));
        let mut g = FelschGraph::new(1, 2, tree);
        g.register_target(0, 0, 1);
        assert!(!g.make_compatible(0, 1, &[(vec![0], vec![])]));
    }
}
