// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! Reconstructs a minimal set of generating pairs for a complete word graph
//! produced by the search: the relations that, added to a bare spanning
//! tree, force every non-tree edge back into place.

use std::sync::Arc;

use crate::felsch_graph::{FelschGraph, FelschTree};
use crate::presentation::Presentation;
use crate::sims2::Sims2Graph;
use crate::spanning::{is_tree_edge, tree_paths};
use crate::word::{Node, Word};

fn tree_word(paths: &[Option<Word>], node: Node) -> Word {
    paths[node as usize]
        .clone()
        .expect("every active node of a complete graph is reachable from node 0")
}

/// Reconstructs the right-congruence generating pairs of `graph`: a
/// spanning tree rooted at node 0 names every node by the shortlex word
/// that first reaches it; walking every `(node, letter)` in node-major,
/// letter-major order, each edge off the tree contributes the pair
/// `(tree_word(node) + letter, tree_word(target))` unless `presentation`'s
/// short rules, applied to the tree plus the pairs emitted so far, already
/// force that edge — in which case it is redundant and skipped.
pub fn right_generating_pairs(graph: &FelschGraph, presentation: &Presentation) -> Vec<(Word, Word)> {
    let paths = tree_paths(graph);
    let felsch_tree = Arc::new(FelschTree::new(presentation));
    let mut reconstructed = FelschGraph::new(graph.num_letters(), graph.num_active_nodes(), felsch_tree);

    for node in 0..graph.num_active_nodes() {
        for letter in 0..graph.num_letters() {
            if let Some(target) = graph.target(node, letter) {
                if is_tree_edge(&paths, node, letter, target) {
                    reconstructed.register_target(node, letter, target);
                }
            }
        }
    }
    assert!(
        reconstructed.process_definitions(0),
        "the presentation's own rules must already hold on a valid complete graph"
    );

    let mut pairs = Vec::new();
    for node in 0..graph.num_active_nodes() {
        for letter in 0..graph.num_letters() {
            let target = graph.target(node, letter).expect("complete graph");
            if is_tree_edge(&paths, node, letter, target) {
                continue;
            }
            if reconstructed.target(node, letter) == Some(target) {
                continue;
            }
            let mut u = tree_word(&paths, node);
            u.push(letter);
            let v = tree_word(&paths, target);
            pairs.push((u, v));

            let start = reconstructed.definition_log_len();
            reconstructed.register_target(node, letter, target);
            assert!(
                reconstructed.process_definitions(start),
                "forcing a genuine generating pair must not conflict with the presentation's rules"
            );
        }
    }
    pairs
}

/// The two-sided analogue of [`right_generating_pairs`]: the same
/// tree/non-tree walk, but redundancy is checked (and each accepted pair is
/// propagated) through [`Sims2Graph::propagate`], so a pair implied by left
/// multiplication as well as the presentation's rules is skipped too.
pub fn two_sided_generating_pairs(graph: &FelschGraph, presentation: &Presentation) -> Vec<(Word, Word)> {
    let paths = tree_paths(graph);
    let felsch_tree = Arc::new(FelschTree::new(presentation));
    let mut reconstructed = Sims2Graph::new(FelschGraph::new(graph.num_letters(), 1, felsch_tree));

    // A node can only ever enter a search graph through the tree edge that
    // first discovers it, and only after its source already exists — so a
    // tree edge's source id is always smaller than its target's. Walking
    // targets in increasing id order therefore always has the source
    // already registered.
    for node in 1..graph.num_active_nodes() {
        let (parent, letter) = (0..node)
            .flat_map(|p| (0..graph.num_letters()).map(move |a| (p, a)))
            .find(|&(p, a)| graph.target(p, a) == Some(node) && is_tree_edge(&paths, p, a, node))
            .expect("tree_paths names every reachable node via exactly one tree edge");
        reconstructed.register(parent, letter, node, true);
    }
    assert!(
        reconstructed.propagate(0, &[]),
        "the presentation's own rules must already hold on a valid complete graph"
    );

    let mut pairs = Vec::new();
    for node in 0..graph.num_active_nodes() {
        for letter in 0..graph.num_letters() {
            let target = graph.target(node, letter).expect("complete graph");
            if is_tree_edge(&paths, node, letter, target) {
                continue;
            }
            if reconstructed.graph().target(node, letter) == Some(target) {
                continue;
            }
            let mut u = tree_word(&paths, node);
            u.push(letter);
            let v = tree_word(&paths, target);
            pairs.push((u, v));

            let start = reconstructed.definition_log_len();
            reconstructed.register(node, letter, target, false);
            assert!(
                reconstructed.propagate(start, &[]),
                "forcing a genuine two-sided generating pair must not conflict with the presentation's rules"
            );
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::felsch_graph::FelschTree;

    #[test]
    fn trivial_graph_has_no_generating_pairs() {
        let p = Presentation::new(1, vec![(vec![0, 0], vec![0])]).unwrap();
        let tree = Arc::new(FelschTree::new(&p));
        let mut g = FelschGraph::new(1, 1, tree);
        g.register_target(0, 0, 0);
        assert!(right_generating_pairs(&g, &p).is_empty());
    }

    #[test]
    fn two_class_quotient_has_one_generating_pair() {
        // ⟨a | a^2 = a⟩, the 2-class quotient (0,a)=1, (1,a)=1: the spanning
        // tree is the single edge (0,a)->1, and (1,a)->1 is the one
        // non-tree edge. Since a^2=a forces follow(0,"aa")==follow(0,"a"),
        // i.e. follow(1,"a")==1, this is already implied and the pair list
        // is empty.
        let p = Presentation::new(1, vec![(vec![0, 0], vec![0])]).unwrap();
        let tree = Arc::new(FelschTree::new(&p));
        let mut g = FelschGraph::new(1, 2, tree);
        g.register_target(0, 0, 1);
        g.register_target(1, 0, 1);
        assert!(right_generating_pairs(&g, &p).is_empty());
    }

    #[test]
    fn free_monoid_quotient_needs_an_explicit_generating_pair() {
        // No relations at all: the 2-class graph (0,a)=1, (1,a)=1 is not
        // forced by anything, so its one non-tree edge must be reported.
        let p = Presentation::new(1, vec![]).unwrap();
        let tree = Arc::new(FelschTree::new(&p));
        let mut g = FelschGraph::new(1, 2, tree);
        g.register_target(0, 0, 1);
        g.register_target(1, 0, 1);
        let pairs = right_generating_pairs(&g, &p);
        assert_eq!(pairs, vec![(vec![0, 0], vec![0])]);
    }
}
