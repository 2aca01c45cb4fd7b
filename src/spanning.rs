// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! Spanning-tree utilities shared by the ideal-shape pruner and the
//! generating-pairs iterator: every active node is named by the shortlex
//! path taken to first reach it from node 0, node-major/letter-major.

use crate::felsch_graph::FelschGraph;
use crate::word::{Letter, Node, Word};

/// For every active node of `graph`, the word read from node 0 along the
/// first-discovered (breadth-first, letter-major) path reaching it. `None`
/// for a node not yet reachable through currently-defined edges (node 0
/// itself is always `Some(vec![])`).
pub fn tree_paths(graph: &FelschGraph) -> Vec<Option<Word>> {
    let n = graph.num_active_nodes() as usize;
    let mut paths: Vec<Option<Word>> = vec![None; n];
    if n == 0 {
        return paths;
    }
    paths[0] = Some(Vec::new());
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(0 as Node);
    while let Some(node) = queue.pop_front() {
        let prefix = paths[node as usize].clone().expect("node was queued with a known path");
        for letter in 0..graph.num_letters() {
            if let Some(target) = graph.target(node, letter as Letter) {
                if paths[target as usize].is_none() {
                    let mut word = prefix.clone();
                    word.push(letter as Letter);
                    paths[target as usize] = Some(word);
                    queue.push_back(target);
                }
            }
        }
    }
    paths
}

/// `true` iff `(node, letter) -> target` is the tree edge that first
/// discovered `target` in `paths` (i.e. `paths[target]` ends in `letter` and
/// has `paths[node]` as its prefix).
pub fn is_tree_edge(paths: &[Option<Word>], node: Node, letter: Letter, target: Node) -> bool {
    match (&paths[node as usize], &paths[target as usize]) {
        (Some(p), Some(t)) => {
            t.len() == p.len() + 1 && t[..p.len()] == p[..] && t[p.len()] == letter
        }
        _ => false,
    }
}
