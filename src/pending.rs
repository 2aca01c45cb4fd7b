// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! A suspended "try edge `(source, letter) -> target`" frame.

use crate::word::{Letter, Node};

/// An immutable, deferred attempt to set `edges[source][letter] := target`
/// in a [`FelschGraph`](crate::felsch_graph::FelschGraph).
///
/// Pushed onto an [`IteratorState`](crate::iterator_base::IteratorBase)'s
/// pending stack by "install descendants"; popped and attempted by
/// "advance". Carries everything needed to roll back to the state that was
/// current when it was pushed, regardless of how much work has happened to
/// the graph since (other `PendingDef`s attempted and discarded in between).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDef {
    pub source: Node,
    pub letter: Letter,
    pub target: Node,
    /// `definition_log` length to roll back to before attempting this
    /// definition.
    pub num_edges_before: usize,
    /// Active node count to roll back to before attempting this definition.
    pub num_nodes_before: Node,
    /// `true` iff this definition allocates a previously unused node, i.e.
    /// `target == num_nodes_before`.
    pub target_is_new_node: bool,
}

impl PendingDef {
    pub fn new(
        source: Node,
        letter: Letter,
        target: Node,
        num_edges_before: usize,
        num_nodes_before: Node,
        target_is_new_node: bool,
    ) -> PendingDef {
        PendingDef {
            source,
            letter,
            target,
            num_edges_before,
            num_nodes_before,
            target_is_new_node,
        }
    }
}
