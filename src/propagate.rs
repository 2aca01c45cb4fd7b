// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! The shared propagation-engine loop: alternate Felsch definition
//! propagation with `make_compatible` passes over one or more pair lists
//! until neither step registers a new definition.

use crate::felsch_graph::FelschGraph;
use crate::word::Word;

/// Runs the propagation-engine loop described in the distilled spec §4.1:
/// repeatedly (a) register fresh definitions and propagate short rules to
/// fixpoint, (b) re-run `make_compatible` over every pair list in
/// `pair_lists`, (c) loop while either step registered new definitions.
/// Returns `false` on the first conflict.
pub fn propagate_to_fixpoint(
    graph: &mut FelschGraph,
    start: usize,
    pair_lists: &[&[(Word, Word)]],
) -> bool {
    let mut cursor = start;
    loop {
        if !graph.process_definitions(cursor) {
            return false;
        }
        cursor = graph.definition_log_len();
        let mut grew = false;
        for pairs in pair_lists {
            let before = graph.definition_log_len();
            if !graph.make_compatible(0, graph.num_active_nodes(), pairs) {
                return false;
            }
            if graph.definition_log_len() != before {
                grew = true;
            }
        }
        if !grew {
            break;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::felsch_graph::FelschTree;
    use crate::presentation::Presentation;
    use std::sync::Arc;

    #[test]
    fn include_pair_forces_an_edge() {
        let p = Presentation::new(1, vec![]).unwrap();
        let tree = Arc::new(FelschTree::new(&p));
        let mut g = FelschGraph::new(1, 2, tree);
        g.register_target(0, 0, 1);
        let include: Vec<(Word, Word)> = vec![(vec![0], vec![])];
        assert!(!propagate_to_fixpoint(&mut g, 0, &[&include]));
    }
}
