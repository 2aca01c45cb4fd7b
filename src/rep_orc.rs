// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! `RepOrc`: finds a single right congruence whose quotient acts as a
//! transformation of a given target degree, rather than enumerating every
//! congruence up to a node bound.

use std::sync::Arc;

use crate::felsch_graph::FelschGraph;
use crate::scheduler::{Sims, Sims1};
use crate::settings::Settings;
use crate::word::{Letter, Node};

/// Stands in for the external transformation-semigroup enumerator: given the
/// number of active nodes of a candidate quotient and its action (a
/// `(node, letter) -> node` function reading the candidate's own edges),
/// returns the degree (number of points) of the transformation semigroup
/// that action generates.
pub trait ActionDegree: Send + Sync {
    fn degree(&self, num_active_nodes: Node, action: &dyn Fn(Node, Letter) -> Node) -> u32;
}

/// Searches the right congruences of a presentation with between `min_nodes`
/// and `max_nodes` classes for one whose quotient acts with exactly
/// `target_size` points, short-circuiting on the first match.
pub struct RepOrc {
    min_nodes: Node,
    max_nodes: Node,
    target_size: u32,
}

impl RepOrc {
    pub fn new(min_nodes: Node, max_nodes: Node, target_size: u32) -> RepOrc {
        RepOrc {
            min_nodes,
            max_nodes,
            target_size,
        }
    }

    pub fn min_nodes(&self) -> Node {
        self.min_nodes
    }

    pub fn max_nodes(&self) -> Node {
        self.max_nodes
    }

    pub fn target_size(&self) -> u32 {
        self.target_size
    }

    /// Returns the first right-congruence word graph with at most
    /// `max_nodes` classes, at least `min_nodes` of them, whose action
    /// (read off its own edges) `oracle` reports as having degree
    /// `target_size`. `settings`'s presentation is otherwise used unchanged.
    /// `oracle` is an `Arc` rather than a borrow since it must outlive, and
    /// be shared across, every worker thread of the search.
    pub fn find(&self, settings: Settings, oracle: Arc<dyn ActionDegree>) -> Option<FelschGraph> {
        let min_nodes = self.min_nodes;
        let target_size = self.target_size;
        Sims1::new(settings).find_if(self.max_nodes, move |g: &FelschGraph| {
            if g.num_active_nodes() < min_nodes {
                return false;
            }
            let degree = oracle.degree(g.num_active_nodes(), &|node, letter| {
                g.target(node, letter)
                    .expect("a leaf candidate has every edge defined")
            });
            degree == target_size
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::Presentation;

    /// Reports the degree as the candidate's own node count, so `RepOrc`
    /// behaves like "find the first graph with exactly `target_size` nodes".
    struct NodeCountIsDegree;

    impl ActionDegree for NodeCountIsDegree {
        fn degree(&self, num_active_nodes: Node, _action: &dyn Fn(Node, Letter) -> Node) -> u32 {
            num_active_nodes
        }
    }

    #[test]
    fn finds_the_two_class_quotient() {
        let settings = Settings::new(Presentation::new(1, vec![(vec![0, 0], vec![0])]).unwrap());
        let orc = RepOrc::new(1, 2, 2);
        let oracle: Arc<dyn ActionDegree> = Arc::new(NodeCountIsDegree);
        let found = orc.find(settings, oracle).expect("a 2-node quotient exists");
        assert_eq!(found.num_active_nodes(), 2);
    }

    #[test]
    fn respects_min_nodes() {
        let settings = Settings::new(Presentation::new(1, vec![(vec![0, 0], vec![0])]).unwrap());
        // Only a 1-node quotient exists with max_nodes = 1, but min_nodes = 2
        // rules it out.
        let orc = RepOrc::new(2, 1, 1);
        let oracle: Arc<dyn ActionDegree> = Arc::new(NodeCountIsDegree);
        assert!(orc.find(settings, oracle).is_none());
    }
}
