// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! `MinimalRepOrc`: the smallest-quotient search built on top of [`RepOrc`].

use std::sync::Arc;

use crate::felsch_graph::FelschGraph;
use crate::rep_orc::{ActionDegree, RepOrc};
use crate::settings::Settings;
use crate::word::Node;

/// Finds the right congruence of fewest classes whose quotient acts with
/// exactly `target_size` points, by repeatedly re-running [`RepOrc`] with
/// its node upper bound tightened to one less than the smallest quotient
/// found so far, until no smaller one exists.
pub struct MinimalRepOrc {
    target_size: u32,
}

impl MinimalRepOrc {
    pub fn new(target_size: u32) -> MinimalRepOrc {
        MinimalRepOrc { target_size }
    }

    pub fn target_size(&self) -> u32 {
        self.target_size
    }

    pub fn find(&self, settings: Settings, oracle: Arc<dyn ActionDegree>) -> Option<FelschGraph> {
        let mut max_nodes: Node = self.target_size;
        let mut best: Option<FelschGraph> = None;
        loop {
            let orc = RepOrc::new(1, max_nodes, self.target_size);
            match orc.find(settings.clone(), Arc::clone(&oracle)) {
                Some(g) => {
                    let new_max = g.num_active_nodes().saturating_sub(1);
                    best = Some(g);
                    if new_max == 0 {
                        break;
                    }
                    max_nodes = new_max;
                }
                None => break,
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::Presentation;
    use crate::word::Letter;

    struct NodeCountIsDegree;

    impl ActionDegree for NodeCountIsDegree {
        fn degree(&self, num_active_nodes: Node, _action: &dyn Fn(Node, Letter) -> Node) -> u32 {
            num_active_nodes
        }
    }

    #[test]
    fn finds_the_smallest_matching_quotient() {
        // ⟨a | a^2 = a⟩ has a 1-node quotient (whose "degree" under this
        // oracle is 1, not 2) and a 2-node quotient (degree 2); minimal-rep
        // for target_size 2 must report the 2-node one, since nothing
        // smaller has that degree.
        let settings = Settings::new(Presentation::new(1, vec![(vec![0, 0], vec![0])]).unwrap());
        let oracle: Arc<dyn ActionDegree> = Arc::new(NodeCountIsDegree);
        let found = MinimalRepOrc::new(2)
            .find(settings, oracle)
            .expect("a 2-node quotient exists and is minimal");
        assert_eq!(found.num_active_nodes(), 2);
    }

    #[test]
    fn returns_none_when_no_quotient_matches() {
        let settings = Settings::new(Presentation::new(1, vec![(vec![0, 0], vec![0])]).unwrap());
        let oracle: Arc<dyn ActionDegree> = Arc::new(NodeCountIsDegree);
        assert!(MinimalRepOrc::new(5).find(settings, oracle).is_none());
    }
}
