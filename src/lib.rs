// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

#![deny(warnings)]
// Enable all clippy lints except for many of the pedantic ones. It's a shame this needs to be copied and pasted across crates, but there doesn't appear to be a way to include inner attributes from a common source.
#![deny(
    clippy::all,
    clippy::default_trait_access,
    clippy::expl_impl_clone_on_copy,
    clippy::if_not_else,
    clippy::needless_continue,
    clippy::unseparated_literal_suffix,
    clippy::used_underscore_binding
)]
// It is often more clear to show that nothing is being moved.
#![allow(clippy::match_ref_pats)]
// Subjective style.
#![allow(
    clippy::len_without_is_empty,
    clippy::redundant_field_names,
    clippy::too_many_arguments
)]
// Default isn't as big a deal as people seem to think it is.
#![allow(clippy::new_without_default, clippy::new_ret_no_self)]
// Arc<Mutex> can be more clear than needing to grok Orderings:
#![allow(clippy::mutex_atomic)]

//! A backtracking enumerator of the low-index congruences of a finitely
//! presented semigroup or monoid.
//!
//! Given a presentation `⟨A | R⟩` and a bound `N`, [`Sims1`](crate::scheduler::Sims1)
//! depth-first searches the space of one-sided (right) congruences with at
//! most `N` classes compatible with `R`, representing each as a complete
//! Felsch word graph on `0..N` with one out-edge per generator per node.
//! [`Sims2`](crate::scheduler::Sims2) extends the same search to two-sided
//! congruences. [`RepOrc`](crate::rep_orc::RepOrc) and
//! [`MinimalRepOrc`](crate::minimal_rep_orc::MinimalRepOrc) build on the same
//! engine to find a single representation of bounded degree rather than
//! enumerate every congruence.
//!
//! The search itself never touches a generator's meaning: growing a node,
//! reusing one, and propagating a short relation to its Felsch closure are
//! the whole of the engine ([`felsch_graph`], [`iterator_base`]). Everything
//! else — excluding known pairs, requiring faithfulness, shaping a Rees
//! ideal's action — is a [`Pruner`](crate::pruner::Pruner) consulted at every
//! successful step.

pub mod error;
pub mod felsch_graph;
pub mod generating_pairs;
pub mod iterator_base;
pub mod minimal_rep_orc;
pub mod pending;
pub mod presentation;
pub mod propagate;
pub mod pruner;
pub mod rep_orc;
pub mod scheduler;
pub mod settings;
pub mod sims2;
pub mod spanning;
pub mod stats;
pub mod word;

pub use crate::error::{Error, Result};
pub use crate::presentation::Presentation;
pub use crate::pruner::{ExcludeRefiner, FaithfulRefiner, IdealRefiner, Pruner, WordEquivalence};
pub use crate::rep_orc::{ActionDegree, RepOrc};
pub use crate::scheduler::{Sims, Sims1, Sims2};
pub use crate::settings::Settings;
pub use crate::stats::Stats;
