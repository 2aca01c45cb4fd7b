// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! The work-stealing scheduler, and the public `Sims1`/`Sims2` enumerator
//! API built over it.
//!
//! Each worker owns a `SearchState` behind its own `parking_lot::Mutex`.
//! Workers pop and attempt one `PendingDef` at a time; when a worker's own
//! stack runs dry it round-robins over its peers looking for one with at
//! least two pending entries to split. A worker that finds neither work of
//! its own nor a victim to steal from gives up after `idle_thread_restarts`
//! consecutive empty rounds, on the assumption every other worker is in the
//! same state and the search is exhausted.

use std::marker::PhantomData;
use std::panic;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::felsch_graph::{FelschGraph, FelschTree};
use crate::iterator_base::{IteratorBase, SearchState};
use crate::settings::Settings;
use crate::sims2::TwoSidedIteratorState;
use crate::stats::Stats;
use crate::word::Node;

/// Attempts to steal half the pending stack of some peer of `me`, starting
/// just after `me` and wrapping around. A victim must have at least two
/// pending entries — stealing from a stack of one would leave the victim
/// with nothing to do, defeating the point. Returns `true` iff a steal
/// succeeded.
fn try_steal<S: SearchState>(me: usize, states: &[Mutex<S>], stats: &Stats) -> bool {
    let n = states.len();
    for offset in 1..n {
        let victim_idx = (me + offset) % n;
        let mut victim = states[victim_idx].lock();
        if victim.pending_len() < 2 {
            continue;
        }
        let stolen = victim.split_off_half();
        let snapshot = victim.snapshot();
        drop(victim);
        stats.record_pushed(stolen.len() as u64);
        let mut mine = states[me].lock();
        mine.adopt(snapshot, stolen);
        trace!("worker {me} stole {} pending definitions from worker {victim_idx}", mine.pending_len());
        return true;
    }
    false
}

fn worker_loop<S, F>(me: usize, states: &[Mutex<S>], stats: &Stats, done: &AtomicBool, idle_thread_restarts: usize, on_found: &F)
where
    S: SearchState,
    F: Fn(&FelschGraph) -> bool + Send + Sync,
{
    let single_threaded = states.len() == 1;
    let mut idle_rounds = 0usize;
    while !done.load(Ordering::Relaxed) {
        let stepped = {
            let mut mine = states[me].lock();
            stats.record_stack_size(mine.pending_len());
            mine.try_step()
        };
        match stepped {
            Some(true) => {
                idle_rounds = 0;
                stats.record_completion();
                let graph = states[me].lock().graph().clone();
                if !on_found(&graph) {
                    trace!("worker {me} stopping: completion hook requested an early stop");
                    done.store(true, Ordering::Relaxed);
                }
            }
            Some(false) => {
                idle_rounds = 0;
            }
            None if single_threaded => {
                break;
            }
            None => {
                if try_steal(me, states, stats) {
                    idle_rounds = 0;
                } else {
                    idle_rounds += 1;
                    if idle_rounds >= idle_thread_restarts {
                        debug!("worker {me} exiting after {idle_rounds} idle rounds with no stealable work");
                        break;
                    }
                    thread::yield_now();
                }
            }
        }
    }
}

/// Drives `states` (one per worker thread) to exhaustion, calling `on_found`
/// — from whichever worker thread found it — on every complete candidate
/// graph. `on_found` returning `false` stops every worker as soon as it
/// notices `done`; a panic inside a worker (or inside `on_found`) is
/// re-raised to the caller of `run` once every worker has joined.
fn run<S, F>(states: Vec<S>, idle_thread_restarts: usize, stats: Arc<Stats>, on_found: F)
where
    S: SearchState + 'static,
    F: Fn(&FelschGraph) -> bool + Send + Sync + 'static,
{
    let n = states.len();
    let states: Arc<Vec<Mutex<S>>> = Arc::new(states.into_iter().map(Mutex::new).collect());
    let done = Arc::new(AtomicBool::new(false));
    let on_found = Arc::new(on_found);

    let handles: Vec<_> = (0..n)
        .map(|i| {
            let states = Arc::clone(&states);
            let stats = Arc::clone(&stats);
            let done = Arc::clone(&done);
            let on_found = Arc::clone(&on_found);
            thread::Builder::new()
                .name(format!("low-index-worker-{i}"))
                .spawn(move || worker_loop(i, &states, &stats, &done, idle_thread_restarts, &*on_found))
                .expect("failed to spawn worker thread")
        })
        .collect();

    for handle in handles {
        if let Err(payload) = handle.join() {
            panic::resume_unwind(payload);
        }
    }
}

/// Shared driving logic behind [`Sims1`] and [`Sims2`]: owns the
/// presentation-derived, immutable-for-the-run `Settings` and `FelschTree`,
/// and spreads `max_classes` across `settings.number_of_threads()` worker
/// states. Every worker carries the real `max_classes` bound from the
/// start — only the first actually starts with anything on its stack, the
/// rest begin idle and pick up work purely by stealing, but keep the same
/// bound so that work they later adopt is installed against the right
/// budget instead of a permanent zero.
struct Engine<S> {
    settings: Arc<Settings>,
    felsch_tree: Arc<FelschTree>,
    stats: Arc<Stats>,
    _state: PhantomData<fn() -> S>,
}

impl<S: SearchState + 'static> Engine<S> {
    fn new(settings: Settings) -> Engine<S> {
        let settings = Arc::new(settings);
        let felsch_tree = Arc::new(FelschTree::new(settings.presentation()));
        Engine {
            settings,
            felsch_tree,
            stats: Arc::new(Stats::new()),
            _state: PhantomData,
        }
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }

    fn seeded_states(&self, max_classes: Node) -> Vec<S> {
        (0..self.settings.number_of_threads())
            .map(|i| {
                let settings = Arc::clone(&self.settings);
                let felsch_tree = Arc::clone(&self.felsch_tree);
                if i == 0 {
                    S::new(settings, felsch_tree, max_classes)
                } else {
                    S::idle(settings, felsch_tree, max_classes)
                }
            })
            .collect()
    }

    fn for_each<F>(&self, max_classes: Node, f: F)
    where
        F: FnMut(FelschGraph) + Send + 'static,
    {
        let states = self.seeded_states(max_classes);
        let f = Mutex::new(f);
        run(
            states,
            self.settings.idle_thread_restarts(),
            Arc::clone(&self.stats),
            move |g: &FelschGraph| {
                (f.lock())(g.clone());
                true
            },
        );
    }

    fn find_if<P>(&self, max_classes: Node, pred: P) -> Option<FelschGraph>
    where
        P: FnMut(&FelschGraph) -> bool + Send + 'static,
    {
        let states = self.seeded_states(max_classes);
        let pred = Mutex::new(pred);
        let found: Arc<Mutex<Option<FelschGraph>>> = Arc::new(Mutex::new(None));
        let found_in_closure = Arc::clone(&found);
        run(
            states,
            self.settings.idle_thread_restarts(),
            Arc::clone(&self.stats),
            move |g: &FelschGraph| {
                if (pred.lock())(g) {
                    *found_in_closure.lock() = Some(g.clone());
                    false
                } else {
                    true
                }
            },
        );
        Arc::try_unwrap(found)
            .unwrap_or_else(|_| panic!("worker thread outlived run()"))
            .into_inner()
    }

    fn number_of_congruences(&self, max_classes: Node) -> u64 {
        let states = self.seeded_states(max_classes);
        let counter = Arc::new(AtomicU64::new(0));
        let counter_in_closure = Arc::clone(&counter);
        run(
            states,
            self.settings.idle_thread_restarts(),
            Arc::clone(&self.stats),
            move |_g: &FelschGraph| {
                counter_in_closure.fetch_add(1, Ordering::Relaxed);
                true
            },
        );
        counter.load(Ordering::Relaxed)
    }
}

/// The enumerator API common to [`Sims1`] and [`Sims2`].
pub trait Sims {
    /// Calls `f` once per congruence with at most `max_classes` classes,
    /// from whichever worker thread found it, until the search is
    /// exhausted.
    fn for_each<F>(&self, max_classes: Node, f: F)
    where
        F: FnMut(FelschGraph) + Send + 'static;

    /// Returns the first congruence with at most `max_classes` classes for
    /// which `pred` returns `true`, or `None` if none does. Every worker
    /// stops as soon as one call to `pred` returns `true`.
    fn find_if<P>(&self, max_classes: Node, pred: P) -> Option<FelschGraph>
    where
        P: FnMut(&FelschGraph) -> bool + Send + 'static;

    /// The number of congruences with at most `max_classes` classes.
    fn number_of_congruences(&self, max_classes: Node) -> u64;
}

/// Enumerates the right congruences of a presentation: word graphs whose
/// right action by every generator agrees with every relation.
pub struct Sims1(Engine<IteratorBase>);

impl Sims1 {
    pub fn new(settings: Settings) -> Sims1 {
        Sims1(Engine::new(settings))
    }

    pub fn stats(&self) -> &Stats {
        self.0.stats()
    }
}

impl Sims for Sims1 {
    fn for_each<F>(&self, max_classes: Node, f: F)
    where
        F: FnMut(FelschGraph) + Send + 'static,
    {
        self.0.for_each(max_classes, f)
    }

    fn find_if<P>(&self, max_classes: Node, pred: P) -> Option<FelschGraph>
    where
        P: FnMut(&FelschGraph) -> bool + Send + 'static,
    {
        self.0.find_if(max_classes, pred)
    }

    fn number_of_congruences(&self, max_classes: Node) -> u64 {
        self.0.number_of_congruences(max_classes)
    }
}

/// Enumerates the two-sided congruences of a presentation: word graphs
/// additionally closed under left multiplication, via the witness/two-sided
/// pair-log machinery in [`crate::sims2`].
pub struct Sims2(Engine<TwoSidedIteratorState>);

impl Sims2 {
    pub fn new(settings: Settings) -> Sims2 {
        Sims2(Engine::new(settings))
    }

    pub fn stats(&self) -> &Stats {
        self.0.stats()
    }
}

impl Sims for Sims2 {
    fn for_each<F>(&self, max_classes: Node, f: F)
    where
        F: FnMut(FelschGraph) + Send + 'static,
    {
        self.0.for_each(max_classes, f)
    }

    fn find_if<P>(&self, max_classes: Node, pred: P) -> Option<FelschGraph>
    where
        P: FnMut(&FelschGraph) -> bool + Send + 'static,
    {
        self.0.find_if(max_classes, pred)
    }

    fn number_of_congruences(&self, max_classes: Node) -> u64 {
        self.0.number_of_congruences(max_classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::Presentation;

    fn a_squared_eq_a() -> Settings {
        Settings::new(Presentation::new(1, vec![(vec![0, 0], vec![0])]).unwrap())
    }

    #[test]
    fn sims1_number_of_congruences_matches_scenario() {
        let sims = Sims1::new(a_squared_eq_a());
        assert_eq!(sims.number_of_congruences(2), 2);
    }

    #[test]
    fn sims1_for_each_visits_every_active_node_count() {
        let sims = Sims1::new(a_squared_eq_a());
        let counts = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&counts);
        sims.for_each(2, move |g| collected.lock().push(g.num_active_nodes()));
        let mut counts = Arc::try_unwrap(counts).unwrap().into_inner();
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn sims1_find_if_locates_the_two_class_graph() {
        let sims = Sims1::new(a_squared_eq_a());
        let found = sims
            .find_if(2, |g| g.num_active_nodes() == 2)
            .expect("a two-class quotient exists");
        assert_eq!(found.num_active_nodes(), 2);
        assert_eq!(found.target(0, 0), Some(1));
        assert_eq!(found.target(1, 0), Some(1));
    }

    #[test]
    fn sims1_find_if_returns_none_when_predicate_never_matches() {
        let sims = Sims1::new(a_squared_eq_a());
        assert!(sims.find_if(2, |_| false).is_none());
    }

    #[test]
    fn sims2_number_of_congruences_matches_one_sided_for_monogenic_presentation() {
        let sims = Sims2::new(a_squared_eq_a());
        assert_eq!(sims.number_of_congruences(2), 2);
    }

    #[test]
    fn sims1_stats_count_reflects_completions() {
        let sims = Sims1::new(a_squared_eq_a());
        sims.for_each(2, |_| {});
        assert_eq!(sims.stats().count_now(), 2);
    }

    #[test]
    fn number_of_congruences_is_independent_of_thread_count() {
        // Free monoid on two generators: with no relations to prune the
        // search, max_classes = 4 grows a frontier wide enough that the
        // single seeded worker reliably has work left to steal, putting
        // every stolen worker's `max_classes` bound to real use.
        let mut settings = Settings::new(Presentation::new(2, vec![]).unwrap());

        settings.set_number_of_threads(1).unwrap();
        let single_threaded = Sims1::new(settings.clone()).number_of_congruences(4);

        settings.set_number_of_threads(8).unwrap();
        let multi_threaded = Sims1::new(settings).number_of_congruences(4);

        assert!(
            single_threaded > 1,
            "the free monoid on two generators has more than one congruence up to 4 classes"
        );
        assert_eq!(
            single_threaded, multi_threaded,
            "number_of_congruences must not depend on number_of_threads"
        );
    }
}
