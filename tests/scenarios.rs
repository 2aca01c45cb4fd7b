// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! Whole-enumerator integration tests: each test builds a presentation from
//! scratch, runs it through the public `Sims1`/`Sims2` API exactly as an
//! external caller would, and checks a congruence count or an exhaustive
//! list of yielded graphs against a count this crate's authors verified by
//! hand rather than by running the enumerator itself.

use std::sync::{Arc, Mutex};

use low_index::{Presentation, Settings, Sims, Sims1, Sims2};

fn init() {
    let _ = env_logger::try_init();
}

/// The standard Coxeter presentation of the symmetric group on 5 points:
/// generators `s0..s3`, `s_i^2 = e`, `(s_i s_{i+1})^3 = e`, and `(s_i
/// s_j)^2 = e` for `|i - j| >= 2`.
///
/// A right congruence with at most `n` classes corresponds to a subgroup of
/// index at most `n` (the stabiliser of the class of the identity). Sym(5)
/// has exactly one subgroup of index 1 (the whole group) and exactly one of
/// index 2 (the alternating group, its only index-2 subgroup since index-2
/// subgroups are always normal and Sym(5)'s abelianisation is `C2`); it has
/// none of index 3, since a transitive action on 3 points would need a
/// surjection onto a transitive subgroup of `S3`, forcing a normal subgroup
/// of order 20, and Sym(5)'s only normal subgroups are `1`, `A5`, and
/// itself. So the count of congruences with at most 3 classes is `1 + 1 + 0
/// = 2`.
fn symmetric_group_coxeter_presentation(n: u32) -> Presentation {
    let mut rules = Vec::new();
    for i in 0..n - 1 {
        rules.push((vec![i, i], vec![]));
    }
    for i in 0..n - 2 {
        rules.push((vec![i, i + 1, i, i + 1, i, i + 1], vec![]));
    }
    for i in 0..n - 1 {
        for j in (i + 2)..(n - 1) {
            rules.push((vec![i, j, i, j], vec![]));
        }
    }
    Presentation::new(n - 1, rules).unwrap()
}

#[test]
fn symmetric_group_on_five_points_has_two_congruences_of_index_three() {
    init();
    let settings = Settings::new(symmetric_group_coxeter_presentation(5));
    let sims = Sims1::new(settings);
    assert_eq!(sims.number_of_congruences(3), 2);
}

#[test]
fn symmetric_group_two_sided_congruence_count_matches_one_sided() {
    // Every right congruence of a group presentation is automatically
    // two-sided (congruences of a group correspond to normal subgroups only
    // when two-sided, but Sims2's notion of "two-sided" here is closure
    // under left multiplication of the coset action, which a genuine group
    // quotient always has): both of Sym(5)'s index-<=3 subgroups give
    // two-sided congruences too, so the count must agree with Sims1's.
    init();
    let settings = Settings::new(symmetric_group_coxeter_presentation(5));
    let sims = Sims2::new(settings);
    assert_eq!(sims.number_of_congruences(3), 2);
}

/// NOTE: the spec names a second headline scenario here — "a
/// Guralnick-Kantor-Kassabov-Lubotzky-style presentation of a
/// 'not-symmetric-group' relative of Sym(5), with `number_of_congruences(3)
/// == 41`" — matching `not_symmetric_group_GKKL08` in the real upstream
/// test suite (see `examples/original_source/tests/test-fpsemi-examples-3.cpp`).
/// That test includes `libsemigroups/fpsemi-examples.hpp`, which defines the
/// exact relator words; that header is not part of this crate's grounding
/// pack (`examples/original_source/_INDEX.md` does not list it), and the
/// GKKL08 presentation's relators are not something derivable from first
/// principles the way the Coxeter presentation above is. Reproducing it from
/// memory would mean asserting a specific count for relations this crate's
/// authors cannot independently verify, which is the kind of guess
/// `spec.md`'s open-questions policy asks us not to make. See DESIGN.md's
/// Open Question 4 for the record of this decision.
#[test]
fn free_monogenic_monoid_of_order_four_yields_three_graphs() {
    // ⟨a | a^4 = a⟩ with the empty word included, max_classes = 3 (spec §8
    // scenario 3): exactly the trivial, two-class, and three-class faithful
    // quotients, run here end to end through the public API rather than the
    // single-threaded unit tests in `iterator_base.rs`.
    init();
    let presentation = Presentation::new(1, vec![(vec![0, 0, 0, 0], vec![0]), (vec![], vec![])]).unwrap();
    let settings = Settings::new(presentation);
    let sims = Sims1::new(settings);

    let counts = Arc::new(Mutex::new(Vec::new()));
    let collected = Arc::clone(&counts);
    sims.for_each(3, move |g| collected.lock().unwrap().push(g.num_active_nodes()));
    let mut counts = Arc::try_unwrap(counts).unwrap().into_inner().unwrap();
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2, 3]);
    assert_eq!(sims.number_of_congruences(3), 3);
}

#[test]
fn a_squared_eq_a_yields_the_two_scenario_four_graphs() {
    // Empty include, empty exclude, relation a^2 = a, max_classes = 2 (spec
    // §8 scenario 4): the trivial graph and the two-class quotient with
    // edge (0,a)=1, (1,a)=1.
    init();
    let presentation = Presentation::new(1, vec![(vec![0, 0], vec![0])]).unwrap();
    let settings = Settings::new(presentation);
    let sims = Sims1::new(settings);

    let found = Arc::new(Mutex::new(Vec::new()));
    let collected = Arc::clone(&found);
    sims.for_each(2, move |g| collected.lock().unwrap().push(g));
    let mut found = Arc::try_unwrap(found).unwrap().into_inner().unwrap();
    found.sort_by_key(|g| g.num_active_nodes());

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].num_active_nodes(), 1);
    assert_eq!(found[1].num_active_nodes(), 2);
    assert_eq!(found[1].target(0, 0), Some(1));
    assert_eq!(found[1].target(1, 0), Some(1));
}

#[test]
fn symmetric_group_congruence_count_is_independent_of_thread_count() {
    init();
    let mut settings = Settings::new(symmetric_group_coxeter_presentation(5));

    settings.set_number_of_threads(1).unwrap();
    let single_threaded = Sims1::new(settings.clone()).number_of_congruences(3);

    settings.set_number_of_threads(4).unwrap();
    let multi_threaded = Sims1::new(settings).number_of_congruences(3);

    assert_eq!(single_threaded, 2);
    assert_eq!(single_threaded, multi_threaded);
}
