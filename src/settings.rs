// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! The immutable, validated run configuration shared by every worker.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::presentation::Presentation;
use crate::pruner::{ExcludeRefiner, Pruner, PrunerSet};
use crate::word::{validate_word, Word};

const DEFAULT_NUM_THREADS: usize = 1;
const DEFAULT_IDLE_THREAD_RESTARTS: usize = 100;

/// Validated, idempotent run configuration for [`Sims1`](crate::scheduler::Sims1)
/// or [`Sims2`](crate::scheduler::Sims2). Every setter validates synchronously
/// and is idempotent: calling it twice with the same value leaves the
/// settings unchanged.
#[derive(Clone)]
pub struct Settings {
    presentation: Presentation,
    include: Vec<(Word, Word)>,
    exclude: Vec<(Word, Word)>,
    pruners: PrunerSet,
    exclude_refiner_installed: bool,
    num_threads: usize,
    idle_thread_restarts: usize,
}

fn pair_up(num_letters: u32, words: Vec<Word>) -> Result<Vec<(Word, Word)>> {
    if words.len() % 2 != 0 {
        return Err(Error::OddLengthPairList { len: words.len() });
    }
    for word in &words {
        validate_word(word, num_letters)?;
    }
    Ok(words
        .chunks_exact(2)
        .map(|chunk| (chunk[0].clone(), chunk[1].clone()))
        .collect())
}

impl Settings {
    pub fn new(presentation: Presentation) -> Settings {
        Settings {
            presentation,
            include: Vec::new(),
            exclude: Vec::new(),
            pruners: PrunerSet::new(),
            exclude_refiner_installed: false,
            num_threads: DEFAULT_NUM_THREADS,
            idle_thread_restarts: DEFAULT_IDLE_THREAD_RESTARTS,
        }
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn set_presentation(&mut self, presentation: Presentation) -> &mut Self {
        self.presentation = presentation;
        self
    }

    pub fn include_pairs(&self) -> &[(Word, Word)] {
        &self.include
    }

    pub fn include(&mut self, words: Vec<Word>) -> Result<&mut Self> {
        self.include = pair_up(self.presentation.num_letters(), words)?;
        Ok(self)
    }

    pub fn exclude_pairs(&self) -> &[(Word, Word)] {
        &self.exclude
    }

    pub fn exclude(&mut self, words: Vec<Word>) -> Result<&mut Self> {
        self.exclude = pair_up(self.presentation.num_letters(), words)?;
        if !self.exclude.is_empty() && !self.exclude_refiner_installed {
            self.pruners
                .push(Arc::new(ExcludeRefiner::new(self.exclude.clone())));
            self.exclude_refiner_installed = true;
        }
        Ok(self)
    }

    pub fn pruners(&self) -> &PrunerSet {
        &self.pruners
    }

    pub fn add_pruner(&mut self, pruner: Arc<dyn Pruner>) -> &mut Self {
        self.pruners.push(pruner);
        self
    }

    pub fn long_rule_length(&mut self, length: usize) -> &mut Self {
        self.presentation.long_rule_length(length);
        self
    }

    pub fn cbegin_long_rules(&mut self, offset: usize) -> Result<&mut Self> {
        self.presentation.cbegin_long_rules(offset)?;
        Ok(self)
    }

    pub fn number_of_threads(&self) -> usize {
        self.num_threads
    }

    pub fn set_number_of_threads(&mut self, n: usize) -> Result<&mut Self> {
        if n == 0 {
            return Err(Error::ZeroThreads);
        }
        self.num_threads = n;
        Ok(self)
    }

    pub fn idle_thread_restarts(&self) -> usize {
        self.idle_thread_restarts
    }

    pub fn set_idle_thread_restarts(&mut self, k: usize) -> Result<&mut Self> {
        if k == 0 {
            return Err(Error::ZeroThreads);
        }
        self.idle_thread_restarts = k;
        Ok(self)
    }

    /// Restores threads, include/exclude, pruners, and idle-restart count to
    /// their defaults, and the presentation's long-rules split to "every
    /// rule is short". The presentation's rules themselves are unchanged.
    pub fn reset(&mut self) {
        self.include.clear();
        self.exclude.clear();
        self.pruners = PrunerSet::new();
        self.exclude_refiner_installed = false;
        self.num_threads = DEFAULT_NUM_THREADS;
        self.idle_thread_restarts = DEFAULT_IDLE_THREAD_RESTARTS;
        let num_rules = self.presentation.rules().len();
        self.presentation.set_long_rules_begin_unchecked(num_rules);
    }
}
