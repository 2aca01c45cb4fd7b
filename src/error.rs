// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
use std::fmt;

/// The single error type returned at setting/construction boundaries.
///
/// Internal search failures (registration conflicts, propagation conflicts,
/// pruner rejections, long-rule conflicts) are never represented here: those
/// are the ordinary way the search prunes a subtree, and are handled by
/// rolling back and trying the next [`PendingDef`](crate::pending::PendingDef).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The alphabet size was zero, or a presentation with no relations was
    /// supplied where the empty presentation is not permitted.
    EmptyAlphabet,
    /// A relation, include, or exclude word referenced a letter outside the
    /// alphabet `[0, num_letters)`.
    LetterOutOfRange { letter: u32, num_letters: u32 },
    /// An include/exclude list had odd length (words must come in pairs).
    OddLengthPairList { len: usize },
    /// `number_of_threads` was called with zero.
    ZeroThreads,
    /// `cbegin_long_rules` was given an odd offset.
    OddLongRulesBegin { offset: usize },
    /// An iterator/graph position was requested that does not exist.
    PositionOutOfBounds { requested: usize, len: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyAlphabet => {
                write!(f, "presentation has an empty alphabet")
            }
            Error::LetterOutOfRange { letter, num_letters } => write!(
                f,
                "letter {letter} is out of range for an alphabet of size {num_letters}"
            ),
            Error::OddLengthPairList { len } => write!(
                f,
                "expected an even number of words (words come in (u, v) pairs), found {len}"
            ),
            Error::ZeroThreads => write!(f, "number of threads must be at least 1"),
            Error::OddLongRulesBegin { offset } => {
                write!(f, "long rules begin offset {offset} must be even")
            }
            Error::PositionOutOfBounds { requested, len } => write!(
                f,
                "position {requested} is out of bounds for a collection of length {len}"
            ),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
