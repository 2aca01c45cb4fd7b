// Copyright 2017 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).
//! Letters and words over a fixed-size alphabet.

use crate::error::{Error, Result};

/// A letter is a small unsigned integer in `[0, num_letters)`.
pub type Letter = u32;

/// A node (equivalence class) identifier.
pub type Node = u32;

/// A finite ordered sequence of letters.
pub type Word = Vec<Letter>;

/// Checks that every letter of `word` lies in `[0, num_letters)`.
pub fn validate_word(word: &[Letter], num_letters: u32) -> Result<()> {
    for &letter in word {
        if letter >= num_letters {
            return Err(Error::LetterOutOfRange {
                letter,
                num_letters,
            });
        }
    }
    Ok(())
}

/// Shortlex comparison: shorter words first, then lexicographic.
pub fn shortlex_cmp(a: &[Letter], b: &[Letter]) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Returns `true` iff `a` is shortlex-greater than `b`, i.e. `a` should be
/// used as the left-hand side of a normalised relation `a = b`.
pub fn is_shortlex_greater(a: &[Letter], b: &[Letter]) -> bool {
    shortlex_cmp(a, b) == std::cmp::Ordering::Greater
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_word_accepts_in_range_letters() {
        assert!(validate_word(&[0, 1, 2], 3).is_ok());
    }

    #[test]
    fn validate_word_rejects_out_of_range_letter() {
        let err = validate_word(&[0, 3], 3).unwrap_err();
        assert_eq!(
            err,
            Error::LetterOutOfRange {
                letter: 3,
                num_letters: 3
            }
        );
    }

    #[test]
    fn shortlex_orders_by_length_then_lex() {
        assert_eq!(shortlex_cmp(&[0], &[0, 0]), std::cmp::Ordering::Less);
        assert_eq!(shortlex_cmp(&[1], &[0]), std::cmp::Ordering::Greater);
        assert_eq!(shortlex_cmp(&[0, 1], &[0, 1]), std::cmp::Ordering::Equal);
    }
}
