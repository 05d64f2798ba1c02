//! Enumeration of substitution variants within a Hamming radius.
//!
//! A [`HammingCircle`] yields every string at exactly `n` substitutions from a
//! sequence; a [`HammingBall`] chains the circles of radius `0..=n`. Both hold
//! no iteration state: every call to `iter()` starts over and yields the same
//! strings in the same order.
//!
//! For a sequence of length `L` over an alphabet of `k` symbols, a circle of
//! radius `n` contains exactly `C(L, n) * (k - 1)^n` strings.

use itertools::Itertools;
use thiserror::Error;

use crate::core::sequence::Alphabet;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VariantError {
    #[error("Radius {radius} exceeds sequence length {length}")]
    RadiusTooLarge { radius: usize, length: usize },
}

/// All strings at exactly `radius` substitutions from a sequence
#[derive(Debug, Clone)]
pub struct HammingCircle<'a> {
    sequence: Vec<char>,
    radius: usize,
    alphabet: &'a Alphabet,
}

impl<'a> HammingCircle<'a> {
    /// # Errors
    ///
    /// Returns `VariantError::RadiusTooLarge` if `radius` exceeds the sequence length.
    pub fn new(sequence: &str, radius: usize, alphabet: &'a Alphabet) -> Result<Self, VariantError> {
        let sequence: Vec<char> = sequence.chars().collect();
        if radius > sequence.len() {
            return Err(VariantError::RadiusTooLarge {
                radius,
                length: sequence.len(),
            });
        }
        Ok(Self {
            sequence,
            radius,
            alphabet,
        })
    }

    #[must_use]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Number of strings `iter()` yields
    #[must_use]
    pub fn expected_len(&self) -> usize {
        let choices = self.alphabet.len().saturating_sub(1);
        binomial(self.sequence.len(), self.radius)
            .saturating_mul(choices.saturating_pow(u32::try_from(self.radius).unwrap_or(u32::MAX)))
    }

    /// Iterate the circle.
    ///
    /// Position sets are visited in lexicographic order; within a position set the
    /// replacement indices advance like an odometer, last position fastest.
    pub fn iter(&self) -> Box<dyn Iterator<Item = String> + '_> {
        if self.radius == 0 {
            return Box::new(std::iter::once(self.sequence.iter().collect()));
        }

        let choices = self.alphabet.len().saturating_sub(1);
        Box::new(
            (0..self.sequence.len())
                .combinations(self.radius)
                .flat_map(move |positions| {
                    (0..self.radius)
                        .map(move |_| 0..choices)
                        .multi_cartesian_product()
                        .map(move |replacements| self.substitute(&positions, &replacements))
                }),
        )
    }

    /// Candidate index `r` becomes `alphabet[r]`, or the last alphabet symbol
    /// when `alphabet[r]` is the base already at that position.
    fn substitute(&self, positions: &[usize], replacements: &[usize]) -> String {
        let symbols = self.alphabet.symbols();
        let fallback = symbols[symbols.len() - 1];

        let mut cousin = self.sequence.clone();
        for (&pos, &r) in positions.iter().zip(replacements) {
            cousin[pos] = if cousin[pos] == symbols[r] {
                fallback
            } else {
                symbols[r]
            };
        }
        cousin.into_iter().collect()
    }
}

/// All strings at most `radius` substitutions from a sequence, the sequence itself first
#[derive(Debug, Clone)]
pub struct HammingBall<'a> {
    circles: Vec<HammingCircle<'a>>,
}

impl<'a> HammingBall<'a> {
    /// # Errors
    ///
    /// Returns `VariantError::RadiusTooLarge` if `radius` exceeds the sequence length.
    pub fn new(sequence: &str, radius: usize, alphabet: &'a Alphabet) -> Result<Self, VariantError> {
        let circles = (0..=radius)
            .map(|r| HammingCircle::new(sequence, r, alphabet))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { circles })
    }

    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.circles.iter().map(HammingCircle::expected_len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = String> + '_ {
        self.circles.iter().flat_map(HammingCircle::iter)
    }
}

fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1usize, |acc, i| acc.saturating_mul(n - i) / (i + 1))
}
