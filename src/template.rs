// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The template-driven two-track message generator.

use crate::error::Error;
use crate::trit::{MessageBlock, TemplateSymbol, Trit, MESSAGE_LENGTH};

use rand::Rng;

/// A validated 243-symbol template: which positions are fixed, which vary freely, and which
/// carry the single differing trit.
///
/// Constructing a `Template` checks the length and "exactly one `Diff`" invariants once, up
/// front, so that [`fill`] never has to re-validate them in its hot loop.
#[derive(Debug, Clone)]
pub struct Template {
    symbols: [TemplateSymbol; MESSAGE_LENGTH],
    diff_index: usize,
}

impl Template {
    /// Validates `symbols` and wraps them into a `Template`.
    ///
    /// Fails if `symbols` is not exactly [`MESSAGE_LENGTH`] long, or does not contain exactly
    /// one [`TemplateSymbol::Diff`].
    pub fn from_symbols(symbols: &[TemplateSymbol]) -> Result<Self, Error> {
        if symbols.len() != MESSAGE_LENGTH {
            return Err(Error::InvalidArgument(format!(
                "template must have {MESSAGE_LENGTH} symbols, got {}",
                symbols.len()
            )));
        }

        let diff_positions: Vec<usize> = symbols
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, TemplateSymbol::Diff))
            .map(|(i, _)| i)
            .collect();

        let diff_index = match diff_positions.as_slice() {
            [only] => *only,
            [] => {
                return Err(Error::InvalidArgument(
                    "template has no Diff symbol, expected exactly one".to_string(),
                ))
            }
            many => {
                return Err(Error::InvalidArgument(format!(
                    "template has {} Diff symbols at {:?}, expected exactly one",
                    many.len(),
                    many
                )))
            }
        };

        let mut fixed = [TemplateSymbol::Vary; MESSAGE_LENGTH];
        fixed.copy_from_slice(symbols);

        Ok(Template {
            symbols: fixed,
            diff_index,
        })
    }

    /// Parses the wire encoding (`-1`/`0`/`1` fixed, `2` vary, `3` diff) used by the external
    /// template generator.
    pub fn from_wire(values: &[Trit]) -> Result<Self, Error> {
        let symbols = values
            .iter()
            .map(|&v| TemplateSymbol::from_wire(v))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_symbols(&symbols)
    }

    /// The index of the unique [`TemplateSymbol::Diff`] position.
    pub fn diff_index(&self) -> usize {
        self.diff_index
    }
}

/// Draws a uniform trit in `{-1, 0, 1}` from `rng`.
///
/// Uses a rejection-free draw from `[0, 3)` (`0 -> 0`, `1 -> 1`, `2 -> -1`). The particular
/// mapping from integer to trit is not itself meaningful, only that the result is uniform over
/// the three trit values — verified by a chi-square test in `tests/template.rs`.
fn random_trit<R: Rng + ?Sized>(rng: &mut R) -> Trit {
    match rng.gen_range(0..3) {
        0 => 0,
        1 => 1,
        _ => -1,
    }
}

/// Realizes `template` into two candidate message blocks differing in exactly one trit.
///
/// For each position: a fixed trit is copied into both `out0` and `out1`; a `Vary` position
/// draws one uniform random trit shared by both; the `Diff` position gets `0` in `out0` and `1`
/// in `out1`. Returns the `Diff` index (equal to `template.diff_index()`), so a caller already
/// holding a `Template` does not need to query it separately just to locate the differing trit.
pub fn fill<R: Rng + ?Sized>(
    template: &Template,
    out0: &mut MessageBlock,
    out1: &mut MessageBlock,
    rng: &mut R,
) -> usize {
    for (i, symbol) in template.symbols.iter().enumerate() {
        match symbol {
            TemplateSymbol::Fixed(t) => {
                out0[i] = *t;
                out1[i] = *t;
            }
            TemplateSymbol::Vary => {
                let t = random_trit(rng);
                out0[i] = t;
                out1[i] = t;
            }
            TemplateSymbol::Diff => {
                out0[i] = 0;
                out1[i] = 1;
            }
        }
    }
    template.diff_index
}
