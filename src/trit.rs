// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The ternary digit and the template symbol that drives the two-track message generator.

use crate::error::Error;

/// A signed ternary digit in `{-1, 0, 1}`.
///
/// State and message arrays are dense sequences of these, stored as plain `i8`s rather than a
/// wrapper enum: the permutation's hot loop indexes them directly and cannot afford a tagged
/// representation.
pub type Trit = i8;

/// Size of the sponge's full internal state, in trits.
pub const STATE_LENGTH: usize = 729;
/// Size of one absorbed message block (the rate), in trits.
pub const MESSAGE_LENGTH: usize = 243;
/// First trit index of the capacity section; `[CAPACITY_START, STATE_LENGTH)` must be preserved
/// by a colliding pair.
pub const CAPACITY_START: usize = MESSAGE_LENGTH;

/// The full internal state of the sponge: rate (`[0, MESSAGE_LENGTH)`) followed by capacity.
pub type State = [Trit; STATE_LENGTH];

/// One rate-sized chunk of input, absorbed or produced by a single permutation call.
pub type MessageBlock = [Trit; MESSAGE_LENGTH];

/// One position of a [`Template`](crate::template::Template): either a fixed trit shared by both
/// candidate message blocks, a freely-varying trit (same random draw in both candidates), or the
/// unique differing trit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSymbol {
    /// Both candidates receive this fixed trit.
    Fixed(Trit),
    /// Both candidates receive the same uniformly random trit.
    Vary,
    /// The special trit: the first candidate gets `0`, the second gets `1`. Exactly one symbol
    /// in a template may be this variant.
    Diff,
}

impl TemplateSymbol {
    /// Parses the wire encoding used by the external template generator: `-1`, `0`, `1` are
    /// fixed trits, `2` is [`Vary`](TemplateSymbol::Vary), `3` is [`Diff`](TemplateSymbol::Diff).
    pub fn from_wire(value: i8) -> Result<Self, Error> {
        match value {
            -1 | 0 | 1 => Ok(TemplateSymbol::Fixed(value)),
            2 => Ok(TemplateSymbol::Vary),
            3 => Ok(TemplateSymbol::Diff),
            other => Err(Error::InvalidArgument(format!(
                "template symbol out of range: {other} (expected -1, 0, 1, 2, or 3)"
            ))),
        }
    }
}
