// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Process-wide, read-only tables used by every round of the permutation: the index table and
//! the S-box.

use crate::trit::{Trit, STATE_LENGTH};

use lazy_static::lazy_static;

/// The non-linear combiner of each round, indexed by `a + 4*b + 5` for a pair of trits `(a, b)`.
pub const SBOX: [Trit; 11] = [1, 0, -1, 0, 1, -1, 0, 0, -1, 1, 0];

lazy_static! {
    /// Source index for each output trit of one permutation round.
    ///
    /// Built once by the recurrence `idx[0] = 0`, `idx[i+1] = idx[i] + (364 if idx[i] < 365 else
    /// -365)`. Has `STATE_LENGTH + 1` entries because round `i = STATE_LENGTH - 1` reads
    /// `idx[STATE_LENGTH]`.
    pub static ref INDICES: [usize; STATE_LENGTH + 1] = build_indices();
}

fn build_indices() -> [usize; STATE_LENGTH + 1] {
    let mut indices = [0usize; STATE_LENGTH + 1];
    for i in 0..STATE_LENGTH {
        let step: isize = if indices[i] < 365 { 364 } else { -365 };
        indices[i + 1] = (indices[i] as isize + step) as usize;
    }
    indices
}

/// Forces initialization of the process-wide index table.
///
/// The table is a [`lazy_static`] and would initialize lazily on first use regardless; this
/// function exists so that callers can make the initialization point explicit (e.g. to pay its
/// one-time cost before timing a search) instead of paying it on the first call into
/// [`crate::permutation`]. Idempotent.
pub fn init_indices() {
    lazy_static::initialize(&INDICES);
}
