// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The ternary sponge permutation and its differential (two-track) variant.

use crate::error::Error;
use crate::indices::{INDICES, SBOX};
use crate::trit::{State, CAPACITY_START, STATE_LENGTH};

/// Number of rounds applied by a single call to [`permute`].
pub const NUM_ROUNDS: usize = 27;

/// Applies the full 27-round ternary permutation to `state`, in place.
///
/// Each round snapshots the state, then recomputes every output trit from the snapshot via the
/// precomputed index table and S-box:
///
/// `state[i] = SBOX[snapshot[idx[i]] + 4 * snapshot[idx[i + 1]] + 5]`
///
/// Pure and deterministic: the only inputs are `state` and the static tables in
/// [`crate::indices`].
pub fn permute(state: &mut State) {
    for _ in 0..NUM_ROUNDS {
        let snapshot = *state;
        for i in 0..STATE_LENGTH {
            let a = snapshot[INDICES[i]];
            let b = snapshot[INDICES[i + 1]];
            state[i] = SBOX[(a as isize + 4 * b as isize + 5) as usize];
        }
    }
}

/// Applies the permutation to `state_a` and `state_b` in lockstep, aborting the comparison at
/// `fail_round` if their trajectories have diverged in more than one trit.
///
/// `fail_round` is the round at which the caller's external template generator is contractually
/// obligated to guarantee a single-trit difference between the two states; a larger divergence
/// observed there means that contract was broken, which is reported as
/// [`Error::InvariantViolation`] rather than silently tolerated. Pass `fail_round = 0` to skip
/// the checkpoint.
///
/// Returns `Ok(true)` iff the capacity sections (`state[CAPACITY_START..]`) agree after all 27
/// rounds, i.e. the two inputs collide in the sponge's capacity at this block.
///
/// This is the hot loop of the search: both states are advanced one round at a time so the
/// `fail_round` checkpoint can be inserted between rounds without re-running the permutation.
pub fn permute_cmp(state_a: &mut State, state_b: &mut State, fail_round: usize) -> Result<bool, Error> {
    for round in 0..NUM_ROUNDS {
        step(state_a);
        step(state_b);

        if fail_round > 0 && round == fail_round {
            let diffs = state_a
                .iter()
                .zip(state_b.iter())
                .filter(|(a, b)| a != b)
                .count();
            if diffs > 1 {
                return Err(Error::InvariantViolation(format!(
                    "differential trajectory diverged in {diffs} trits at round {round}, expected at most 1"
                )));
            }
        }
    }

    Ok(state_a[CAPACITY_START..] == state_b[CAPACITY_START..])
}

/// Advances `state` by exactly one round.
fn step(state: &mut State) {
    let snapshot = *state;
    for i in 0..STATE_LENGTH {
        let a = snapshot[INDICES[i]];
        let b = snapshot[INDICES[i + 1]];
        state[i] = SBOX[(a as isize + 4 * b as isize + 5) as usize];
    }
}
