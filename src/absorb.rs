// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Reconstructing intermediate sponge state by absorbing a prefix of a trit stream.

use crate::error::Error;
use crate::permutation::permute;
use crate::trit::{State, Trit, MESSAGE_LENGTH, STATE_LENGTH};

/// Absorbs `trits[0 .. (last_block_index + 1) * MESSAGE_LENGTH]` into a fresh, zero-initialized
/// state and returns it.
///
/// For each block index `k` from `0` through `last_block_index` inclusive, the rate section of
/// the state is overwritten with `trits[k * MESSAGE_LENGTH .. (k + 1) * MESSAGE_LENGTH]` and the
/// permutation is applied. Used to reconstruct the sponge state at any absorption boundary
/// without replaying an entire multi-block message.
pub fn produce_state(trits: &[Trit], last_block_index: usize) -> Result<State, Error> {
    if trits.len() % MESSAGE_LENGTH != 0 {
        return Err(Error::InvalidArgument(format!(
            "trit stream length must be a multiple of {MESSAGE_LENGTH}, got {}",
            trits.len()
        )));
    }

    let required = (last_block_index + 1) * MESSAGE_LENGTH;
    if trits.len() < required {
        return Err(Error::InvalidArgument(format!(
            "need at least {required} trits to absorb through block {last_block_index}, got {}",
            trits.len()
        )));
    }

    let mut state: State = [0; STATE_LENGTH];
    for k in 0..=last_block_index {
        let block = &trits[k * MESSAGE_LENGTH..(k + 1) * MESSAGE_LENGTH];
        state[0..MESSAGE_LENGTH].copy_from_slice(block);
        permute(&mut state);
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_input() {
        let trits = vec![0i8; MESSAGE_LENGTH];
        assert!(matches!(
            produce_state(&trits, 1),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_a_length_that_is_not_a_multiple_of_message_length() {
        let trits = vec![0i8; MESSAGE_LENGTH + 57];
        assert!(matches!(
            produce_state(&trits, 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn single_block_matches_one_permute_call() {
        let trits = vec![1i8; MESSAGE_LENGTH];
        let state = produce_state(&trits, 0).unwrap();

        let mut expected: State = [0; STATE_LENGTH];
        expected[0..MESSAGE_LENGTH].copy_from_slice(&trits);
        permute(&mut expected);

        assert_eq!(state, expected);
    }

    #[test]
    fn incremental_absorption_matches_single_pass() {
        let mut trits = Vec::with_capacity(MESSAGE_LENGTH * 3);
        for block in 0..3 {
            for i in 0..MESSAGE_LENGTH {
                trits.push(((block * 7 + i) % 3) as i8 - 1);
            }
        }

        let incremental_0 = produce_state(&trits, 0).unwrap();
        let incremental_2 = produce_state(&trits, 2).unwrap();

        // Re-deriving block-2 state by hand from block-0 state must agree with produce_state
        // applied directly through block 2 in one call.
        let mut manual = incremental_0;
        for k in 1..=2 {
            let block = &trits[k * MESSAGE_LENGTH..(k + 1) * MESSAGE_LENGTH];
            manual[0..MESSAGE_LENGTH].copy_from_slice(block);
            permute(&mut manual);
        }

        assert_eq!(manual, incremental_2);
    }
}
