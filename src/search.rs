// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The single-worker randomized try-loop: generate a candidate pair, run the differential
//! permutation, and report either a collision or that the shared stop signal fired.

use crate::error::Error;
use crate::permutation::{permute, permute_cmp};
use crate::template::{fill, Template};
use crate::trit::{MessageBlock, State, CAPACITY_START, MESSAGE_LENGTH, STATE_LENGTH};

use rand::Rng;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Atomics shared by every worker in a single [`crate::coordinator::collide`] call.
pub struct SharedSearchState {
    pub(crate) collisions: AtomicU64,
    pub(crate) stop: AtomicU64,
}

impl SharedSearchState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            collisions: AtomicU64::new(0),
            stop: AtomicU64::new(0),
        })
    }

    fn should_stop(&self, cancel: Option<&Arc<AtomicBool>>) -> bool {
        if self.stop.load(Ordering::SeqCst) > 0 {
            return true;
        }
        matches!(cancel, Some(flag) if flag.load(Ordering::SeqCst))
    }
}

/// What a single worker produced when it stopped searching.
pub struct WorkerOutcome {
    pub attempts: u64,
    pub result: Option<(MessageBlock, MessageBlock)>,
}

/// Runs the randomized try-loop until either a collision pushes the shared counter to
/// `target_collisions`, or the shared stop flag (or an optional external cancellation signal)
/// fires.
///
/// Each attempt: copies `state` into two local buffers, fills the rate section of each from
/// `template` via [`fill`], then runs [`permute_cmp`] on the pair. A `true` result bumps the
/// shared collision counter; if that counter reaches `target_collisions`, this worker's pair is
/// recorded and the loop exits. A worker that exhausts its budget without success (stop raised by
/// a sibling, or cancellation) exits with no result.
///
/// On a reported success, re-applies a single-state [`permute`] to the unpermuted candidate pair
/// and independently re-checks that the capacity sections still agree; disagreement is reported
/// as [`Error::InvariantViolation`] rather than trusting the differential permutation blindly.
///
/// Every exit path — success, exhaustion, or an invariant violation surfaced through `?` —
/// raises the shared stop flag before returning, so a single worker tripping a fatal error cannot
/// leave its siblings (and the coordinator waiting on their joins) spinning forever with no one
/// left to find a collision or signal stop on their behalf.
pub fn search_worker<R: Rng + ?Sized>(
    state: &State,
    template: &Template,
    fail_round: usize,
    target_collisions: u64,
    shared: &SharedSearchState,
    cancel: Option<&Arc<AtomicBool>>,
    rng: &mut R,
) -> Result<WorkerOutcome, Error> {
    let outcome = try_search(state, template, fail_round, target_collisions, shared, cancel, rng);
    shared.stop.fetch_add(1, Ordering::SeqCst);
    outcome
}

fn try_search<R: Rng + ?Sized>(
    state: &State,
    template: &Template,
    fail_round: usize,
    target_collisions: u64,
    shared: &SharedSearchState,
    cancel: Option<&Arc<AtomicBool>>,
    rng: &mut R,
) -> Result<WorkerOutcome, Error> {
    let mut attempts: u64 = 0;

    loop {
        let mut s0: State = *state;
        let mut s1: State = *state;

        fill(
            template,
            (&mut s0[0..MESSAGE_LENGTH]).try_into().unwrap(),
            (&mut s1[0..MESSAGE_LENGTH]).try_into().unwrap(),
            rng,
        );

        let mut msg0: MessageBlock = [0; MESSAGE_LENGTH];
        let mut msg1: MessageBlock = [0; MESSAGE_LENGTH];
        msg0.copy_from_slice(&s0[0..MESSAGE_LENGTH]);
        msg1.copy_from_slice(&s1[0..MESSAGE_LENGTH]);

        let mut cmp_a = s0;
        let mut cmp_b = s1;
        let collided = permute_cmp(&mut cmp_a, &mut cmp_b, fail_round)?;

        if collided {
            let count = shared.collisions.fetch_add(1, Ordering::SeqCst) + 1;
            if count >= target_collisions {
                self_check(&msg0, &msg1, state)?;
                log::debug!("worker found an accepted collision after {attempts} attempts");
                return Ok(WorkerOutcome {
                    attempts,
                    result: Some((msg0, msg1)),
                });
            }
        }

        attempts += 1;

        if shared.should_stop(cancel) {
            log::trace!("worker observed stop/cancel after {attempts} attempts");
            return Ok(WorkerOutcome {
                attempts,
                result: None,
            });
        }
    }
}

/// Re-derives the capacity section from scratch for both message blocks and checks they agree,
/// guarding against a bug in [`permute_cmp`] reporting a false collision.
fn self_check(msg0: &MessageBlock, msg1: &MessageBlock, state: &State) -> Result<(), Error> {
    let mut s0: State = *state;
    let mut s1: State = *state;
    s0[0..MESSAGE_LENGTH].copy_from_slice(msg0);
    s1[0..MESSAGE_LENGTH].copy_from_slice(msg1);
    permute(&mut s0);
    permute(&mut s1);

    if s0[CAPACITY_START..] != s1[CAPACITY_START..] {
        return Err(Error::InvariantViolation(
            "permute_cmp reported a collision but the independent self-check disagreed".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trit::TemplateSymbol;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn stop_flag_observed_without_a_collision() {
        let state: State = [0; STATE_LENGTH];
        let mut symbols = [TemplateSymbol::Vary; MESSAGE_LENGTH];
        symbols[0] = TemplateSymbol::Diff;
        let template = Template::from_symbols(&symbols).unwrap();

        let shared = SharedSearchState::new();
        // Raise stop before ever running: target_collisions impossible to reach (u64::MAX) so
        // the only way to exit is to observe stop, which must happen after the first attempt.
        shared.stop.fetch_add(1, Ordering::SeqCst);
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = search_worker(&state, &template, 0, u64::MAX, &shared, None, &mut rng).unwrap();

        assert_eq!(outcome.attempts, 1);
        assert!(outcome.result.is_none());
    }

    #[test]
    fn invariant_violation_still_raises_stop() {
        let state: State = [0; STATE_LENGTH];
        let mut symbols = [TemplateSymbol::Vary; MESSAGE_LENGTH];
        symbols[0] = TemplateSymbol::Diff;
        let template = Template::from_symbols(&symbols).unwrap();

        let shared = SharedSearchState::new();
        let mut rng = StdRng::seed_from_u64(1);
        // An arbitrary template (not one produced by a real differential template generator
        // that curates the trajectory) is expected to diverge by more than one trit well before
        // round 10, tripping the fail_round invariant checkpoint.
        let err = search_worker(&state, &template, 10, u64::MAX, &shared, None, &mut rng).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
        assert!(
            shared.stop.load(Ordering::SeqCst) > 0,
            "stop must be raised even when a worker exits via an invariant violation"
        );
    }

    #[test]
    fn cancel_signal_stops_worker() {
        let state: State = [0; STATE_LENGTH];
        let mut symbols = [TemplateSymbol::Vary; MESSAGE_LENGTH];
        symbols[0] = TemplateSymbol::Diff;
        let template = Template::from_symbols(&symbols).unwrap();

        let shared = SharedSearchState::new();
        let cancel = Arc::new(AtomicBool::new(true));
        let mut rng = StdRng::seed_from_u64(1);
        let outcome =
            search_worker(&state, &template, 0, u64::MAX, &shared, Some(&cancel), &mut rng).unwrap();

        assert_eq!(outcome.attempts, 1);
        assert!(outcome.result.is_none());
    }
}
