// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Builder and orchestrator for a parallel differential collision search.
//!
//! Mirrors the shape of a proof-of-work miner: a [`CollideBuilder`] configures the number of
//! workers, the collision target, and an optional external cancellation signal; [`Collider::run`]
//! spawns the workers, waits for them to finish, and returns the first accepted collision.

use crate::error::Error;
use crate::search::{search_worker, SharedSearchState, WorkerOutcome};
use crate::template::Template;
use crate::trit::{MessageBlock, State, STATE_LENGTH};

use rand::rngs::StdRng;
use rand::SeedableRng;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

/// The outcome of a completed search: the winning message pair, if any, and bookkeeping totals.
#[derive(Debug)]
pub struct CollideResult {
    /// The two 243-trit candidate blocks that collided in the capacity section, if the search
    /// found `target_collisions` of them before stopping.
    pub blocks: Option<(MessageBlock, MessageBlock)>,
    /// Total attempts made across every worker.
    pub total_attempts: u64,
    /// Wall-clock time spent inside [`Collider::run`].
    pub elapsed: std::time::Duration,
}

/// Builder for a [`Collider`], following the same `with_*` chaining style as a proof-of-work
/// miner builder: every field has a sensible default, and only the fields a caller cares about
/// need to be set.
pub struct CollideBuilder {
    num_workers: usize,
    target_collisions: u64,
    fail_round: usize,
    seed: Option<u64>,
    signal: Option<Arc<AtomicBool>>,
}

impl Default for CollideBuilder {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get().max(1),
            target_collisions: 1,
            fail_round: 0,
            seed: None,
            signal: None,
        }
    }
}

impl CollideBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of worker threads. Defaults to the number of logical CPUs.
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Sets how many differential collisions must be observed (by any worker, in total) before
    /// the search stops. Defaults to `1`.
    pub fn with_target_collisions(mut self, target_collisions: u64) -> Self {
        self.target_collisions = target_collisions;
        self
    }

    /// Sets the round at which [`crate::permutation::permute_cmp`] checks that the two
    /// trajectories have not diverged by more than one trit. `0` disables the checkpoint.
    pub fn with_fail_round(mut self, fail_round: usize) -> Self {
        self.fail_round = fail_round;
        self
    }

    /// Sets the master seed workers derive their per-worker RNG from. Without one, the current
    /// time is used, matching the non-reproducible default of an interactively launched search.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Registers an external cancellation signal a caller can raise to stop the search early,
    /// independent of whether a collision was ever found.
    pub fn with_signal(mut self, signal: Arc<AtomicBool>) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn finish(self) -> Collider {
        Collider {
            num_workers: self.num_workers,
            target_collisions: self.target_collisions,
            fail_round: self.fail_round,
            seed: self.seed,
            signal: self.signal,
        }
    }
}

/// A configured collision search, ready to run against a particular starting state and template.
pub struct Collider {
    num_workers: usize,
    target_collisions: u64,
    fail_round: usize,
    seed: Option<u64>,
    signal: Option<Arc<AtomicBool>>,
}

impl Collider {
    /// Runs the search to completion and returns the result.
    ///
    /// Spawns `num_workers` threads, each running [`search_worker`] against its own seeded
    /// [`StdRng`] derived from `config.seed.unwrap_or_else(current time) ^ worker_index`, so that
    /// two workers never retrace the same random sequence. Every worker shares one
    /// [`SharedSearchState`] (the collision counter and stop flag) and, if configured, the same
    /// external cancellation signal.
    ///
    /// Workers report their outcome as a thread `Result<WorkerOutcome, Error>` return value,
    /// collected via [`std::thread::JoinHandle::join`]; there is no shared error slot. The first
    /// worker whose join panics is surfaced as [`Error::InvariantViolation`]; the first
    /// `Ok(Err(_))` worker error is returned as-is, after every handle has been joined so that no
    /// thread is left detached.
    pub fn run(&self, state: &State, template: &Template) -> Result<CollideResult, Error> {
        if self.num_workers == 0 {
            return Err(Error::InvalidArgument(
                "num_workers must be at least 1".to_string(),
            ));
        }
        if self.target_collisions == 0 {
            return Err(Error::InvalidArgument(
                "target_collisions must be at least 1".to_string(),
            ));
        }
        if self.fail_round >= crate::permutation::NUM_ROUNDS {
            return Err(Error::InvalidArgument(format!(
                "fail_round must be in [0, {}), got {}",
                crate::permutation::NUM_ROUNDS,
                self.fail_round
            )));
        }

        let started = Instant::now();
        let shared = SharedSearchState::new();
        let master_seed = self.seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        });

        log::info!(
            "starting collision search: {} workers, target_collisions = {}, fail_round = {}",
            self.num_workers,
            self.target_collisions,
            self.fail_round
        );

        let mut handles = Vec::with_capacity(self.num_workers);
        for worker_index in 0..self.num_workers {
            let state = *state;
            let template = template.clone();
            let shared = Arc::clone(&shared);
            let signal = self.signal.clone();
            let fail_round = self.fail_round;
            let target_collisions = self.target_collisions;
            let worker_seed = master_seed ^ (worker_index as u64);

            handles.push(std::thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(worker_seed);
                search_worker(
                    &state,
                    &template,
                    fail_round,
                    target_collisions,
                    &shared,
                    signal.as_ref(),
                    &mut rng,
                )
            }));
        }

        let mut total_attempts: u64 = 0;
        let mut found: Option<(MessageBlock, MessageBlock)> = None;
        let mut first_error: Option<Error> = None;

        for handle in handles {
            match handle.join() {
                Ok(Ok(WorkerOutcome { attempts, result })) => {
                    total_attempts += attempts;
                    if found.is_none() {
                        found = result;
                    }
                }
                Ok(Err(err)) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(_) => {
                    if first_error.is_none() {
                        first_error = Some(Error::InvariantViolation(
                            "a search worker thread panicked".to_string(),
                        ));
                    }
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        let elapsed = started.elapsed();
        log::info!(
            "collision search finished: {} attempts in {:?}, collision {}",
            total_attempts,
            elapsed,
            if found.is_some() { "found" } else { "not found" }
        );

        Ok(CollideResult {
            blocks: found,
            total_attempts,
            elapsed,
        })
    }
}

/// The direct, spec-shaped entry point: runs a collision search with the given worker count,
/// collision target, and fail round, using the default master-seed derivation (current time
/// mixed with the worker index) and no external cancellation signal.
///
/// Equivalent to `CollideBuilder::new().with_num_workers(n_workers)
/// .with_target_collisions(target_collisions).with_fail_round(fail_round).finish().run(state,
/// template)`. Kept alongside [`CollideBuilder`] for callers that don't need the builder's extra
/// knobs (a master seed or an external signal).
pub fn collide(
    state: &State,
    template: &Template,
    n_workers: usize,
    target_collisions: u64,
    fail_round: usize,
) -> Result<CollideResult, Error> {
    CollideBuilder::new()
        .with_num_workers(n_workers)
        .with_target_collisions(target_collisions)
        .with_fail_round(fail_round)
        .finish()
        .run(state, template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trit::TemplateSymbol;

    #[test]
    fn rejects_zero_workers() {
        let state: State = [0; STATE_LENGTH];
        let mut symbols = [TemplateSymbol::Vary; crate::trit::MESSAGE_LENGTH];
        symbols[0] = TemplateSymbol::Diff;
        let template = Template::from_symbols(&symbols).unwrap();

        let collider = CollideBuilder::new().with_num_workers(0).finish();
        assert!(matches!(
            collider.run(&state, &template),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_zero_target_collisions() {
        let state: State = [0; STATE_LENGTH];
        let mut symbols = [TemplateSymbol::Vary; crate::trit::MESSAGE_LENGTH];
        symbols[0] = TemplateSymbol::Diff;
        let template = Template::from_symbols(&symbols).unwrap();

        let collider = CollideBuilder::new()
            .with_target_collisions(0)
            .finish();
        assert!(matches!(
            collider.run(&state, &template),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_fail_round() {
        let state: State = [0; STATE_LENGTH];
        let mut symbols = [TemplateSymbol::Vary; crate::trit::MESSAGE_LENGTH];
        symbols[0] = TemplateSymbol::Diff;
        let template = Template::from_symbols(&symbols).unwrap();

        let collider = CollideBuilder::new()
            .with_fail_round(crate::permutation::NUM_ROUNDS)
            .finish();
        assert!(matches!(
            collider.run(&state, &template),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn free_function_delegates_to_the_builder() {
        let state: State = [0; STATE_LENGTH];
        let mut symbols = [TemplateSymbol::Vary; crate::trit::MESSAGE_LENGTH];
        symbols[0] = TemplateSymbol::Diff;
        let template = Template::from_symbols(&symbols).unwrap();

        assert!(matches!(
            collide(&state, &template, 0, 1, 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn stops_immediately_when_signal_is_already_raised() {
        let state: State = [0; STATE_LENGTH];
        let mut symbols = [TemplateSymbol::Vary; crate::trit::MESSAGE_LENGTH];
        symbols[0] = TemplateSymbol::Diff;
        let template = Template::from_symbols(&symbols).unwrap();

        let signal = Arc::new(AtomicBool::new(true));
        let collider = CollideBuilder::new()
            .with_num_workers(2)
            .with_target_collisions(u64::MAX)
            .with_signal(signal)
            .with_seed(1)
            .finish();

        let result = collider.run(&state, &template).unwrap();
        assert!(result.blocks.is_none());
        // Each worker checks the signal only after its first attempt.
        assert_eq!(result.total_attempts, 2);
    }
}
