// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Parallel differential collision search over a 27-round, 729-trit ternary sponge permutation.
//!
//! This crate reconstructs a two-track variant of the permutation used by an IOTA-style ledger's
//! hash function, runs many randomized trials in parallel looking for two message blocks whose
//! capacity sections agree after the permutation, and exposes the supporting pieces (the index
//! and S-box tables, the template-driven message generator, and a block-absorbing state
//! reconstructor) as a library so they can be composed outside of the search itself.

#![warn(missing_docs)]
#![allow(clippy::many_single_char_names)]

pub mod absorb;
pub mod bridge;
pub mod coordinator;
pub mod error;
pub mod indices;
pub mod logging;
pub mod permutation;
pub mod search;
pub mod template;
pub mod trit;

pub use coordinator::{collide, CollideBuilder, CollideResult, Collider};
pub use error::Error;
pub use template::Template;
pub use trit::{MessageBlock, State, TemplateSymbol, Trit, CAPACITY_START, MESSAGE_LENGTH, STATE_LENGTH};
