// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Errors produced by the collision search engine.

use thiserror::Error;

/// Errors that can occur while operating the permutation, template filler, absorber, search
/// coordinator, or external-tool bridge.
///
/// Every fallible condition here is returned as a typed error rather than a panic, so that a
/// caller embedding this crate can decide for itself whether a violated invariant is fatal to the
/// whole process or just to the current search.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied argument violated a length, range, or shape precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A safety invariant the external template generator is supposed to uphold was violated
    /// (e.g. the differential trajectory diverged in more than one trit at `fail_round`, or the
    /// post-success self-check disagreed with the differential permutation's verdict).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The external template-generator subprocess failed: nonzero exit, unparseable output, or
    /// output that didn't match the expected shape.
    #[error("external tool failed: {0}")]
    ExternalTool(String),

    /// A transient or unexpected I/O failure, typically from spawning the template-generator
    /// subprocess.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
