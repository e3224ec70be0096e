//! Index building.
//!
//! # Error Handling Strategy
//!
//! Rescans degrade gracefully instead of failing:
//!
//! - **Candidate-level failures**: an [`ExtractError`](crate::adapters::ExtractError)
//!   drops that candidate only; the rest of the scan continues.
//! - **Unresolved container**: the scan is abandoned with
//!   [`RescanOutcome::ContainerUnresolved`] and the runtime retries later.
//! - **Empty reads**: an empty draft never wipes a populated index unless the
//!   conversation changed ([`RescanOutcome::Retained`]).
//!
//! None of these reach the user; they are reported through `tracing` at
//! debug/info level.

pub mod builder;
pub mod diff;

pub use builder::{Draft, RescanOutcome, assign_serials, collect, commit, rescan};
pub use diff::IndexDiff;
