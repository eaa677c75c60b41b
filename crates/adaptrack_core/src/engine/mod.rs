//! Projection and scoring engine.
//!
//! # Responsibility
//! - Turn a validated `Project` into rate, trajectory, time-to-target,
//!   quality, impact and status values.
//!
//! # Invariants
//! - Every function is pure and synchronous; no I/O, clock or global state.
//! - Data flows rate -> projection -> time-to-target -> {status, impact};
//!   status and impact do not depend on each other.

pub mod error;
pub mod evaluate;
pub mod impact;
pub mod options;
pub mod projection;
pub mod quality;
pub mod rate;
pub mod status;
pub mod target;
pub mod trajectory;
