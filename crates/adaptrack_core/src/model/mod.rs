//! Domain model for adaptation projects.
//!
//! # Responsibility
//! - Define the persisted project record and its typed sub-structures.
//! - Keep derived values out of the model; they live in `crate::engine`.
//!
//! # Invariants
//! - Every project is identified by a stable `ProjectId`.
//! - A record that fails `Project::validate()` never reaches the engine.

pub mod project;
