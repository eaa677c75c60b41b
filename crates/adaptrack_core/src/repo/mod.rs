//! Repository layer for persisted projects.
//!
//! # Invariants
//! - Writes enforce `Project::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Duplicate`) in
//!   addition to DB transport errors.

pub mod project_repo;
