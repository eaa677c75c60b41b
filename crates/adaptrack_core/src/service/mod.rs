//! Use-case services.
//!
//! # Responsibility
//! - Load records through repositories and hand them to the engine.
//! - Keep callers decoupled from storage details.

pub mod project_service;
