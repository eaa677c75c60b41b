//! Adaptation-project projection and portfolio scoring.
//!
//! The `engine` module is pure and storage-agnostic; `db`, `repo` and
//! `service` load persisted projects and hand them to it.

pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod portfolio;
pub mod repo;
pub mod service;

pub use engine::error::{EngineError, EngineResult, InvalidInput};
pub use engine::evaluate::{evaluate_project, ProjectEvaluation};
pub use engine::impact::{ImpactPriority, ImpactScore};
pub use engine::options::{ConfidenceLevel, EvaluationOptions, ImpactWeights};
pub use engine::projection::{Horizon, Projection, ProjectionModel};
pub use engine::quality::{QualityAssessment, QualityBand};
pub use engine::rate::{RateBound, RateEstimate, RateKind};
pub use engine::status::ProjectStatus;
pub use engine::target::{TargetEstimate, TimeToTarget};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::project::{
    Environment, ImpactDimensions, ImprovementDirection, ModelKind, ModelSpec, Project, ProjectId,
    ProjectValidationError, SelectionMethod, TargetKind, TargetLevel, TargetSpec,
};
pub use portfolio::{aggregate, PortfolioQuery, PortfolioReport, PortfolioRow, SortKey};
pub use repo::project_repo::{
    ProjectListQuery, ProjectRepository, RepoError, RepoResult, SqliteProjectRepository,
};
pub use service::project_service::{ProjectService, ServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
