//! Project use-case service.
//!
//! # Responsibility
//! - Provide CRUD entry points over a `ProjectRepository`.
//! - Load stored projects and run per-project or portfolio evaluation.
//!
//! # Invariants
//! - Evaluation results are derived on every call and never written back.
//! - A stored row that cannot be loaded is recorded as a portfolio failure,
//!   never fatal to the run.

use crate::engine::error::EngineError;
use crate::engine::evaluate::{evaluate_project, ProjectEvaluation};
use crate::engine::options::EvaluationOptions;
use crate::model::project::{Project, ProjectId};
use crate::portfolio::{aggregate, FailureStage, PortfolioQuery, PortfolioReport, RowFailure};
use crate::repo::project_repo::{ProjectListQuery, ProjectRepository, RepoError, RepoResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure of a load-then-evaluate call.
#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    Engine(EngineError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Engine(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<EngineError> for ServiceError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        self.repo.create_project(project)
    }

    pub fn update_project(&self, project: &Project) -> RepoResult<()> {
        self.repo.update_project(project)
    }

    pub fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        self.repo.get_project(id)
    }

    pub fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>> {
        self.repo.list_projects(query)
    }

    pub fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        self.repo.delete_project(id)
    }

    /// Loads one project and evaluates it.
    ///
    /// # Errors
    /// - `ServiceError::Repo(RepoError::NotFound)` for unknown IDs.
    /// - `ServiceError::Engine` when the record cannot be evaluated.
    pub fn evaluate_project(
        &self,
        id: ProjectId,
        options: &EvaluationOptions,
    ) -> Result<ProjectEvaluation, ServiceError> {
        let project = self.repo.get_project(id)?.ok_or(RepoError::NotFound(id))?;
        Ok(evaluate_project(&project, options)?)
    }

    /// Loads every stored project and aggregates them.
    ///
    /// Rows that fail to decode are reported in `PortfolioReport::failures`
    /// with `FailureStage::Load`.
    ///
    /// # Errors
    /// - Only when the table itself cannot be read.
    pub fn portfolio(
        &self,
        query: &PortfolioQuery,
        options: &EvaluationOptions,
    ) -> RepoResult<PortfolioReport> {
        let mut projects = Vec::new();
        let mut failures = Vec::new();
        for stored in self.repo.scan_projects(&ProjectListQuery::default())? {
            match stored.record {
                Ok(project) => projects.push(project),
                Err(err) => failures.push(RowFailure {
                    project_id: stored.project_id,
                    stage: FailureStage::Load,
                    message: err.to_string(),
                }),
            }
        }

        let mut report = aggregate(&projects, query, options);
        report.record_failures(failures);
        Ok(report)
    }
}
