//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `projects` table.
//! - Keep SQL and JSON payload details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Project::validate()` before SQL mutations.
//! - Read paths re-validate and reject invalid persisted state instead of
//!   masking it.
//! - `last_updated_ms` is owned by storage; the stored `updated_at` column
//!   wins over whatever the payload carries.

use crate::db::DbError;
use crate::model::project::{Project, ProjectId, ProjectValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PROJECT_SELECT_SQL: &str = "SELECT
    project_id,
    payload,
    updated_at
FROM projects";

const NOW_MS_SQL: &str = "(CAST(strftime('%s', 'now') AS INTEGER) * 1000)";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(ProjectValidationError),
    Db(DbError),
    NotFound(ProjectId),
    /// Row already exists under this ID.
    Duplicate(ProjectId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "project not found: {id}"),
            Self::Duplicate(id) => write!(f, "project already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted project data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Duplicate(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ProjectValidationError> for RepoError {
    fn from(value: ProjectValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter and pagination for listing projects.
#[derive(Debug, Clone, Default)]
pub struct ProjectListQuery {
    pub team_name: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// One stored row decoded independently of its neighbours.
#[derive(Debug)]
pub struct StoredProject {
    /// Raw `project_id` column text.
    pub project_id: String,
    pub record: RepoResult<Project>,
}

pub trait ProjectRepository {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId>;
    fn update_project(&self, project: &Project) -> RepoResult<()>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Fails on the first invalid row.
    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>>;
    /// Like `list_projects` but decodes each row on its own, so one bad row
    /// does not hide the rest.
    fn scan_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<StoredProject>>;
    fn delete_project(&self, id: ProjectId) -> RepoResult<()>;
}

pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn select_rows<T>(
        &self,
        query: &ProjectListQuery,
        mut decode: impl FnMut(&Row<'_>) -> RepoResult<T>,
    ) -> RepoResult<Vec<T>> {
        let mut sql = format!("{PROJECT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(team) = &query.team_name {
            sql.push_str(" AND team_name = ?");
            bind_values.push(Value::Text(team.clone()));
        }

        sql.push_str(" ORDER BY team_name ASC, system_name ASC, project_id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(decode(row)?);
        }
        Ok(out)
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        project.validate()?;
        let payload = encode_payload(project)?;

        let result = self.conn.execute(
            &format!(
                "INSERT INTO projects (
                    project_id,
                    team_name,
                    system_name,
                    payload,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, {NOW_MS_SQL}, {NOW_MS_SQL});"
            ),
            params![
                project.project_id.to_string(),
                project.team_name.as_str(),
                project.system_name.as_str(),
                payload,
            ],
        );

        match result {
            Ok(_) => Ok(project.project_id),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(RepoError::Duplicate(project.project_id))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_project(&self, project: &Project) -> RepoResult<()> {
        project.validate()?;
        let payload = encode_payload(project)?;

        let changed = self.conn.execute(
            &format!(
                "UPDATE projects
                 SET
                    team_name = ?1,
                    system_name = ?2,
                    payload = ?3,
                    updated_at = {NOW_MS_SQL}
                 WHERE project_id = ?4;"
            ),
            params![
                project.team_name.as_str(),
                project.system_name.as_str(),
                payload,
                project.project_id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(project.project_id));
        }
        Ok(())
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE project_id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>> {
        self.select_rows(query, parse_project_row)
    }

    fn scan_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<StoredProject>> {
        self.select_rows(query, |row| {
            Ok(StoredProject {
                project_id: row.get("project_id")?,
                record: parse_project_row(row),
            })
        })
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE project_id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn encode_payload(project: &Project) -> RepoResult<String> {
    serde_json::to_string(project)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode project payload: {err}")))
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id_text: String = row.get("project_id")?;
    let project_id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in projects.project_id"))
    })?;

    let payload: String = row.get("payload")?;
    let mut project: Project = serde_json::from_str(&payload).map_err(|err| {
        RepoError::InvalidData(format!("malformed payload for project `{id_text}`: {err}"))
    })?;

    if project.project_id != project_id {
        return Err(RepoError::InvalidData(format!(
            "payload id `{}` does not match row id `{id_text}`",
            project.project_id
        )));
    }

    project.last_updated_ms = row.get("updated_at")?;
    project.validate()?;
    Ok(project)
}
