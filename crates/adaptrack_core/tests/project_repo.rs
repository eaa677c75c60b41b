use adaptrack_core::db::{open_db, open_db_in_memory};
use adaptrack_core::portfolio::FailureStage;
use adaptrack_core::{
    EvaluationOptions, ModelSpec, PortfolioQuery, Project, ProjectListQuery, ProjectRepository,
    ProjectService, ProjectStatus, ProjectValidationError, RepoError, ServiceError,
    SqliteProjectRepository, TargetSpec,
};
use uuid::Uuid;

fn coral(team: &str) -> Project {
    let mut project = Project::new(team, "Coral", 2022);
    project.phenotype = "thermal tolerance".to_string();
    project.w0 = 28.5;
    project.w_current = 30.2;
    project.generations_observed = 8.0;
    project.generation_time_years = 0.5;
    project.target = TargetSpec::fold(2.0);
    project.target_date = 2200;
    project.dw_se = 0.3;
    project.contact_email = "lead@reef.example.org".to_string();
    project
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::new(&conn);

    let project = coral("Reef Lab");
    let id = repo.create_project(&project).unwrap();
    assert_eq!(id, project.project_id);

    let loaded = repo.get_project(id).unwrap().unwrap();
    assert!(loaded.last_updated_ms > 0);
    assert_eq!(
        Project {
            last_updated_ms: project.last_updated_ms,
            ..loaded
        },
        project
    );
}

#[test]
fn unknown_id_reads_as_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::new(&conn);
    assert!(repo.get_project(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn invalid_project_is_rejected_before_write() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::new(&conn);

    let mut project = coral("Reef Lab");
    project.generations_observed = 0.0;
    let err = repo.create_project(&project).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ProjectValidationError::NonPositiveGenerations(_))
    ));
    assert!(repo
        .list_projects(&ProjectListQuery::default())
        .unwrap()
        .is_empty());
}

#[test]
fn duplicate_create_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::new(&conn);
    let project = coral("Reef Lab");
    repo.create_project(&project).unwrap();

    let err = repo.create_project(&project).unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(id) if id == project.project_id));
}

#[test]
fn update_and_delete_existing_project() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::new(&conn);

    let mut project = coral("Reef Lab");
    repo.create_project(&project).unwrap();

    project.w_current = 31.0;
    project.team_name = "Reef Lab North".to_string();
    repo.update_project(&project).unwrap();
    let loaded = repo.get_project(project.project_id).unwrap().unwrap();
    assert_eq!(loaded.w_current, 31.0);
    assert_eq!(loaded.team_name, "Reef Lab North");

    repo.delete_project(project.project_id).unwrap();
    assert!(repo.get_project(project.project_id).unwrap().is_none());
    assert!(matches!(
        repo.delete_project(project.project_id),
        Err(RepoError::NotFound(_))
    ));
    assert!(matches!(
        repo.update_project(&project),
        Err(RepoError::NotFound(_))
    ));
}

#[test]
fn list_filters_by_team_and_paginates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::new(&conn);
    for team in ["Alpha", "Beta", "Beta", "Gamma"] {
        repo.create_project(&coral(team)).unwrap();
    }

    let betas = repo
        .list_projects(&ProjectListQuery {
            team_name: Some("Beta".to_string()),
            ..ProjectListQuery::default()
        })
        .unwrap();
    assert_eq!(betas.len(), 2);

    let page = repo
        .list_projects(&ProjectListQuery {
            limit: Some(2),
            offset: 1,
            ..ProjectListQuery::default()
        })
        .unwrap();
    let teams: Vec<&str> = page.iter().map(|p| p.team_name.as_str()).collect();
    assert_eq!(teams, ["Beta", "Beta"]);

    let tail = repo
        .list_projects(&ProjectListQuery {
            offset: 3,
            ..ProjectListQuery::default()
        })
        .unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].team_name, "Gamma");
}

#[test]
fn persisted_invalid_state_is_not_masked() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::new(&conn);
    let project = coral("Reef Lab");
    repo.create_project(&project).unwrap();

    conn.execute(
        "UPDATE projects SET payload = json_set(payload, '$.generation_time_years', -1.0) WHERE project_id = ?1;",
        [project.project_id.to_string()],
    )
    .unwrap();

    let err = repo.get_project(project.project_id).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ProjectValidationError::NonPositiveGenerationTime(_))
    ));
}

#[test]
fn data_survives_reopening_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("portfolio.db");
    let project = coral("Reef Lab");

    {
        let conn = open_db(&path).unwrap();
        SqliteProjectRepository::new(&conn)
            .create_project(&project)
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let loaded = SqliteProjectRepository::new(&conn)
        .get_project(project.project_id)
        .unwrap()
        .unwrap();
    assert_eq!(loaded.project_id, project.project_id);
    assert_eq!(loaded.target, project.target);
}

#[test]
fn service_evaluates_stored_project() {
    let conn = open_db_in_memory().unwrap();
    let service = ProjectService::new(SqliteProjectRepository::new(&conn));
    let project = coral("Reef Lab");
    service.create_project(&project).unwrap();

    let evaluation = service
        .evaluate_project(project.project_id, &EvaluationOptions::for_year(2025))
        .unwrap();
    assert_eq!(evaluation.project_id, project.project_id);
    assert!(evaluation.primary.years.slower.is_some());

    let missing = service.evaluate_project(Uuid::new_v4(), &EvaluationOptions::for_year(2025));
    assert!(matches!(
        missing,
        Err(ServiceError::Repo(RepoError::NotFound(_)))
    ));
}

#[test]
fn service_portfolio_records_unloadable_rows() {
    let conn = open_db_in_memory().unwrap();
    let service = ProjectService::new(SqliteProjectRepository::new(&conn));

    let healthy = coral("Reef Lab");
    let mut broken = coral("Moss Group");
    broken.model = ModelSpec {
        plateau: None,
        ..ModelSpec::logistic(0.0)
    };
    service.create_project(&healthy).unwrap();
    service.create_project(&broken).unwrap();
    conn.execute(
        "INSERT INTO projects (project_id, team_name, system_name, payload, created_at, updated_at)
         VALUES ('legacy-row', 'Zeta', 'Old', '{\"team_name\": \"Zeta\"}', 1, 1);",
        [],
    )
    .unwrap();

    let report = service
        .portfolio(&PortfolioQuery::default(), &EvaluationOptions::for_year(2025))
        .unwrap();

    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.evaluated, 1);
    assert_eq!(report.summary.failed, 2);
    assert_eq!(report.summary.count(ProjectStatus::OnTrack), 1);

    let stages: Vec<FailureStage> = report.failures.iter().map(|f| f.stage).collect();
    assert!(stages.contains(&FailureStage::Evaluate));
    assert!(stages.contains(&FailureStage::Load));
    let load = report
        .failures
        .iter()
        .find(|f| f.stage == FailureStage::Load)
        .unwrap();
    assert_eq!(load.project_id, "legacy-row");
}
