//! Portfolio report executable.
//!
//! Usage: `adaptrack_cli <db-path>`
//!
//! Environment:
//! - `ADAPTRACK_LOG_LEVEL`: log level, defaults to the build-mode default.
//! - `ADAPTRACK_LOG_DIR`: absolute log directory; file logging is off when unset.
//! - `ADAPTRACK_YEAR`: evaluation year, defaults to the current calendar year.
//! - `ADAPTRACK_CONFIDENCE`: 0.80, 0.90 or 0.95 (default).

use adaptrack_core::db::open_db;
use adaptrack_core::portfolio::PortfolioReport;
use adaptrack_core::{
    core_version, default_log_level, init_logging, ConfidenceLevel, EvaluationOptions,
    PortfolioQuery, ProjectService, SqliteProjectRepository,
};
use chrono::Datelike;
use log::{error, info};
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(db_path) = std::env::args().nth(1) else {
        println!("adaptrack_core version={}", core_version());
        return ExitCode::SUCCESS;
    };

    if let Ok(log_dir) = std::env::var("ADAPTRACK_LOG_DIR") {
        let level = std::env::var("ADAPTRACK_LOG_LEVEL")
            .unwrap_or_else(|_| default_log_level().to_string());
        if let Err(err) = init_logging(&level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let options = match evaluation_options() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let conn = match open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("cannot open database `{db_path}`: {err}");
            return ExitCode::FAILURE;
        }
    };

    let service = ProjectService::new(SqliteProjectRepository::new(&conn));
    match service.portfolio(&PortfolioQuery::default(), &options) {
        Ok(report) => {
            info!(
                "event=cli_report module=cli status=ok evaluated={} failed={}",
                report.summary.evaluated, report.summary.failed
            );
            print_report(&report, &options);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_report module=cli status=error error={err}");
            eprintln!("cannot read projects: {err}");
            ExitCode::FAILURE
        }
    }
}

fn evaluation_options() -> Result<EvaluationOptions, String> {
    let year = match std::env::var("ADAPTRACK_YEAR") {
        Ok(raw) => raw
            .trim()
            .parse::<i32>()
            .map_err(|_| format!("invalid ADAPTRACK_YEAR `{raw}`"))?,
        Err(_) => chrono::Local::now().year(),
    };

    let mut options = EvaluationOptions::for_year(year);
    if let Ok(raw) = std::env::var("ADAPTRACK_CONFIDENCE") {
        let probability = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid ADAPTRACK_CONFIDENCE `{raw}`"))?;
        options.confidence = ConfidenceLevel::from_probability(probability)
            .map_err(|err| format!("invalid ADAPTRACK_CONFIDENCE `{raw}`: {err}"))?;
    }
    Ok(options)
}

fn print_report(report: &PortfolioReport, options: &EvaluationOptions) {
    let summary = &report.summary;
    println!(
        "summary year={} confidence={} total={} evaluated={} failed={} skipped={}",
        options.current_year,
        options.confidence.probability(),
        summary.total,
        summary.evaluated,
        summary.failed,
        summary.skipped
    );
    for (status, count) in &summary.by_status {
        println!(
            "status name={} count={} share_pct={:.1}",
            status.as_str(),
            count,
            summary.share_pct.get(status).copied().unwrap_or(0.0)
        );
    }

    for row in &report.rows {
        let years = row
            .years_to_target
            .map_or_else(|| "unreachable".to_string(), |years| format!("{years:.1}"));
        println!(
            "project id={} team={:?} system={:?} status={} quality={} stars={} impact={:.2} priority={} years_to_target={} target_year={} progress_pct={:.1} rate_per_year={:.4} model={}",
            row.project_id,
            row.team_name,
            row.system_name,
            row.status.as_str(),
            row.quality_score,
            row.quality_stars,
            row.impact_score,
            row.impact_priority.as_str(),
            years,
            row.target_year,
            row.progress_pct,
            row.rate_per_year,
            row.model.as_str()
        );
    }

    for failure in &report.failures {
        println!(
            "failure id={} stage={:?} error={:?}",
            failure.project_id, failure.stage, failure.message
        );
    }
}
