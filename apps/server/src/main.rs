//! CI results sync - command-line entry point.
//!
//! Usage:
//!   ci-results-sync sync                  Sync the latest build of every job
//!   ci-results-sync sync <job>            Sync the latest build of one job
//!   ci-results-sync latest [job]          Latest stored result per job, or for one job
//!   ci-results-sync stats                 Statistics over the latest build of each job
//!   ci-results-sync cases <build-id>      Stored test cases of a build
//!   ci-results-sync detail <job> <build>  Test cases of a build, extracted live if not stored
//!   ci-results-sync notes <build-id> <bugs> [reasons]
//!   ci-results-sync frequencies           Distinct job frequency labels
//!   ci-results-sync ping                  Check the Jenkins connection
//!   ci-results-sync watch                 Sync periodically until interrupted
//!   ci-results-sync --health-check        Exit 0 if configuration loads

use std::env;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use ci_results_lib::config::Config;
use ci_results_lib::db::{DbPool, ResultStore};
use ci_results_lib::error::{AppError, AppResult};
use ci_results_lib::models::BuildNotes;
use ci_results_lib::services::{start_sync_task, CiResultsService};

/// Perform health check (for Docker healthcheck).
fn health_check() -> bool {
    Config::from_env().is_ok()
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "--health-check") {
        std::process::exit(if health_check() { 0 } else { 1 });
    }

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    // Logs go to stderr; stdout carries command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, CRS_DB_URL and CRS_JENKINS_URL must be set");
            error!("  - CRS_JENKINS_USERNAME and CRS_JENKINS_TOKEN must be set together");
            std::process::exit(1);
        }
    };

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let pool = match DbPool::new(&config).await {
        Ok(p) => p,
        Err(e) => fail(e),
    };
    if let Err(e) = pool.run_migrations().await {
        fail(e);
    }

    let store: Arc<dyn ResultStore> = Arc::new(pool);
    let service = match CiResultsService::from_config(&config, store) {
        Ok(s) => s,
        Err(e) => fail(e),
    };

    match run_command(&service, &config, &args[1..]).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => fail(e.into()),
        },
        Err(e) => fail(e),
    }
}

async fn run_command(service: &CiResultsService, config: &Config, args: &[String]) -> AppResult<Value> {
    let arg = |i: usize| args.get(i).map(String::as_str);

    let output = match (arg(0), arg(1)) {
        (Some("sync"), None) => to_json(service.sync_all_jobs().await?)?,
        (Some("sync"), Some(job)) => to_json(service.sync_job(job).await)?,
        (Some("latest"), None) => to_json(service.get_latest_results().await?)?,
        (Some("latest"), Some(job)) => to_json(service.get_latest_result_by_job(job).await?)?,
        (Some("stats"), _) => to_json(service.get_statistics().await?)?,
        (Some("cases"), Some(id)) => to_json(service.get_test_cases(parse_id(id)?).await?)?,
        (Some("detail"), Some(job)) => {
            let build = arg(2).ok_or_else(|| missing("build number"))?;
            to_json(service.get_detailed_test_cases(job, build).await?)?
        }
        (Some("notes"), Some(id)) => {
            let notes = BuildNotes {
                bugs_identified: arg(2).map(str::to_string),
                failure_reasons: arg(3).map(str::to_string),
            };
            to_json(service.update_notes(parse_id(id)?, notes).await?)?
        }
        (Some("frequencies"), _) => to_json(service.list_frequencies().await?)?,
        (Some("ping"), _) => json!({ "connected": service.test_connection().await }),
        (Some("watch"), _) => {
            let task = start_sync_task(service.fleet(), config.sync.interval);
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            task.abort();
            info!("Sync service stopped");
            json!({ "status": "stopped" })
        }
        (Some("cases"), None) => return Err(missing("build result id")),
        (Some("notes"), None) => return Err(missing("build result id")),
        (Some(other), _) => {
            print_usage();
            return Err(AppError::InvalidInput(format!("Unknown command: {}", other)));
        }
        (None, _) => return Err(missing("command")),
    };

    Ok(output)
}

fn to_json<T: serde::Serialize>(value: T) -> AppResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn parse_id(id: &str) -> AppResult<Uuid> {
    Ok(Uuid::parse_str(id)?)
}

fn missing(what: &str) -> AppError {
    AppError::InvalidInput(format!("Missing {}", what))
}

fn fail(e: AppError) -> ! {
    let body = e.to_response();
    match serde_json::to_string_pretty(&body) {
        Ok(text) => eprintln!("{}", text),
        Err(_) => eprintln!("{}", body),
    }
    std::process::exit(1);
}

fn print_usage() {
    eprintln!("Usage: ci-results-sync <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  sync [job]                       Sync all jobs, or one job");
    eprintln!("  latest [job]                     Latest stored result per job, or for one job");
    eprintln!("  stats                            Statistics over the latest build of each job");
    eprintln!("  cases <build-id>                 Stored test cases of a build");
    eprintln!("  detail <job> <build>             Test cases of a build, extracted live if not stored");
    eprintln!("  notes <build-id> <bugs> [reasons] Record operator notes");
    eprintln!("  frequencies                      Distinct job frequency labels");
    eprintln!("  ping                             Check the Jenkins connection");
    eprintln!("  watch                            Sync periodically until interrupted");
    eprintln!("  --health-check                   Exit 0 if configuration loads");
}
