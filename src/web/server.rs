use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Path, Query, Request, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};

use crate::cli::ServeArgs;
use crate::dictionary::builder::BuildConfig;
use crate::matching::CountRow;
use crate::pipeline::report::{count_table_csv, unmatched_file_name, write_unmatched, RESULTS_FILE};
use crate::pipeline::{run_analysis, AnalysisConfig};
use crate::utils::validation::{check_bearer_token, validate_run_id, validate_season, ValidationError};
use crate::web::tasks::{TaskOutput, TaskRegistry, TaskState};

/// Environment variable read when no token is given on the command line
pub const TOKEN_ENV: &str = "AMPLICOUNT_TOKEN";

/// Security configuration constants to prevent `DoS` attacks
pub const MAX_BODY_SIZE: usize = 64 * 1024;
pub const MAX_CONCURRENT_REQUESTS: usize = 100;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything the service needs to analyse runs
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding one sub-directory per run
    pub runs_root: PathBuf,

    pub plate_map: PathBuf,

    /// Amplicon map used when no season is requested
    pub amplicon_map: PathBuf,

    /// Amplicon maps selectable with `?season=`
    pub seasons: HashMap<String, PathBuf>,

    /// Bearer token required on every non-GET request
    pub token: Option<String>,

    pub build: BuildConfig,

    pub debug: bool,
}

impl ServiceConfig {
    /// # Errors
    ///
    /// Returns an error if the dictionary options are invalid.
    pub fn from_args(args: &ServeArgs) -> anyhow::Result<Self> {
        let token = args
            .token
            .clone()
            .or_else(|| std::env::var(TOKEN_ENV).ok())
            .filter(|t| !t.is_empty());

        Ok(Self {
            runs_root: args.runs_root.clone(),
            plate_map: args.plate_map.clone(),
            amplicon_map: args.amplicon_map.clone(),
            seasons: args.seasons.iter().cloned().collect(),
            token,
            build: args.build.to_config()?,
            debug: args.debug,
        })
    }
}

/// Shared application state
pub struct AppState {
    pub config: ServiceConfig,
    pub tasks: TaskRegistry,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            tasks: TaskRegistry::new(),
        }
    }
}

/// Enhanced error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    pub details: Option<String>,
}

/// Create a safe error response that prevents information disclosure
/// while logging detailed errors server-side for debugging
pub fn create_safe_error_response(
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> ErrorResponse {
    if let Some(internal_msg) = internal_error {
        error!("Internal error ({}): {}", error_type, internal_msg);
    }

    ErrorResponse {
        error: user_message.to_string(),
        error_type: error_type.to_string(),
        details: None,
    }
}

fn error_response(status: StatusCode, error_type: &str, message: &str) -> Response {
    (status, Json(create_safe_error_response(error_type, message, None))).into_response()
}

/// Status payload of one analysis task
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum TaskResponse {
    NotReady {
        id: u64,
    },
    Ready {
        id: u64,
        run_id: String,
        results: Vec<CountRow>,
        attachments: BTreeMap<String, String>,
    },
    Failed {
        id: u64,
        error: String,
    },
}

#[derive(Debug, Deserialize)]
struct StartParams {
    season: Option<String>,
}

/// Run the web server
///
/// # Errors
///
/// Returns an error if the tokio runtime cannot be created or the server fails to start.
pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    let config = ServiceConfig::from_args(&args)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move { run_server(&args.address, args.port, config).await })
}

/// Routes with every security layer except per-IP rate limiting, which needs
/// the peer address of a real connection.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/swabseq/{run_id}", post(start_handler))
        .route("/swabseq/{run_id}/{task_id}", get(status_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                // Security headers for API clients and browsers
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("strict-transport-security"),
                    HeaderValue::from_static("max-age=31536000; includeSubDomains"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                ))
                // Request timeout to prevent slow client attacks
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    REQUEST_TIMEOUT,
                ))
                // Limit concurrent requests to prevent DOS
                .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
                // Requests carry no bodies worth more than this
                .layer(DefaultBodyLimit::max(MAX_BODY_SIZE)),
        )
}

/// Create the application router with all routes and middleware configured.
///
/// # Errors
///
/// Returns an error if the rate limiter cannot be configured.
pub fn create_router(config: ServiceConfig) -> anyhow::Result<Router> {
    let state = Arc::new(AppState::new(config));

    // Configure IP-based rate limiting
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(10) // 10 requests per second per IP
        .burst_size(50) // Allow bursts of 50 requests
        .finish()
        .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?;

    Ok(router(state).layer(GovernorLayer {
        config: Arc::new(governor_conf),
    }))
}

async fn run_server(address: &str, port: u16, config: ServiceConfig) -> anyhow::Result<()> {
    if config.token.is_none() {
        tracing::warn!("No bearer token configured; POST requests are not authenticated");
    }
    let app = create_router(config)?;

    let addr = format!("{address}:{port}");
    info!("Starting amplicount service at http://{addr}");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Reject requests other than GET, HEAD and OPTIONS without the configured bearer token
async fn require_token(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    if matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return next.run(request).await;
    }

    if let Some(expected) = &state.config.token {
        let header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if let Err(e) = check_bearer_token(header, expected) {
            return error_response(StatusCode::UNAUTHORIZED, "unauthorized", &e.to_string());
        }
    }

    next.run(request).await
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Start a background analysis of one run
async fn start_handler(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
    Query(params): Query<StartParams>,
) -> Response {
    let run_id = match validate_run_id(&run_id) {
        Ok(id) => id.to_string(),
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "invalid_run_id", &e.to_string()),
    };

    let amplicon_map = match params.season.as_deref() {
        None => state.config.amplicon_map.clone(),
        Some(season) => {
            let known = validate_season(season)
                .ok()
                .and_then(|s| state.config.seasons.get(s));
            match known {
                Some(path) => path.clone(),
                None => {
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        "invalid_season",
                        &ValidationError::InvalidSeason.to_string(),
                    )
                }
            }
        }
    };

    let run_dir = state.config.runs_root.join(&run_id);
    if !run_dir.is_dir() {
        return error_response(StatusCode::NOT_FOUND, "run_not_found", "Run not found");
    }

    let mut config = AnalysisConfig::new(run_dir, state.config.plate_map.clone(), amplicon_map);
    config.build = state.config.build.clone();
    config.debug = state.config.debug;

    let id = state.tasks.create(&run_id, params.season.clone());
    info!("Task {} started for run {}", id, run_id);

    let task_state = state.clone();
    let task_run_id = run_id.clone();
    tokio::spawn(async move {
        let outcome = tokio::task::spawn_blocking(move || analyse_run(config, &task_run_id)).await;
        match outcome {
            Ok(Ok(output)) => {
                info!("Task {} finished", id);
                task_state.tasks.complete(id, output);
            }
            Ok(Err(e)) => {
                error!("Task {} failed: {:#}", id, e);
                task_state.tasks.fail(id, "Analysis failed");
            }
            Err(e) => {
                error!("Task {} aborted: {}", id, e);
                task_state.tasks.fail(id, "Analysis aborted");
            }
        }
    });

    (StatusCode::ACCEPTED, Json(TaskResponse::NotReady { id })).into_response()
}

/// Run the pipeline in a scratch directory and collect what clients are sent
fn analyse_run(mut config: AnalysisConfig, run_id: &str) -> anyhow::Result<TaskOutput> {
    // Reports never land in the run directory; concurrent tasks get their own
    let scratch = tempfile::Builder::new()
        .prefix(&format!("{run_id}-results-"))
        .tempdir()
        .context("Failed to create a results directory")?;
    config.output_dir = Some(scratch.path().to_path_buf());
    let (result, _) = run_analysis(&config)?;

    let mut attachments = BTreeMap::new();
    attachments.insert(RESULTS_FILE.to_string(), count_table_csv(&result.counts)?);
    if let Some(unmatched) = &result.unmatched {
        for (channel, rows) in unmatched {
            let mut buf = Vec::new();
            write_unmatched(&mut buf, rows)?;
            attachments.insert(unmatched_file_name(*channel), String::from_utf8_lossy(&buf).into_owned());
        }
    }

    let results = result
        .counts
        .rows()
        .into_iter()
        .filter(|r| r.index1.is_matched() && r.index2.is_matched() && r.amplicon.is_matched())
        .collect();

    Ok(TaskOutput { results, attachments })
}

/// Report the state of a task
async fn status_handler(
    State(state): State<Arc<AppState>>,
    Path((run_id, task_id)): Path<(String, u64)>,
) -> Response {
    let Some(task) = state.tasks.get(task_id).filter(|t| t.run_id == run_id) else {
        return error_response(StatusCode::NOT_FOUND, "task_not_found", "Task not found");
    };

    let body = match task.state {
        TaskState::Running => TaskResponse::NotReady { id: task.id },
        TaskState::Ready(output) => TaskResponse::Ready {
            id: task.id,
            run_id: task.run_id,
            results: output.results,
            attachments: output.attachments,
        },
        TaskState::Failed(error) => TaskResponse::Failed { id: task.id, error },
    };

    Json(body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_response_shape() {
        let json = serde_json::to_value(TaskResponse::NotReady { id: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "not-ready", "id": 3 }));

        let json = serde_json::to_value(TaskResponse::Failed {
            id: 4,
            error: "Analysis failed".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
    }

    #[test]
    fn test_safe_error_response_hides_details() {
        let response = create_safe_error_response("io", "Run not found", Some("/secret/path"));
        assert_eq!(response.error, "Run not found");
        assert!(response.details.is_none());
    }
}
