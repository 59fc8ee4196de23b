use axum::Router;
use axum::response::Json;
use axum::routing::get;
use migration::MigratorTrait;
use sea_orm::sqlx::sqlite::SqliteConnectOptions;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::PathBuf;
use std::str::FromStr;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::task::api::create_task_router;
use crate::task::{SeaOrmTaskRepository, TaskState};

pub mod api;

/// OpenAPI description of every public endpoint.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Task API",
        version = "1.0.0",
        description = "A simple Task API following the repository pattern"
    ),
    paths(
        health_check_handler,
        readiness_check_handler,
        liveness_check_handler,
        crate::task::api::create_task_handler,
        crate::task::api::list_tasks_handler,
        crate::task::api::get_task_handler,
        crate::task::api::update_task_handler,
        crate::task::api::delete_task_handler,
        crate::task::api::mark_complete_handler,
        crate::task::api::mark_incomplete_handler,
    ),
    components(schemas(
        crate::task::api::TaskJson,
        crate::task::api::TaskListJson,
        crate::task::api::CreateTaskRequest,
        crate::task::api::UpdateTaskRequest,
        api::ErrorResponse,
        api::FieldError,
        api::MessageResponse,
    )),
    tags(
        (name = "tasks", description = "Task management"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

/// Creates the full application router: probes, task routes and API docs.
pub fn create_app(task_state: TaskState) -> Router {
    Router::new()
        .merge(create_health_router())
        .merge(create_task_router(task_state))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Creates the router for the liveness and readiness probes.
pub fn create_health_router() -> Router {
    Router::new()
        .route("/", get(health_check_handler))
        .route("/healthz", get(health_check_handler))
        .route("/readyz", get(readiness_check_handler))
        .route("/livez", get(liveness_check_handler))
}

/// Opens the database described by `config`, creating the directory of a
/// SQLite file when it does not exist yet, and applies pending migrations.
#[tracing::instrument(skip(config))]
pub async fn connect_database(config: &Config) -> anyhow::Result<DatabaseConnection> {
    if let Some(directory) = sqlite_directory(&config.database_url) {
        std::fs::create_dir_all(directory)?;
    }

    let mut options = ConnectOptions::new(config.database_url.clone());
    options.sqlx_logging(config.sql_logging());
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");
    Ok(db)
}

/// Directory holding the file of a SQLite URL; `None` for in-memory
/// databases, files in the working directory and other drivers.
fn sqlite_directory(database_url: &str) -> Option<PathBuf> {
    if !database_url.starts_with("sqlite:") {
        return None;
    }
    let options = SqliteConnectOptions::from_str(database_url).ok()?;
    let parent = options.get_filename().parent()?;
    if parent.as_os_str().is_empty() {
        None
    } else {
        Some(parent.to_path_buf())
    }
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting up {} ({})", config.app_name, config.environment);
    let db = connect_database(&config).await?;

    let task_state = TaskState::new(SeaOrmTaskRepository::new(db));
    let app = create_app(task_state);

    let server_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Shutting down application");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", err);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tracing::instrument]
#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Service is healthy", body = String)),
    tag = "health"
)]
pub async fn health_check_handler() -> Json<&'static str> {
    Json("ok")
}

#[tracing::instrument]
#[utoipa::path(
    get,
    path = "/readyz",
    responses((status = 200, description = "Service is ready", body = String)),
    tag = "health"
)]
pub async fn readiness_check_handler() -> Json<&'static str> {
    Json("ok")
}

#[tracing::instrument]
#[utoipa::path(
    get,
    path = "/livez",
    responses((status = 200, description = "Service is alive", body = String)),
    tag = "health"
)]
pub async fn liveness_check_handler() -> Json<&'static str> {
    Json("ok")
}
