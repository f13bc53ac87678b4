use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use todo_service::{
    application::{
        activities::{ActivityRepository, ActivityService},
        error::AppError,
        repos::{ActivityStore, TodoStore},
        todos::{TodoRepository, TodoService},
    },
    cache::{CacheConfig, CacheStore, MemoryCacheStore, ResourceNames},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use tokio::sync::watch;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_api_state(&repositories, &settings);
    serve_http(&settings, state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings).await?;
    info!(target = "todo_service::migrate", "Migrations applied");
    Ok(())
}

async fn init_repositories(settings: &config::Settings) -> Result<PostgresRepositories, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    Ok(PostgresRepositories::new(pool))
}

fn build_api_state(repositories: &PostgresRepositories, settings: &config::Settings) -> ApiState {
    let cache_config = CacheConfig::from(&settings.cache);
    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new(&cache_config));

    info!(
        target = "todo_service::cache",
        enabled = cache_config.enabled,
        ttl_seconds = cache_config.ttl_seconds,
        max_entries = cache_config.max_entries,
        invalidation = cache_config.invalidation.as_str(),
        "Repository cache configured"
    );

    let activity_store: Arc<ActivityStore> = Arc::new(repositories.activities());
    let todo_store: Arc<TodoStore> = Arc::new(repositories.todos());

    let activities = Arc::new(ActivityRepository::new(
        activity_store,
        cache.clone(),
        ResourceNames::new("activity-repository", "activity", "activities"),
        cache_config.clone(),
    ));
    let todos = Arc::new(TodoRepository::new(
        todo_store,
        cache,
        ResourceNames::new("todo-repository", "todo", "todos"),
        cache_config,
    ));

    ApiState::new(
        ActivityService::new(activities.clone(), todos.clone()),
        TodoService::new(todos, activities),
    )
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state, settings.server.request_timeout);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "todo_service::http",
        addr = %settings.server.addr,
        "Listening"
    );

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            let _ = shutdown_rx.changed().await;
        },
    );
    let mut handle = tokio::spawn(server.into_future());

    tokio::select! {
        result = &mut handle => return flatten_server_result(result),
        () = shutdown_signal() => {}
    }

    info!(target = "todo_service::http", "Shutdown requested, draining connections");
    let _ = shutdown_tx.send(true);

    let grace: Duration = settings.server.graceful_shutdown;
    match tokio::time::timeout(grace, &mut handle).await {
        Ok(result) => flatten_server_result(result),
        Err(_) => {
            warn!(
                target = "todo_service::http",
                grace_seconds = grace.as_secs(),
                "Graceful shutdown timed out; aborting open connections"
            );
            handle.abort();
            Ok(())
        }
    }
}

fn flatten_server_result(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::unexpected(format!("server error: {err}"))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
