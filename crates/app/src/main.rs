use std::{sync::Arc, time::Duration};

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "sipesda={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let server = settings.server;
    let db = parse_database(&server.database).await?;
    let engine = engine::Engine::builder()
        .database(db)
        .session_policy(engine::SessionPolicy::new(
            settings.session.ttl_minutes,
            settings.session.remember_me_ttl_minutes,
        ))
        .password_cost(settings.security.bcrypt_cost)
        .build()
        .await?;
    let engine = Arc::new(engine);

    let sweeper = tokio::spawn(sweep_sessions(
        engine.clone(),
        Duration::from_secs(settings.session.sweep_interval_secs.max(1)),
    ));

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let result = server::run_with_listener(engine, listener, &server.base_path).await;

    sweeper.abort();
    result?;
    Ok(())
}

/// Periodically delete expired sessions until the task is aborted.
async fn sweep_sessions(engine: Arc<engine::Engine>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        if let Err(err) = engine.sweep_expired_sessions().await {
            tracing::error!("session sweep failed: {err}");
        }
    }
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
        Database::Url(url) => url.clone(),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
