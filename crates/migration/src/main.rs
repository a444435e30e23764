use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_DATABASE_URL: &str = "sqlite:./sipesda.db?mode=rwc";
const USAGE: &str = "Usage: migration [up|down|fresh|status]

  up      apply pending SIPESDA migrations (schema, default payment types)
  down    roll back the most recent migration
  fresh   drop every table and re-apply all migrations
  status  list applied and pending migrations

DATABASE_URL selects the database (default: sqlite:./sipesda.db?mode=rwc).";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cmd = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    if !matches!(cmd.as_str(), "up" | "down" | "fresh" | "status") {
        eprintln!("unknown command `{cmd}`\n\n{USAGE}");
        std::process::exit(2);
    }

    let db_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let db = Database::connect(&db_url)
        .await
        .map_err(|err| format!("cannot open the SIPESDA database at {db_url}: {err}"))?;

    let migrated = match cmd.as_str() {
        "up" => migration::Migrator::up(&db, None).await,
        "down" => migration::Migrator::down(&db, Some(1)).await,
        "fresh" => migration::Migrator::fresh(&db).await,
        _ => migration::Migrator::status(&db).await,
    };
    migrated.map_err(|err| format!("SIPESDA migration `{cmd}` failed: {err}"))?;

    Ok(())
}
