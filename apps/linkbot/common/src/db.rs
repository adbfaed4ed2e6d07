use crate::ServiceError;
use crate::config::Settings;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

/// Opens the database once at startup and brings the schema up to date.
///
/// The connection is passed explicitly to whatever needs storage access.
pub async fn connect(settings: &Settings) -> Result<DatabaseConnection, ServiceError> {
    let db = Database::connect(
        ConnectOptions::new(&settings.database_url)
            .sqlx_logging(settings.sql_log)
            .to_owned(),
    )
    .await?;

    info!("Running database migrations...");
    Migrator::up(&db, None).await?;
    info!("Migrations completed successfully");

    Ok(db)
}
