use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::config::TryLogConfig;

pub mod migrator;

pub async fn open_or_create_db(config: &TryLogConfig) -> Result<DatabaseConnection, DbErr> {
    let connection_string = format!("sqlite://{}?mode=rwc", config.database_path.display());
    tracing::debug!(%connection_string, "opening database");

    Database::connect(&connection_string).await
}

pub async fn migrate_up(db: &DatabaseConnection) -> Result<(), DbErr> {
    migrator::Migrator::up(db, None).await
}

/// Fresh in-memory database with every migration applied.
#[cfg(test)]
pub(crate) async fn test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    migrate_up(&db).await.expect("Failed to run migrations");

    db
}
