use sea_orm_migration::prelude::*;

mod m20250601_000001_create_users_table;
mod m20250601_000002_create_posts_table;
mod m20250601_000003_create_reactions_table;
mod m20250601_000004_create_comments_table;
mod m20250601_000005_create_accounts_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_users_table::Migration),
            Box::new(m20250601_000002_create_posts_table::Migration),
            Box::new(m20250601_000003_create_reactions_table::Migration),
            Box::new(m20250601_000004_create_comments_table::Migration),
            Box::new(m20250601_000005_create_accounts_table::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{Database, DbErr};

    #[tokio::test]
    async fn test_migrations_okay() -> Result<(), DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        let schema_manager = SchemaManager::new(&db);

        Migrator::refresh(&db).await?;

        assert!(schema_manager.has_table("users").await?);
        assert!(schema_manager.has_table("post").await?);
        assert!(schema_manager.has_table("reaction").await?);
        assert!(schema_manager.has_table("comment").await?);
        assert!(schema_manager.has_table("account").await?);
        assert!(schema_manager.has_table("session").await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_migrations_roll_back() -> Result<(), DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        let schema_manager = SchemaManager::new(&db);

        Migrator::up(&db, None).await?;
        Migrator::down(&db, None).await?;

        assert!(!schema_manager.has_table("post").await?);
        assert!(!schema_manager.has_table("session").await?);

        Ok(())
    }
}
