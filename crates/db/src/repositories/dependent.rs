//! Repository for denormalization target entities.
//!
//! The rating denormalizer writes to tables named in configuration, so
//! their names are not known at compile time. Table and column names
//! reaching this repository MUST come from the eagerly-validated
//! `[dependents]` routing table (identifier syntax enforced at
//! startup); only the entity id and the rating travel as bind values.

use std::sync::Arc;

use ballot_common::{AppError, AppResult};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};

/// Repository for configuration-named denormalization targets.
#[derive(Clone)]
pub struct DependentRepository {
    db: Arc<DatabaseConnection>,
}

impl DependentRepository {
    /// Create a new dependent repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Whether a row with the given id exists in the named table.
    pub async fn exists(&self, table: &str, id: &str) -> AppResult<bool> {
        let backend = self.db.get_database_backend();
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                backend,
                select_sql(table),
                [id.into()],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.is_some())
    }

    /// Overwrite the configured rating column of one row.
    /// Last-write-wins; no history of prior ratings is kept.
    pub async fn write_rating(
        &self,
        table: &str,
        field: &str,
        id: &str,
        rating: i64,
    ) -> AppResult<()> {
        let backend = self.db.get_database_backend();
        self.db
            .execute(Statement::from_sql_and_values(
                backend,
                update_sql(table, field),
                [rating.into(), id.into()],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

fn select_sql(table: &str) -> String {
    format!(r#"SELECT "id" FROM "{table}" WHERE "id" = $1"#)
}

fn update_sql(table: &str, field: &str) -> String {
    format!(r#"UPDATE "{table}" SET "{field}" = $1 WHERE "id" = $2"#)
}
