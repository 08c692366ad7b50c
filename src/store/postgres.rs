//! PostgreSQL-backed stores.
//!
//! `environments.seq` is an identity column, so `ORDER BY seq DESC` yields
//! reverse storage order. The `UNIQUE` constraint on `environment_code` and
//! the `RESTRICT` foreign key from `machines` map to `StoreError::Duplicate`
//! and `StoreError::InUse`.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use super::{
    Environment, EnvironmentChanges, EnvironmentStore, MachineStore, NewEnvironment, StoreError,
};
use crate::photos::PhotoRef;

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const ENVIRONMENT_COLUMNS: &str = "id, environment_code, name, in_charge, photo_filename, \
     photo_folder, created_at, updated_at";

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the tables and indexes if they do not exist yet.
    ///
    /// # Errors
    /// Returns the first failing statement's error.
    pub async fn apply_schema(&self) -> Result<(), sqlx::Error> {
        for statement in split_sql_statements(SCHEMA_SQL) {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        debug!("environment schema applied");
        Ok(())
    }
}

#[async_trait]
impl EnvironmentStore for PostgresStore {
    async fn list(&self) -> Result<Vec<Environment>, StoreError> {
        let query = format!("SELECT {ENVIRONMENT_COLUMNS} FROM environments ORDER BY seq DESC");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT"))
            .await?;
        Ok(rows.iter().map(environment_from_row).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Environment>, StoreError> {
        let query = format!("SELECT {ENVIRONMENT_COLUMNS} FROM environments WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT"))
            .await?;
        Ok(row.as_ref().map(environment_from_row))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Environment>, StoreError> {
        let query =
            format!("SELECT {ENVIRONMENT_COLUMNS} FROM environments WHERE environment_code = $1");
        let row = sqlx::query(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT"))
            .await?;
        Ok(row.as_ref().map(environment_from_row))
    }

    async fn insert(&self, new: NewEnvironment) -> Result<Environment, StoreError> {
        let query = format!(
            r"
            INSERT INTO environments
                (id, environment_code, name, in_charge, photo_filename, photo_folder)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ENVIRONMENT_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(&new.environment_code)
            .bind(&new.name)
            .bind(&new.in_charge)
            .bind(&new.photo.filename)
            .bind(&new.photo.folder)
            .fetch_one(&self.pool)
            .instrument(db_span("INSERT"))
            .await
            .map_err(map_write_error)?;
        Ok(environment_from_row(&row))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: EnvironmentChanges,
    ) -> Result<Option<Environment>, StoreError> {
        let query = format!(
            r"
            UPDATE environments
            SET environment_code = $2,
                name = $3,
                in_charge = $4,
                photo_filename = COALESCE($5, photo_filename),
                photo_folder = COALESCE($6, photo_folder),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ENVIRONMENT_COLUMNS}
            "
        );
        let (filename, folder) = changes
            .photo
            .map(|photo| (photo.filename, photo.folder))
            .unzip();
        let row = sqlx::query(&query)
            .bind(id)
            .bind(&changes.environment_code)
            .bind(&changes.name)
            .bind(&changes.in_charge)
            .bind(filename)
            .bind(folder)
            .fetch_optional(&self.pool)
            .instrument(db_span("UPDATE"))
            .await
            .map_err(map_write_error)?;
        Ok(row.as_ref().map(environment_from_row))
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM environments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .instrument(db_span("DELETE"))
            .await
            .map_err(map_write_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MachineStore for PostgresStore {
    async fn any_for_environment(&self, environment_id: Uuid) -> Result<bool, StoreError> {
        let row = sqlx::query(
            r"
            SELECT EXISTS (
                SELECT 1 FROM machines WHERE environment_id = $1
            ) AS in_use
            ",
        )
        .bind(environment_id)
        .fetch_one(&self.pool)
        .instrument(db_span("SELECT"))
        .await?;
        Ok(row.get("in_use"))
    }
}

fn environment_from_row(row: &PgRow) -> Environment {
    Environment {
        id: row.get("id"),
        environment_code: row.get("environment_code"),
        name: row.get("name"),
        in_charge: row.get("in_charge"),
        environment_photo: PhotoRef {
            filename: row.get("photo_filename"),
            folder: row.get("photo_folder"),
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn db_span(operation: &'static str) -> tracing::Span {
    info_span!("db.query", db.system = "postgresql", db.operation = operation)
}

/// Map constraint violations raised by writes onto domain errors.
fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => StoreError::Duplicate,
            Some(FOREIGN_KEY_VIOLATION) => StoreError::InUse,
            _ => StoreError::Database(err),
        },
        _ => StoreError::Database(err),
    }
}

/// Split a schema file into statements, dropping `--` comment lines.
/// Statements must end with `;` at the end of a line.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_splits_into_statements() {
        let statements = split_sql_statements(SCHEMA_SQL);
        assert_eq!(statements.len(), 4);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS environments"));
        assert!(statements.iter().all(|s| s.ends_with(';')));
        assert!(statements.iter().all(|s| !s.contains("--")));
    }

    #[test]
    fn split_keeps_unterminated_tail() {
        let statements = split_sql_statements("SELECT 1;\n-- note\nSELECT 2");
        assert_eq!(statements, vec!["SELECT 1;", "SELECT 2"]);
    }

    #[test]
    fn non_database_errors_stay_database() {
        let err = map_write_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
