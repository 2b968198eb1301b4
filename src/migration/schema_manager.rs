//! SchemaManager - Provides methods for schema operations in migrations

use super::naming::is_valid_identifier;
use crate::{PodiumError, PodiumExecutor};
use may_postgres::types::ToSql;
use sea_query::{
    ColumnDef, IndexCreateStatement, IndexDropStatement, PostgresQueryBuilder, Table,
    TableAlterStatement, TableCreateStatement, TableDropStatement,
};
use std::fmt::Display;

/// SchemaManager provides methods for performing schema operations in migrations
///
/// It borrows the executor the runner hands it, which is the open migration
/// transaction when the runner is transactional.
pub struct SchemaManager<'a> {
    executor: &'a dyn PodiumExecutor,
}

impl<'a> SchemaManager<'a> {
    /// Create a new SchemaManager over the given executor
    pub fn new(executor: &'a dyn PodiumExecutor) -> Self {
        Self { executor }
    }

    /// Create a table
    ///
    /// # Example
    /// ```rust,no_run
    /// use sea_query::{Table, ColumnDef};
    /// # let manager: podium::migration::SchemaManager = todo!();
    ///
    /// let table = Table::create()
    ///     .table("competitions")
    ///     .if_not_exists()
    ///     .col(ColumnDef::new("id").big_integer().not_null().auto_increment().primary_key())
    ///     .col(ColumnDef::new("title").string().not_null())
    ///     .to_owned();
    ///
    /// manager.create_table(table)?;
    /// # Ok::<(), podium::PodiumError>(())
    /// ```
    pub fn create_table(&self, table: TableCreateStatement) -> Result<(), PodiumError> {
        self.run(&table.build(PostgresQueryBuilder))
    }

    /// Drop a table
    pub fn drop_table(&self, table: TableDropStatement) -> Result<(), PodiumError> {
        self.run(&table.build(PostgresQueryBuilder))
    }

    /// Alter a table
    pub fn alter_table(&self, alter: TableAlterStatement) -> Result<(), PodiumError> {
        self.run(&alter.build(PostgresQueryBuilder))
    }

    /// Create an index
    pub fn create_index(&self, index: IndexCreateStatement) -> Result<(), PodiumError> {
        self.run(&index.build(PostgresQueryBuilder))
    }

    /// Drop an index
    pub fn drop_index(&self, index: IndexDropStatement) -> Result<(), PodiumError> {
        self.run(&index.build(PostgresQueryBuilder))
    }

    /// Add a column to an existing table
    ///
    /// # Example
    /// ```rust,no_run
    /// use sea_query::ColumnDef;
    /// # let manager: podium::migration::SchemaManager = todo!();
    ///
    /// manager.add_column("registrations", ColumnDef::new("bib_number").integer().null().to_owned())?;
    /// # Ok::<(), podium::PodiumError>(())
    /// ```
    pub fn add_column<T: Display>(&self, table: T, column: ColumnDef) -> Result<(), PodiumError> {
        let alter = Table::alter()
            .table(table.to_string())
            .add_column(column)
            .to_owned();
        self.alter_table(alter)
    }

    /// Drop a column from an existing table
    pub fn drop_column<T: Display>(&self, table: T, column: &str) -> Result<(), PodiumError> {
        let alter = Table::alter()
            .table(table.to_string())
            .drop_column(column.to_string())
            .to_owned();
        self.alter_table(alter)
    }

    /// Rename a column in an existing table
    pub fn rename_column<T: Display>(
        &self,
        table: T,
        old_name: &str,
        new_name: &str,
    ) -> Result<(), PodiumError> {
        let alter = Table::alter()
            .table(table.to_string())
            .rename_column(old_name.to_string(), new_name.to_string())
            .to_owned();
        self.alter_table(alter)
    }

    /// Create a PostgreSQL enum type, ignoring an existing type of the same name
    ///
    /// # Example
    /// ```rust,no_run
    /// # let manager: podium::migration::SchemaManager = todo!();
    /// manager.create_enum_type("score_kind", &["time", "reps", "load"])?;
    /// # Ok::<(), podium::PodiumError>(())
    /// ```
    pub fn create_enum_type(&self, name: &str, variants: &[&str]) -> Result<(), PodiumError> {
        check_identifier(name)?;
        if variants.is_empty() {
            return Err(PodiumError::Query(format!(
                "enum type {name} needs at least one variant"
            )));
        }

        let labels = variants
            .iter()
            .map(|v| format!("'{}'", v.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(", ");
        // No CREATE TYPE IF NOT EXISTS in PostgreSQL.
        let sql = format!(
            "DO $$ BEGIN CREATE TYPE {name} AS ENUM ({labels}); \
             EXCEPTION WHEN duplicate_object THEN NULL; END $$"
        );
        self.run(&sql)
    }

    /// Drop a PostgreSQL enum type if it exists
    pub fn drop_enum_type(&self, name: &str) -> Result<(), PodiumError> {
        check_identifier(name)?;
        self.run(&format!("DROP TYPE IF EXISTS {name}"))
    }

    /// Execute raw SQL
    ///
    /// # Example
    /// ```rust,no_run
    /// # let manager: podium::migration::SchemaManager = todo!();
    /// manager.execute("CREATE EXTENSION IF NOT EXISTS pgcrypto", &[])?;
    /// # Ok::<(), podium::PodiumError>(())
    /// ```
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<(), PodiumError> {
        self.executor.execute(sql, params).map(|_| ())
    }

    /// Get a reference to the underlying executor
    pub fn executor(&self) -> &dyn PodiumExecutor {
        self.executor
    }

    fn run(&self, sql: &str) -> Result<(), PodiumError> {
        // DDL statements carry no parameters
        self.executor.execute(sql, &[]).map(|_| ())
    }
}

fn check_identifier(name: &str) -> Result<(), PodiumError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(PodiumError::Query(format!("invalid SQL identifier: {name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RecordingExecutor;
    use sea_query::{Expr, Index};

    #[test]
    fn test_create_table_and_index() {
        let executor = RecordingExecutor::new();
        let manager = SchemaManager::new(&executor);

        let table = Table::create()
            .table("competitions")
            .if_not_exists()
            .col(ColumnDef::new("id").big_integer().not_null().primary_key())
            .col(ColumnDef::new("title").string().not_null())
            .to_owned();
        manager.create_table(table).unwrap();

        let index = Index::create()
            .name("idx_competitions_title")
            .table("competitions")
            .col(Expr::col("title"))
            .to_owned();
        manager.create_index(index).unwrap();

        let statements = executor.statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS \"competitions\""));
        assert!(statements[1].contains("\"idx_competitions_title\""));
    }

    #[test]
    fn test_column_helpers() {
        let executor = RecordingExecutor::new();
        let manager = SchemaManager::new(&executor);

        manager
            .add_column("registrations", ColumnDef::new("bib_number").integer().null().to_owned())
            .unwrap();
        manager.rename_column("registrations", "bib_number", "bib").unwrap();
        manager.drop_column("registrations", "bib").unwrap();

        let statements = executor.statements();
        assert!(statements[0].starts_with("ALTER TABLE \"registrations\" ADD COLUMN \"bib_number\""));
        assert!(statements[1].contains("RENAME COLUMN \"bib_number\" TO \"bib\""));
        assert!(statements[2].contains("DROP COLUMN \"bib\""));
    }

    #[test]
    fn test_create_enum_type_escapes_labels() {
        let executor = RecordingExecutor::new();
        let manager = SchemaManager::new(&executor);

        manager.create_enum_type("score_kind", &["time", "athlete's choice"]).unwrap();

        let statements = executor.statements();
        assert!(statements[0].contains("CREATE TYPE score_kind AS ENUM ('time', 'athlete''s choice')"));
        assert!(statements[0].contains("duplicate_object"));
    }

    #[test]
    fn test_enum_type_rejects_bad_input() {
        let executor = RecordingExecutor::new();
        let manager = SchemaManager::new(&executor);

        assert!(manager.create_enum_type("score kind", &["time"]).is_err());
        assert!(manager.create_enum_type("score_kind", &[]).is_err());
        assert!(manager.drop_enum_type("x; DROP TABLE users").is_err());
        assert!(executor.statements().is_empty());

        manager.drop_enum_type("score_kind").unwrap();
        assert_eq!(executor.statements(), vec!["DROP TYPE IF EXISTS score_kind"]);
    }

    #[test]
    fn test_execute_propagates_errors() {
        let executor = RecordingExecutor::new();
        executor.fail_when("gen_random_uuid", "function gen_random_uuid() does not exist");
        let manager = SchemaManager::new(&executor);

        let err = manager.execute("SELECT gen_random_uuid()", &[]).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
