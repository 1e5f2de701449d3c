//! Declarative table schemas and schema introspection
//!
//! Table layouts are declared once as [`TableSchema`] implementations and
//! turned into `CREATE TABLE IF NOT EXISTS` statements. Introspection reads
//! the actual columns of a relation with `PRAGMA table_info`, which the merge
//! uses to reconcile libraries written by different Mixxx versions.

use crate::Result;
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// SQL type (e.g., "TEXT", "INTEGER", "REAL", "BLOB")
    pub sql_type: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// INTEGER PRIMARY KEY AUTOINCREMENT
    pub primary_key: bool,
    /// UNIQUE constraint
    pub unique: bool,
    /// DEFAULT value (SQL expression)
    pub default_value: Option<String>,
    /// REFERENCES target as `table(column)`
    pub references: Option<String>,
}

impl ColumnDefinition {
    /// Create new column definition
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            unique: false,
            default_value: None,
            references: None,
        }
    }

    /// Mark column as auto-assigned PRIMARY KEY
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark column as NOT NULL
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark column as UNIQUE
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set DEFAULT value
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Add a foreign key reference, e.g. `"library(id)"`
    pub fn references(mut self, target: impl Into<String>) -> Self {
        self.references = Some(target.into());
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", quote_ident(&self.name), self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY AUTOINCREMENT");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(default) = &self.default_value {
            sql.push_str(&format!(" DEFAULT {}", default));
        }
        if let Some(target) = &self.references {
            sql.push_str(&format!(" REFERENCES {}", target));
        }
        sql
    }
}

/// Defines expected schema for a database table
pub trait TableSchema {
    /// Table name in database
    fn table_name() -> &'static str;

    /// Expected column definitions (order matters for new table creation)
    fn expected_columns() -> Vec<ColumnDefinition>;

    /// Table-level constraints appended after the columns, e.g. `UNIQUE (a, b)`
    fn table_constraints() -> Vec<String> {
        Vec::new()
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table
    fn create_sql() -> String {
        let mut columns: Vec<String> = Self::expected_columns()
            .iter()
            .map(ColumnDefinition::to_sql)
            .collect();
        columns.extend(Self::table_constraints());
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            quote_ident(Self::table_name()),
            columns.join(",\n    ")
        )
    }
}

/// Create a table from its declaration if it does not exist yet
pub async fn create_table<T: TableSchema>(pool: &SqlitePool) -> Result<()> {
    sqlx::query(&T::create_sql()).execute(pool).await?;
    Ok(())
}

/// Quote an identifier for SQLite (Mixxx uses reserved words such as `key`)
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Actual column from database introspection (PRAGMA table_info result)
#[derive(Debug, Clone)]
pub struct ActualColumn {
    /// Column ID (position in table)
    pub cid: i32,
    /// Column name
    pub name: String,
    /// SQL type from PRAGMA table_info
    pub type_name: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// DEFAULT value
    pub default_value: Option<String>,
    /// PRIMARY KEY flag
    pub pk: bool,
}

/// Schema introspection - read actual database schema
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Read actual columns from a table using PRAGMA table_info
    ///
    /// Returns columns in database order (by cid). A missing table yields an
    /// empty list.
    pub async fn table_columns(
        conn: &mut SqliteConnection,
        table_name: &str,
    ) -> Result<Vec<ActualColumn>> {
        let query = format!("PRAGMA table_info({})", quote_ident(table_name));
        let rows = sqlx::query(&query).fetch_all(&mut *conn).await?;

        let mut columns: Vec<ActualColumn> = rows
            .iter()
            .map(|row| ActualColumn {
                cid: row.get("cid"),
                name: row.get("name"),
                type_name: row.get("type"),
                not_null: row.get::<i32, _>("notnull") != 0,
                default_value: row.get("dflt_value"),
                pk: row.get::<i32, _>("pk") != 0,
            })
            .collect();

        columns.sort_by_key(|c| c.cid);

        Ok(columns)
    }

    /// Check if table exists
    pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM sqlite_master
                WHERE type='table' AND name = ?
            )
            "#,
        )
        .bind(table_name)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}
