//! Physical schema per backend
//!
//! [`SchemaMapping`] is the schema handle a driver hands out: it resolves each
//! logical column to exactly one native column type for its backend and
//! renders the DDL used by `init_schema`.

use super::definitions::{ColumnDef, DefaultRule, LogicalType, TableDef, ALL_TABLES};
use crate::backend::DatabaseType;

/// Storage strategy chosen for a logical type on a given backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalEncoding {
    /// Plain string column
    Text,
    /// Engine-native 64-bit integer
    NativeBigInt,
    /// Decimal digits stored as a BLOB, for engines whose clients lose
    /// precision past 2^53
    BigIntBlob,
    /// Engine-native array of text
    NativeArray,
    /// JSON document in a text column
    JsonText,
    /// JSON document in an engine JSON column
    JsonColumn,
    /// Engine timestamp type, defaulting to the engine clock
    NativeTimestamp,
    /// `YYYY-MM-DD HH:MM:SS` UTC text computed at insert time
    TextTimestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaMapping {
    database_type: DatabaseType,
}

impl SchemaMapping {
    pub fn new(database_type: DatabaseType) -> Self {
        Self { database_type }
    }

    pub fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    /// SQLite and libsql share the same file format and column encodings
    fn is_sqlite_family(&self) -> bool {
        matches!(self.database_type, DatabaseType::SQLite | DatabaseType::Libsql)
    }

    pub fn encoding(&self, logical_type: LogicalType) -> PhysicalEncoding {
        match (logical_type, self.database_type) {
            (LogicalType::Id | LogicalType::VarChar(_) | LogicalType::Text, _) => {
                PhysicalEncoding::Text
            }
            (LogicalType::BigInt, DatabaseType::SQLite | DatabaseType::Libsql) => {
                PhysicalEncoding::BigIntBlob
            }
            (LogicalType::BigInt, _) => PhysicalEncoding::NativeBigInt,
            (LogicalType::StringList, DatabaseType::PostgreSQL) => PhysicalEncoding::NativeArray,
            (LogicalType::StringList, DatabaseType::MySql) => PhysicalEncoding::JsonColumn,
            (LogicalType::StringList, _) => PhysicalEncoding::JsonText,
            (LogicalType::Timestamp, DatabaseType::SQLite | DatabaseType::Libsql) => {
                PhysicalEncoding::TextTimestamp
            }
            (LogicalType::Timestamp, _) => PhysicalEncoding::NativeTimestamp,
        }
    }

    /// Native column type for a logical type
    pub fn column_type(&self, logical_type: LogicalType) -> String {
        if self.is_sqlite_family() {
            return match logical_type {
                LogicalType::BigInt => "BLOB",
                _ => "TEXT",
            }
            .to_string();
        }

        match logical_type {
            // MySQL cannot index unbounded TEXT, so identifiers get a bound there.
            LogicalType::Id if self.database_type == DatabaseType::MySql => {
                "VARCHAR(255)".to_string()
            }
            LogicalType::Id | LogicalType::Text => "TEXT".to_string(),
            LogicalType::VarChar(length) => format!("VARCHAR({})", length),
            LogicalType::BigInt => "BIGINT".to_string(),
            LogicalType::StringList => match self.database_type {
                DatabaseType::PostgreSQL => "TEXT[]".to_string(),
                _ => "JSON".to_string(),
            },
            LogicalType::Timestamp => match self.database_type {
                // Instants, independent of the session time zone.
                DatabaseType::PostgreSQL => "TIMESTAMPTZ".to_string(),
                _ => "TIMESTAMP".to_string(),
            },
        }
    }

    fn default_clause(&self, column: &ColumnDef) -> Option<&'static str> {
        match column.default {
            DefaultRule::CreationTime => Some(match self.database_type {
                DatabaseType::PostgreSQL => "DEFAULT now()",
                _ => "DEFAULT CURRENT_TIMESTAMP",
            }),
            // Identifiers are generated by the application on every backend.
            DefaultRule::GeneratedId | DefaultRule::None => None,
        }
    }

    /// Quote an identifier for this backend
    pub fn quote(&self, identifier: &str) -> String {
        match self.database_type {
            DatabaseType::MySql => format!("`{}`", identifier),
            _ => format!("\"{}\"", identifier),
        }
    }

    /// Quoted table name, safe for reserved words such as `keys`
    pub fn table(&self, table: &TableDef) -> String {
        self.quote(table.name)
    }

    fn column_sql(&self, column: &ColumnDef) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote(column.name),
            self.column_type(column.logical_type)
        );
        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = self.default_clause(column) {
            sql.push(' ');
            sql.push_str(default);
        }
        sql
    }

    pub fn create_table_sql(&self, table: &TableDef) -> String {
        let mut parts: Vec<String> = table.columns.iter().map(|c| self.column_sql(c)).collect();

        for column in table.columns {
            if let Some(fk) = column.references {
                parts.push(format!(
                    "FOREIGN KEY ({}) REFERENCES {} ({})",
                    self.quote(column.name),
                    self.quote(fk.table),
                    self.quote(fk.column)
                ));
            }
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.table(table),
            parts.join(",\n    ")
        )
    }

    /// DDL for every table, in dependency order
    pub fn create_statements(&self) -> Vec<String> {
        ALL_TABLES
            .iter()
            .map(|table| self.create_table_sql(table))
            .collect()
    }
}
