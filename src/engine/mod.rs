//! Schema Source Trait and Core Types
//!
//! This module defines the schema snapshot consumed by the diagram and
//! data-dictionary stages, and the [`SchemaSource`] trait that produces it.
//!
//! # Stateless Design
//! A source opens a connection, reads the whole schema and closes the
//! connection within one `load_schema` call. Later stages only see the
//! in-memory [`SchemaInfo`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ExclusionList;
use crate::error::Result;

pub mod postgres;

/// Default `PostgreSQL` port
pub const DEFAULT_PORT: u16 = 5432;

/// Default host when none is supplied
pub const DEFAULT_HOST: &str = "localhost";

/// Connection configuration for the documented database
#[derive(Clone, Serialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,

    /// Password
    /// WARNING: Sensitive data, do not log or include in error messages
    #[serde(skip_serializing)]
    pub password: String,

    pub database: String,

    /// Schema to document; `None` means the server's `current_schema()`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl ConnectionConfig {
    /// Create a new `PostgreSQL` connection config
    #[must_use]
    pub const fn postgres(
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    ) -> Self {
        Self { host, port, user, password, database, schema: None }
    }

    /// Restrict introspection to `schema`
    #[must_use]
    pub fn with_schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema;
        self
    }

    /// Connection URL without the password, safe for logs
    #[must_use]
    pub fn redacted_url(&self) -> String {
        format!("postgresql://{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("schema", &self.schema)
            .finish()
    }
}

/// Schema introspection result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaInfo {
    /// Tables, sorted by name
    pub tables: Vec<TableInfo>,
}

impl SchemaInfo {
    /// Build a schema snapshot, sorting tables by name
    #[must_use]
    pub fn new(mut tables: Vec<TableInfo>) -> Self {
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Self { tables }
    }

    /// Drop excluded tables, keeping name order
    #[must_use]
    pub fn excluding(self, exclusions: &ExclusionList) -> Self {
        if exclusions.is_empty() {
            return self;
        }

        let tables = self.tables.into_iter().filter(|t| !exclusions.contains(&t.name)).collect();
        Self { tables }
    }

    /// Table names in document order
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    #[must_use]
    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name == name)
    }
}

/// Table information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name
    pub name: String,

    /// Columns in ordinal order
    pub columns: Vec<ColumnInfo>,

    /// Primary key columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,

    /// Foreign keys, in introspection order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKeyInfo>,

    /// Unique constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_constraints: Vec<UniqueConstraintInfo>,

    /// Indexes (primary-key indexes excluded)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexInfo>,
}

/// Column information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,

    /// Column data type as reported by the engine
    pub data_type: String,

    /// Character length (e.g. `varchar(100)` → 100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i32>,

    /// Numeric precision (e.g. `numeric(10, 2)` → 10)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<i32>,

    /// Whether column allows NULL values
    pub nullable: bool,

    /// Whether column is part of the primary key
    pub primary_key: bool,

    /// Whether column is backed by a sequence or identity
    pub autoincrement: bool,
}

/// Foreign key information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    /// Foreign key constraint name
    pub name: String,

    /// Column names in this table
    pub columns: Vec<String>,

    /// Referenced table name
    pub referenced_table: String,

    /// Referenced column names
    pub referenced_columns: Vec<String>,
}

/// Unique constraint information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueConstraintInfo {
    pub name: String,
    pub columns: Vec<String>,
}

/// Index information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Index name
    pub name: String,

    /// Column names included in the index
    pub columns: Vec<String>,

    /// Whether this is a unique index
    pub unique: bool,
}

/// Producer of a schema snapshot
///
/// The pipeline is generic over this trait so the live database can be
/// swapped for a fixture.
pub trait SchemaSource {
    /// Open a connection, read every table of the target schema, and close it
    fn load_schema(&self) -> impl std::future::Future<Output = Result<SchemaInfo>> + Send;
}
