//! `PostgreSQL` Schema Introspection
//!
//! This module implements [`SchemaSource`] for `PostgreSQL` databases.
//!
//! # Features
//! - Client-server connections via TCP
//! - Schema introspection via `information_schema` and the `pg_catalog` tables
//! - Column length/precision, nullability, primary key and auto-increment detection
//! - Foreign keys, unique constraints and indexes per table
//!
//! # Implementation Notes
//! - Uses `tokio-postgres` (async driver, requires tokio runtime)
//! - `information_schema` columns are cast to plain SQL types, since its domain
//!   types (`sql_identifier`, `cardinal_number`) have no direct Rust mapping
//! - Only base tables are documented (views are skipped)
//! - The target schema is `current_schema()` unless one is configured

use tokio_postgres::{Client, Config, NoTls};

use crate::engine::{
    ColumnInfo, ConnectionConfig, ForeignKeyInfo, IndexInfo, SchemaInfo, SchemaSource, TableInfo,
    UniqueConstraintInfo,
};
use crate::error::{AutodocError, Result};

/// `PostgreSQL` schema source
#[derive(Debug, Clone)]
pub struct PostgresEngine {
    config: ConnectionConfig,
}

impl PostgresEngine {
    #[must_use]
    pub const fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<Client> {
        let pg_config = build_pg_config(&self.config)?;

        let (client, connection) = pg_config.connect(NoTls).await.map_err(|e| {
            AutodocError::connection_failed(format!("Failed to connect to PostgreSQL: {e}"))
        })?;

        // Spawn connection handler
        // Note: Connection errors are not logged to prevent credential leakage
        tokio::spawn(async move {
            let _ = connection.await;
        });

        Ok(client)
    }
}

impl SchemaSource for PostgresEngine {
    async fn load_schema(&self) -> Result<SchemaInfo> {
        tracing::info!(url = %self.config.redacted_url(), "Connecting to database");
        let client = self.connect().await?;

        let schema = determine_target_schema(&client, self.config.schema.as_deref()).await?;
        let table_names = list_tables(&client, &schema).await?;
        tracing::info!(schema = %schema, tables = table_names.len(), "Introspecting schema");

        let mut tables = Vec::with_capacity(table_names.len());
        for name in table_names {
            tables.push(introspect_table(&client, &schema, name).await?);
        }

        Ok(SchemaInfo::new(tables))
    }
}

/// Build `PostgreSQL` connection config from `ConnectionConfig`
fn build_pg_config(config: &ConnectionConfig) -> Result<Config> {
    if config.host.is_empty() {
        return Err(AutodocError::invalid_input("PostgreSQL requires 'host' parameter"));
    }
    if config.user.is_empty() {
        return Err(AutodocError::invalid_input("PostgreSQL requires 'user' parameter"));
    }
    if config.database.is_empty() {
        return Err(AutodocError::invalid_input("PostgreSQL requires 'database' parameter"));
    }

    let mut pg_config = Config::new();
    pg_config
        .host(&config.host)
        .port(config.port)
        .user(&config.user)
        .password(&config.password)
        .dbname(&config.database)
        .application_name("autodoc");

    Ok(pg_config)
}

/// Determine target schema from filter or current schema
async fn determine_target_schema(client: &Client, schema_filter: Option<&str>) -> Result<String> {
    if let Some(schema) = schema_filter {
        return Ok(schema.to_string());
    }

    let row = client.query_one("SELECT current_schema()::text", &[]).await.map_err(|e| {
        AutodocError::engine_error("postgres", format!("Failed to query current schema: {e}"))
    })?;

    let current_schema: Option<String> = row.get(0);
    current_schema.ok_or_else(|| {
        AutodocError::engine_error("postgres", "No current schema (search_path is empty)")
    })
}

/// List base tables of `schema`, sorted by name
async fn list_tables(client: &Client, schema: &str) -> Result<Vec<String>> {
    let query = "
        SELECT table_name::text
        FROM information_schema.tables
        WHERE table_schema = $1 AND table_type = 'BASE TABLE'
        ORDER BY table_name";

    let rows = client.query(query, &[&schema]).await.map_err(|e| {
        AutodocError::engine_error("postgres", format!("Failed to list tables in {schema}: {e}"))
    })?;

    Ok(rows.iter().map(|row| row.get(0)).collect())
}

async fn introspect_table(client: &Client, schema: &str, name: String) -> Result<TableInfo> {
    let primary_key = introspect_primary_key(client, schema, &name).await?;
    let mut columns = introspect_columns(client, schema, &name).await?;
    for column in &mut columns {
        column.primary_key = primary_key.contains(&column.name);
    }

    let foreign_keys = introspect_foreign_keys(client, schema, &name).await?;
    let unique_constraints = introspect_unique_constraints(client, schema, &name).await?;
    let indexes = introspect_indexes(client, schema, &name).await?;

    tracing::debug!(
        table = %name,
        columns = columns.len(),
        foreign_keys = foreign_keys.len(),
        indexes = indexes.len(),
        "Introspected table"
    );

    Ok(TableInfo { name, columns, primary_key, foreign_keys, unique_constraints, indexes })
}

/// Introspect table columns
///
/// The type comes from `format_type`, so declared modifiers such as
/// `character varying(120)` or `timestamp(3) without time zone` are kept.
async fn introspect_columns(
    client: &Client,
    schema: &str,
    table_name: &str,
) -> Result<Vec<ColumnInfo>> {
    let query = "
        SELECT
            c.column_name::text,
            pg_catalog.format_type(a.atttypid, a.atttypmod),
            c.data_type::text,
            c.udt_name::text,
            c.character_maximum_length::int4,
            c.numeric_precision::int4,
            c.datetime_precision::int4,
            c.is_nullable::text,
            c.column_default::text,
            c.is_identity::text
        FROM information_schema.columns c
        JOIN pg_catalog.pg_namespace n ON n.nspname = c.table_schema
        JOIN pg_catalog.pg_class t ON t.relnamespace = n.oid AND t.relname = c.table_name
        JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid AND a.attname = c.column_name
        WHERE c.table_schema = $1 AND c.table_name = $2
        ORDER BY c.ordinal_position";

    let rows = client.query(query, &[&schema, &table_name]).await.map_err(|e| {
        AutodocError::engine_error(
            "postgres",
            format!("Failed to query columns for {schema}.{table_name}: {e}"),
        )
    })?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let formatted: String = row.get(1);
        let data_type: String = row.get(2);
        let udt_name: String = row.get(3);
        let numeric_precision: Option<i32> = row.get(5);
        let datetime_precision: Option<i32> = row.get(6);
        let is_nullable: String = row.get(7);
        let default: Option<String> = row.get(8);
        let is_identity: Option<String> = row.get(9);

        columns.push(ColumnInfo {
            name: row.get(0),
            precision: declared_precision(&formatted, numeric_precision, datetime_precision),
            data_type: display_type(&formatted, &data_type, &udt_name),
            length: row.get(4),
            nullable: is_nullable == "YES",
            primary_key: false,
            autoincrement: is_autoincrement(default.as_deref(), is_identity.as_deref()),
        });
    }

    Ok(columns)
}

/// Pick the shown type name
///
/// `format_type` schema-qualifies user-defined types outside the search path,
/// so enums and domains are shown by their bare name.
fn display_type(formatted: &str, data_type: &str, udt_name: &str) -> String {
    if data_type == "USER-DEFINED" {
        udt_name.to_string()
    } else {
        formatted.to_string()
    }
}

/// Precision for exact numerics, and for date/time types with a declared
/// fractional-seconds precision
fn declared_precision(
    formatted: &str,
    numeric_precision: Option<i32>,
    datetime_precision: Option<i32>,
) -> Option<i32> {
    let base = formatted.split('(').next().unwrap_or(formatted).trim();
    if is_exact_numeric(base) {
        return numeric_precision;
    }
    // information_schema reports 6 for undeclared timestamps
    let is_datetime = base.starts_with("time") || base.starts_with("interval");
    if is_datetime && formatted.contains('(') {
        datetime_precision
    } else {
        None
    }
}

fn is_exact_numeric(data_type: &str) -> bool {
    matches!(data_type, "numeric" | "decimal")
}

/// Serial columns default to `nextval(...)`; identity columns report `is_identity`
fn is_autoincrement(default: Option<&str>, is_identity: Option<&str>) -> bool {
    is_identity == Some("YES") || default.is_some_and(|d| d.starts_with("nextval("))
}

/// Introspect primary key
async fn introspect_primary_key(
    client: &Client,
    schema: &str,
    table_name: &str,
) -> Result<Vec<String>> {
    let query = "
        SELECT kcu.column_name::text
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
          ON tc.constraint_name = kcu.constraint_name
          AND tc.table_schema = kcu.table_schema
          AND tc.table_name = kcu.table_name
        WHERE tc.constraint_type = 'PRIMARY KEY'
          AND tc.table_schema = $1
          AND tc.table_name = $2
        ORDER BY kcu.ordinal_position";

    let rows = client.query(query, &[&schema, &table_name]).await.map_err(|e| {
        AutodocError::engine_error(
            "postgres",
            format!("Failed to query primary key for {schema}.{table_name}: {e}"),
        )
    })?;

    Ok(rows.iter().map(|row| row.get(0)).collect())
}

/// Introspect foreign keys
///
/// Read from `pg_constraint` by table OID, since constraint names are only
/// unique per table. Key columns are paired position by position.
async fn introspect_foreign_keys(
    client: &Client,
    schema: &str,
    table_name: &str,
) -> Result<Vec<ForeignKeyInfo>> {
    let query = "
        SELECT
            con.conname::text,
            la.attname::text,
            rt.relname::text,
            ra.attname::text
        FROM pg_catalog.pg_constraint con
        JOIN pg_catalog.pg_class t ON t.oid = con.conrelid
        JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
        JOIN pg_catalog.pg_class rt ON rt.oid = con.confrelid
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
            WITH ORDINALITY AS k(attnum, ref_attnum, ord)
        JOIN pg_catalog.pg_attribute la ON la.attrelid = con.conrelid AND la.attnum = k.attnum
        JOIN pg_catalog.pg_attribute ra
          ON ra.attrelid = con.confrelid AND ra.attnum = k.ref_attnum
        WHERE con.contype = 'f'
          AND n.nspname = $1
          AND t.relname = $2
        ORDER BY con.conname, k.ord";

    let rows = client.query(query, &[&schema, &table_name]).await.map_err(|e| {
        AutodocError::engine_error(
            "postgres",
            format!("Failed to query foreign keys for {schema}.{table_name}: {e}"),
        )
    })?;

    let rows = rows.iter().map(|row| (row.get(0), row.get(1), row.get(2), row.get(3)));
    Ok(group_foreign_keys(rows))
}

/// Group `(constraint, column, foreign_table, foreign_column)` rows by constraint,
/// preserving row order
fn group_foreign_keys(
    rows: impl IntoIterator<Item = (String, String, String, String)>,
) -> Vec<ForeignKeyInfo> {
    let mut foreign_keys: Vec<ForeignKeyInfo> = Vec::new();

    for (constraint_name, column_name, foreign_table, foreign_column) in rows {
        match foreign_keys.last_mut() {
            Some(fk) if fk.name == constraint_name => {
                fk.columns.push(column_name);
                fk.referenced_columns.push(foreign_column);
            }
            _ => foreign_keys.push(ForeignKeyInfo {
                name: constraint_name,
                columns: vec![column_name],
                referenced_table: foreign_table,
                referenced_columns: vec![foreign_column],
            }),
        }
    }

    foreign_keys
}

/// Introspect unique constraints
async fn introspect_unique_constraints(
    client: &Client,
    schema: &str,
    table_name: &str,
) -> Result<Vec<UniqueConstraintInfo>> {
    let query = "
        SELECT tc.constraint_name::text, kcu.column_name::text
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
          ON tc.constraint_name = kcu.constraint_name
          AND tc.table_schema = kcu.table_schema
          AND tc.table_name = kcu.table_name
        WHERE tc.constraint_type = 'UNIQUE'
          AND tc.table_schema = $1
          AND tc.table_name = $2
        ORDER BY tc.constraint_name, kcu.ordinal_position";

    let rows = client.query(query, &[&schema, &table_name]).await.map_err(|e| {
        AutodocError::engine_error(
            "postgres",
            format!("Failed to query unique constraints for {schema}.{table_name}: {e}"),
        )
    })?;

    let mut constraints: Vec<UniqueConstraintInfo> = Vec::new();
    for row in rows {
        let name: String = row.get(0);
        let column: String = row.get(1);

        match constraints.last_mut() {
            Some(constraint) if constraint.name == name => constraint.columns.push(column),
            _ => constraints.push(UniqueConstraintInfo { name, columns: vec![column] }),
        }
    }

    Ok(constraints)
}

/// Introspect indexes
///
/// Primary key indexes are left out, as are `INCLUDE` columns. Expression
/// indexes have no column to document and are skipped.
async fn introspect_indexes(
    client: &Client,
    schema: &str,
    table_name: &str,
) -> Result<Vec<IndexInfo>> {
    let query = "
        SELECT
            ic.relname::text,
            ix.indisunique,
            a.attname::text
        FROM pg_catalog.pg_index ix
        JOIN pg_catalog.pg_class ic ON ic.oid = ix.indexrelid
        JOIN pg_catalog.pg_class t ON t.oid = ix.indrelid
        JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
        CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
        LEFT JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
        WHERE n.nspname = $1
          AND t.relname = $2
          AND NOT ix.indisprimary
          AND k.ord <= ix.indnkeyatts
        ORDER BY ic.relname, k.ord";

    let rows = client.query(query, &[&schema, &table_name]).await.map_err(|e| {
        AutodocError::engine_error(
            "postgres",
            format!("Failed to query indexes for {schema}.{table_name}: {e}"),
        )
    })?;

    let rows = rows.iter().map(|row| (row.get(0), row.get(1), row.get(2)));
    Ok(group_index_columns(rows))
}

/// Group `(index, unique, column)` rows by index, preserving row order
///
/// A `None` column is an expression key; such indexes are dropped.
fn group_index_columns(
    rows: impl IntoIterator<Item = (String, bool, Option<String>)>,
) -> Vec<IndexInfo> {
    let mut grouped: Vec<(IndexInfo, bool)> = Vec::new();

    for (index_name, unique, column) in rows {
        if grouped.last().map_or(true, |(index, _)| index.name != index_name) {
            grouped.push((IndexInfo { name: index_name, columns: Vec::new(), unique }, false));
        }
        if let Some((index, has_expression)) = grouped.last_mut() {
            match column {
                Some(column) => index.columns.push(column),
                None => *has_expression = true,
            }
        }
    }

    grouped
        .into_iter()
        .filter_map(|(index, has_expression)| {
            if has_expression {
                tracing::debug!(index = %index.name, "Skipping expression index");
                None
            } else {
                Some(index)
            }
        })
        .collect()
}
