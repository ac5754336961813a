use crate::db::db_pool::DbPool;
use crate::db::executor::{self, QueryError, Row};
use duckdb::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Rows fetched per table for the description.
pub const SAMPLE_ROWS: usize = 2;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableDescription {
    pub columns: Vec<ColumnInfo>,
    pub sample_data: Vec<Row>,
}

/// Table name → columns and a few sample rows, read fresh on every call.
pub type SchemaDescription = BTreeMap<String, TableDescription>;

pub fn list_tables(conn: &Connection) -> Result<Vec<String>, duckdb::Error> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(tables)
}

fn describe_table(conn: &Connection, table_name: &str) -> Result<TableDescription, QueryError> {
    let mut col_stmt = conn.prepare(&format!("PRAGMA table_info('{}')", table_name.replace('\'', "''")))?;
    let columns = col_stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get::<_, String>(1)?,
                data_type: row.get::<_, String>(2)?,
            })
        })?
        .collect::<Result<Vec<ColumnInfo>, _>>()?;

    let sample_sql = format!(
        "SELECT * FROM \"{}\" LIMIT {}",
        table_name.replace('"', "\"\""),
        SAMPLE_ROWS
    );
    let sample_data = executor::execute(conn, &sample_sql)?.rows;

    Ok(TableDescription { columns, sample_data })
}

/// Describes every table visible on `conn`. Tables that cannot be
/// introspected are logged and left out.
pub fn describe_schema(conn: &Connection) -> SchemaDescription {
    let mut schema = SchemaDescription::new();

    let tables = match list_tables(conn) {
        Ok(tables) => tables,
        Err(e) => {
            error!("Error listing tables: {}", e);
            return schema;
        }
    };

    for table_name in tables {
        match describe_table(conn, &table_name) {
            Ok(description) => {
                debug!("Described table {} ({} columns)", table_name, description.columns.len());
                schema.insert(table_name, description);
            }
            Err(e) => error!("Error describing table {}: {}", table_name, e),
        }
    }

    schema
}

/// Pool-backed variant used on the request path; an unavailable
/// connection yields an empty description.
pub async fn describe_schema_pooled(pool: &DbPool) -> SchemaDescription {
    let pool = pool.clone();
    let result = tokio::task::spawn_blocking(move || -> Result<SchemaDescription, QueryError> {
        let conn = pool.get()?;
        Ok(describe_schema(&conn))
    })
    .await;

    match result {
        Ok(Ok(schema)) => schema,
        Ok(Err(e)) => {
            error!("Error getting schema: {}", e);
            SchemaDescription::new()
        }
        Err(join_err) => {
            error!("Schema task failed: {}", join_err);
            SchemaDescription::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::db_pool::memory_pool;
    use crate::db::seed;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seeded_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        seed::create_tables(&conn).unwrap();
        seed::populate_sample_data(&conn, &mut StdRng::seed_from_u64(7)).unwrap();
        conn
    }

    #[test]
    fn test_describes_every_table() {
        let conn = seeded_connection();
        let schema = describe_schema(&conn);

        let tables: Vec<&String> = schema.keys().collect();
        assert_eq!(
            tables,
            vec!["cart", "interactions", "order_items", "orders", "products", "users"]
        );

        let products = &schema["products"];
        let names: Vec<&str> = products.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(&names[..4], &["id", "name", "price", "mrp"]);
        assert_eq!(products.columns[2].data_type, "DOUBLE");
    }

    #[test]
    fn test_samples_are_capped_and_shaped_like_columns() {
        let conn = seeded_connection();
        let schema = describe_schema(&conn);

        for (table, description) in &schema {
            assert!(description.sample_data.len() <= SAMPLE_ROWS, "{} has too many samples", table);
            let column_names: Vec<&String> = description.columns.iter().map(|c| &c.name).collect();
            for row in &description.sample_data {
                let keys: Vec<&String> = row.keys().collect();
                assert_eq!(keys, column_names, "sample row of {} does not match columns", table);
            }
        }
        assert_eq!(schema["products"].sample_data.len(), SAMPLE_ROWS);
        assert!(schema["cart"].sample_data.is_empty());
    }

    #[test]
    fn test_back_to_back_descriptions_match_structurally() {
        let conn = seeded_connection();
        let first = describe_schema(&conn);
        let second = describe_schema(&conn);

        assert_eq!(first.len(), second.len());
        for (table, description) in &first {
            assert_eq!(description.columns, second[table].columns);
        }
    }

    #[test]
    fn test_empty_database_has_empty_description() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(describe_schema(&conn).is_empty());
    }

    #[tokio::test]
    async fn test_pooled_description() {
        let pool = memory_pool();
        {
            let conn = pool.get().unwrap();
            conn.execute_batch("CREATE TABLE notes (id INTEGER, body VARCHAR)").unwrap();
        }
        let schema = describe_schema_pooled(&pool).await;
        assert_eq!(schema.len(), 1);
        assert_eq!(schema["notes"].columns[1].data_type, "VARCHAR");
    }

    #[test]
    fn test_serialized_shape() {
        let conn = seeded_connection();
        let schema = describe_schema(&conn);
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["users"]["columns"][0]["name"], "id");
        assert_eq!(value["users"]["columns"][0]["type"], "INTEGER");
        assert!(value["users"]["sample_data"].is_array());
    }
}
