use duckdb::Connection;
use r2d2::{ManageConnection, Pool};
use std::sync::Mutex;

pub type DbPool = Pool<DuckDBConnectionManager>;

/// Hands out connections cloned from a single opened database, so every
/// pooled connection (including `:memory:` ones) sees the same data.
pub struct DuckDBConnectionManager {
    root: Mutex<Connection>,
}

impl DuckDBConnectionManager {
    pub fn new(connection_string: String) -> Result<Self, duckdb::Error> {
        let root = if connection_string == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(&connection_string)?
        };

        Ok(Self {
            root: Mutex::new(root),
        })
    }
}

impl ManageConnection for DuckDBConnectionManager {
    type Connection = Connection;
    type Error = duckdb::Error;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let root = self.root.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        root.try_clone()
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.execute("SELECT 1", [])?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

pub fn build_pool(connection_string: &str, pool_size: u32) -> Result<DbPool, Box<dyn std::error::Error + Send + Sync>> {
    let manager = DuckDBConnectionManager::new(connection_string.to_string())?;
    let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;
    Ok(pool)
}

#[cfg(test)]
pub fn memory_pool() -> DbPool {
    build_pool(":memory:", 2).expect("in-memory pool")
}
