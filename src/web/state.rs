use crate::config::AppConfig;
use crate::db::db_pool::DbPool;
use crate::db::executor::{self, QueryError, QueryResult};
use crate::db::schema::{self, SchemaDescription};
use crate::nlq::QueryAssistant;

/// Shared application state for the web server
pub struct AppState {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub assistant: QueryAssistant,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, db_pool: DbPool, assistant: QueryAssistant) -> Self {
        Self {
            config,
            db_pool,
            assistant,
            startup_time: chrono::Utc::now(),
        }
    }

    pub async fn describe_schema(&self) -> SchemaDescription {
        schema::describe_schema_pooled(&self.db_pool).await
    }

    // DuckDB calls block, so they run off the async workers
    pub async fn run_query(&self, sql: &str) -> Result<QueryResult, QueryError> {
        let pool = self.db_pool.clone();
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || -> Result<QueryResult, QueryError> {
            let conn = pool.get()?;
            executor::execute(&conn, &sql)
        })
        .await?
    }

    pub async fn table_count(&self) -> Result<usize, QueryError> {
        let pool = self.db_pool.clone();

        tokio::task::spawn_blocking(move || -> Result<usize, QueryError> {
            let conn = pool.get()?;
            Ok(schema::list_tables(&conn)?.len())
        })
        .await?
    }
}
