use arrow::json::writer::{JsonArray, WriterBuilder};
use arrow::record_batch::RecordBatch;
use duckdb::Connection;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// One result row, keyed by column name in select-list order.
pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{0}")]
    Sql(#[from] duckdb::Error),
    #[error("failed to encode results: {0}")]
    Encode(#[from] arrow::error::ArrowError),
    #[error("failed to decode results: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no database connection: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("query task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: usize,
}

/// Runs `sql` and shapes every row into a column → value map. Engine errors
/// come back untouched so the caller can show them.
pub fn execute(conn: &Connection, sql: &str) -> Result<QueryResult, QueryError> {
    let start_time = Instant::now();

    let mut stmt = conn.prepare(sql)?;
    let arrow_batch = stmt.query_arrow([])?;
    let schema = arrow_batch.get_schema();

    let columns = schema
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .collect::<Vec<String>>();

    let record_batches = arrow_batch.collect::<Vec<RecordBatch>>();
    let rows = batches_to_rows(&record_batches)?;
    let row_count = rows.len();

    debug!(
        "Executed query in {}ms, {} rows: {}",
        start_time.elapsed().as_millis(),
        row_count,
        sql
    );

    Ok(QueryResult {
        columns,
        rows,
        row_count,
    })
}

fn batches_to_rows(batches: &[RecordBatch]) -> Result<Vec<Row>, QueryError> {
    if batches.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = WriterBuilder::new()
        .with_explicit_nulls(true)
        .build::<_, JsonArray>(Vec::new());

    let refs: Vec<&RecordBatch> = batches.iter().collect();
    writer.write_batches(&refs)?;
    writer.finish()?;

    let buffer = writer.into_inner();
    if buffer.is_empty() {
        return Ok(Vec::new());
    }

    Ok(serde_json::from_slice(&buffer)?)
}
