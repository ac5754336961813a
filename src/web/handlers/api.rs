use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::db::executor::{QueryError, Row};
use crate::db::schema::SchemaDescription;
use crate::nlq::QuerySource;
use crate::web::state::AppState;

const USAGE_HINT: &str = "Try: 'Show top 10 expensive products' or 'Count all users'";

// Query types

#[derive(Debug, Deserialize, Clone)]
pub struct NlQueryRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct NlQueryResponse {
    pub status: &'static str,
    pub question: String,
    pub sql_query: String,
    pub explanation: String,
    pub results: Vec<Row>,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub source: QuerySource,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub status: &'static str,
    pub schema: SchemaDescription,
}

// System status

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: i64,
    pub database: String,
    pub table_count: usize,
    pub ai_enabled: bool,
    pub ai_backend: Option<String>,
}

// Errors

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            message: self.message,
            suggestion: self.suggestion,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Pool(e) => {
                error!("Failed to get DB connection: {}", e);
                ApiError::internal("Database not connected")
            }
            QueryError::Task(e) => {
                error!("Query task failed: {}", e);
                ApiError::internal(format!("Database task execution failed: {}", e))
            }
            other => ApiError::bad_request(format!("Query execution error: {}", other))
                .with_suggestion("Try rephrasing your question or check the SQL syntax."),
        }
    }
}

// API Implementations

// Natural language query
pub async fn database_query(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<NlQueryRequest>, JsonRejection>,
) -> Result<Json<NlQueryResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let question = payload.question.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::bad_request("Please provide a question"));
    }

    let start_time = Instant::now();
    debug!("NL-query: {}", question);

    // The model needs the schema; the rules do not
    let schema = if app_state.assistant.ai_enabled() {
        Some(app_state.describe_schema().await)
    } else {
        None
    };

    let candidate = app_state
        .assistant
        .translate(&question, schema.as_ref())
        .await
        .ok_or_else(|| {
            info!("No translation for question: {}", question);
            ApiError::bad_request("Could not understand your question.").with_suggestion(USAGE_HINT)
        })?;

    info!("Validated SQL ({:?}): {}", candidate.source, candidate.sql);

    let result = app_state.run_query(&candidate.sql).await.map_err(|e| {
        error!("Database query error: {}", e);
        ApiError::from(e)
    })?;

    info!(
        "Query executed successfully. Row count: {}, Execution time: {}ms",
        result.row_count,
        start_time.elapsed().as_millis()
    );

    Ok(Json(NlQueryResponse {
        status: "success",
        explanation: candidate.source.explanation(result.row_count),
        question,
        sql_query: candidate.sql,
        row_count: result.row_count,
        columns: result.columns,
        results: result.rows,
        source: candidate.source,
    }))
}

// Schema
pub async fn database_schema(State(state): State<Arc<AppState>>) -> Json<SchemaResponse> {
    Json(SchemaResponse {
        status: "success",
        schema: state.describe_schema().await,
    })
}

// System status
pub async fn system_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SystemStatus>, ApiError> {
    let now = chrono::Utc::now();
    let uptime = now.signed_duration_since(state.startup_time).num_seconds();

    let table_count = state.table_count().await?;

    Ok(Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        database: state.config.database.connection_string.clone(),
        table_count,
        ai_enabled: state.assistant.ai_enabled(),
        ai_backend: state.assistant.ai_backend().map(str::to_string),
    }))
}
