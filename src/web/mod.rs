pub mod handlers;
pub mod routes;
pub mod state;
pub mod static_files;

use crate::config::WebConfig;
use axum::Router;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use self::state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::ui_routes())
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(config: WebConfig, state: Arc<AppState>) -> Result<(), std::io::Error> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    info!("Database query page: http://{}/database-query", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::db_pool::memory_pool;
    use crate::db::seed;
    use crate::llm::{LlmError, LlmManager, SqlGenerator};
    use crate::nlq::QueryAssistant;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    struct Unreachable;

    #[async_trait]
    impl SqlGenerator for Unreachable {
        async fn generate_sql(&self, _question: &str, _schema: &str) -> Result<String, LlmError> {
            Err(LlmError::ConnectionError("connection refused".to_string()))
        }
    }

    fn test_app(assistant: QueryAssistant) -> Router {
        let pool = memory_pool();
        {
            let conn = pool.get().unwrap();
            seed::create_tables(&conn).unwrap();
            seed::populate_sample_data(&conn, &mut StdRng::seed_from_u64(42)).unwrap();
        }
        app(Arc::new(AppState::new(AppConfig::default(), pool, assistant)))
    }

    async fn ask(app: Router, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/database/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_count_users_end_to_end() {
        let (status, body) = ask(test_app(QueryAssistant::rules_only()), json!({"question": "how many users"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["source"], "rule");
        assert_eq!(body["sql_query"], "SELECT COUNT(*) as total_users FROM users;");
        assert_eq!(body["columns"], json!(["total_users"]));
        assert_eq!(body["row_count"], 1);
        assert_eq!(body["results"][0]["total_users"], 25);
        assert_eq!(body["question"], "how many users");
    }

    #[tokio::test]
    async fn test_top_expensive_products_are_sorted() {
        let (status, body) = ask(
            test_app(QueryAssistant::rules_only()),
            json!({"question": "show top 5 expensive products"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["row_count"], 5);
        let prices: Vec<f64> = body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["price"].as_f64().unwrap())
            .collect();
        assert!(prices.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(body["columns"], json!(["name", "price", "brand", "category", "rating"]));
    }

    #[tokio::test]
    async fn test_price_filter_respects_threshold() {
        let (status, body) = ask(test_app(QueryAssistant::rules_only()), json!({"question": "products under 500"})).await;

        assert_eq!(status, StatusCode::OK);
        let rows = body["results"].as_array().unwrap();
        assert!(rows.len() <= 100);
        assert!(rows.iter().all(|row| row["price"].as_f64().unwrap() < 500.0));
    }

    #[tokio::test]
    async fn test_every_analytics_rule_executes() {
        let app = test_app(QueryAssistant::rules_only());
        for question in [
            "show tables",
            "describe products",
            "average price",
            "total revenue",
            "recent orders",
            "products per category",
            "list brands count",
            "popular products",
            "user activity",
            "nike",
            "kids",
        ] {
            let (status, body) = ask(app.clone(), json!({ "question": question })).await;
            assert_eq!(status, StatusCode::OK, "{}: {}", question, body);
            assert_eq!(body["source"], "rule");
        }
    }

    #[tokio::test]
    async fn test_empty_question_is_input_error() {
        let (status, body) = ask(test_app(QueryAssistant::rules_only()), json!({"question": "   "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Please provide a question");

        let (status, _) = ask(test_app(QueryAssistant::rules_only()), json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_is_input_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/database/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(test_app(QueryAssistant::rules_only()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_unknown_question_gets_hint() {
        let (status, body) = ask(test_app(QueryAssistant::rules_only()), json!({"question": "sing me a song"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["suggestion"].as_str().unwrap().contains("Show top 10 expensive products"));
    }

    #[tokio::test]
    async fn test_unreachable_model_never_surfaces() {
        let llm = LlmManager::from_generator("fake", Box::new(Unreachable));
        let assistant = QueryAssistant::new(Some(llm), Duration::from_secs(1));
        let (status, body) = ask(test_app(assistant), json!({"question": "how many products"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "rule");
        assert_eq!(body["results"][0]["total_products"], 1000);
    }

    #[tokio::test]
    async fn test_schema_endpoint() {
        let request = Request::builder()
            .uri("/api/database/schema")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(test_app(QueryAssistant::rules_only()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["schema"]["products"]["columns"][1]["name"], "name");
        assert!(body["schema"]["products"]["sample_data"].as_array().unwrap().len() <= 2);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let request = Request::builder().uri("/api/status").body(Body::empty()).unwrap();
        let (status, body) = send(test_app(QueryAssistant::rules_only()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["table_count"], 6);
        assert_eq!(body["ai_enabled"], false);
        assert_eq!(body["ai_backend"], Value::Null);
    }

    #[tokio::test]
    async fn test_index_page_is_served() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = test_app(QueryAssistant::rules_only()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/api/database/query"));
    }

    #[tokio::test]
    async fn test_missing_asset_is_404() {
        let request = Request::builder().uri("/static/nope.css").body(Body::empty()).unwrap();
        let response = test_app(QueryAssistant::rules_only()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
