use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use nl_shop::config::{AppConfig, CliArgs};
use nl_shop::db::db_pool::build_pool;
use nl_shop::db::seed;
use nl_shop::llm::LlmManager;
use nl_shop::nlq::QueryAssistant;
use nl_shop::util::logging::init_tracing;
use nl_shop::web::{self, state::AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Pick up GEMINI_API_KEY and friends from .env
    dotenv::dotenv().ok();

    // Parse command line arguments
    let args = CliArgs::parse();

    // Initialize logging
    init_tracing(args.log_json);

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!("Initializing DuckDB connection pool: {}", config.database.connection_string);
    let pool = build_pool(&config.database.connection_string, config.database.pool_size as u32)?;

    {
        let conn = pool.get()?;
        seed::create_tables(&conn)?;

        if config.database.seed_sample_data {
            match seed::populate_sample_data(&conn, &mut rand::thread_rng()) {
                Ok(true) => info!("Sample data generated"),
                Ok(false) => info!("Sample data already present"),
                // queries still work against whatever is there
                Err(e) => error!("Error populating sample data: {}", e),
            }
        }
    }

    // The model is optional; without it every question goes to the rules
    info!("Initializing AI translator with backend: {}", config.ai.backend);
    let llm = match LlmManager::new(&config.ai) {
        Ok(llm) => llm,
        Err(e) => {
            warn!("AI initialization failed: {}", e);
            None
        }
    };

    match &llm {
        Some(llm) => info!("Mode: AI-powered ({}) with pattern fallback", llm.backend()),
        None => info!("Mode: pattern-based"),
    }

    let assistant = QueryAssistant::new(llm, Duration::from_secs(config.ai.timeout_secs));
    let app_state = Arc::new(AppState::new(config.clone(), pool, assistant));

    // Start the web server
    info!("Starting NL-Shop server on {}:{}", config.web.host, config.web.port);
    match web::run_server(config.web, app_state).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
