use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub connection_string: String, // file path or ":memory:"
    pub pool_size: usize,
    pub seed_sample_data: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AiConfig {
    pub backend: String, // "gemini", "remote", "ollama" or "none"
    pub model: String,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub ai: AiConfig,
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// DuckDB database file (or ":memory:")
    #[arg(long)]
    pub database: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        // Start with default configuration
        let mut config_builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = [
                "config.toml",
                "config/config.toml",
                "/etc/nl-shop/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        // NLSHOP__AI__API_KEY=... and friends
        config_builder = config_builder.add_source(
            Environment::with_prefix("NLSHOP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;

        // Override with command line args if provided
        if let Some(host) = &args.host {
            config.web.host = host.clone();
        }
        if let Some(port) = args.port {
            config.web.port = port;
        }
        if let Some(database) = &args.database {
            config.database.connection_string = database.clone();
        }

        config.ai.apply_key_fallback(std::env::var("GEMINI_API_KEY").ok());

        Ok(config)
    }
}

impl AiConfig {
    /// Picks up a bare Gemini key when no key was configured, switching the
    /// backend on if it was left at "none".
    pub fn apply_key_fallback(&mut self, gemini_key: Option<String>) {
        let key = match gemini_key.map(|k| k.trim().to_string()) {
            Some(k) if !k.is_empty() => k,
            _ => return,
        };

        if self.api_key.is_none() {
            self.api_key = Some(key);
            if self.backend == "none" {
                self.backend = "gemini".to_string();
            }
        }
    }
}

// Default implementation
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                connection_string: "ecommerce.duckdb".to_string(),
                pool_size: 5,
                seed_sample_data: true,
            },
            web: WebConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            ai: AiConfig {
                backend: "none".to_string(),
                model: "gemini-2.0-flash-exp".to_string(),
                api_key: None,
                api_url: None,
                timeout_secs: 15,
            },
        }
    }
}
