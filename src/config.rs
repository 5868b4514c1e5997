//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `GROQ_API_KEY` (required): credential for the chat completion upstream
/// - `GROQ_API_URL` (optional): chat completion endpoint
/// - `GROQ_MODEL` (optional): model name, defaults to `llama3-8b-8192`
/// - `GROQ_TEMPERATURE` (optional): sampling temperature, defaults to 0.2
/// - `GROQ_TIMEOUT_SECS` (optional): upstream request timeout, defaults to 10
/// - `INSTALL_TOKEN` (optional): enables `POST /internal/shops` when set
/// - `DEFAULT_USAGE_LIMIT` (optional): usage limit given to new shops, defaults to 1000
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    pub groq_api_key: String,

    #[serde(default = "default_groq_api_url")]
    pub groq_api_url: String,

    #[serde(default = "default_groq_model")]
    pub groq_model: String,

    #[serde(default = "default_groq_temperature")]
    pub groq_temperature: f32,

    #[serde(default = "default_groq_timeout_secs")]
    pub groq_timeout_secs: u64,

    #[serde(default)]
    pub install_token: Option<String>,

    #[serde(default = "default_usage_limit")]
    pub default_usage_limit: i64,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_groq_api_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_groq_model() -> String {
    "llama3-8b-8192".to_string()
}

fn default_groq_temperature() -> f32 {
    0.2
}

fn default_groq_timeout_secs() -> u64 {
    10
}

fn default_usage_limit() -> i64 {
    1000
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL, GROQ_API_KEY)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }
}
