use std::env;
use std::time::Duration;

use crate::limiter::RateLimitConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage_path: String,
    pub db_path: String,
    pub static_path: String,
    pub gemini_api_hostname: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub llm_timeout: Duration,
    pub rate_limit: RateLimitConfig,
    pub rate_limit_sweep_interval: Duration,
    // Only enable behind a reverse proxy that overwrites the header
    pub trust_forwarded_for: bool,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Default for AppConfig {
    fn default() -> Self {
        let storage_path = env::var("TUTOR_STORAGE_PATH").unwrap_or("./".to_string());
        let db_path = format!("{}/db", storage_path);
        let static_path =
            env::var("TUTOR_STATIC_PATH").unwrap_or_else(|_| "./web".to_string());
        let gemini_api_hostname = env::var("TUTOR_GEMINI_API_HOST")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
        let gemini_api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        let gemini_model =
            env::var("TUTOR_GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());
        let llm_timeout = Duration::from_secs(env_parse("TUTOR_LLM_TIMEOUT_SECS", 30));

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            window: Duration::from_secs(env_parse(
                "TUTOR_RATE_LIMIT_WINDOW_SECS",
                defaults.window.as_secs(),
            )),
            max_requests: env_parse("TUTOR_RATE_LIMIT_MAX_REQUESTS", defaults.max_requests),
            cooldown: Duration::from_secs(env_parse(
                "TUTOR_RATE_LIMIT_COOLDOWN_SECS",
                defaults.cooldown.as_secs(),
            )),
        };
        // A zero interval would stop the sweep job entirely
        let rate_limit_sweep_interval =
            Duration::from_secs(env_parse::<u64>("TUTOR_RATE_LIMIT_SWEEP_SECS", 60 * 5).max(1));
        let trust_forwarded_for = env_parse("TUTOR_TRUST_FORWARDED_FOR", false);

        Self {
            storage_path,
            db_path,
            static_path,
            gemini_api_hostname,
            gemini_api_key,
            gemini_model,
            llm_timeout,
            rate_limit,
            rate_limit_sweep_interval,
            trust_forwarded_for,
        }
    }
}
