use tokio_rusqlite::Connection;

use crate::ai::SharedLanguageModel;
use crate::chat::ChatService;
use crate::core::AppConfig;
use crate::limiter::RateLimiter;

pub struct AppState {
    pub config: AppConfig,
    pub chat: ChatService,
}

impl AppState {
    pub fn new(db: Connection, config: AppConfig, llm: SharedLanguageModel) -> Self {
        let limiter = RateLimiter::new(config.rate_limit);
        let chat = ChatService::new(db, limiter, llm, config.llm_timeout);
        Self { config, chat }
    }
}
