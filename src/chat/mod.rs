pub mod db;
mod error;
pub mod models;
mod service;
mod session;

pub use error::ChatError;
pub use models::{ChatReply, Feedback, FeedbackOutcome, HistoryMessage, Role};
pub use service::ChatService;
pub use session::{SessionChatCache, SessionHandle};
