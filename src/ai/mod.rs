pub mod model;
pub mod prompt;

pub use model::{LanguageModel, SharedLanguageModel, request_failed};
