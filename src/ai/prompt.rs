//! Reusable prompts using Handlebars for templating. User input is
//! only ever passed in as data, never compiled as a template, so a
//! message containing `{{...}}` is sent through untouched.

use std::fmt;

use anyhow::{Error, Result};
use handlebars::{Handlebars, no_escape};
use serde_json::json;

#[derive(Debug)]
pub enum Prompt {
    EducationalQuery,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Prepended to every user message before it is sent to the model.
pub const EDUCATIONAL_SYSTEM_PROMPT: &str = r"
You are an educational assistant designed to help users learn and understand various topics.
Your responses should be:
- Accurate and factual
- Age-appropriate and educational
- Clear and easy to understand
- Focused on teaching and explaining concepts
- Free from personal opinions, biases, or inappropriate content

If asked about topics outside of educational content, politely redirect the conversation
to educational subjects. If you don't know the answer, acknowledge this
rather than making up information.
";

const EDUCATIONAL_QUERY_PROMPT: &str = "{{system_prompt}}\n\nUser query: {{user_message}}";

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // Prompts are plain text, HTML escaping would mangle quotes and
    // angle brackets in the user's message
    registry.register_escape_fn(no_escape);
    registry
        .register_template_string(
            &Prompt::EducationalQuery.to_string(),
            EDUCATIONAL_QUERY_PROMPT,
        )
        .expect("Failed to register template");
    registry
}

/// Render the full prompt for a single user message.
pub fn educational_query(templates: &Handlebars, user_message: &str) -> Result<String, Error> {
    let prompt = templates.render(
        &Prompt::EducationalQuery.to_string(),
        &json!({
            "system_prompt": EDUCATIONAL_SYSTEM_PROMPT,
            "user_message": user_message,
        }),
    )?;
    Ok(prompt)
}
