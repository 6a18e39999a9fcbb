use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::ai::LanguageModel;
use crate::ai::prompt::{educational_query, templates};
use crate::core::AppConfig;
use crate::gemini::GeminiClient;

/// Ask the assistant questions from the terminal. Nothing is rate
/// limited or saved, each question is sent on its own.
pub async fn run(config: &AppConfig) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let templates = templates();
    let client = GeminiClient::new(
        &config.gemini_api_hostname,
        &config.gemini_api_key,
        &config.gemini_model,
        config.llm_timeout,
    );

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                let prompt = educational_query(&templates, &line)?;
                match client.generate(&prompt).await {
                    Ok(resp) => println!("{}", resp),
                    Err(e) => println!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
