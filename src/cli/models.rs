use anyhow::Result;

use crate::core::AppConfig;
use crate::gemini::list_models;

const GENERATE_CONTENT: &str = "generateContent";

pub async fn run(config: &AppConfig, generate_only: bool) -> Result<()> {
    let models = list_models(&config.gemini_api_hostname, &config.gemini_api_key).await?;

    println!("Listing available models:");
    for model in models.iter().filter(|m| {
        !generate_only
            || m.supported_generation_methods
                .iter()
                .any(|method| method == GENERATE_CONTENT)
    }) {
        println!("- {}", model.name);
        println!(
            "  Supported generation methods: {}",
            model.supported_generation_methods.join(", ")
        );
        println!();
    }

    Ok(())
}
