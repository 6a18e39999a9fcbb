use anyhow::Result;

use crate::core::AppConfig;
use crate::core::db::{async_db, initialize_db};

pub async fn run(config: &AppConfig) -> Result<()> {
    println!("Initializing db...");
    let db = async_db(&config.db_path).await?;
    db.call(|conn| Ok(initialize_db(conn)?)).await?;
    println!("Finished initializing db at {}", config.db_path);
    Ok(())
}
