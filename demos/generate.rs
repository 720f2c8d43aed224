use nanogen::logger::{self, LoggerConfig};
use nanogen::{NanoBananaClient, NanoBananaConfig, StorageConfig};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    logger::init_with_config(LoggerConfig::development())?;
    if !dotenv_loaded {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let prompt = env::args().skip(1).collect::<Vec<_>>().join(" ");
    let prompt = if prompt.trim().is_empty() {
        "A serene landscape with mountains and a lake at sunset, digital art style".to_string()
    } else {
        prompt
    };

    let api_config = NanoBananaConfig::from_env();
    let storage_config = StorageConfig::from_env();
    logger::log_config_info(&api_config, &storage_config);

    let client = match NanoBananaClient::with_storage(api_config, storage_config) {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Failed to initialize client: {}", e);
            return Err(e.into());
        }
    };

    log::info!("🎨 Generating: {}", prompt);
    let outcome = client.generate_and_store(&prompt).await?;
    log::info!("🖼️  Image URL: {}", outcome.image.image_url);
    if let Some(error) = &outcome.save_error {
        log::warn!("⚠️  Image generated but couldn't be saved to gallery: {}", error);
    }

    log::info!("📚 Recent images:");
    for record in client.recent_images().await? {
        log::info!(
            "   {} | {} | {}",
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.prompt,
            record.image_url
        );
    }

    Ok(())
}
