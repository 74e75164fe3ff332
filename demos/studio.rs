use rimagen::{AspectRatio, ImageSize, SourceImage, Studio, StudioConfig};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rimagen::logger::init_with_config(rimagen::logger::LoggerConfig::development())?;
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded"),
        Err(_) => log::warn!("⚠️  No .env file found"),
    }

    let config = StudioConfig::from_env()?;
    rimagen::logger::log_config_info(&config);

    let studio = Studio::from_config(config)?;
    log::info!("📚 {} images in history", studio.history().len());

    studio.set_prompt("A robot holding a red skateboard.");
    studio.set_aspect_ratio(AspectRatio::Portrait);
    studio.set_image_size(ImageSize::TwoK);

    // An optional reference image turns the request into an edit.
    if let Some(path) = env::args().nth(1) {
        let reference = SourceImage::from_path(&path)?;
        let handle = studio.attach_reference(reference);
        log::info!("🖼️  Using reference image {} ({})", path, handle);
    }

    if let Err(e) = studio.submit().await {
        log::error!("❌ {}", studio.snapshot().error.unwrap_or_else(|| e.to_string()));
        studio.shutdown();
        return Ok(());
    }

    if let Err(e) = studio.upscale(2).await {
        log::error!("❌ {}", studio.snapshot().error.unwrap_or_else(|| e.to_string()));
    }

    let state = studio.snapshot();
    if let Some(url) = &state.image_url {
        let payload = rimagen::codec::strip_data_url_prefix(url).unwrap_or_default();
        let bytes = rimagen::codec::decode(payload)?;
        std::fs::write("studio-output.jpg", &bytes)?;
        log::info!("💾 Saved studio-output.jpg ({} bytes)", bytes.len());
    }

    for entry in studio.history() {
        log::info!("  {} - {} ({}, {})", entry.id, entry.prompt, entry.aspect_ratio, entry.image_size);
    }

    studio.shutdown();
    Ok(())
}
