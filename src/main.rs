use anyhow::{bail, Context, Result};
use gemini_draw::settings::ApiConfigUpdate;
use gemini_draw::system::SystemPreferences;
use gemini_draw::{
    BackendClient, GeminiClient, GenerateRequest, LocalStore, StudioSession, UserStore,
};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

/// Minimal driver: `gemini-draw "<prompt>" [reference images...]` generates
/// one image, saves it to the gallery, and prints the gallery.
#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let local = LocalStore::in_config_dir()?;
    let prefs = SystemPreferences::restore_from(&local).await?;
    let default_level = if prefs.verbose_logging { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let prompt = match args.next() {
        Some(p) => p,
        None => bail!("usage: gemini-draw \"<prompt>\" [reference images...]"),
    };

    let backend_url =
        std::env::var("BACKEND_URL").unwrap_or_else(|_| "http://localhost:5000".into());
    let backend = Arc::new(BackendClient::new(&backend_url));

    let mut user = UserStore::default();
    user.restore_from(&backend, &local).await?;
    if let Ok(token) = std::env::var("BACKEND_TOKEN") {
        backend.set_token(token);
    }

    let mut session = StudioSession::new(Arc::new(GeminiClient::new()), backend.clone());
    session.restore_from(&local).await?;

    // Env vars override whatever the persisted settings say.
    session.settings.update_api_config(ApiConfigUpdate {
        base_url: std::env::var("DRAW_API_BASE").ok(),
        api_key: std::env::var("DRAW_API_KEY").ok(),
        model: std::env::var("DRAW_MODEL").ok(),
    });
    tracing::info!(
        "using API key: {}...",
        preview(&session.settings.api_key, 8)
    );

    let mut request = GenerateRequest::new(prompt, session.settings.current_model());
    for path in args {
        let image = gemini_draw::codec::read_uploaded_image(&path)
            .await
            .with_context(|| format!("failed to load reference image {path}"))?;
        request.reference_images.push(image);
    }

    let result = session.generate(request).await?;
    println!("image:    {}", preview_counted(&result.image_url, 80));
    println!("response: {}", result.model_response);
    println!("elapsed:  {}s", result.elapsed_time);
    if result.is_persisted() {
        println!("saved as: {}", result.image_id);
    } else {
        println!("not saved to the gallery");
    }

    if session.load_gallery(true).await.is_ok() {
        println!("\ngallery ({} images):", session.gallery.count());
        for item in session.gallery.images() {
            println!("  {}  {}  {}", item.image_id, item.created_at, item.prompt);
        }
    }

    session.persist_to(&local).await?;
    user.persist_to(&local).await?;
    prefs.persist_to(&local).await?;
    Ok(())
}

/// First `max_chars` characters of a string, cut on a character boundary.
fn preview(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn preview_counted(s: &str, max_chars: usize) -> String {
    let total = s.chars().count();
    if total > max_chars {
        format!("{}...[{} chars]", preview(s, max_chars), total)
    } else {
        s.to_string()
    }
}
