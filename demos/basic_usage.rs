// Basic usage example for kvsettings
//
// Run with: cargo run --example basic_usage

use kvsettings::{CacheStrategy, FileStore, SettingsManager};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    // Keep the demo's table in a throwaway directory
    let dir = tempfile::tempdir()?;
    let store = FileStore::builder("basic-usage").dir(dir.path()).build()?;
    println!("📁 Settings file: {}", store.path().display());

    let settings = SettingsManager::builder()
        .store(store)
        .cache_strategy(CacheStrategy::Lru(16))
        .build()?;

    // Single values in the default group
    settings.set("app.locale", "ro")?;
    println!("app.locale = {}", settings.get("app.locale")?);

    // A batch in another group, one write and one invalidation
    let mail = settings.group("mail");
    mail.set_many([
        ("smtp.host", json!("smtp.example.com")),
        ("smtp.port", json!(587)),
        ("smtp.tls", json!(true)),
    ])?;

    let port: u16 = mail.get_as("smtp.port")?;
    println!("smtp.port = {port}");
    println!("mail group = {}", serde_json::to_string_pretty(&*mail.all()?)?);

    // Missing keys are an error unless a default is supplied
    match settings.get("app.theme") {
        Ok(value) => println!("app.theme = {value}"),
        Err(e) => println!("⚠️  {e}"),
    }
    println!("app.theme (default) = {}", settings.get_or("app.theme", "light")?);

    // Deleting
    println!("forget app.locale -> {}", settings.forget("app.locale"));
    println!("forget app.locale again -> {}", settings.forget("app.locale"));
    println!("has app.locale -> {}", settings.has("app.locale"));

    println!("groups = {:?}", settings.all_groups()?);

    // Cache control
    println!("flush mail -> {}", mail.flush_cache());
    println!("flush all -> {}", settings.flush_all_cache());

    println!("\n✅ Done");
    Ok(())
}
