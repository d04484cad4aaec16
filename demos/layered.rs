use ordered_settings::{Settings, SettingsError};
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct AppConfig {
    app: AppSection,
    database: DatabaseSection,
}

#[derive(Debug, Deserialize)]
struct AppSection {
    name: String,
    debug: bool,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct DatabaseSection {
    host: String,
    port: u16,
    name: String,
}

fn main() -> Result<(), SettingsError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/demos");
    let settings = Settings::new();

    // Issued in this order, merged in this order.
    settings
        .load(format!("{dir}/default.json"))
        .load(format!("{dir}/local.toml"))
        .load_env("LAYERED", "__")
        .set(
            json!({ "database": { "name": "demo_override" } })
                .as_object()
                .cloned()
                .unwrap_or_default(),
        );

    let host = settings.get("database.host")?;
    println!("Database host: {host}");

    let config: AppConfig = settings.deserialize()?;
    println!("App: {} (debug={})", config.app.name, config.app.debug);
    println!("Database: {:?}", config.database);

    Ok(())
}
