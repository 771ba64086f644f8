//! Translation lookup binary - prints one translated path
//!
//! Usage:
//!   cargo run -- menus.default.users
//!   cargo run -- homeWithName name=Ada
//!
//! Required environment variables:
//! - I18N_DEFAULT_LANGUAGE
//!
//! Optional:
//! - I18N_LOCALES_DIR (defaults to locales)
//! - I18N_LANGUAGE (defaults to the system locale)
//! - I18N_ALIASES (e.g. "en-*=en,zh-*=zh")

use anyhow::{bail, Context, Result};
use i18n_engine::config::LocalesConfig;
use i18n_engine::i18n::{Params, Value};
use i18n_engine::locales;
use tracing::info;

/// Parse `name=value` arguments; numeric values become numbers.
fn parse_params(args: &[String]) -> Result<Params> {
    args.iter()
        .map(|arg| {
            let (name, raw) = arg
                .split_once('=')
                .with_context(|| format!("Expected name=value, got '{}'", arg))?;
            let value = if let Ok(int) = raw.parse::<i64>() {
                Value::Int(int)
            } else if let Ok(float) = raw.parse::<f64>() {
                Value::Float(float)
            } else {
                Value::from(raw)
            };
            Ok((name.to_string(), value))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("i18n_engine=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((path, rest)) = args.split_first() else {
        bail!("Usage: i18n-engine <path> [name=value ...]");
    };
    let params = parse_params(rest)?;

    let settings = LocalesConfig::from_env()?;
    info!("Loading locales from {}", settings.locales_dir.display());
    let i18n = locales::build_engine(&settings).await?;

    let text = i18n
        .translate(path, &params, None)
        .with_context(|| format!("Failed to translate '{}'", path))?;
    println!("{}", text);

    Ok(())
}
