//! Build an engine configuration from a directory of JSON locale files.
//!
//! Each `<language>.json` file in the directory is one language. The default
//! language's file is parsed up front; every other file becomes a lazy loader
//! that reads and parses it the first time that language is needed.

use crate::config::{I18nConfig, LocalesConfig};
use crate::i18n::{I18n, Resource};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

async fn read_resource(path: &Path) -> Result<Resource> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let resource = Resource::from_json_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(resource)
}

/// Language files in `dir`, sorted by language id.
async fn locale_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read locales directory {}", dir.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if let Some(language) = path.file_stem().and_then(|stem| stem.to_str()) {
            files.push((language.to_string(), path.clone()));
        }
    }
    files.sort();
    Ok(files)
}

/// Load `<dir>/<language>.json` files into an [`I18nConfig`].
///
/// # Arguments
/// * `dir` - Directory containing the locale files
/// * `default_language` - Language whose file is read immediately
///
/// # Returns
/// * `Err` if the directory cannot be read, or the default language's file
///   is missing or invalid
pub async fn load_locales_dir(dir: impl AsRef<Path>, default_language: &str) -> Result<I18nConfig> {
    let dir = dir.as_ref();
    let files = locale_files(dir).await?;

    if !files.iter().any(|(language, _)| language == default_language) {
        bail!(
            "No locale file for default language '{}' in {}",
            default_language,
            dir.display()
        );
    }

    let mut config = I18nConfig::new(default_language);
    for (language, path) in files {
        if language == default_language {
            config = config.resource(language, read_resource(&path).await?);
        } else {
            debug!("Registering lazy locale '{}' from {}", language, path.display());
            config = config.lazy_resource(language, move || {
                let path = path.clone();
                async move { read_resource(&path).await }
            });
        }
    }

    Ok(config)
}

/// Build a ready engine from environment-derived settings.
///
/// Loads the locale directory, applies the aliases and switches to the
/// configured startup language, if any.
pub async fn build_engine(settings: &LocalesConfig) -> Result<I18n> {
    let mut config = load_locales_dir(&settings.locales_dir, &settings.default_language).await?;
    for (pattern, language) in &settings.aliases {
        config = config.alias(pattern.as_str(), language.as_str());
    }

    let i18n = I18n::new(config).context("Invalid i18n configuration")?;
    if let Some(language) = &settings.language {
        i18n.set_language(language)
            .await
            .with_context(|| format!("Failed to switch to language '{}'", language))?;
    }
    Ok(i18n)
}
