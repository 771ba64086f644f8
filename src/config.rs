//! Engine and binary configuration.

use crate::i18n::{LocaleFormat, Resource, ResourceSource, SystemLocaleFormat};
use anyhow::{bail, Context, Result};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for [`crate::i18n::I18n`].
///
/// Resource insertion order defines the order of `languages()`. Alias
/// insertion order defines the order wildcard aliases are tried in.
pub struct I18nConfig {
    pub(crate) default_language: String,
    pub(crate) resources: Vec<(String, ResourceSource)>,
    pub(crate) aliases: Vec<(String, String)>,
    pub(crate) locale_format: Arc<dyn LocaleFormat>,
}

impl I18nConfig {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            default_language: default_language.into(),
            resources: Vec::new(),
            aliases: Vec::new(),
            locale_format: Arc::new(SystemLocaleFormat),
        }
    }

    /// Register a language with an in-memory resource.
    pub fn resource(self, language: impl Into<String>, resource: Resource) -> Self {
        self.source(language, ResourceSource::Ready(resource))
    }

    /// Register a language whose resource is produced on first use.
    pub fn lazy_resource<F, Fut>(self, language: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Resource>> + Send + 'static,
    {
        self.source(language, ResourceSource::lazy(loader))
    }

    /// Register a language from either kind of source.
    ///
    /// Registering the same id twice replaces the earlier source in place.
    pub fn source(mut self, language: impl Into<String>, source: ResourceSource) -> Self {
        let language = language.into();
        match self.resources.iter_mut().find(|(id, _)| *id == language) {
            Some(existing) => existing.1 = source,
            None => self.resources.push((language, source)),
        }
        self
    }

    /// Map an input tag (or `*` pattern) to a configured language.
    pub fn alias(mut self, pattern: impl Into<String>, language: impl Into<String>) -> Self {
        self.aliases.push((pattern.into(), language.into()));
        self
    }

    /// Replace number and date rendering.
    pub fn locale_format(mut self, format: impl LocaleFormat + 'static) -> Self {
        self.locale_format = Arc::new(format);
        self
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|(id, _)| id.as_str())
    }
}

impl std::fmt::Debug for I18nConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I18nConfig")
            .field("default_language", &self.default_language)
            .field("resources", &self.resources)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

/// Settings for the command-line tools, read from the environment.
#[derive(Debug, Clone)]
pub struct LocalesConfig {
    /// Directory holding one `<language>.json` per language
    pub locales_dir: PathBuf,

    pub default_language: String,

    /// Language to switch to at startup; `None` stays on the default
    pub language: Option<String>,

    pub aliases: Vec<(String, String)>,
}

impl LocalesConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            locales_dir: std::env::var("I18N_LOCALES_DIR")
                .unwrap_or_else(|_| "locales".to_string())
                .into(),
            default_language: std::env::var("I18N_DEFAULT_LANGUAGE")
                .context("I18N_DEFAULT_LANGUAGE not set")?,
            language: std::env::var("I18N_LANGUAGE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or_else(system_language),
            aliases: match std::env::var("I18N_ALIASES") {
                Ok(raw) => parse_aliases(&raw).context("Invalid I18N_ALIASES")?,
                Err(_) => Vec::new(),
            },
        })
    }
}

/// Parse `pattern=language` pairs separated by commas.
pub fn parse_aliases(raw: &str) -> Result<Vec<(String, String)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((pattern, language)) if !pattern.trim().is_empty() && !language.trim().is_empty() => {
                Ok((pattern.trim().to_string(), language.trim().to_string()))
            }
            _ => bail!("expected 'pattern=language', got '{}'", pair),
        })
        .collect()
}

/// The user's language from the POSIX locale variables, as a BCP 47-ish tag.
pub fn system_language() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
        .and_then(|value| normalize_locale(&value))
}

/// `en_US.UTF-8` → `en-US`, `de_DE@euro` → `de-DE`; `C` and `POSIX` → `None`.
fn normalize_locale(raw: &str) -> Option<String> {
    let tag = raw.split(['.', '@']).next().unwrap_or_default().trim();
    match tag {
        "" | "C" | "POSIX" => None,
        tag => Some(tag.replace('_', "-")),
    }
}
