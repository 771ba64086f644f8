//! Error types for the translation engine.
//!
//! Missing translations and unresolvable language tags are not errors: the
//! engine echoes the path or falls back to the default language. Only
//! configuration mistakes, loader failures and formatter failures surface here.

use thiserror::Error;

/// Invalid engine configuration, reported by `I18n::new`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("language id must not be empty")]
    EmptyLanguageId,

    #[error("default language '{0}' has no configured resource")]
    UnknownDefaultLanguage(String),

    #[error("default language '{0}' must be materialized, not a loader")]
    DefaultLanguageNotMaterialized(String),

    #[error("alias '{alias}' points to unconfigured language '{language}'")]
    UnknownAliasTarget { alias: String, language: String },

    #[error("alias pattern '{alias}' is invalid")]
    InvalidAliasPattern {
        alias: String,
        #[source]
        source: regex::Error,
    },
}

/// A resource loader failed.
///
/// Cloneable so every caller awaiting the same load observes the same outcome.
/// The language stays pending and a later `set_language` may retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load resource for language '{language}': {reason}")]
pub struct ResourceLoadError {
    pub language: String,
    pub reason: String,
}

impl ResourceLoadError {
    pub(crate) fn new(language: impl Into<String>, err: &anyhow::Error) -> Self {
        Self {
            language: language.into(),
            reason: format!("{:#}", err),
        }
    }
}

/// A formatter in a parameter pipeline failed.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("custom formatter failed for parameter '{param}'")]
    Custom {
        param: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid date-time value '{0}'")]
    InvalidDateTime(String),

    #[error("invalid format style: {0}")]
    InvalidStyle(String),

    #[error("failed to render {kind} for language '{language}'")]
    Render { kind: &'static str, language: String },
}

/// A resource tree could not be built from JSON.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("invalid resource JSON")]
    Json(#[from] serde_json::Error),

    #[error("invalid entry at '{path}': expected string, object or message, found {found}")]
    InvalidEntry { path: String, found: &'static str },

    #[error("invalid message at '{path}': {reason}")]
    InvalidMessage { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_load_error_keeps_context_chain() {
        let err = anyhow::anyhow!("file not found").context("reading en.json");
        let load = ResourceLoadError::new("en", &err);

        assert_eq!(load.language, "en");
        assert!(load.reason.contains("reading en.json"));
        assert!(load.reason.contains("file not found"));
        assert!(load.to_string().contains("'en'"));
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::UnknownAliasTarget {
            alias: "zh-*".to_string(),
            language: "zh".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "alias 'zh-*' points to unconfigured language 'zh'"
        );
    }

    #[test]
    fn test_custom_format_error_exposes_source() {
        let err = FormatError::Custom {
            param: "name".to_string(),
            source: anyhow::anyhow!("boom"),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("boom"));
    }
}
