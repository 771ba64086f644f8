//! Language resolution: map an arbitrary input tag to a configured language.
//!
//! Resolution order, first match wins:
//! 1. exact configured language id
//! 2. exact alias key
//! 3. wildcard alias keys (`*` matches any substring, case-insensitive,
//!    anchored at both ends), in alias declaration order

use crate::i18n::error::ConfigError;
use regex::Regex;

/// A wildcard alias compiled to an anchored, case-insensitive pattern.
#[derive(Debug, Clone)]
struct WildcardAlias {
    pattern: Regex,
    language: String,
}

/// Resolves input tags against the configured languages and alias table.
///
/// Immutable after construction.
#[derive(Debug, Clone)]
pub struct LanguageResolver {
    languages: Vec<String>,
    aliases: Vec<(String, String)>,
    wildcards: Vec<WildcardAlias>,
}

fn wildcard_pattern(alias: &str) -> String {
    let body = alias
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("(?is)^{}$", body)
}

impl LanguageResolver {
    /// Build a resolver.
    ///
    /// # Arguments
    /// * `languages` - Configured language ids, in configuration order
    /// * `aliases` - `(pattern, language)` pairs, in declaration order
    ///
    /// # Returns
    /// * `Err` if an alias targets an unconfigured language
    pub fn new(languages: Vec<String>, aliases: Vec<(String, String)>) -> Result<Self, ConfigError> {
        let mut wildcards = Vec::new();

        for (alias, language) in &aliases {
            if !languages.contains(language) {
                return Err(ConfigError::UnknownAliasTarget {
                    alias: alias.clone(),
                    language: language.clone(),
                });
            }
            if alias.contains('*') {
                let pattern = Regex::new(&wildcard_pattern(alias)).map_err(|source| {
                    ConfigError::InvalidAliasPattern {
                        alias: alias.clone(),
                        source,
                    }
                })?;
                wildcards.push(WildcardAlias {
                    pattern,
                    language: language.clone(),
                });
            }
        }

        Ok(Self {
            languages,
            aliases,
            wildcards,
        })
    }

    /// Configured language ids in configuration order.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn is_configured(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l == language)
    }

    /// Resolve `input` to a configured language id.
    ///
    /// Returns `None` for empty input or when nothing matches.
    pub fn resolve(&self, input: &str) -> Option<&str> {
        if input.is_empty() {
            return None;
        }

        if let Some(language) = self.languages.iter().find(|l| *l == input) {
            return Some(language);
        }

        if let Some((_, language)) = self.aliases.iter().find(|(alias, _)| alias == input) {
            return Some(language);
        }

        self.wildcards
            .iter()
            .find(|w| w.pattern.is_match(input))
            .map(|w| w.language.as_str())
    }
}
