//! Translation engine: language selection, lookup with fallback, formatting.

use crate::config::I18nConfig;
use crate::i18n::error::{ConfigError, FormatError, ResourceLoadError};
use crate::i18n::formatter::{format_value, LocaleFormat};
use crate::i18n::language::LanguageResolver;
use crate::i18n::metrics::{MetricsReport, TranslationMetrics};
use crate::i18n::notifier::{I18nEvent, Subscription, Topic};
use crate::i18n::registry::LanguageRegistry;
use crate::i18n::resource::{Leaf, Resource};
use crate::i18n::validator::{self, CompletenessReport, ResourceSchema};
use crate::i18n::value::{Params, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Replace every `{{name}}` in `template` for which `lookup` has a value.
///
/// Single pass: substituted text is never scanned again. Placeholders without
/// a value stay as written.
pub(crate) fn interpolate<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    validator::placeholder_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// The translation engine.
///
/// `I18n` is `Send + Sync`; share it through an `Arc`. `translate` never
/// suspends. `set_language` suspends only while a language's loader runs.
pub struct I18n {
    registry: LanguageRegistry,
    resolver: LanguageResolver,
    fallback: String,
    current: RwLock<String>,
    topic: Topic,
    locale_format: Arc<dyn LocaleFormat>,
    metrics: Arc<TranslationMetrics>,
    schema: ResourceSchema,
}

impl std::fmt::Debug for I18n {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I18n")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl I18n {
    /// Build an engine from its configuration.
    ///
    /// # Returns
    /// * `Err` if the default language is missing or configured as a loader,
    ///   or an alias targets an unknown language
    pub fn new(config: I18nConfig) -> Result<Self, ConfigError> {
        let I18nConfig {
            resources,
            default_language,
            aliases,
            locale_format,
        } = config;

        if default_language.is_empty() || resources.iter().any(|(id, _)| id.is_empty()) {
            return Err(ConfigError::EmptyLanguageId);
        }
        match resources.iter().find(|(id, _)| *id == default_language) {
            None => return Err(ConfigError::UnknownDefaultLanguage(default_language)),
            Some((_, source)) if !source.is_ready() => {
                return Err(ConfigError::DefaultLanguageNotMaterialized(default_language))
            }
            Some(_) => {}
        }

        let languages: Vec<String> = resources.iter().map(|(id, _)| id.clone()).collect();
        let resolver = LanguageResolver::new(languages, aliases)?;
        let metrics = Arc::new(TranslationMetrics::new());
        let registry = LanguageRegistry::new(resources, Arc::clone(&metrics));
        let schema = registry
            .get(&default_language)
            .map(|resource| ResourceSchema::from_resource(&resource))
            .unwrap_or_default();

        debug!(
            "Initialized i18n engine with languages {:?}, default '{}'",
            resolver.languages(),
            default_language
        );

        Ok(Self {
            registry,
            resolver,
            current: RwLock::new(default_language.clone()),
            fallback: default_language,
            topic: Topic::new(),
            locale_format,
            metrics,
            schema,
        })
    }

    /// Configured language ids, in configuration order.
    pub fn languages(&self) -> Vec<String> {
        self.resolver.languages().to_vec()
    }

    /// The engine-wide current language.
    pub fn language(&self) -> String {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The default language, consulted when a path is missing.
    pub fn fallback_language(&self) -> &str {
        &self.fallback
    }

    /// Map an input tag to a configured language, without side effects.
    pub fn resolve_language(&self, tag: &str) -> Option<&str> {
        self.resolver.resolve(tag)
    }

    fn resolve_or_fallback(&self, tag: &str) -> &str {
        self.resolver.resolve(tag).unwrap_or_else(|| {
            debug!(
                "Unresolved language tag '{}', using fallback '{}'",
                tag, self.fallback
            );
            &self.fallback
        })
    }

    /// Switch the engine-wide language.
    ///
    /// Unresolvable tags select the default language. A pending resource is
    /// loaded first; if that fails the current language is left untouched.
    /// Subscribers are notified only when the language actually changes.
    pub async fn set_language(&self, tag: &str) -> Result<(), ResourceLoadError> {
        let target = self.resolve_or_fallback(tag).to_string();

        self.registry.load(&target).await?;

        let changed = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            if *current == target {
                false
            } else {
                *current = target.clone();
                true
            }
        };

        if changed {
            self.metrics.record_language_change();
            info!("Language changed to '{}'", target);
            self.topic.publish(&target);
        }
        Ok(())
    }

    /// Load every language that still has a pending loader.
    pub async fn preload(&self) -> Result<(), ResourceLoadError> {
        let pending = self.registry.pending_languages();
        futures::future::try_join_all(pending.iter().map(|language| self.registry.load(language)))
            .await?;
        Ok(())
    }

    /// The language a lookup uses: the resolved override, or the current one.
    fn effective_language(&self, language: Option<&str>) -> String {
        match language {
            Some(tag) => self.resolve_or_fallback(tag).to_string(),
            None => self.language(),
        }
    }

    /// Translate `path` with `params`.
    ///
    /// `language` overrides the current language for this call only. A path
    /// missing in the chosen language is looked up in the default language;
    /// missing in both, the path itself is returned.
    pub fn translate(
        &self,
        path: &str,
        params: &Params,
        language: Option<&str>,
    ) -> Result<String, FormatError> {
        self.metrics.record_translation();
        let language = self.effective_language(language);

        if let Some(rendered) = self.render_in(&language, path, params)? {
            return Ok(rendered);
        }

        if language != self.fallback {
            if let Some(rendered) = self.render_in(&self.fallback, path, params)? {
                debug!(
                    "'{}' missing in '{}', used fallback '{}'",
                    path, language, self.fallback
                );
                self.metrics.record_fallback_hit();
                return Ok(rendered);
            }
        }

        debug!("No translation for '{}', echoing path", path);
        self.metrics.record_missing_path();
        Ok(path.to_string())
    }

    /// Shorthand for [`I18n::translate`].
    pub fn t(&self, path: &str, params: &Params, language: Option<&str>) -> Result<String, FormatError> {
        self.translate(path, params, language)
    }

    fn render_in(
        &self,
        language: &str,
        path: &str,
        params: &Params,
    ) -> Result<Option<String>, FormatError> {
        let Some(resource) = self.registry.get(language) else {
            debug!("Resource for '{}' not loaded yet, skipping", language);
            return Ok(None);
        };

        match resource.find(path) {
            None => Ok(None),
            Some(Leaf::Text(template)) => Ok(Some(interpolate(template, |name| {
                params.get(name).map(Value::to_string)
            }))),
            Some(Leaf::Message(message)) => {
                let mut formatted: HashMap<&str, Value> = HashMap::with_capacity(params.len());
                for (name, value) in params.iter() {
                    let value = format_value(
                        name,
                        value.clone(),
                        message.formatters(name),
                        language,
                        self.locale_format.as_ref(),
                    )?;
                    formatted.insert(name, value);
                }
                Ok(Some(interpolate(message.template(), |name| {
                    formatted.get(name).map(Value::to_string)
                })))
            }
        }
    }

    /// Subscribe to an engine event.
    pub fn on<F>(&self, event: I18nEvent, handler: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        match event {
            I18nEvent::LanguageChanged => self.topic.subscribe(handler),
        }
    }

    /// A view that translates in `tag` without touching the current language.
    pub fn scoped(&self, tag: &str) -> ScopedI18n<'_> {
        ScopedI18n {
            engine: self,
            language: self.resolve_or_fallback(tag),
        }
    }

    /// The materialized resource for `language`, if loaded.
    pub fn resource(&self, language: &str) -> Option<Arc<Resource>> {
        self.registry.get(language)
    }

    /// Paths and parameters of the default language, for static checks.
    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Per non-default language, the default-language paths it lacks.
    pub fn completeness(&self) -> CompletenessReport {
        let mut report = CompletenessReport::default();
        let Some(default) = self.registry.get(&self.fallback) else {
            return report;
        };

        for language in self.resolver.languages() {
            if *language == self.fallback {
                continue;
            }
            match self.registry.get(language) {
                Some(resource) => {
                    report
                        .missing
                        .insert(language.clone(), validator::missing_paths(&default, &resource));
                }
                None => report.unloaded.push(language.clone()),
            }
        }
        report
    }

    pub fn metrics(&self) -> MetricsReport {
        self.metrics.report()
    }
}

/// Translations pinned to one language for a unit of work.
///
/// Hosts build one per request (or task) from whatever language the request
/// carries; the engine-wide language is not consulted or modified.
#[derive(Clone, Copy)]
pub struct ScopedI18n<'a> {
    engine: &'a I18n,
    language: &'a str,
}

impl<'a> ScopedI18n<'a> {
    pub fn language(&self) -> &str {
        self.language
    }

    pub fn translate(&self, path: &str, params: &Params) -> Result<String, FormatError> {
        self.engine.translate(path, params, Some(self.language))
    }

    pub fn t(&self, path: &str, params: &Params) -> Result<String, FormatError> {
        self.translate(path, params)
    }

    pub fn engine(&self) -> &'a I18n {
        self.engine
    }
}
