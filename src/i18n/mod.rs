//! Internationalization (i18n) engine.
//!
//! Translations live in per-language resource trees addressed by dotted
//! paths. The engine keeps a current language, resolves input tags through
//! aliases, loads lazily-configured languages on first use, and falls back to
//! the default language when a path is missing.
//!
//! # Architecture
//!
//! - `language`: maps input tags to configured languages (exact, alias, wildcard)
//! - `resource`: translation trees and dotted-path lookup
//! - `registry`: per-language storage with coalesced lazy loading
//! - `message` / `formatter`: parameterized messages and the formatter pipeline
//! - `engine`: the `I18n` orchestrator and per-request `ScopedI18n` views
//! - `notifier`: language-change subscriptions
//! - `validator`: schema, placeholder and completeness checks
//! - `metrics`: translation observability
//!
//! # Example
//!
//! ```rust,ignore
//! use i18n_engine::config::I18nConfig;
//! use i18n_engine::i18n::{I18n, Params, Resource};
//!
//! let i18n = I18n::new(
//!     I18nConfig::new("zh")
//!         .resource("zh", Resource::new().text("homeWithName", "你好，{{name}}"))
//!         .lazy_resource("en", || async { load_english().await })
//!         .alias("en-*", "en"),
//! )?;
//!
//! i18n.set_language("en-US").await?;
//! let text = i18n.t("homeWithName", &Params::from([("name", "Ada")]), None)?;
//! ```

mod engine;
mod error;
mod formatter;
mod language;
mod message;
mod metrics;
mod notifier;
mod registry;
mod resource;
mod validator;
mod value;

pub use engine::{I18n, ScopedI18n};
pub use error::{ConfigError, FormatError, ResourceError, ResourceLoadError};
pub use formatter::{format_value, match_plural, LocaleFormat, SystemLocaleFormat};
pub use language::LanguageResolver;
pub use message::{
    CustomFormat, DateTimeStyle, Formatter, Length, Message, MonthWidth, NumberKind, NumberStyle,
    NumericWidth, PluralMap, TextWidth, UnitDisplay,
};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use notifier::{I18nEvent, Subscription, Topic};
pub use registry::{LanguageRegistry, Loader, ResourceSource};
pub use resource::{Entry, Leaf, Resource};
pub use validator::{
    extract_placeholders, missing_paths, CompletenessReport, ResourceSchema, TranslationValidator,
    ValidationReport,
};
pub use value::{Params, Value};
