//! Locale audit binary - reports missing paths and placeholder mismatches
//!
//! Loads every language in the locales directory, then prints a JSON report
//! to stdout. Exits with an error when any language is incomplete, so it can
//! gate CI.
//!
//! Usage:
//!   cargo run --bin i18n-audit
//!   cargo run --bin i18n-audit -- --allow-incomplete
//!
//! Required environment variables:
//! - I18N_DEFAULT_LANGUAGE
//!
//! Optional:
//! - I18N_LOCALES_DIR (defaults to locales)

use anyhow::{bail, Context, Result};
use i18n_engine::config::LocalesConfig;
use i18n_engine::i18n::{CompletenessReport, I18n, TranslationValidator};
use i18n_engine::locales;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct AuditReport {
    default_language: String,
    languages: Vec<String>,
    completeness: CompletenessReport,
    /// Per language, placeholder warnings against the default language
    placeholder_warnings: BTreeMap<String, Vec<String>>,
}

fn audit(i18n: &I18n) -> AuditReport {
    let mut placeholder_warnings = BTreeMap::new();

    if let Some(default) = i18n.resource(i18n.fallback_language()) {
        for language in i18n.languages() {
            if language == i18n.fallback_language() {
                continue;
            }
            let Some(resource) = i18n.resource(&language) else {
                continue;
            };
            let report = TranslationValidator::compare(&default, &resource);
            if report.has_warnings() {
                placeholder_warnings.insert(language, report.warnings);
            }
        }
    }

    AuditReport {
        default_language: i18n.fallback_language().to_string(),
        languages: i18n.languages(),
        completeness: i18n.completeness(),
        placeholder_warnings,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("i18n_engine=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let allow_incomplete = std::env::args().any(|arg| arg == "--allow-incomplete");

    // The startup language is irrelevant for an audit
    let settings = LocalesConfig {
        language: None,
        ..LocalesConfig::from_env()?
    };
    let i18n = locales::build_engine(&settings).await?;

    info!("Loading all locales from {}", settings.locales_dir.display());
    i18n.preload().await.context("Failed to load locales")?;

    let report = audit(&i18n);
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize audit report")?
    );

    for (language, warnings) in &report.placeholder_warnings {
        for warning in warnings {
            warn!("[{}] {}", language, warning);
        }
    }

    if !report.completeness.is_complete() && !allow_incomplete {
        bail!("Locales are incomplete");
    }

    info!("Audit complete");
    Ok(())
}
