//! Translation quality validation module.
//!
//! Static checks layered on top of the runtime engine:
//! - [`ResourceSchema`] checks a path and its parameter names against the
//!   default language's resource.
//! - [`TranslationValidator::compare`] warns when a translation's
//!   placeholders differ from the default language's.
//! - [`missing_paths`] lists what a translation lacks compared to the default.
//!
//! None of these run inside `translate`.

use crate::i18n::resource::{Entry, Resource};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Validation report containing errors and warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that make a lookup or translation wrong
    pub errors: Vec<String>,

    /// Inconsistencies worth a look
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if the report has any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX
        .get_or_init(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("placeholder pattern is valid"))
}

/// Placeholder names in a template, deduplicated.
pub fn extract_placeholders(template: &str) -> BTreeSet<String> {
    placeholder_regex()
        .captures_iter(template)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn leaf_template(entry: &Entry) -> Option<&str> {
    match entry {
        Entry::Text(text) => Some(text),
        Entry::Message(message) => Some(message.template()),
        Entry::Tree(_) => None,
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Visit every leaf as `(path, template)`.
fn walk_leaves<'a>(resource: &'a Resource, prefix: &str, visit: &mut dyn FnMut(String, &'a str)) {
    for (key, entry) in resource.iter() {
        let path = join(prefix, key);
        match entry {
            Entry::Tree(child) => walk_leaves(child, &path, visit),
            leaf => {
                if let Some(template) = leaf_template(leaf) {
                    visit(path, template);
                }
            }
        }
    }
}

/// Paths and parameter names derived from the default language's resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSchema {
    paths: BTreeMap<String, BTreeSet<String>>,
}

impl ResourceSchema {
    pub fn from_resource(resource: &Resource) -> Self {
        let mut paths = BTreeMap::new();
        walk_leaves(resource, "", &mut |path, template| {
            paths.insert(path, extract_placeholders(template));
        });
        Self { paths }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains_key(path)
    }

    /// Parameter names the template at `path` expects.
    pub fn params(&self, path: &str) -> Option<&BTreeSet<String>> {
        self.paths.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    /// Check that `path` exists and `params` names exactly its placeholders.
    pub fn check<'a>(&self, path: &str, params: impl IntoIterator<Item = &'a str>) -> ValidationReport {
        let mut report = ValidationReport::new();

        let Some(expected) = self.paths.get(path) else {
            report.errors.push(format!("Unknown path: '{}'", path));
            return report;
        };

        let given: BTreeSet<&str> = params.into_iter().collect();
        for name in expected {
            if !given.contains(name.as_str()) {
                report
                    .errors
                    .push(format!("Missing parameter '{}' for '{}'", name, path));
            }
        }
        for name in &given {
            if !expected.contains(*name) {
                report
                    .errors
                    .push(format!("Unexpected parameter '{}' for '{}'", name, path));
            }
        }

        report
    }
}

/// Validator for translation consistency across languages.
pub struct TranslationValidator;

impl TranslationValidator {
    /// Compare a translation against the default language's resource.
    ///
    /// Warns for every shared leaf whose placeholder names differ.
    pub fn compare(default: &Resource, translation: &Resource) -> ValidationReport {
        let mut report = ValidationReport::new();
        let mut expected = BTreeMap::new();
        walk_leaves(default, "", &mut |path, template| {
            expected.insert(path, extract_placeholders(template));
        });

        let mut found = BTreeMap::new();
        walk_leaves(translation, "", &mut |path, template| {
            found.insert(path, extract_placeholders(template));
        });

        for (path, orig) in &expected {
            if let Some(trans) = found.get(path) {
                if orig != trans {
                    report.warnings.push(format!(
                        "Placeholder mismatch at '{}': default has {:?}, translation has {:?}",
                        path, orig, trans
                    ));
                }
            }
        }

        report
    }
}

/// Leaf paths of `default` that `translation` lacks or shapes differently.
pub fn missing_paths(default: &Resource, translation: &Resource) -> BTreeSet<String> {
    let mut missing = BTreeSet::new();
    collect_missing(default, Some(translation), "", &mut missing);
    missing
}

fn collect_missing(
    default: &Resource,
    translation: Option<&Resource>,
    prefix: &str,
    missing: &mut BTreeSet<String>,
) {
    for (key, entry) in default.iter() {
        let path = join(prefix, key);
        let other = translation.and_then(|t| t.get(key));
        match (entry, other) {
            (Entry::Tree(child), Some(Entry::Tree(other_child))) => {
                collect_missing(child, Some(other_child), &path, missing)
            }
            (Entry::Tree(child), _) => collect_missing(child, None, &path, missing),
            (_, Some(Entry::Text(_) | Entry::Message(_))) => {}
            (_, _) => {
                missing.insert(path);
            }
        }
    }
}

/// Result of the completeness audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompletenessReport {
    /// Per non-default language, the default-language paths it lacks
    pub missing: BTreeMap<String, BTreeSet<String>>,

    /// Languages whose loader has not run yet, so they could not be audited
    pub unloaded: Vec<String>,
}

impl CompletenessReport {
    /// True when every audited language has every path and nothing is unloaded.
    pub fn is_complete(&self) -> bool {
        self.unloaded.is_empty() && self.missing.values().all(BTreeSet::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::message::Message;

    fn default_resource() -> Resource {
        Resource::new()
            .text("home", "你好")
            .text("homeWithName", "你好，{{name}}")
            .message("friend", Message::new("我的朋友是 {{friend}}"))
            .text("extra", "多余的翻译")
            .tree(
                "menus",
                Resource::new().tree(
                    "default",
                    Resource::new()
                        .text("users", "用户列表")
                        .text("admins", "管理员列表"),
                ),
            )
    }

    fn english() -> Resource {
        Resource::new()
            .text("home", "hello")
            .text("homeWithName", "Hello, {{user}}")
            .message("friend", Message::new("my friend is {{friend}}"))
            .tree(
                "menus",
                Resource::new().tree("default", Resource::new().text("users", "User lists")),
            )
    }

    // ==================== Placeholder Extraction Tests ====================

    #[test]
    fn test_extract_placeholders() {
        let names = extract_placeholders("{{a}} and {{b}} and {{a}}");
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_extract_placeholders_none() {
        assert!(extract_placeholders("plain { text }").is_empty());
    }

    // ==================== Schema Tests ====================

    #[test]
    fn test_schema_paths() {
        let schema = ResourceSchema::from_resource(&default_resource());
        assert!(schema.contains("menus.default.admins"));
        assert!(!schema.contains("menus.default"));
        assert_eq!(schema.paths().count(), 6);
    }

    #[test]
    fn test_schema_check_valid() {
        let schema = ResourceSchema::from_resource(&default_resource());
        assert!(schema.check("homeWithName", ["name"]).is_clean());
        assert!(schema.check("home", []).is_clean());
    }

    #[test]
    fn test_schema_check_unknown_path() {
        let schema = ResourceSchema::from_resource(&default_resource());
        let report = schema.check("abc.d.e", []);
        assert!(report.errors[0].contains("Unknown path"));
    }

    #[test]
    fn test_schema_check_parameter_mismatch() {
        let schema = ResourceSchema::from_resource(&default_resource());
        let report = schema.check("homeWithName", ["name1"]);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().any(|e| e.contains("Missing parameter 'name'")));
        assert!(report.errors.iter().any(|e| e.contains("Unexpected parameter 'name1'")));
    }

    // ==================== Compare Tests ====================

    #[test]
    fn test_compare_flags_placeholder_mismatch() {
        let report = TranslationValidator::compare(&default_resource(), &english());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("homeWithName"));
    }

    #[test]
    fn test_compare_identical_is_clean() {
        let report = TranslationValidator::compare(&default_resource(), &default_resource());
        assert!(report.is_clean());
    }

    // ==================== Missing Path Tests ====================

    #[test]
    fn test_missing_paths() {
        let missing = missing_paths(&default_resource(), &english());
        assert_eq!(
            missing.into_iter().collect::<Vec<_>>(),
            vec!["extra", "menus.default.admins"]
        );
    }

    #[test]
    fn test_missing_paths_shape_mismatch() {
        let translation = Resource::new()
            .tree("home", Resource::new().text("x", "y"))
            .text("menus", "flat");
        let missing = missing_paths(&default_resource(), &translation);

        assert!(missing.contains("home"));
        assert!(missing.contains("menus.default.users"));
        assert!(missing.contains("menus.default.admins"));
    }

    #[test]
    fn test_message_and_text_are_interchangeable_leaves() {
        let translation = default_resource().text("friend", "plain friend");
        assert!(missing_paths(&default_resource(), &translation).is_empty());
    }

    #[test]
    fn test_completeness_report() {
        let mut report = CompletenessReport::default();
        assert!(report.is_complete());

        report.missing.insert("en".to_string(), BTreeSet::new());
        assert!(report.is_complete());

        report.unloaded.push("jp".to_string());
        assert!(!report.is_complete());
    }
}
