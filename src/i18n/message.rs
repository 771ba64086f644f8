//! Messages: a template plus per-parameter formatter pipelines.

use crate::i18n::error::ResourceError;
use crate::i18n::formatter::is_supported_unit;
use crate::i18n::value::Value;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type CustomFn = dyn Fn(Value, &str) -> anyhow::Result<Value> + Send + Sync;

/// A user-supplied transform `(value, language) -> value`.
#[derive(Clone)]
pub struct CustomFormat(Arc<CustomFn>);

impl CustomFormat {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &str) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, value: Value, language: &str) -> anyhow::Result<Value> {
        (self.0)(value, language)
    }
}

impl fmt::Debug for CustomFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomFormat(..)")
    }
}

/// Plural replacements in declaration order.
///
/// Keys are literal values (`"1"`, `"male"`), inclusive ranges (`"3-7"`),
/// open ranges (`"10-n"`) or the catch-all `"n"`. Order matters: the first
/// matching range wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluralMap {
    entries: Vec<(String, Value)>,
}

impl PluralMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a case. Re-declaring a key replaces its value but keeps its position.
    pub fn when(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Length presets for dates and times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    Full,
    Long,
    Medium,
    Short,
}

/// How a unit is spelled out next to the number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitDisplay {
    #[default]
    Short,
    Long,
    Narrow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberKind {
    Decimal,
    Percent,
    /// ISO 4217 currency code, case-insensitive.
    Currency(String),
    /// Measurement unit identifier such as `kilometer` or `megabyte`.
    Unit { unit: String, display: UnitDisplay },
}

/// Style descriptor for locale-aware number rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberStyle {
    pub kind: NumberKind,
    pub minimum_fraction_digits: Option<u8>,
    pub maximum_fraction_digits: Option<u8>,
    pub use_grouping: bool,
}

impl NumberStyle {
    fn with_kind(kind: NumberKind) -> Self {
        Self {
            kind,
            minimum_fraction_digits: None,
            maximum_fraction_digits: None,
            use_grouping: true,
        }
    }

    pub fn decimal() -> Self {
        Self::with_kind(NumberKind::Decimal)
    }

    pub fn percent() -> Self {
        Self::with_kind(NumberKind::Percent)
    }

    pub fn currency(code: impl Into<String>) -> Self {
        Self::with_kind(NumberKind::Currency(code.into()))
    }

    pub fn unit(unit: impl Into<String>, display: UnitDisplay) -> Self {
        Self::with_kind(NumberKind::Unit {
            unit: unit.into(),
            display,
        })
    }

    pub fn with_fraction_digits(mut self, min: u8, max: u8) -> Self {
        self.minimum_fraction_digits = Some(min);
        self.maximum_fraction_digits = Some(max.max(min));
        self
    }

    pub fn without_grouping(mut self) -> Self {
        self.use_grouping = false;
        self
    }
}

/// Width of a textual date field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextWidth {
    Long,
    Short,
    Narrow,
}

/// Width of a numeric date or time field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum NumericWidth {
    #[serde(rename = "numeric")]
    Numeric,
    #[serde(rename = "2-digit")]
    TwoDigit,
}

/// Width of the month field, numeric or textual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MonthWidth {
    #[serde(rename = "numeric")]
    Numeric,
    #[serde(rename = "2-digit")]
    TwoDigit,
    #[serde(rename = "long")]
    Long,
    #[serde(rename = "short")]
    Short,
    #[serde(rename = "narrow")]
    Narrow,
}

/// Style descriptor for locale-aware date-time rendering.
///
/// Either the `date_style`/`time_style` presets or the individual components
/// (`weekday` through `second`) are used, never both. With neither, a short
/// numeric date is rendered. `time_zone` is an IANA zone name and wins over
/// `utc_offset_minutes`; without either the host's local time zone is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DateTimeStyle {
    #[serde(default)]
    pub date_style: Option<Length>,
    #[serde(default)]
    pub time_style: Option<Length>,
    #[serde(default)]
    pub weekday: Option<TextWidth>,
    #[serde(default)]
    pub year: Option<NumericWidth>,
    #[serde(default)]
    pub month: Option<MonthWidth>,
    #[serde(default)]
    pub day: Option<NumericWidth>,
    #[serde(default)]
    pub hour: Option<NumericWidth>,
    #[serde(default)]
    pub minute: Option<NumericWidth>,
    #[serde(default)]
    pub second: Option<NumericWidth>,
    /// Force a 12-hour (`true`) or 24-hour (`false`) clock for `hour`
    #[serde(default)]
    pub hour12: Option<bool>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl DateTimeStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date(mut self, length: Length) -> Self {
        self.date_style = Some(length);
        self
    }

    pub fn time(mut self, length: Length) -> Self {
        self.time_style = Some(length);
        self
    }

    pub fn weekday(mut self, width: TextWidth) -> Self {
        self.weekday = Some(width);
        self
    }

    pub fn year(mut self, width: NumericWidth) -> Self {
        self.year = Some(width);
        self
    }

    pub fn month(mut self, width: MonthWidth) -> Self {
        self.month = Some(width);
        self
    }

    pub fn day(mut self, width: NumericWidth) -> Self {
        self.day = Some(width);
        self
    }

    pub fn hour(mut self, width: NumericWidth) -> Self {
        self.hour = Some(width);
        self
    }

    pub fn minute(mut self, width: NumericWidth) -> Self {
        self.minute = Some(width);
        self
    }

    pub fn second(mut self, width: NumericWidth) -> Self {
        self.second = Some(width);
        self
    }

    pub fn hour12(mut self, twelve_hour: bool) -> Self {
        self.hour12 = Some(twelve_hour);
        self
    }

    pub fn time_zone(mut self, zone: impl Into<String>) -> Self {
        self.time_zone = Some(zone.into());
        self
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = Some(minutes);
        self
    }

    /// Whether any individual date or time component is requested.
    pub fn has_components(&self) -> bool {
        self.weekday.is_some()
            || self.year.is_some()
            || self.month.is_some()
            || self.day.is_some()
            || self.has_time_components()
    }

    pub(crate) fn has_time_components(&self) -> bool {
        self.hour.is_some() || self.minute.is_some() || self.second.is_some()
    }

    /// Reject presets mixed with components and unknown time zones.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if (self.date_style.is_some() || self.time_style.is_some()) && self.has_components() {
            return Err(
                "dateStyle/timeStyle cannot be combined with individual date-time fields"
                    .to_string(),
            );
        }
        if let Some(zone) = &self.time_zone {
            zone.parse::<chrono_tz::Tz>()
                .map_err(|_| format!("unknown time zone '{}'", zone))?;
        }
        Ok(())
    }
}

/// One step of a parameter pipeline.
#[derive(Debug, Clone)]
pub enum Formatter {
    Custom(CustomFormat),
    Plural(PluralMap),
    Number(NumberStyle),
    DateTime(DateTimeStyle),
}

impl Formatter {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Value, &str) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Formatter::Custom(CustomFormat::new(f))
    }
}

/// An immutable template with `{{name}}` placeholders and the formatter
/// pipelines declared for its parameters.
#[derive(Debug, Clone)]
pub struct Message {
    template: String,
    formats: HashMap<String, Vec<Formatter>>,
}

impl Message {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            formats: HashMap::new(),
        }
    }

    /// Append a formatter to a parameter's pipeline.
    pub fn format(mut self, param: impl Into<String>, formatter: Formatter) -> Self {
        self.formats.entry(param.into()).or_default().push(formatter);
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// The pipeline for `param`; empty when none was declared.
    pub fn formatters(&self, param: &str) -> &[Formatter] {
        self.formats.get(param).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parameter names that have a declared pipeline.
    pub fn formatted_params(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    /// Build a message from its JSON form:
    /// `{"$message": "...", "$formats": {"param": descriptor | [descriptor]}}`.
    pub(crate) fn from_json(
        path: &str,
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Message, ResourceError> {
        let invalid = |reason: String| ResourceError::InvalidMessage {
            path: path.to_string(),
            reason,
        };

        let template = object
            .get(MESSAGE_KEY)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| invalid(format!("'{}' must be a string", MESSAGE_KEY)))?;

        if let Some(key) = object
            .keys()
            .find(|k| k.as_str() != MESSAGE_KEY && k.as_str() != FORMATS_KEY)
        {
            return Err(invalid(format!("unexpected key '{}'", key)));
        }

        let mut message = Message::new(template);
        let Some(formats) = object.get(FORMATS_KEY) else {
            return Ok(message);
        };
        let formats = formats
            .as_object()
            .ok_or_else(|| invalid(format!("'{}' must be an object", FORMATS_KEY)))?;

        for (param, descriptors) in formats {
            let specs: OneOrMany = serde_json::from_value(descriptors.clone())
                .map_err(|e| invalid(format!("formatter for '{}': {}", param, e)))?;
            let specs = match specs {
                OneOrMany::One(spec) => vec![spec],
                OneOrMany::Many(specs) => specs,
            };
            for spec in specs {
                let formatter = spec
                    .into_formatter()
                    .map_err(|reason| invalid(format!("formatter for '{}': {}", param, reason)))?;
                message = message.format(param.clone(), formatter);
            }
        }

        Ok(message)
    }
}

pub(crate) const MESSAGE_KEY: &str = "$message";
const FORMATS_KEY: &str = "$formats";

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(FormatterSpec),
    Many(Vec<FormatterSpec>),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum FormatterSpec {
    Plural {
        plural: serde_json::Map<String, serde_json::Value>,
    },
    Number(NumberSpec),
    DateTime(DateTimeStyle),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct NumberSpec {
    style: String,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    unit_display: Option<UnitDisplay>,
    #[serde(default)]
    minimum_fraction_digits: Option<u8>,
    #[serde(default)]
    maximum_fraction_digits: Option<u8>,
    #[serde(default)]
    use_grouping: Option<bool>,
}

impl FormatterSpec {
    fn into_formatter(self) -> Result<Formatter, String> {
        match self {
            FormatterSpec::Plural { plural } => {
                let mut map = PluralMap::new();
                for (key, value) in &plural {
                    let value = Value::from_json(value)
                        .ok_or_else(|| format!("plural case '{}' must be a scalar", key))?;
                    map = map.when(key.clone(), value);
                }
                Ok(Formatter::Plural(map))
            }
            FormatterSpec::Number(spec) => {
                let kind = match spec.style.as_str() {
                    "decimal" => NumberKind::Decimal,
                    "percent" => NumberKind::Percent,
                    "currency" => NumberKind::Currency(
                        spec.currency
                            .ok_or_else(|| "currency style needs a 'currency' code".to_string())?,
                    ),
                    "unit" => {
                        let unit = spec
                            .unit
                            .ok_or_else(|| "unit style needs a 'unit' identifier".to_string())?;
                        if !is_supported_unit(&unit) {
                            return Err(format!("unsupported unit '{}'", unit));
                        }
                        NumberKind::Unit {
                            unit,
                            display: spec.unit_display.unwrap_or_default(),
                        }
                    }
                    other => return Err(format!("unsupported number style '{}'", other)),
                };
                Ok(Formatter::Number(NumberStyle {
                    kind,
                    minimum_fraction_digits: spec.minimum_fraction_digits,
                    maximum_fraction_digits: spec.maximum_fraction_digits,
                    use_grouping: spec.use_grouping.unwrap_or(true),
                }))
            }
            FormatterSpec::DateTime(style) => {
                style.validate()?;
                Ok(Formatter::DateTime(style))
            }
        }
    }
}
