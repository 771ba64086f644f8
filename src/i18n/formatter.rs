//! Parameter formatting pipeline.
//!
//! Each parameter of a [`Message`](crate::i18n::Message) may declare an
//! ordered list of formatters. They run in declaration order and every
//! formatter receives the previous one's output.
//!
//! Number and date-time rendering is delegated to a [`LocaleFormat`]
//! implementation so hosts can plug in their own locale data. The default,
//! [`SystemLocaleFormat`], uses `num-format` for digit grouping and `chrono`'s
//! localized calendars.

use crate::i18n::error::FormatError;
use crate::i18n::message::{
    DateTimeStyle, Formatter, Length, MonthWidth, NumberKind, NumberStyle, NumericWidth,
    PluralMap, TextWidth, UnitDisplay,
};
use crate::i18n::value::Value;
use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};
use num_format::ToFormattedString;
use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

/// Locale-aware rendering of numbers and date-times.
pub trait LocaleFormat: Send + Sync {
    fn format_number(
        &self,
        value: &Value,
        style: &NumberStyle,
        language: &str,
    ) -> Result<String, FormatError>;

    fn format_date_time(
        &self,
        value: &Value,
        style: &DateTimeStyle,
        language: &str,
    ) -> Result<String, FormatError>;
}

/// Run `formatters` over `value` in order.
///
/// Custom formatter failures propagate unchanged to the caller.
pub fn format_value(
    param: &str,
    value: Value,
    formatters: &[Formatter],
    language: &str,
    locale_format: &dyn LocaleFormat,
) -> Result<Value, FormatError> {
    let mut value = value;
    for formatter in formatters {
        value = match formatter {
            Formatter::Custom(custom) => {
                custom
                    .apply(value, language)
                    .map_err(|source| FormatError::Custom {
                        param: param.to_string(),
                        source,
                    })?
            }
            Formatter::Plural(map) => match_plural(value, map),
            Formatter::Number(style) => {
                Value::Str(locale_format.format_number(&value, style, language)?)
            }
            Formatter::DateTime(style) => {
                Value::Str(locale_format.format_date_time(&value, style, language)?)
            }
        };
    }
    Ok(value)
}

static RANGE_REGEX: OnceLock<Regex> = OnceLock::new();

fn range_regex() -> &'static Regex {
    RANGE_REGEX.get_or_init(|| Regex::new(r"^(\d+)-(\d+|n)$").expect("range pattern is valid"))
}

/// Whether a plural key of the form `lo-hi` or `lo-n` covers `number`.
///
/// Only non-negative integral numbers fall into ranges.
fn range_matches(key: &str, number: f64) -> bool {
    if number < 0.0 || number.fract() != 0.0 {
        return false;
    }
    let Some(caps) = range_regex().captures(key) else {
        return false;
    };
    let Ok(lower) = caps[1].parse::<f64>() else {
        return false;
    };
    match &caps[2] {
        "n" => number >= lower,
        upper => upper
            .parse::<f64>()
            .map(|upper| lower <= number && number <= upper)
            .unwrap_or(false),
    }
}

/// Pick the plural replacement for `value`.
///
/// Exact key first, then the first covering range in declaration order, then
/// the `n` catch-all. Values that match nothing are returned unchanged.
pub fn match_plural(value: Value, map: &PluralMap) -> Value {
    if let Some(exact) = map.get(&value.to_string()) {
        return exact.clone();
    }

    let Some(number) = value.as_number().filter(|n| n.is_finite()) else {
        return value;
    };

    if let Some((_, hit)) = map.iter().find(|(key, _)| range_matches(key, number)) {
        return hit.clone();
    }

    map.get("n").cloned().unwrap_or(value)
}

/// Default [`LocaleFormat`] backed by `num-format` and `chrono` locale data.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLocaleFormat;

fn primary_subtag(language: &str) -> &str {
    language
        .split(|c| c == '-' || c == '_')
        .next()
        .unwrap_or(language)
}

fn number_locale(language: &str) -> num_format::Locale {
    num_format::Locale::from_name(language)
        .or_else(|_| num_format::Locale::from_name(primary_subtag(language)))
        .unwrap_or(num_format::Locale::en)
}

/// Languages that write currency and percent signs after the number.
const SUFFIX_SIGN_LANGUAGES: &[&str] = &[
    "cs", "da", "de", "es", "fi", "fr", "it", "nb", "pl", "pt", "ru", "sv", "uk",
];

fn currency_symbol(code: &str) -> Option<&'static str> {
    let symbol = match code {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "CNY" | "JPY" => "¥",
        "KRW" => "₩",
        "INR" => "₹",
        "RUB" => "₽",
        "BRL" => "R$",
        _ => return None,
    };
    Some(symbol)
}

fn currency_fraction_digits(code: &str) -> u8 {
    match code {
        "JPY" | "KRW" | "VND" | "CLP" | "ISK" | "UGX" => 0,
        "BHD" | "KWD" | "OMR" | "JOD" | "TND" => 3,
        _ => 2,
    }
}

/// Unit spellings: short, narrow, long singular, long plural.
///
/// Long forms are English; other languages fall back to the short form.
const UNITS: &[(&str, [&str; 4])] = &[
    ("kilometer", ["{} km", "{}km", "{} kilometer", "{} kilometers"]),
    ("meter", ["{} m", "{}m", "{} meter", "{} meters"]),
    ("centimeter", ["{} cm", "{}cm", "{} centimeter", "{} centimeters"]),
    ("millimeter", ["{} mm", "{}mm", "{} millimeter", "{} millimeters"]),
    ("mile", ["{} mi", "{}mi", "{} mile", "{} miles"]),
    ("foot", ["{} ft", "{}\u{2032}", "{} foot", "{} feet"]),
    ("inch", ["{} in", "{}\u{2033}", "{} inch", "{} inches"]),
    ("kilogram", ["{} kg", "{}kg", "{} kilogram", "{} kilograms"]),
    ("gram", ["{} g", "{}g", "{} gram", "{} grams"]),
    ("pound", ["{} lb", "{}#", "{} pound", "{} pounds"]),
    ("liter", ["{} L", "{}L", "{} liter", "{} liters"]),
    ("milliliter", ["{} mL", "{}mL", "{} milliliter", "{} milliliters"]),
    ("second", ["{} sec", "{}s", "{} second", "{} seconds"]),
    ("minute", ["{} min", "{}m", "{} minute", "{} minutes"]),
    ("hour", ["{} hr", "{}h", "{} hour", "{} hours"]),
    ("day", ["{} days", "{}d", "{} day", "{} days"]),
    ("byte", ["{} byte", "{}B", "{} byte", "{} bytes"]),
    ("kilobyte", ["{} kB", "{}kB", "{} kilobyte", "{} kilobytes"]),
    ("megabyte", ["{} MB", "{}MB", "{} megabyte", "{} megabytes"]),
    ("gigabyte", ["{} GB", "{}GB", "{} gigabyte", "{} gigabytes"]),
    ("percent", ["{}%", "{}%", "{} percent", "{} percent"]),
    ("celsius", ["{}°C", "{}°C", "{} degree Celsius", "{} degrees Celsius"]),
    ("fahrenheit", ["{}°F", "{}°", "{} degree Fahrenheit", "{} degrees Fahrenheit"]),
    (
        "kilometer-per-hour",
        ["{} km/h", "{}km/h", "{} kilometer per hour", "{} kilometers per hour"],
    ),
    ("mile-per-hour", ["{} mph", "{}mph", "{} mile per hour", "{} miles per hour"]),
];

fn unit_forms(unit: &str) -> Option<&'static [&'static str; 4]> {
    UNITS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(unit))
        .map(|(_, forms)| forms)
}

/// Whether [`SystemLocaleFormat`] knows how to spell `unit`.
pub(crate) fn is_supported_unit(unit: &str) -> bool {
    unit_forms(unit).is_some()
}

fn resolve_fraction_digits(style: &NumberStyle, default_min: u8, default_max: u8) -> (u8, u8) {
    match (style.minimum_fraction_digits, style.maximum_fraction_digits) {
        (Some(min), Some(max)) => (min, max.max(min)),
        (Some(min), None) => (min, default_max.max(min)),
        (None, Some(max)) => (default_min.min(max), max),
        (None, None) => (default_min, default_max),
    }
}

/// Render `abs` with locale separators, keeping between `min` and `max`
/// fraction digits.
fn render_digits(
    abs: f64,
    min: u8,
    max: u8,
    locale: &num_format::Locale,
    grouping: bool,
) -> String {
    let fixed = format!("{:.*}", usize::from(max), abs);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut frac = frac_part.to_string();
    while frac.len() > usize::from(min) && frac.ends_with('0') {
        frac.pop();
    }

    let int_rendered = match (grouping, int_part.parse::<u128>()) {
        (true, Ok(n)) => n.to_formatted_string(locale),
        _ => int_part.to_string(),
    };

    if frac.is_empty() {
        int_rendered
    } else {
        format!("{}{}{}", int_rendered, locale.decimal(), frac)
    }
}

impl LocaleFormat for SystemLocaleFormat {
    fn format_number(
        &self,
        value: &Value,
        style: &NumberStyle,
        language: &str,
    ) -> Result<String, FormatError> {
        let Some(number) = value.as_number().filter(|n| !n.is_nan()) else {
            return Ok("NaN".to_string());
        };

        let locale = number_locale(language);
        let suffix_signs = SUFFIX_SIGN_LANGUAGES.contains(&primary_subtag(language));

        let (scaled, (min, max)) = match &style.kind {
            NumberKind::Decimal => (number, resolve_fraction_digits(style, 0, 3)),
            NumberKind::Percent => (number * 100.0, resolve_fraction_digits(style, 0, 0)),
            NumberKind::Currency(code) => {
                let digits = currency_fraction_digits(&code.to_ascii_uppercase());
                (number, resolve_fraction_digits(style, digits, digits))
            }
            NumberKind::Unit { .. } => (number, resolve_fraction_digits(style, 0, 3)),
        };

        let body = if scaled.is_infinite() {
            "∞".to_string()
        } else {
            render_digits(scaled.abs(), min, max, &locale, style.use_grouping)
        };
        let sign = if scaled < 0.0 { locale.minus_sign() } else { "" };

        let rendered = match &style.kind {
            NumberKind::Decimal => format!("{}{}", sign, body),
            NumberKind::Percent if suffix_signs => format!("{}{}\u{a0}%", sign, body),
            NumberKind::Percent => format!("{}{}%", sign, body),
            NumberKind::Currency(code) => {
                let code = code.to_ascii_uppercase();
                match (currency_symbol(&code), suffix_signs) {
                    (Some(symbol), true) => format!("{}{}\u{a0}{}", sign, body, symbol),
                    (Some(symbol), false) => format!("{}{}{}", sign, symbol, body),
                    (None, true) => format!("{}{}\u{a0}{}", sign, body, code),
                    (None, false) => format!("{}{}\u{a0}{}", sign, code, body),
                }
            }
            NumberKind::Unit { unit, display } => {
                let forms = unit_forms(unit).ok_or_else(|| {
                    FormatError::InvalidStyle(format!("unsupported unit '{}'", unit))
                })?;
                let english = primary_subtag(language).eq_ignore_ascii_case("en");
                let template = match display {
                    UnitDisplay::Short => forms[0],
                    UnitDisplay::Narrow => forms[1],
                    UnitDisplay::Long if english && scaled.abs() == 1.0 => forms[2],
                    UnitDisplay::Long if english => forms[3],
                    UnitDisplay::Long => forms[0],
                };
                template.replace("{}", &format!("{}{}", sign, body))
            }
        };
        Ok(rendered)
    }

    fn format_date_time(
        &self,
        value: &Value,
        style: &DateTimeStyle,
        language: &str,
    ) -> Result<String, FormatError> {
        style.validate().map_err(FormatError::InvalidStyle)?;
        let instant = to_instant(value)?;
        let local = instant.with_timezone(&display_offset(&instant, style)?);

        let (locale, family) = match time_locale(language) {
            Some(locale) => (locale, CalendarFamily::for_language(language)),
            None => (chrono::Locale::en_US, CalendarFamily::English),
        };
        let pattern = if style.has_components() {
            family.component_pattern(style)
        } else {
            family.pattern(style.date_style, style.time_style)
        };

        let mut out = String::new();
        write!(out, "{}", local.format_localized(&pattern, locale)).map_err(|_| {
            FormatError::Render {
                kind: "date-time",
                language: language.to_string(),
            }
        })?;
        Ok(out)
    }
}

/// Offset to render `instant` in: the named zone, then the fixed offset, then
/// the host's local zone.
fn display_offset(
    instant: &DateTime<Utc>,
    style: &DateTimeStyle,
) -> Result<FixedOffset, FormatError> {
    if let Some(zone) = &style.time_zone {
        let tz: chrono_tz::Tz = zone
            .parse()
            .map_err(|_| FormatError::InvalidStyle(format!("unknown time zone '{}'", zone)))?;
        return Ok(instant.with_timezone(&tz).offset().fix());
    }
    match style.utc_offset_minutes {
        Some(minutes) => FixedOffset::east_opt(minutes.saturating_mul(60)).ok_or_else(|| {
            FormatError::InvalidDateTime(format!("utc offset of {} minutes", minutes))
        }),
        None => Ok(*instant.with_timezone(&Local).offset()),
    }
}

fn to_instant(value: &Value) -> Result<DateTime<Utc>, FormatError> {
    let invalid = || FormatError::InvalidDateTime(value.to_string());
    let from_millis = |ms: f64| -> Result<DateTime<Utc>, FormatError> {
        if !ms.is_finite() {
            return Err(invalid());
        }
        Utc.timestamp_millis_opt(ms as i64).single().ok_or_else(invalid)
    };

    match value {
        Value::DateTime(dt) => Ok(*dt),
        Value::Int(ms) => Utc.timestamp_millis_opt(*ms).single().ok_or_else(invalid),
        Value::Float(ms) => from_millis(*ms),
        Value::Str(s) => match DateTime::parse_from_rfc3339(s.trim()) {
            Ok(dt) => Ok(dt.with_timezone(&Utc)),
            Err(_) => value.as_number().map(from_millis).unwrap_or_else(|| Err(invalid())),
        },
        Value::Null | Value::Bool(_) => Err(invalid()),
    }
}

/// Map a language tag to chrono's POSIX-style locale names.
fn time_locale(language: &str) -> Option<chrono::Locale> {
    let posix = language.replace('-', "_");
    if let Ok(locale) = chrono::Locale::try_from(posix.as_str()) {
        return Some(locale);
    }

    let primary = primary_subtag(language).to_ascii_lowercase();
    let region = match primary.as_str() {
        "en" => "US".to_string(),
        "zh" => "CN".to_string(),
        "ja" => "JP".to_string(),
        "ko" => "KR".to_string(),
        "da" => "DK".to_string(),
        "sv" => "SE".to_string(),
        "nb" => "NO".to_string(),
        "cs" => "CZ".to_string(),
        "el" => "GR".to_string(),
        "uk" => "UA".to_string(),
        other => other.to_ascii_uppercase(),
    };
    chrono::Locale::try_from(format!("{}_{}", primary, region).as_str()).ok()
}

/// Field order and separators for date-time patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CalendarFamily {
    /// Month-first, 12-hour clock.
    English,
    /// Year-first with 年月日 markers, 24-hour clock.
    Cjk,
    /// Day-first, 24-hour clock.
    DayFirst,
}

impl CalendarFamily {
    fn for_language(language: &str) -> Self {
        match primary_subtag(language).to_ascii_lowercase().as_str() {
            "en" => CalendarFamily::English,
            "zh" | "ja" => CalendarFamily::Cjk,
            _ => CalendarFamily::DayFirst,
        }
    }

    fn date_pattern(self, length: Option<Length>) -> &'static str {
        match (self, length) {
            (CalendarFamily::English, None) => "%-m/%-d/%Y",
            (CalendarFamily::English, Some(Length::Full)) => "%A, %B %-d, %Y",
            (CalendarFamily::English, Some(Length::Long)) => "%B %-d, %Y",
            (CalendarFamily::English, Some(Length::Medium)) => "%b %-d, %Y",
            (CalendarFamily::English, Some(Length::Short)) => "%-m/%-d/%y",
            (CalendarFamily::Cjk, Some(Length::Full)) => "%Y年%-m月%-d日%A",
            (CalendarFamily::Cjk, Some(Length::Long)) => "%Y年%-m月%-d日",
            (CalendarFamily::Cjk, _) => "%Y/%-m/%-d",
            (CalendarFamily::DayFirst, Some(Length::Full)) => "%A %-d %B %Y",
            (CalendarFamily::DayFirst, Some(Length::Long)) => "%-d %B %Y",
            (CalendarFamily::DayFirst, Some(Length::Medium)) => "%-d %b %Y",
            (CalendarFamily::DayFirst, _) => "%d/%m/%Y",
        }
    }

    fn time_pattern(self, length: Length) -> &'static str {
        match (self, length) {
            (CalendarFamily::English, Length::Full | Length::Long) => "%-I:%M:%S %p %:z",
            (CalendarFamily::English, Length::Medium) => "%-I:%M:%S %p",
            (CalendarFamily::English, Length::Short) => "%-I:%M %p",
            (_, Length::Full | Length::Long) => "%H:%M:%S %:z",
            (_, Length::Medium) => "%H:%M:%S",
            (_, Length::Short) => "%H:%M",
        }
    }

    fn pattern(self, date: Option<Length>, time: Option<Length>) -> String {
        match (date, time) {
            (None, None) => self.date_pattern(None).to_string(),
            (Some(_), None) => self.date_pattern(date).to_string(),
            (None, Some(time)) => self.time_pattern(time).to_string(),
            (Some(d), Some(time)) => {
                let joiner = match (self, d) {
                    (CalendarFamily::English, Length::Full | Length::Long) => " at ",
                    (CalendarFamily::English, _) | (CalendarFamily::DayFirst, _) => ", ",
                    (CalendarFamily::Cjk, _) => " ",
                };
                format!(
                    "{}{}{}",
                    self.date_pattern(date),
                    joiner,
                    self.time_pattern(time)
                )
            }
        }
    }

    /// Pattern for individually requested fields, in this family's order.
    fn component_pattern(self, style: &DateTimeStyle) -> String {
        let date = self.date_components(style);
        let time = self.time_components(style);
        match (date.is_empty(), time.is_empty()) {
            (false, false) => {
                let joiner = if self == CalendarFamily::Cjk { " " } else { ", " };
                format!("{}{}{}", date, joiner, time)
            }
            (false, true) => date,
            (true, _) => time,
        }
    }

    fn date_components(self, style: &DateTimeStyle) -> String {
        let weekday = style.weekday.map(|width| match width {
            TextWidth::Long => "%A",
            TextWidth::Short | TextWidth::Narrow => "%a",
        });
        let year = style.year.map(|width| match width {
            NumericWidth::Numeric => "%Y",
            NumericWidth::TwoDigit => "%y",
        });
        let day = style.day.map(|width| match width {
            NumericWidth::Numeric => "%-d",
            NumericWidth::TwoDigit => "%d",
        });
        let month = style.month.map(|width| match width {
            MonthWidth::Numeric => "%-m",
            MonthWidth::TwoDigit => "%m",
            MonthWidth::Long => "%B",
            MonthWidth::Short | MonthWidth::Narrow => "%b",
        });
        let numeric_month = matches!(
            style.month,
            Some(MonthWidth::Numeric | MonthWidth::TwoDigit)
        );

        match self {
            CalendarFamily::English => {
                let core = if numeric_month {
                    join_fields(&[month, day, year], "/")
                } else {
                    let month_day = join_fields(&[month, day], " ");
                    match year {
                        Some(year) if day.is_some() && month.is_some() => {
                            format!("{}, {}", month_day, year)
                        }
                        Some(year) => join_fields(&[Some(month_day.as_str()), Some(year)], " "),
                        None => month_day,
                    }
                };
                join_fields(&[weekday, Some(core.as_str())], ", ")
            }
            CalendarFamily::Cjk => {
                let core = if numeric_month && (year.is_some() || day.is_some()) {
                    join_fields(&[year, month, day], "/")
                } else {
                    let mut core = String::new();
                    if let Some(year) = year {
                        core.push_str(year);
                        core.push('年');
                    }
                    if let Some(width) = style.month {
                        core.push_str(if width == MonthWidth::TwoDigit { "%m" } else { "%-m" });
                        core.push('月');
                    }
                    if let Some(day) = day {
                        core.push_str(day);
                        core.push('日');
                    }
                    core
                };
                format!("{}{}", core, weekday.unwrap_or_default())
            }
            CalendarFamily::DayFirst => {
                let sep = if numeric_month { "/" } else { " " };
                let core = join_fields(&[day, month, year], sep);
                join_fields(&[weekday, Some(core.as_str())], " ")
            }
        }
    }

    fn time_components(self, style: &DateTimeStyle) -> String {
        let twelve_hour = style.hour12.unwrap_or(self == CalendarFamily::English);
        let hour = style.hour.map(|width| match (twelve_hour, width) {
            (true, NumericWidth::Numeric) => "%-I",
            (true, NumericWidth::TwoDigit) => "%I",
            (false, _) => "%H",
        });
        let clock = join_fields(
            &[hour, style.minute.map(|_| "%M"), style.second.map(|_| "%S")],
            ":",
        );
        if twelve_hour && hour.is_some() {
            format!("{} %p", clock)
        } else {
            clock
        }
    }
}

/// Join the present, non-empty fields with `sep`.
fn join_fields(fields: &[Option<&str>], sep: &str) -> String {
    fields
        .iter()
        .flatten()
        .filter(|field| !field.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn counting_map() -> PluralMap {
        PluralMap::new()
            .when("1", "one")
            .when("2", "two")
            .when("3-7", "few")
            .when("n", "many")
    }

    fn plural(value: impl Into<Value>, map: &PluralMap) -> String {
        match_plural(value.into(), map).to_string()
    }

    // ==================== Plural Tests ====================

    #[test]
    fn test_plural_exact_and_ranges() {
        let map = counting_map();
        assert_eq!(plural("1", &map), "one");
        assert_eq!(plural("2", &map), "two");
        assert_eq!(plural("4", &map), "few");
        assert_eq!(plural("7", &map), "few");
        assert_eq!(plural("8", &map), "many");
        assert_eq!(plural(1, &map), "one");
        assert_eq!(plural(8, &map), "many");
    }

    #[test]
    fn test_plural_non_numeric_passthrough() {
        assert_eq!(plural("foo", &counting_map()), "foo");
    }

    #[test]
    fn test_plural_null_and_bool_skip_numeric_cases() {
        let map = counting_map();
        assert_eq!(plural(true, &map), "true");
        assert_eq!(plural(Value::Null, &map), "null");

        let keyed = PluralMap::new().when("true", "yes").when("n", "many");
        assert_eq!(plural(true, &keyed), "yes");
    }

    #[test]
    fn test_number_null_and_bool_are_nan() {
        assert_eq!(number(Value::Null, NumberStyle::decimal(), "en"), "NaN");
        assert_eq!(number(true, NumberStyle::decimal(), "en"), "NaN");
    }

    #[test]
    fn test_plural_literal_keys() {
        let map = PluralMap::new().when("male", "foo").when("female", "bar");
        assert_eq!(plural("male", &map), "foo");
        assert_eq!(plural("female", &map), "bar");
        assert_eq!(plural("other", &map), "other");
    }

    #[test]
    fn test_plural_open_range_without_catch_all() {
        let map = PluralMap::new().when("1", "one").when("10-n", "many");
        assert_eq!(plural(4, &map), "4");
        assert_eq!(plural(10, &map), "many");
        assert_eq!(plural(1_000, &map), "many");
    }

    #[test]
    fn test_plural_first_declared_range_wins() {
        let map = PluralMap::new().when("5-10", "first").when("0-n", "second");
        assert_eq!(plural(7, &map), "first");
        assert_eq!(plural(11, &map), "second");

        let reversed = PluralMap::new().when("0-n", "second").when("5-10", "first");
        assert_eq!(plural(7, &reversed), "second");
    }

    #[test]
    fn test_plural_fractional_and_negative_skip_ranges() {
        let map = counting_map();
        assert_eq!(plural(4.5, &map), "many");
        assert_eq!(plural(-4, &map), "many");

        let no_catch_all = PluralMap::new().when("3-7", "few");
        assert_eq!(plural(4.5, &no_catch_all), "4.5");
        assert_eq!(plural(-4, &no_catch_all), "-4");
    }

    #[test]
    fn test_plural_malformed_keys_never_match() {
        let map = PluralMap::new().when("3 - 7", "spaced").when("a-b", "letters").when("7-", "open");
        assert_eq!(plural(5, &map), "5");
    }

    #[test]
    fn test_plural_non_finite_passthrough() {
        let map = counting_map();
        assert_eq!(plural(f64::INFINITY, &map), "Infinity");
        assert_eq!(plural("NaN", &map), "NaN");
    }

    proptest! {
        #[test]
        fn prop_values_inside_range_pick_range(v in 3u32..=7) {
            prop_assert_eq!(plural(v, &counting_map()), "few");
        }

        #[test]
        fn prop_values_above_ranges_pick_catch_all(v in 8u32..1_000_000) {
            prop_assert_eq!(plural(v, &counting_map()), "many");
        }

        #[test]
        fn prop_unmatched_values_unchanged(v in 0u32..10) {
            let map = PluralMap::new().when("10-20", "teen");
            prop_assert_eq!(plural(v, &map), v.to_string());
        }
    }

    // ==================== Pipeline Tests ====================

    #[test]
    fn test_pipeline_threads_values_in_order() {
        let formatters = vec![
            Formatter::custom(|v, _| Ok(Value::Int(v.as_number().unwrap_or(0.0) as i64 * 2))),
            Formatter::Plural(counting_map()),
            Formatter::custom(|v, lang| Ok(Value::Str(format!("{}:{}", lang, v)))),
        ];
        let out = format_value("count", Value::from("2"), &formatters, "en", &SystemLocaleFormat)
            .unwrap();
        assert_eq!(out, Value::from("en:few"));
    }

    #[test]
    fn test_pipeline_empty_is_identity() {
        let out = format_value("x", Value::Int(5), &[], "en", &SystemLocaleFormat).unwrap();
        assert_eq!(out, Value::Int(5));
    }

    #[test]
    fn test_pipeline_custom_error_propagates() {
        let formatters = vec![
            Formatter::custom(|_, _| Err(anyhow::anyhow!("nope"))),
            Formatter::custom(|_, _| panic!("must not run after a failure")),
        ];
        let err = format_value("name", Value::from("x"), &formatters, "en", &SystemLocaleFormat)
            .unwrap_err();
        assert!(matches!(err, FormatError::Custom { ref param, .. } if param == "name"));
    }

    #[test]
    fn test_custom_uppercase() {
        let formatters = vec![Formatter::custom(|v, _| Ok(Value::Str(v.to_string().to_uppercase())))];
        let out = format_value("g", Value::from("male"), &formatters, "zh", &SystemLocaleFormat)
            .unwrap();
        assert_eq!(out, Value::from("MALE"));
    }

    // ==================== Number Tests ====================

    fn number(value: impl Into<Value>, style: NumberStyle, language: &str) -> String {
        SystemLocaleFormat
            .format_number(&value.into(), &style, language)
            .unwrap()
    }

    #[test]
    fn test_number_decimal_grouping() {
        assert_eq!(number("200000000", NumberStyle::decimal(), "us"), "200,000,000");
        assert_eq!(number(1234.5678, NumberStyle::decimal(), "en"), "1,234.568");
        assert_eq!(number(-1234, NumberStyle::decimal(), "en"), "-1,234");
        assert_eq!(number(1234, NumberStyle::decimal().without_grouping(), "en"), "1234");
    }

    #[test]
    fn test_number_currency() {
        assert_eq!(number("200000", NumberStyle::currency("cny"), "zh"), "¥200,000.00");
        assert_eq!(number("200000", NumberStyle::currency("usd"), "us"), "$200,000.00");
        assert_eq!(number(1500, NumberStyle::currency("jpy"), "ja"), "¥1,500");
        assert_eq!(number(5, NumberStyle::currency("chf"), "en"), "CHF\u{a0}5.00");
    }

    #[test]
    fn test_number_percent() {
        assert_eq!(number(0.256, NumberStyle::percent(), "en"), "26%");
        assert_eq!(
            number(0.256, NumberStyle::percent().with_fraction_digits(1, 1), "en"),
            "25.6%"
        );
    }

    #[test]
    fn test_number_fraction_digits() {
        assert_eq!(
            number(3, NumberStyle::decimal().with_fraction_digits(2, 2), "en"),
            "3.00"
        );
        assert_eq!(number(3.10, NumberStyle::decimal(), "en"), "3.1");
    }

    #[test]
    fn test_number_non_numeric_is_nan() {
        assert_eq!(number("abc", NumberStyle::decimal(), "en"), "NaN");
    }

    #[test]
    fn test_number_unit_displays() {
        let km = |display| NumberStyle::unit("kilometer", display);
        assert_eq!(number(16, km(UnitDisplay::Short), "en"), "16 km");
        assert_eq!(number(16, km(UnitDisplay::Narrow), "en"), "16km");
        assert_eq!(number(16, km(UnitDisplay::Long), "en"), "16 kilometers");
        assert_eq!(number(1, km(UnitDisplay::Long), "en"), "1 kilometer");
        assert_eq!(number(1234.5, km(UnitDisplay::Short), "en"), "1,234.5 km");
        assert_eq!(number(-3, km(UnitDisplay::Short), "en"), "-3 km");
    }

    #[test]
    fn test_number_unit_long_outside_english_uses_short() {
        let style = NumberStyle::unit("megabyte", UnitDisplay::Long);
        assert_eq!(number(20, style, "zh"), "20 MB");
    }

    #[test]
    fn test_number_unknown_unit_errors() {
        let err = SystemLocaleFormat
            .format_number(&Value::Int(1), &NumberStyle::unit("furlong", UnitDisplay::Short), "en")
            .unwrap_err();
        assert!(matches!(err, FormatError::InvalidStyle(_)));
    }

    // ==================== Date-Time Tests ====================

    fn sample_instant() -> Value {
        Value::Int(1_727_189_872_880)
    }

    fn date_time(style: DateTimeStyle, language: &str) -> String {
        SystemLocaleFormat
            .format_date_time(&sample_instant(), &style, language)
            .unwrap()
    }

    #[test]
    fn test_date_default_is_short_numeric() {
        let style = DateTimeStyle::new().with_utc_offset_minutes(8 * 60);
        assert_eq!(date_time(style, "us"), "9/24/2024");
    }

    #[test]
    fn test_date_full_time_medium_chinese() {
        let style = DateTimeStyle::new()
            .date(Length::Full)
            .time(Length::Medium)
            .with_utc_offset_minutes(8 * 60);
        assert_eq!(date_time(style, "zh"), "2024年9月24日星期二 22:57:52");
    }

    #[test]
    fn test_date_full_time_short_unknown_language_uses_english() {
        let style = DateTimeStyle::new()
            .date(Length::Full)
            .time(Length::Short)
            .with_utc_offset_minutes(8 * 60);
        assert_eq!(
            date_time(style, "jp"),
            "Tuesday, September 24, 2024 at 10:57 PM"
        );
    }

    #[test]
    fn test_date_accepts_rfc3339_strings() {
        let style = DateTimeStyle::new().date(Length::Long).with_utc_offset_minutes(0);
        let out = SystemLocaleFormat
            .format_date_time(&Value::from("2024-09-24T14:57:52Z"), &style, "en")
            .unwrap();
        assert_eq!(out, "September 24, 2024");
    }

    #[test]
    fn test_date_components_named_zone() {
        let style = DateTimeStyle::new()
            .year(NumericWidth::Numeric)
            .month(MonthWidth::Long)
            .time_zone("Asia/Tokyo");
        assert_eq!(date_time(style, "en"), "September 2024");
    }

    #[test]
    fn test_date_components_chinese() {
        let style = DateTimeStyle::new()
            .year(NumericWidth::Numeric)
            .month(MonthWidth::Long)
            .day(NumericWidth::Numeric)
            .time_zone("Asia/Shanghai");
        assert_eq!(date_time(style, "zh"), "2024年9月24日");
    }

    #[test]
    fn test_date_components_weekday_month_day() {
        let style = DateTimeStyle::new()
            .weekday(TextWidth::Long)
            .month(MonthWidth::Long)
            .day(NumericWidth::Numeric)
            .with_utc_offset_minutes(8 * 60);
        assert_eq!(date_time(style, "en"), "Tuesday, September 24");
    }

    #[test]
    fn test_date_components_numeric_english() {
        let style = DateTimeStyle::new()
            .year(NumericWidth::Numeric)
            .month(MonthWidth::TwoDigit)
            .day(NumericWidth::TwoDigit)
            .time_zone("UTC");
        assert_eq!(date_time(style, "en"), "09/24/2024");
    }

    #[test]
    fn test_time_components_clock_by_language() {
        let clock = || {
            DateTimeStyle::new()
                .hour(NumericWidth::Numeric)
                .minute(NumericWidth::TwoDigit)
        };
        assert_eq!(date_time(clock().time_zone("UTC"), "en"), "2:57 PM");
        assert_eq!(date_time(clock().time_zone("UTC").hour12(false), "en"), "14:57");
        assert_eq!(date_time(clock().time_zone("Asia/Shanghai"), "zh"), "22:57");
    }

    #[test]
    fn test_date_and_time_components_joined() {
        let style = DateTimeStyle::new()
            .month(MonthWidth::Short)
            .day(NumericWidth::Numeric)
            .hour(NumericWidth::Numeric)
            .minute(NumericWidth::TwoDigit)
            .time_zone("UTC");
        assert_eq!(date_time(style, "en"), "Sep 24, 2:57 PM");
    }

    #[test]
    fn test_named_zone_wins_over_offset() {
        let style = DateTimeStyle::new()
            .hour(NumericWidth::Numeric)
            .minute(NumericWidth::TwoDigit)
            .hour12(false)
            .with_utc_offset_minutes(8 * 60)
            .time_zone("UTC");
        assert_eq!(date_time(style, "en"), "14:57");
    }

    #[test]
    fn test_date_invalid_styles_error() {
        let mixed = DateTimeStyle::new().date(Length::Long).year(NumericWidth::Numeric);
        let unknown_zone = DateTimeStyle::new().time_zone("Nowhere/City");
        for style in [mixed, unknown_zone] {
            let err = SystemLocaleFormat
                .format_date_time(&sample_instant(), &style, "en")
                .unwrap_err();
            assert!(matches!(err, FormatError::InvalidStyle(_)));
        }
    }

    #[test]
    fn test_date_rejects_non_dates() {
        let err = SystemLocaleFormat
            .format_date_time(&Value::from("yesterday"), &DateTimeStyle::new(), "en")
            .unwrap_err();
        assert!(matches!(err, FormatError::InvalidDateTime(_)));
    }
}
