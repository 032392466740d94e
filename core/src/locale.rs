use std::collections::HashMap;

use chrono::NaiveDate;

/// Parsing, formatting and translation collaborator injected into rendering.
///
/// SQL fragment rendering is locale-independent except for date literals,
/// which use the short date format configured here. The defaults mirror an
/// en-US style locale.
#[derive(Debug, Clone)]
pub struct Locale {
    /// strftime-style short date format used for date literals.
    pub date_format: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
    /// Display-string overrides for table names, operator labels and the
    /// like. Untranslated keys fall back to themselves.
    pub translations: HashMap<String, String>,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            date_format: "%m/%d/%Y".to_string(),
            decimal_separator: '.',
            grouping_separator: ',',
            translations: HashMap::new(),
        }
    }
}

impl Locale {
    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.translations.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }

    /// Parse a date string, trying the locale format first and then a few
    /// common interchange forms.
    pub fn parse_date(&self, string: &str) -> Option<NaiveDate> {
        let string = string.trim();
        for format in [
            self.date_format.as_str(),
            "%m/%d/%Y",
            "%m-%d-%Y",
            "%Y-%m-%d",
        ] {
            if let Ok(date) = NaiveDate::parse_from_str(string, format) {
                return Some(date);
            }
        }
        None
    }

    /// Parse a number string honoring the locale's grouping and decimal
    /// separators.
    pub fn parse_number(&self, string: &str) -> Option<f64> {
        let cleaned: String = string
            .trim()
            .chars()
            .filter(|c| *c != self.grouping_separator)
            .map(|c| if c == self.decimal_separator { '.' } else { c })
            .collect();
        if cleaned.is_empty() {
            return None;
        }
        cleaned.parse().ok()
    }

    /// Boolean word scan: after optional whitespace and sign, an affirmative
    /// prefix (`y`/`t`, any case) or a nonzero integer prefix reads as true,
    /// anything else as false.
    pub fn parse_bool(&self, string: &str) -> bool {
        let string = string.trim_start();
        let string = string
            .strip_prefix('+')
            .or_else(|| string.strip_prefix('-'))
            .unwrap_or(string);
        match string.chars().next() {
            Some('y') | Some('Y') | Some('t') | Some('T') => true,
            Some(c) if c.is_ascii_digit() => string
                .chars()
                .take_while(char::is_ascii_digit)
                .any(|c| c != '0'),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        let locale = Locale::default();
        assert_eq!(locale.parse_number("7"), Some(7.0));
        assert_eq!(locale.parse_number(" 1,234.5 "), Some(1234.5));
        assert_eq!(locale.parse_number("-2.25"), Some(-2.25));
        assert_eq!(locale.parse_number("seven"), None);
        assert_eq!(locale.parse_number(""), None);

        let european = Locale {
            decimal_separator: ',',
            grouping_separator: '.',
            ..Locale::default()
        };
        assert_eq!(european.parse_number("1.234,5"), Some(1234.5));
    }

    #[test]
    fn test_parse_bool() {
        let locale = Locale::default();
        for truthy in ["y", "YES", "true", "T", "1", "12", "  +9"] {
            assert!(locale.parse_bool(truthy), "{truthy:?} should parse true");
        }
        for falsy in ["", "no", "FALSE", "0", "00", "-0", "maybe"] {
            assert!(!locale.parse_bool(falsy), "{falsy:?} should parse false");
        }
    }

    #[test]
    fn test_date_round_trip() {
        let locale = Locale::default();
        let date = locale.parse_date("08/05/1959").unwrap();
        assert_eq!(locale.format_date(date), "08/05/1959");
        assert_eq!(locale.parse_date("1959-08-05"), Some(date));
        assert_eq!(locale.parse_date("yesterday"), None);
    }

    #[test]
    fn test_translate_falls_back_to_key() {
        let mut locale = Locale::default();
        locale
            .translations
            .insert("Artists".to_string(), "Artistes".to_string());
        assert_eq!(locale.translate("Artists"), "Artistes");
        assert_eq!(locale.translate("Albums"), "Albums");
    }
}
