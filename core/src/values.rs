use std::hash::{Hash, Hasher};

use chrono::NaiveDate;

use crate::locale::Locale;
use crate::schema::FieldType;

/// A scalar value attached to a WHERE expression or a field's preset list.
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Str(s) => {
                state.write_u8(0);
                s.hash(state);
            }
            Value::Number(n) => {
                state.write_u8(1);
                // Normalize -0.0 so that equal numbers hash equally.
                let canonical = if *n == 0.0 { 0.0 } else { *n };
                state.write_u64(canonical.to_bits());
            }
            Value::Bool(b) => {
                state.write_u8(2);
                b.hash(state);
            }
            Value::Date(d) => {
                state.write_u8(3);
                d.hash(state);
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

// Coercion helpers. Native values pass through, strings are parsed through
// the locale, everything else yields None — coercion fails silently, never
// panics.

pub fn string_value(value: &Value) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.clone()),
        Value::Number(n) => Some(number_string(*n)),
        Value::Bool(b) => Some(String::from(if *b { "1" } else { "0" })),
        Value::Date(_) => None,
    }
}

pub fn bool_value(value: &Value, locale: &Locale) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Str(s) => Some(locale.parse_bool(s)),
        Value::Number(n) => Some(*n != 0.0),
        Value::Date(_) => None,
    }
}

pub fn number_value(value: &Value, locale: &Locale) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Str(s) => locale.parse_number(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Date(_) => None,
    }
}

pub fn date_value(value: &Value, locale: &Locale) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Str(s) => locale.parse_date(s),
        _ => None,
    }
}

/// Numeric string form: integral values render without a decimal part.
pub fn number_string(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

impl FieldType {
    /// Cast an arbitrary value to the type's natural representation, used by
    /// embedding editors to validate user input against a field.
    pub fn proper_value(&self, value: &Value, locale: &Locale) -> Option<Value> {
        match self {
            FieldType::String => string_value(value).map(Value::Str),
            FieldType::Date | FieldType::Time => date_value(value, locale).map(Value::Date),
            FieldType::Boolean => bool_value(value, locale).map(Value::Bool),
            FieldType::Number => number_value(value, locale).map(Value::Number),
            _ => Some(value.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_values_pass_through() {
        let locale = Locale::default();
        assert_eq!(bool_value(&Value::Bool(true), &locale), Some(true));
        assert_eq!(number_value(&Value::Number(7.5), &locale), Some(7.5));
        let date = NaiveDate::from_ymd_opt(1959, 8, 5).unwrap();
        assert_eq!(date_value(&Value::Date(date), &locale), Some(date));
        assert_eq!(string_value(&Value::Str("x".into())), Some("x".to_string()));
    }

    #[test]
    fn test_strings_parse_through_locale() {
        let locale = Locale::default();
        assert_eq!(bool_value(&Value::from("yes"), &locale), Some(true));
        assert_eq!(number_value(&Value::from("1,234.5"), &locale), Some(1234.5));
        assert_eq!(
            date_value(&Value::from("08/05/1959"), &locale),
            NaiveDate::from_ymd_opt(1959, 8, 5)
        );
    }

    #[test]
    fn test_failed_coercions_yield_none() {
        let locale = Locale::default();
        assert_eq!(number_value(&Value::from("seven"), &locale), None);
        assert_eq!(date_value(&Value::Number(3.0), &locale), None);
        let date = Value::Date(NaiveDate::from_ymd_opt(1959, 8, 5).unwrap());
        assert_eq!(string_value(&date), None);
        assert_eq!(bool_value(&date, &locale), None);
    }

    #[test]
    fn test_number_string_drops_integral_fraction() {
        assert_eq!(number_string(7.0), "7");
        assert_eq!(number_string(-3.0), "-3");
        assert_eq!(number_string(7.5), "7.5");
    }

    #[test]
    fn test_proper_value() {
        let locale = Locale::default();
        assert_eq!(
            FieldType::Number.proper_value(&Value::from("7"), &locale),
            Some(Value::Number(7.0))
        );
        assert_eq!(
            FieldType::Boolean.proper_value(&Value::from("no"), &locale),
            Some(Value::Bool(false))
        );
        assert_eq!(FieldType::Number.proper_value(&Value::from("x"), &locale), None);
        let value = Value::from("anything");
        assert_eq!(FieldType::Undefined.proper_value(&value, &locale), Some(value.clone()));
    }
}
