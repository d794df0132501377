//! Relaxed conversion of property values into field types.
//!
//! Values are deserialized with serde. Environment and in-memory sources only
//! produce strings, so when the direct conversion fails the value is retried
//! in a few alternative shapes before the original error is reported.

use serde::de::DeserializeOwned;
use toml::Value;

pub(crate) fn convert<F: DeserializeOwned>(value: Value) -> Result<F, toml::de::Error> {
    match value.clone().try_into::<F>() {
        Ok(converted) => Ok(converted),
        Err(err) => relaxed_forms(&value)
            .into_iter()
            .find_map(|form| form.try_into::<F>().ok())
            .ok_or(err),
    }
}

/// Alternative shapes of `value`, most specific first.
fn relaxed_forms(value: &Value) -> Vec<Value> {
    match value {
        Value::String(s) => {
            let mut forms = Vec::new();
            let coerced = coerce_value(s);
            if !matches!(coerced, Value::String(_)) {
                forms.push(coerced);
            }
            forms.extend(split_list(s));
            forms
        }
        Value::Array(items) => relaxed_items(items),
        Value::Table(_) => Vec::new(),
        scalar => scalar_to_string(scalar)
            .map(Value::String)
            .into_iter()
            .collect(),
    }
}

/// Element-wise variants of an array: scalars rendered as strings, then strings coerced.
fn relaxed_items(items: &[Value]) -> Vec<Value> {
    let mut forms = Vec::new();

    if items.iter().any(|item| !matches!(item, Value::String(_))) {
        let rendered: Option<Vec<Value>> = items
            .iter()
            .map(|item| scalar_to_string(item).map(Value::String))
            .collect();
        forms.extend(rendered.map(Value::Array));
    }

    if items.iter().any(|item| matches!(item, Value::String(_))) {
        forms.push(Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => coerce_value(s),
                    other => other.clone(),
                })
                .collect(),
        ));
    }

    forms
}

/// Renders a scalar the way it is written in TOML. `None` for arrays and tables.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(render_float(*f)),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(dt) => Some(dt.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}

// f64's Display drops the fraction of whole numbers; keep `1.0` as written.
fn render_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

/// `"a, b"` as a list of strings, then as a list of coerced scalars.
fn split_list(s: &str) -> Vec<Value> {
    if s.trim().is_empty() {
        return vec![Value::Array(Vec::new())];
    }

    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let strings = Value::Array(parts.iter().map(|p| Value::String(p.to_string())).collect());
    let coerced: Vec<Value> = parts.iter().map(|p| coerce_value(p)).collect();

    if coerced.iter().all(|v| matches!(v, Value::String(_))) {
        vec![strings]
    } else {
        vec![strings, Value::Array(coerced)]
    }
}

/// Coerces a string to the most specific scalar: boolean, integer, float, or string.
pub(crate) fn coerce_value(s: &str) -> Value {
    // Try boolean first (case-insensitive)
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }

    // Try integer (only if it looks like an integer: optional minus, then digits)
    if looks_like_integer(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
    }

    // Try float (if contains decimal point)
    if s.contains('.') {
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
    }

    Value::String(s.to_string())
}

fn looks_like_integer(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    fn string(s: &str) -> Value {
        Value::String(s.to_string())
    }

    #[test]
    fn test_numeric_strings_convert() {
        assert_eq!(convert::<u16>(string("8080")).unwrap(), 8080);
        assert_eq!(convert::<i64>(string("-3")).unwrap(), -3);
        assert_eq!(convert::<f64>(string("0.5")).unwrap(), 0.5);
        assert!(convert::<bool>(string("TRUE")).unwrap());
    }

    #[test]
    fn test_scalars_convert_to_strings() {
        assert_eq!(convert::<String>(Value::Integer(42)).unwrap(), "42");
        assert_eq!(convert::<String>(Value::Boolean(false)).unwrap(), "false");
        assert_eq!(convert::<String>(string("007")).unwrap(), "007");
    }

    #[test]
    fn test_comma_separated_lists() {
        assert_eq!(
            convert::<Vec<String>>(string("a, b,c")).unwrap(),
            vec!["a", "b", "c"]
        );
        assert_eq!(convert::<Vec<u32>>(string("1,2, 3")).unwrap(), vec![1, 2, 3]);
        assert_eq!(convert::<Vec<String>>(string("1,2")).unwrap(), vec!["1", "2"]);
        assert_eq!(convert::<Vec<String>>(string("solo")).unwrap(), vec!["solo"]);
        assert!(convert::<Vec<String>>(string("")).unwrap().is_empty());
    }

    #[test]
    fn test_structured_values_use_serde() {
        #[derive(Debug, Deserialize, PartialEq)]
        #[serde(rename_all = "lowercase")]
        enum Mode {
            Fast,
            Safe,
        }

        assert_eq!(convert::<Mode>(string("safe")).unwrap(), Mode::Safe);

        let table: toml::Table = toml::from_str("a = \"1\"\nb = \"2\"").unwrap();
        let map = convert::<BTreeMap<String, String>>(Value::Table(table)).unwrap();
        assert_eq!(map["b"], "2");
        assert_ne!(convert::<Mode>(string("fast")).unwrap(), Mode::Safe);
    }

    #[test]
    fn test_whole_floats_keep_their_fraction() {
        assert_eq!(convert::<String>(Value::Float(1.0)).unwrap(), "1.0");
        assert_eq!(convert::<String>(Value::Float(-2.0)).unwrap(), "-2.0");
        assert_eq!(convert::<String>(Value::Float(0.25)).unwrap(), "0.25");
    }

    #[test]
    fn test_arrays_convert_element_wise() {
        let ints = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(convert::<Vec<String>>(ints).unwrap(), vec!["1", "2"]);

        let mixed = Value::Array(vec![Value::Float(3.0), Value::Boolean(true)]);
        assert_eq!(convert::<Vec<String>>(mixed).unwrap(), vec!["3.0", "true"]);

        let strings = Value::Array(vec![string("8080"), string("9090")]);
        assert_eq!(convert::<Vec<u16>>(strings).unwrap(), vec![8080, 9090]);

        let nested = Value::Array(vec![Value::Array(vec![Value::Integer(1)])]);
        assert!(convert::<Vec<String>>(nested).is_err());
    }

    #[test]
    fn test_unconvertible_reports_original_error() {
        let err = convert::<u16>(string("notanumber")).unwrap_err();
        assert!(err.to_string().contains("notanumber"), "{err}");

        assert!(convert::<u8>(string("300")).is_err());
    }
}
