//! Tool parameter extraction.
//!
//! Parameters arrive as JSON bodies, form bodies or query strings, so every
//! scalar may be string-encoded. `ToolArgs` accepts both encodings and turns
//! absent or malformed values into explicit [`ToolError`]s.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::error::{ToolError, ToolResult};

/// Loosely typed tool parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a JSON object; `null` counts as no parameters.
    pub fn from_value(value: Value) -> ToolResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(ToolError::invalid(format!(
                "parameters must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build from string pairs, e.g. a decoded query string.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Overlay `other` on top of these parameters.
    pub fn merge(&mut self, other: ToolArgs) {
        self.0.extend(other.0);
    }

    /// Move `from` to `to` unless `to` is already set.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(value) = self.0.remove(from) {
            self.0.entry(to.to_string()).or_insert(value);
        }
    }

    /// Keep only the listed keys.
    pub fn select(&self, keys: &[&str]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Raw value; JSON `null` is treated as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn required_id(&self, key: &str) -> ToolResult<u64> {
        self.optional_id(key)?.ok_or_else(|| ToolError::missing(key))
    }

    /// Entity identifiers must be positive integers.
    pub fn optional_id(&self, key: &str) -> ToolResult<Option<u64>> {
        self.get(key).map(|value| parse_id(key, value)).transpose()
    }

    /// A list of identifiers: JSON array, comma separated string or a single id.
    pub fn optional_id_list(&self, key: &str) -> ToolResult<Option<Vec<u64>>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let ids = match value {
            Value::Array(items) => items
                .iter()
                .map(|item| parse_id(key, item))
                .collect::<ToolResult<Vec<_>>>()?,
            Value::String(s) => s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| parse_id(key, &Value::String(part.to_string())))
                .collect::<ToolResult<Vec<_>>>()?,
            other => vec![parse_id(key, other)?],
        };
        Ok(Some(ids))
    }

    pub fn required_str(&self, key: &str) -> ToolResult<String> {
        match self.optional_str(key)? {
            Some(s) if !s.trim().is_empty() => Ok(s),
            _ => Err(ToolError::missing(key)),
        }
    }

    pub fn optional_str(&self, key: &str) -> ToolResult<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(ToolError::invalid(format!(
                "{key} must be a string, got {}",
                json_kind(other)
            ))),
        }
    }

    pub fn optional_bool(&self, key: &str) -> ToolResult<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(ToolError::invalid(format!("{key} must be a boolean, got '{s}'"))),
            },
            Some(Value::Number(n)) => match n.as_u64() {
                Some(1) => Ok(Some(true)),
                Some(0) => Ok(Some(false)),
                _ => Err(ToolError::invalid(format!("{key} must be a boolean, got {n}"))),
            },
            Some(other) => Err(ToolError::invalid(format!(
                "{key} must be a boolean, got {}",
                json_kind(other)
            ))),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> ToolResult<bool> {
        Ok(self.optional_bool(key)?.unwrap_or(default))
    }

    pub fn optional_u64(&self, key: &str) -> ToolResult<Option<u64>> {
        self.get(key)
            .map(|value| {
                as_u64(value).ok_or_else(|| {
                    ToolError::invalid(format!("{key} must be a non-negative integer"))
                })
            })
            .transpose()
    }

    pub fn required_f64(&self, key: &str) -> ToolResult<f64> {
        self.optional_f64(key)?.ok_or_else(|| ToolError::missing(key))
    }

    pub fn optional_f64(&self, key: &str) -> ToolResult<Option<f64>> {
        self.get(key)
            .map(|value| {
                let number = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                number
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| ToolError::invalid(format!("{key} must be a number")))
            })
            .transpose()
    }

    pub fn required_date(&self, key: &str) -> ToolResult<String> {
        self.optional_date(key)?.ok_or_else(|| ToolError::missing(key))
    }

    /// ISO dates (`YYYY-MM-DD`), returned normalized.
    pub fn optional_date(&self, key: &str) -> ToolResult<Option<String>> {
        self.optional_str(key)?
            .map(|raw| {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .map_err(|_| ToolError::invalid(format!("{key} must be a date (YYYY-MM-DD), got '{raw}'")))
            })
            .transpose()
    }
}

impl From<Map<String, Value>> for ToolArgs {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_id(key: &str, value: &Value) -> ToolResult<u64> {
    as_u64(value)
        .filter(|id| *id > 0)
        .ok_or_else(|| ToolError::invalid(format!("{key} must be a positive integer")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> ToolArgs {
        ToolArgs::from_value(value).unwrap()
    }

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let a = args(json!({"project_id": 5, "user_id": "7"}));
        assert_eq!(a.required_id("project_id"), Ok(5));
        assert_eq!(a.optional_id("user_id"), Ok(Some(7)));
        assert_eq!(a.optional_id("absent"), Ok(None));
    }

    #[test]
    fn test_ids_must_be_positive() {
        for bad in [json!(0), json!(-3), json!("abc"), json!(1.5), json!("")] {
            let a = args(json!({ "project_id": bad }));
            assert!(
                matches!(a.required_id("project_id"), Err(ToolError::InvalidParameter(_))),
                "{a:?}"
            );
        }
    }

    #[test]
    fn test_missing_and_null_are_absent() {
        let a = args(json!({"project_id": null}));
        assert_eq!(a.required_id("project_id"), Err(ToolError::missing("project_id")));
        assert_eq!(a.required_str("name"), Err(ToolError::missing("name")));
    }

    #[test]
    fn test_blank_required_string_is_missing() {
        let a = args(json!({"name": "   "}));
        assert_eq!(a.required_str("name"), Err(ToolError::missing("name")));
    }

    #[test]
    fn test_bools() {
        let a = ToolArgs::from_pairs([("a", "true"), ("b", "0"), ("c", "maybe")]);
        assert_eq!(a.optional_bool("a"), Ok(Some(true)));
        assert_eq!(a.optional_bool("b"), Ok(Some(false)));
        assert!(a.optional_bool("c").is_err());
        assert_eq!(a.bool_or("d", true), Ok(true));
    }

    #[test]
    fn test_id_lists() {
        assert_eq!(args(json!({"r": [3, "4"]})).optional_id_list("r"), Ok(Some(vec![3, 4])));
        assert_eq!(args(json!({"r": "3, 4"})).optional_id_list("r"), Ok(Some(vec![3, 4])));
        assert_eq!(args(json!({"r": 9})).optional_id_list("r"), Ok(Some(vec![9])));
        assert!(args(json!({"r": [0]})).optional_id_list("r").is_err());
    }

    #[test]
    fn test_numbers_and_dates() {
        let a = args(json!({"hours": "2.5", "lag": 3, "spent_on": "2024-02-29", "bad": "2023-02-30"}));
        assert_eq!(a.required_f64("hours"), Ok(2.5));
        assert_eq!(a.optional_u64("lag"), Ok(Some(3)));
        assert_eq!(a.required_date("spent_on"), Ok("2024-02-29".to_string()));
        assert!(a.optional_date("bad").is_err());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(ToolArgs::from_value(json!([1, 2])).is_err());
        assert!(ToolArgs::from_value(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_merge_rename_select() {
        let mut a = ToolArgs::from_pairs([("active", "false"), ("x", "1")]);
        a.merge(ToolArgs::new().with("x", 2));
        a.rename("active", "active_only");
        assert_eq!(a.optional_bool("active_only"), Ok(Some(false)));
        assert_eq!(a.optional_u64("x"), Ok(Some(2)));

        let selected = a.select(&["x"]);
        assert!(selected.contains("x"));
        assert!(!selected.contains("active_only"));
    }
}
