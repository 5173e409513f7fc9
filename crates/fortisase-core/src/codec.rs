// ── Expand / flatten codec ──
//
// Bridges typed resource models and the untyped JSON objects the
// resource API speaks. `Body` builds request maps ("expand"), `Fields`
// reads response maps ("flatten"). Every read is typed and reports the
// attribute path on mismatch instead of degrading to empty values.

use std::collections::BTreeMap;

use fortisase_api::JsonMap;
use serde_json::{Number, Value};
use thiserror::Error;

use crate::reference::Reference;

// ── Errors ─────────────────────────────────────────────────────────

/// A response value did not have the shape the model expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: expected {expected}, found {found}")]
pub struct DecodeError {
    /// Path of the offending value in the response, e.g.
    /// `backup_links[1].ipsec_remote_gw`.
    pub path: String,
    pub expected: &'static str,
    pub found: &'static str,
}

// ── Traits ─────────────────────────────────────────────────────────

/// Serialize a nested typed value into its API object.
pub trait Expand {
    fn expand(&self) -> JsonMap;
}

/// Deserialize a nested API object into its typed value.
pub trait Flatten: Sized {
    fn flatten(fields: &Fields<'_>) -> Result<Self, DecodeError>;
}

// ── Flatten ────────────────────────────────────────────────────────

/// Typed reader over one JSON object.
///
/// Absent keys and explicit `null` both read as `None`.
pub struct Fields<'a> {
    map: &'a JsonMap,
    path: String,
}

impl<'a> Fields<'a> {
    pub fn new(map: &'a JsonMap, path: impl Into<String>) -> Self {
        Self {
            map,
            path: path.into(),
        }
    }

    /// Reader for a top-level response (empty path prefix).
    pub fn root(map: &'a JsonMap) -> Self {
        Self::new(map, String::new())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn string(&self, key: &str) -> Result<Option<String>, DecodeError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => scalar_string(value)
                .map(Some)
                .ok_or_else(|| self.mismatch(key, "a string", value)),
        }
    }

    /// Numbers arrive either as JSON numbers or as numeric strings.
    pub fn number(&self, key: &str) -> Result<Option<f64>, DecodeError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => scalar_number(value)
                .map(Some)
                .ok_or_else(|| self.mismatch(key, "a number", value)),
        }
    }

    pub fn boolean(&self, key: &str) -> Result<Option<bool>, DecodeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) if s == "true" => Ok(Some(true)),
            Some(Value::String(s)) if s == "false" => Ok(Some(false)),
            Some(value) => Err(self.mismatch(key, "a boolean", value)),
        }
    }

    pub fn strings(&self, key: &str) -> Result<Option<Vec<String>>, DecodeError> {
        let Some(items) = self.array(key)? else {
            return Ok(None);
        };
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                scalar_string(item).ok_or_else(|| DecodeError {
                    path: format!("{}[{idx}]", self.child_path(key)),
                    expected: "a string",
                    found: kind_of(item),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    pub fn object<T: Flatten>(&self, key: &str) -> Result<Option<T>, DecodeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(inner)) => {
                T::flatten(&Fields::new(inner, self.child_path(key))).map(Some)
            }
            Some(value) => Err(self.mismatch(key, "an object", value)),
        }
    }

    pub fn list<T: Flatten>(&self, key: &str) -> Result<Option<Vec<T>>, DecodeError> {
        let Some(items) = self.array(key)? else {
            return Ok(None);
        };
        let base = self.child_path(key);
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(inner) => T::flatten(&Fields::new(inner, format!("{base}[{idx}]"))),
                other => Err(DecodeError {
                    path: format!("{base}[{idx}]"),
                    expected: "an object",
                    found: kind_of(other),
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Object with arbitrary keys and numeric values.
    pub fn number_map(&self, key: &str) -> Result<Option<BTreeMap<String, f64>>, DecodeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(inner)) => {
                let base = self.child_path(key);
                inner
                    .iter()
                    .map(|(k, v)| {
                        scalar_number(v)
                            .map(|n| (k.clone(), n))
                            .ok_or_else(|| DecodeError {
                                path: format!("{base}.{k}"),
                                expected: "a number",
                                found: kind_of(v),
                            })
                    })
                    .collect::<Result<BTreeMap<_, _>, _>>()
                    .map(Some)
            }
            Some(value) => Err(self.mismatch(key, "an object", value)),
        }
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn array(&self, key: &str) -> Result<Option<&'a Vec<Value>>, DecodeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(value) => Err(self.mismatch(key, "a list", value)),
        }
    }

    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_owned()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    fn mismatch(&self, key: &str, expected: &'static str, found: &Value) -> DecodeError {
        DecodeError {
            path: self.child_path(key),
            expected,
            found: kind_of(found),
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

// ── Expand ─────────────────────────────────────────────────────────

/// Request body builder. Every `put_*` skips `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body(JsonMap);

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_str(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            self.0.insert(key.to_owned(), Value::String(v.to_owned()));
        }
        self
    }

    pub fn put_number(&mut self, key: &str, value: Option<f64>) -> &mut Self {
        if let Some(v) = value.and_then(number_value) {
            self.0.insert(key.to_owned(), v);
        }
        self
    }

    pub fn put_bool(&mut self, key: &str, value: Option<bool>) -> &mut Self {
        if let Some(v) = value {
            self.0.insert(key.to_owned(), Value::Bool(v));
        }
        self
    }

    pub fn put_strings(&mut self, key: &str, value: Option<&[String]>) -> &mut Self {
        if let Some(items) = value {
            let items = items.iter().cloned().map(Value::String).collect();
            self.0.insert(key.to_owned(), Value::Array(items));
        }
        self
    }

    pub fn put_object<T: Expand>(&mut self, key: &str, value: Option<&T>) -> &mut Self {
        if let Some(v) = value {
            self.0.insert(key.to_owned(), Value::Object(v.expand()));
        }
        self
    }

    pub fn put_list<T: Expand>(&mut self, key: &str, value: Option<&[T]>) -> &mut Self {
        if let Some(items) = value {
            let items = items.iter().map(|i| Value::Object(i.expand())).collect();
            self.0.insert(key.to_owned(), Value::Array(items));
        }
        self
    }

    /// Datasource references, always sent as `[{primaryKey, datasource}]`.
    pub fn put_refs(&mut self, key: &str, value: Option<&[Reference]>) -> &mut Self {
        self.put_list(key, value)
    }

    pub fn put_number_map(&mut self, key: &str, value: Option<&BTreeMap<String, f64>>) -> &mut Self {
        if let Some(entries) = value {
            let map = entries
                .iter()
                .filter_map(|(k, v)| number_value(*v).map(|n| (k.clone(), n)))
                .collect();
            self.0.insert(key.to_owned(), Value::Object(map));
        }
        self
    }

    pub fn put_value(&mut self, key: &str, value: Value) -> &mut Self {
        self.0.insert(key.to_owned(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> JsonMap {
        self.0
    }
}

/// The API rejects `389.0` where it expects a port, so integral values
/// are written as JSON integers. Non-finite values are dropped.
#[allow(
    clippy::cast_possible_truncation,
    clippy::as_conversions,
    clippy::float_cmp
)]
fn number_value(v: f64) -> Option<Value> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    if !v.is_finite() {
        return None;
    }
    if v.fract() == 0.0 && v.abs() <= MAX_EXACT {
        Some(Value::from(v as i64))
    } else {
        Number::from_f64(v).map(Value::Number)
    }
}

/// Value to send on update for fields the API should only receive when
/// they changed: `None` when the plan matches prior state.
pub fn resend<'a, T: PartialEq>(current: &'a Option<T>, prior: Option<&Option<T>>) -> Option<&'a T> {
    match prior {
        Some(previous) if previous == current => None,
        _ => current.as_ref(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> JsonMap {
        match value {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[derive(Debug, PartialEq)]
    struct Link {
        gateway: Option<String>,
        priority: Option<f64>,
    }

    impl Flatten for Link {
        fn flatten(fields: &Fields<'_>) -> Result<Self, DecodeError> {
            Ok(Self {
                gateway: fields.string("gateway")?,
                priority: fields.number("priority")?,
            })
        }
    }

    impl Expand for Link {
        fn expand(&self) -> JsonMap {
            let mut body = Body::new();
            body.put_str("gateway", self.gateway.as_deref())
                .put_number("priority", self.priority);
            body.into_map()
        }
    }

    #[test]
    fn absent_and_null_read_as_none() {
        let data = map(json!({ "a": null }));
        let fields = Fields::root(&data);
        assert_eq!(fields.string("a").unwrap(), None);
        assert_eq!(fields.string("b").unwrap(), None);
        assert!(!fields.contains("a"));
    }

    #[test]
    fn numbers_accept_numeric_strings() {
        let data = map(json!({ "port": "389", "timeout": 5 }));
        let fields = Fields::root(&data);
        assert_eq!(fields.number("port").unwrap(), Some(389.0));
        assert_eq!(fields.number("timeout").unwrap(), Some(5.0));
    }

    #[test]
    fn mismatch_reports_nested_path() {
        let data = map(json!({ "links": [ { "gateway": "a" }, { "gateway": ["x"] } ] }));
        let err = Fields::root(&data).list::<Link>("links").unwrap_err();
        assert_eq!(err.path, "links[1].gateway");
        assert_eq!(err.expected, "a string");
        assert_eq!(err.found, "a list");
    }

    #[test]
    fn list_of_non_objects_is_an_error() {
        let data = map(json!({ "links": "oops" }));
        let err = Fields::root(&data).list::<Link>("links").unwrap_err();
        assert_eq!(err.path, "links");
        assert_eq!(err.expected, "a list");
    }

    #[test]
    fn body_skips_none_and_writes_integers() {
        let mut body = Body::new();
        body.put_str("name", Some("x"))
            .put_str("comment", None)
            .put_number("port", Some(636.0))
            .put_number("weight", Some(0.5))
            .put_number("bad", Some(f64::NAN));
        assert_eq!(
            Value::Object(body.into_map()),
            json!({ "name": "x", "port": 636, "weight": 0.5 })
        );
    }

    #[test]
    fn nested_round_trip() {
        let links = vec![Link {
            gateway: Some("203.0.113.1".into()),
            priority: Some(1.0),
        }];
        let mut body = Body::new();
        body.put_list("links", Some(&links));
        let data = body.into_map();
        let back = Fields::root(&data).list::<Link>("links").unwrap();
        assert_eq!(back, Some(links));
    }

    #[test]
    fn number_map_reads_dynamic_keys() {
        let data = map(json!({ "cost": { "us-east-1": 10, "eu-west-2": "20" } }));
        let cost = Fields::root(&data).number_map("cost").unwrap().unwrap();
        assert_eq!(cost.get("us-east-1"), Some(&10.0));
        assert_eq!(cost.get("eu-west-2"), Some(&20.0));
    }

    #[test]
    fn resend_only_on_change() {
        let current = Some("new".to_owned());
        assert_eq!(resend(&current, None), Some(&"new".to_owned()));
        assert_eq!(resend(&current, Some(&Some("new".to_owned()))), None);
        assert_eq!(
            resend(&current, Some(&Some("old".to_owned()))),
            Some(&"new".to_owned())
        );
    }
}
