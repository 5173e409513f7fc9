// ── Resource schemas ──
//
// Static description of a resource's attributes: type, mode, validators
// and plan modifiers. Schemas drive configuration validation before any
// model is deserialized, and decide when a change forces replacement.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::codec::kind_of;
use crate::diag::Diagnostics;

// ── Building blocks ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum AttrKind {
    String,
    Number,
    Bool,
    List(Box<AttrKind>),
    Map(Box<AttrKind>),
    Object(Schema),
    ListObject(Schema),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttrMode {
    Required,
    Optional,
    Computed,
    OptionalComputed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    /// String length in characters, inclusive.
    LengthBetween(usize, usize),
    /// Numeric range, inclusive.
    Between(f64, f64),
    OneOf(Vec<&'static str>),
    /// List length, inclusive.
    SizeBetween(usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanModifier {
    RequiresReplace,
    UseStateForUnknown,
}

// ── Attribute ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub kind: AttrKind,
    pub mode: AttrMode,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plan_modifiers: Vec<PlanModifier>,
}

impl Attribute {
    fn of(kind: AttrKind) -> Self {
        Self {
            kind,
            mode: AttrMode::Optional,
            sensitive: false,
            description: "",
            validators: Vec::new(),
            plan_modifiers: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::of(AttrKind::String)
    }

    pub fn number() -> Self {
        Self::of(AttrKind::Number)
    }

    pub fn boolean() -> Self {
        Self::of(AttrKind::Bool)
    }

    pub fn strings() -> Self {
        Self::of(AttrKind::List(Box::new(AttrKind::String)))
    }

    pub fn map_of(kind: AttrKind) -> Self {
        Self::of(AttrKind::Map(Box::new(kind)))
    }

    pub fn object(schema: Schema) -> Self {
        Self::of(AttrKind::Object(schema))
    }

    pub fn list_of(schema: Schema) -> Self {
        Self::of(AttrKind::ListObject(schema))
    }

    // ── Modes ────────────────────────────────────────────────────────

    #[must_use]
    pub fn required(mut self) -> Self {
        self.mode = AttrMode::Required;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.mode = AttrMode::Optional;
        self
    }

    #[must_use]
    pub fn computed(mut self) -> Self {
        self.mode = AttrMode::Computed;
        self
    }

    #[must_use]
    pub fn optional_computed(mut self) -> Self {
        self.mode = AttrMode::OptionalComputed;
        self
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    #[must_use]
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    // ── Validators ───────────────────────────────────────────────────

    #[must_use]
    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.validators.push(Validator::LengthBetween(min, max));
        self
    }

    #[must_use]
    pub fn between(mut self, min: f64, max: f64) -> Self {
        self.validators.push(Validator::Between(min, max));
        self
    }

    #[must_use]
    pub fn one_of(mut self, allowed: impl IntoIterator<Item = &'static str>) -> Self {
        self.validators
            .push(Validator::OneOf(allowed.into_iter().collect()));
        self
    }

    #[must_use]
    pub fn size(mut self, min: usize, max: usize) -> Self {
        self.validators.push(Validator::SizeBetween(min, max));
        self
    }

    // ── Plan modifiers ───────────────────────────────────────────────

    #[must_use]
    pub fn requires_replace(mut self) -> Self {
        self.plan_modifiers.push(PlanModifier::RequiresReplace);
        self
    }

    #[must_use]
    pub fn use_state_for_unknown(mut self) -> Self {
        self.plan_modifiers.push(PlanModifier::UseStateForUnknown);
        self
    }

    pub fn has_modifier(&self, modifier: PlanModifier) -> bool {
        self.plan_modifiers.contains(&modifier)
    }

    /// Set by the user (as opposed to purely computed).
    pub fn is_configurable(&self) -> bool {
        self.mode != AttrMode::Computed
    }
}

// ── Schema ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub description: &'static str,
    pub attributes: IndexMap<&'static str, Attribute>,
}

impl Schema {
    pub fn new(description: &'static str) -> Self {
        Self {
            description,
            attributes: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn attr(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    /// Adds the computed `id` attribute every resource carries.
    #[must_use]
    pub fn with_id(self) -> Self {
        self.attr(
            "id",
            Attribute::string()
                .computed()
                .use_state_for_unknown()
                .describe("Identifier of the resource, equal to its primary key."),
        )
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Check a configuration object against the schema.
    pub fn validate(&self, config: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        match config {
            Value::Object(obj) => self.validate_object(obj, "", &mut diags),
            other => diags.error(
                "Invalid configuration",
                format!("expected an object, found {}", kind_of(other)),
            ),
        }
        diags
    }

    /// Top-level and nested-object attributes whose planned value differs
    /// from the prior one and that carry `RequiresReplace`.
    pub fn replace_paths(&self, prior: &Value, planned: &Value) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_replace_paths(prior, planned, "", &mut paths);
        paths
    }

    /// Replace sensitive values with a placeholder, for display.
    pub fn redact(&self, state: &mut Value) {
        let Value::Object(obj) = state else { return };
        for (name, attr) in &self.attributes {
            let Some(value) = obj.get_mut(*name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            if attr.sensitive {
                *value = Value::String("(sensitive)".into());
                continue;
            }
            match &attr.kind {
                AttrKind::Object(inner) => inner.redact(value),
                AttrKind::ListObject(inner) => {
                    if let Value::Array(items) = value {
                        items.iter_mut().for_each(|item| inner.redact(item));
                    }
                }
                _ => {}
            }
        }
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn validate_object(
        &self,
        obj: &serde_json::Map<String, Value>,
        prefix: &str,
        diags: &mut Diagnostics,
    ) {
        for key in obj.keys() {
            if !self.attributes.contains_key(key.as_str()) {
                diags.error_at(
                    join(prefix, key),
                    "Unsupported attribute",
                    format!("An attribute named \"{key}\" is not expected here."),
                );
            }
        }

        for (name, attr) in &self.attributes {
            let path = join(prefix, name);
            let value = obj.get(*name).filter(|v| !v.is_null());
            match (value, attr.mode) {
                (None, AttrMode::Required) => diags.error_at(
                    path,
                    "Missing required attribute",
                    format!("The attribute \"{name}\" is required, but no definition was found."),
                ),
                (None, _) => {}
                (Some(_), AttrMode::Computed) => diags.error_at(
                    path,
                    "Invalid configuration",
                    format!("\"{name}\" is computed by the API and cannot be set."),
                ),
                (Some(v), _) => validate_value(&attr.kind, &attr.validators, v, &path, diags),
            }
        }
    }

    fn collect_replace_paths(
        &self,
        prior: &Value,
        planned: &Value,
        prefix: &str,
        out: &mut Vec<String>,
    ) {
        for (name, attr) in &self.attributes {
            if !attr.is_configurable() {
                continue;
            }
            let before = prior.get(*name).unwrap_or(&Value::Null);
            let after = planned.get(*name).unwrap_or(&Value::Null);
            if attr.has_modifier(PlanModifier::RequiresReplace) {
                // An unset optional+computed value keeps whatever the API chose.
                let unset = after.is_null() && attr.mode == AttrMode::OptionalComputed;
                if !unset && !values_equal(before, after) {
                    out.push(join(prefix, name));
                }
            } else if let AttrKind::Object(inner) = &attr.kind {
                inner.collect_replace_paths(before, after, &join(prefix, name), out);
            }
        }
    }
}

fn validate_value(
    kind: &AttrKind,
    validators: &[Validator],
    value: &Value,
    path: &str,
    diags: &mut Diagnostics,
) {
    let mismatch = |diags: &mut Diagnostics, expected: &str| {
        diags.error_at(
            path,
            "Incorrect attribute value type",
            format!("expected {expected}, found {}", kind_of(value)),
        );
    };

    match kind {
        AttrKind::String => match value.as_str() {
            Some(s) => check_string(s, validators, path, diags),
            None => mismatch(diags, "a string"),
        },
        AttrKind::Number => match value.as_f64() {
            Some(n) => check_number(n, validators, path, diags),
            None => mismatch(diags, "a number"),
        },
        AttrKind::Bool => {
            if !value.is_boolean() {
                mismatch(diags, "a boolean");
            }
        }
        AttrKind::List(inner) => match value.as_array() {
            Some(items) => {
                check_size(items.len(), validators, path, diags);
                for (idx, item) in items.iter().enumerate() {
                    validate_value(inner, validators, item, &format!("{path}[{idx}]"), diags);
                }
            }
            None => mismatch(diags, "a list"),
        },
        AttrKind::Map(inner) => match value.as_object() {
            Some(entries) => {
                for (key, item) in entries {
                    validate_value(inner, validators, item, &format!("{path}.{key}"), diags);
                }
            }
            None => mismatch(diags, "a map"),
        },
        AttrKind::Object(schema) => match value.as_object() {
            Some(obj) => schema.validate_object(obj, path, diags),
            None => mismatch(diags, "an object"),
        },
        AttrKind::ListObject(schema) => match value.as_array() {
            Some(items) => {
                check_size(items.len(), validators, path, diags);
                for (idx, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{idx}]");
                    match item.as_object() {
                        Some(obj) => schema.validate_object(obj, &item_path, diags),
                        None => diags.error_at(
                            item_path,
                            "Incorrect attribute value type",
                            format!("expected an object, found {}", kind_of(item)),
                        ),
                    }
                }
            }
            None => mismatch(diags, "a list"),
        },
    }
}

fn check_string(s: &str, validators: &[Validator], path: &str, diags: &mut Diagnostics) {
    for validator in validators {
        match validator {
            Validator::LengthBetween(min, max) => {
                let len = s.chars().count();
                if len < *min || len > *max {
                    diags.error_at(
                        path,
                        "Invalid attribute value length",
                        format!("length must be between {min} and {max}, got {len}"),
                    );
                }
            }
            Validator::OneOf(allowed) => {
                if !allowed.contains(&s) {
                    diags.error_at(
                        path,
                        "Invalid attribute value",
                        format!("value must be one of: {}, got \"{s}\"", allowed.join(", ")),
                    );
                }
            }
            Validator::Between(..) | Validator::SizeBetween(..) => {}
        }
    }
}

fn check_number(n: f64, validators: &[Validator], path: &str, diags: &mut Diagnostics) {
    for validator in validators {
        if let Validator::Between(min, max) = validator {
            if n < *min || n > *max {
                diags.error_at(
                    path,
                    "Invalid attribute value",
                    format!("value must be between {min} and {max}, got {n}"),
                );
            }
        }
    }
}

fn check_size(len: usize, validators: &[Validator], path: &str, diags: &mut Diagnostics) {
    for validator in validators {
        if let Validator::SizeBetween(min, max) = validator {
            if len < *min || len > *max {
                diags.error_at(
                    path,
                    "Invalid attribute value",
                    format!("list must contain between {min} and {max} elements, got {len}"),
                );
            }
        }
    }
}

/// JSON equality with numbers compared by value (`389` equals `389.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            let present = |m: &serde_json::Map<String, Value>| {
                m.iter().filter(|(_, v)| !v.is_null()).count()
            };
            present(xs) == present(ys)
                && xs
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn server_schema() -> Schema {
        Schema::new("test")
            .with_id()
            .attr("name", Attribute::string().required().length(1, 35))
            .attr("port", Attribute::number().optional().between(1.0, 65535.0))
            .attr(
                "mode",
                Attribute::string().optional().one_of(["simple", "regular"]),
            )
            .attr("tags", Attribute::strings().optional().size(0, 2))
            .attr(
                "links",
                Attribute::list_of(
                    Schema::new("link").attr("gateway", Attribute::string().required()),
                ),
            )
            .attr(
                "file_content",
                Attribute::string().optional().sensitive().requires_replace(),
            )
    }

    fn attributes(diags: &Diagnostics) -> Vec<String> {
        diags.iter().filter_map(|d| d.attribute.clone()).collect()
    }

    #[test]
    fn valid_config_has_no_diagnostics() {
        let diags = server_schema().validate(&json!({
            "name": "corp",
            "port": 389,
            "mode": "simple",
            "tags": ["a"],
            "links": [{ "gateway": "10.0.0.1" }],
        }));
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn missing_required_is_reported() {
        let diags = server_schema().validate(&json!({ "port": 389 }));
        assert_eq!(attributes(&diags), vec!["name"]);
    }

    #[test]
    fn unknown_attribute_is_reported() {
        let diags = server_schema().validate(&json!({ "name": "a", "colour": "red" }));
        assert_eq!(attributes(&diags), vec!["colour"]);
    }

    #[test]
    fn computed_attribute_cannot_be_set() {
        let diags = server_schema().validate(&json!({ "name": "a", "id": "x" }));
        assert_eq!(attributes(&diags), vec!["id"]);
    }

    #[test]
    fn validators_fire() {
        let diags = server_schema().validate(&json!({
            "name": "",
            "port": 70000,
            "mode": "fancy",
            "tags": ["a", "b", "c"],
        }));
        assert_eq!(attributes(&diags), vec!["name", "port", "mode", "tags"]);
    }

    #[test]
    fn nested_paths_are_indexed() {
        let diags = server_schema().validate(&json!({
            "name": "a",
            "links": [{ "gateway": "x" }, { "gateway": 5 }],
        }));
        assert_eq!(attributes(&diags), vec!["links[1].gateway"]);
    }

    #[test]
    fn wrong_type_is_reported() {
        let diags = server_schema().validate(&json!({ "name": ["a"] }));
        assert_eq!(diags.len(), 1);
        assert!(diags.iter().all(|d| d.summary == "Incorrect attribute value type"));
    }

    #[test]
    fn replace_paths_only_for_marked_attributes() {
        let schema = server_schema();
        let prior = json!({ "name": "a", "file_content": "old" });
        let planned = json!({ "name": "b", "file_content": "new" });
        assert_eq!(schema.replace_paths(&prior, &planned), vec!["file_content"]);
        assert!(schema.replace_paths(&prior, &prior).is_empty());
    }

    #[test]
    fn redact_hides_sensitive_values() {
        let mut state = json!({ "name": "a", "file_content": "secret" });
        server_schema().redact(&mut state);
        assert_eq!(state["file_content"], json!("(sensitive)"));
        assert_eq!(state["name"], json!("a"));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(values_equal(&json!(389), &json!(389.0)));
        assert!(values_equal(&json!({ "a": 1, "b": null }), &json!({ "a": 1.0 })));
        assert!(!values_equal(&json!([1]), &json!([2])));
    }
}
