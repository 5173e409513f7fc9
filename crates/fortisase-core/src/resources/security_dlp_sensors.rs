// ── DLP sensors ──

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};

use crate::codec::{Body, DecodeError, Expand, Fields, Flatten};
use crate::error::CoreError;
use crate::reference::{Datasource, Reference};
use crate::resource::{ApiObject, require_import_id};
use crate::schema::{Attribute, Schema};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DlpSensor {
    pub id: Option<String>,
    pub primary_key: Option<String>,
    pub entries: Option<Vec<SensorEntry>>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEntry {
    pub dictionary: Reference,
    pub severity: Option<String>,
    pub action: Option<String>,
    pub match_count: Option<f64>,
}

impl SensorEntry {
    fn schema() -> Schema {
        Schema::new("Dictionary match and the action it triggers")
            .attr(
                "dictionary",
                Attribute::object(Reference::schema(&[Datasource::SecurityDlpDictionaries]))
                    .required(),
            )
            .attr(
                "severity",
                Attribute::string()
                    .optional_computed()
                    .one_of(["info", "low", "medium", "high", "critical"]),
            )
            .attr(
                "action",
                Attribute::string()
                    .optional_computed()
                    .one_of(["allow", "monitor", "block"]),
            )
            .attr(
                "match_count",
                Attribute::number()
                    .optional_computed()
                    .between(1.0, 255.0)
                    .describe("Dictionary matches needed before the entry fires."),
            )
    }
}

impl Expand for SensorEntry {
    fn expand(&self) -> JsonMap {
        let mut body = Body::new();
        body.put_object("dictionary", Some(&self.dictionary))
            .put_str("severity", self.severity.as_deref())
            .put_str("action", self.action.as_deref())
            .put_number("count", self.match_count);
        body.into_map()
    }
}

impl Flatten for SensorEntry {
    fn flatten(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            dictionary: fields.object("dictionary")?.ok_or_else(|| DecodeError {
                path: format!("{}.dictionary", fields.path()),
                expected: "an object",
                found: "null",
            })?,
            severity: fields.string("severity")?,
            action: fields.string("action")?,
            match_count: fields.number("count")?,
        })
    }
}

pub struct DlpSensors;

impl ApiObject for DlpSensors {
    type Model = DlpSensor;

    const TYPE_NAME: &'static str = "fortisase_security_dlp_sensors";
    const PATH: &'static str = "security/dlp-sensors";

    fn schema() -> Schema {
        Schema::new("Data loss prevention sensor built from DLP dictionaries.")
            .with_id()
            .attr(
                "primary_key",
                Attribute::string().required().length(1, 35).requires_replace(),
            )
            .attr("entries", Attribute::list_of(SensorEntry::schema()).optional().size(0, 32))
            .attr("comment", Attribute::string().optional().length(0, 255))
    }

    fn primary_key(model: &DlpSensor) -> Option<String> {
        model.primary_key.clone()
    }

    fn id(model: &DlpSensor) -> Option<&str> {
        model.id.as_deref()
    }

    fn set_id(model: &mut DlpSensor, id: String) {
        model.id = Some(id);
    }

    fn expand(model: &DlpSensor, _prior: Option<&DlpSensor>) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref())
            .put_list("entries", model.entries.as_deref())
            .put_str("comment", model.comment.as_deref());
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &DlpSensor) -> Result<DlpSensor, DecodeError> {
        let f = Fields::root(data);
        Ok(DlpSensor {
            id: known.id.clone(),
            primary_key: f.string("primaryKey")?.or_else(|| known.primary_key.clone()),
            entries: f.list("entries")?,
            comment: f.string("comment")?,
        })
    }

    fn import(id: &str) -> Result<DlpSensor, CoreError> {
        let key = require_import_id(id)?;
        Ok(DlpSensor {
            id: Some(key.clone()),
            primary_key: Some(key),
            ..DlpSensor::default()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn match_count_travels_as_count() {
        let model = DlpSensor {
            primary_key: Some("pci".into()),
            entries: Some(vec![SensorEntry {
                dictionary: Reference::new("credit-cards", Datasource::SecurityDlpDictionaries),
                severity: Some("high".into()),
                action: Some("block".into()),
                match_count: Some(3.0),
            }]),
            comment: None,
            ..DlpSensor::default()
        };
        let wire = DlpSensors::expand(&model, None);
        assert_eq!(wire["entries"][0]["count"], json!(3));
        assert_eq!(DlpSensors::flatten(&wire, &model).unwrap(), model);
    }
}
