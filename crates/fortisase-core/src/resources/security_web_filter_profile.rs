// ── Web filter profiles ──
//
// One profile per profile group and direction. The profile always exists
// once its group does, so create and delete are an update and a no-op.

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};

use super::{PROFILE_DIRECTIONS, import_directional};
use crate::codec::{Body, DecodeError, Expand, Fields, Flatten};
use crate::error::CoreError;
use crate::lock::PROFILE_GROUP;
use crate::reference::{Datasource, Reference};
use crate::resource::{ApiObject, ObjectKind};
use crate::schema::{Attribute, Schema};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebFilterProfile {
    pub id: Option<String>,
    pub direction: Option<String>,
    pub primary_key: Option<String>,
    pub fortiguard_filters: Option<Vec<CategoryFilter>>,
    pub fortiguard_local_categories: Option<Vec<CategoryFilter>>,
    pub url_filters: Option<Vec<UrlFilter>>,
    pub block_invalid_url: Option<bool>,
    pub enforce_safe_search: Option<bool>,
    pub youtube_restrict: Option<String>,
}

/// Action taken for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub category: Reference,
    pub action: String,
}

impl CategoryFilter {
    pub(crate) fn schema(categories: Datasource, actions: &[&'static str]) -> Schema {
        Schema::new("Category action")
            .attr(
                "category",
                Attribute::object(Reference::schema(&[categories])).required(),
            )
            .attr(
                "action",
                Attribute::string().required().one_of(actions.iter().copied()),
            )
    }
}

impl Expand for CategoryFilter {
    fn expand(&self) -> JsonMap {
        let mut body = Body::new();
        body.put_object("category", Some(&self.category))
            .put_str("action", Some(&self.action));
        body.into_map()
    }
}

impl Flatten for CategoryFilter {
    fn flatten(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        let missing = |key: &str, expected| DecodeError {
            path: format!("{}.{key}", fields.path()),
            expected,
            found: "null",
        };
        Ok(Self {
            category: fields
                .object("category")?
                .ok_or_else(|| missing("category", "an object"))?,
            action: fields
                .string("action")?
                .ok_or_else(|| missing("action", "a string"))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlFilter {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub action: Option<String>,
    pub status: Option<String>,
}

impl Expand for UrlFilter {
    fn expand(&self) -> JsonMap {
        let mut body = Body::new();
        body.put_str("url", Some(&self.url))
            .put_str("type", self.kind.as_deref())
            .put_str("action", self.action.as_deref())
            .put_str("status", self.status.as_deref());
        body.into_map()
    }
}

impl Flatten for UrlFilter {
    fn flatten(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            url: fields.string("url")?.ok_or_else(|| DecodeError {
                path: format!("{}.url", fields.path()),
                expected: "a string",
                found: "null",
            })?,
            kind: fields.string("type")?,
            action: fields.string("action")?,
            status: fields.string("status")?,
        })
    }
}

const CATEGORY_ACTIONS: &[&str] = &["allow", "monitor", "block", "warning", "disable"];

pub struct WebFilterProfiles;

impl ApiObject for WebFilterProfiles {
    type Model = WebFilterProfile;

    const TYPE_NAME: &'static str = "fortisase_security_web_filter_profile";
    const PATH: &'static str = "security/{direction}/web-filter-profile";
    const KIND: ObjectKind = ObjectKind::Singleton;
    const LOCK: Option<&'static str> = Some(PROFILE_GROUP);

    fn schema() -> Schema {
        let url_filter = Schema::new("URL filter entry")
            .attr("url", Attribute::string().required().length(1, 511))
            .attr(
                "type",
                Attribute::string()
                    .optional_computed()
                    .one_of(["simple", "wildcard", "regex"]),
            )
            .attr(
                "action",
                Attribute::string()
                    .optional_computed()
                    .one_of(["allow", "monitor", "block", "exempt"]),
            )
            .attr(
                "status",
                Attribute::string()
                    .optional_computed()
                    .one_of(["enable", "disable"]),
            );

        Schema::new("Web filter profile of a profile group. Import with `direction/primary_key`.")
            .with_id()
            .attr(
                "direction",
                Attribute::string()
                    .required()
                    .one_of(PROFILE_DIRECTIONS.iter().copied())
                    .requires_replace(),
            )
            .attr(
                "primary_key",
                Attribute::string().required().length(1, 47).requires_replace(),
            )
            .attr(
                "fortiguard_filters",
                Attribute::list_of(CategoryFilter::schema(
                    Datasource::SecurityFortiguardCategories,
                    CATEGORY_ACTIONS,
                ))
                .optional(),
            )
            .attr(
                "fortiguard_local_categories",
                Attribute::list_of(CategoryFilter::schema(
                    Datasource::SecurityLocalCategories,
                    CATEGORY_ACTIONS,
                ))
                .optional(),
            )
            .attr("url_filters", Attribute::list_of(url_filter).optional())
            .attr("block_invalid_url", Attribute::boolean().optional_computed())
            .attr("enforce_safe_search", Attribute::boolean().optional_computed())
            .attr(
                "youtube_restrict",
                Attribute::string()
                    .optional_computed()
                    .one_of(["none", "moderate", "strict"]),
            )
    }

    fn primary_key(model: &WebFilterProfile) -> Option<String> {
        model.primary_key.clone()
    }

    fn id(model: &WebFilterProfile) -> Option<&str> {
        model.id.as_deref()
    }

    fn set_id(model: &mut WebFilterProfile, id: String) {
        model.id = Some(id);
    }

    fn path_params(model: &WebFilterProfile) -> Vec<(&'static str, String)> {
        model
            .direction
            .iter()
            .map(|d| ("direction", d.clone()))
            .collect()
    }

    fn expand(model: &WebFilterProfile, _prior: Option<&WebFilterProfile>) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref())
            .put_list("fortiguardFilters", model.fortiguard_filters.as_deref())
            .put_list(
                "fortiguardLocalCategories",
                model.fortiguard_local_categories.as_deref(),
            )
            .put_list("contentFilters", model.url_filters.as_deref())
            .put_bool("blockInvalidUrl", model.block_invalid_url)
            .put_bool("enforceSafeSearch", model.enforce_safe_search)
            .put_str("youtubeRestrict", model.youtube_restrict.as_deref());
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &WebFilterProfile) -> Result<WebFilterProfile, DecodeError> {
        let f = Fields::root(data);
        Ok(WebFilterProfile {
            id: known.id.clone(),
            // Part of the URL, not the body.
            direction: known.direction.clone(),
            primary_key: f.string("primaryKey")?.or_else(|| known.primary_key.clone()),
            fortiguard_filters: f.list("fortiguardFilters")?,
            fortiguard_local_categories: f.list("fortiguardLocalCategories")?,
            url_filters: f.list("contentFilters")?,
            block_invalid_url: f.boolean("blockInvalidUrl")?,
            enforce_safe_search: f.boolean("enforceSafeSearch")?,
            youtube_restrict: f.string("youtubeRestrict")?,
        })
    }

    fn import(id: &str) -> Result<WebFilterProfile, CoreError> {
        let (direction, key) = import_directional(id)?;
        Ok(WebFilterProfile {
            id: Some(key.clone()),
            direction: Some(direction),
            primary_key: Some(key),
            ..WebFilterProfile::default()
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
    fn import_splits_direction_and_key() {
        let model = WebFilterProfiles::import("outbound-profiles/default").unwrap();
        assert_eq!(model.direction.as_deref(), Some("outbound-profiles"));
        assert_eq!(model.primary_key.as_deref(), Some("default"));
        assert_eq!(model.id.as_deref(), Some("default"));
    }

    #[test]
    fn import_rejects_unknown_direction() {
        let err = WebFilterProfiles::import("sideways-profiles/default").unwrap_err();
        assert!(matches!(err, CoreError::InvalidImportId { .. }));
    }

    #[test]
    fn direction_is_a_path_parameter_not_a_body_field() {
        let model = WebFilterProfile {
            direction: Some("internal-profiles".into()),
            primary_key: Some("default".into()),
            block_invalid_url: Some(true),
            ..WebFilterProfile::default()
        };
        assert_eq!(
            WebFilterProfiles::path_params(&model),
            vec![("direction", "internal-profiles".to_owned())]
        );
        let body = WebFilterProfiles::expand(&model, None);
        assert!(!body.contains_key("direction"));
        assert_eq!(WebFilterProfiles::flatten(&body, &model).unwrap(), model);
    }

    #[test]
    fn category_filters_round_trip() {
        let model = WebFilterProfile {
            direction: Some("outbound-profiles".into()),
            primary_key: Some("default".into()),
            fortiguard_filters: Some(vec![CategoryFilter {
                category: Reference::new("26", Datasource::SecurityFortiguardCategories),
                action: "block".into(),
            }]),
            url_filters: Some(vec![UrlFilter {
                url: "*.example.com".into(),
                kind: Some("wildcard".into()),
                action: Some("exempt".into()),
                status: Some("enable".into()),
            }]),
            ..WebFilterProfile::default()
        };
        let body = WebFilterProfiles::expand(&model, None);
        assert_eq!(
            body.get("contentFilters"),
            Some(&json!([{
                "url": "*.example.com",
                "type": "wildcard",
                "action": "exempt",
                "status": "enable",
            }]))
        );
        assert_eq!(WebFilterProfiles::flatten(&body, &model).unwrap(), model);
    }
}
