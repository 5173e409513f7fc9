// ── Video filter profiles ──

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};

use super::security_web_filter_profile::CategoryFilter;
use super::{PROFILE_DIRECTIONS, import_directional};
use crate::codec::{Body, DecodeError, Fields};
use crate::error::CoreError;
use crate::lock::PROFILE_GROUP;
use crate::reference::{Datasource, Reference};
use crate::resource::{ApiObject, ObjectKind};
use crate::schema::{Attribute, Schema};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoFilterProfile {
    pub id: Option<String>,
    pub direction: Option<String>,
    pub primary_key: Option<String>,
    pub default_action: Option<String>,
    pub fortiguard_filters: Option<Vec<CategoryFilter>>,
    pub youtube_channel_filter: Option<Reference>,
    pub youtube: Option<bool>,
    pub vimeo: Option<bool>,
    pub dailymotion: Option<bool>,
}

pub struct VideoFilterProfiles;

impl ApiObject for VideoFilterProfiles {
    type Model = VideoFilterProfile;

    const TYPE_NAME: &'static str = "fortisase_security_video_filter_profile";
    const PATH: &'static str = "security/{direction}/video-filter-profile";
    const KIND: ObjectKind = ObjectKind::Singleton;
    const LOCK: Option<&'static str> = Some(PROFILE_GROUP);

    fn schema() -> Schema {
        Schema::new("Video filter profile of a profile group. Import with `direction/primary_key`.")
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
                "default_action",
                Attribute::string()
                    .optional_computed()
                    .one_of(["allow", "monitor", "block"]),
            )
            .attr(
                "fortiguard_filters",
                Attribute::list_of(CategoryFilter::schema(
                    Datasource::SecurityFortiguardCategories,
                    &["allow", "monitor", "block"],
                ))
                .optional(),
            )
            .attr(
                "youtube_channel_filter",
                Attribute::object(Reference::schema(&[Datasource::SecurityYoutubeChannelFilters]))
                    .optional(),
            )
            .attr("youtube", Attribute::boolean().optional_computed())
            .attr("vimeo", Attribute::boolean().optional_computed())
            .attr("dailymotion", Attribute::boolean().optional_computed())
    }

    fn primary_key(model: &VideoFilterProfile) -> Option<String> {
        model.primary_key.clone()
    }

    fn id(model: &VideoFilterProfile) -> Option<&str> {
        model.id.as_deref()
    }

    fn set_id(model: &mut VideoFilterProfile, id: String) {
        model.id = Some(id);
    }

    fn path_params(model: &VideoFilterProfile) -> Vec<(&'static str, String)> {
        model
            .direction
            .iter()
            .map(|d| ("direction", d.clone()))
            .collect()
    }

    fn expand(model: &VideoFilterProfile, _prior: Option<&VideoFilterProfile>) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref())
            .put_str("defaultAction", model.default_action.as_deref())
            .put_list("fortiguardFilters", model.fortiguard_filters.as_deref())
            .put_object("youtubeChannelFilter", model.youtube_channel_filter.as_ref())
            .put_bool("youtube", model.youtube)
            .put_bool("vimeo", model.vimeo)
            .put_bool("dailymotion", model.dailymotion);
        body.into_map()
    }

    fn flatten(
        data: &JsonMap,
        known: &VideoFilterProfile,
    ) -> Result<VideoFilterProfile, DecodeError> {
        let f = Fields::root(data);
        Ok(VideoFilterProfile {
            id: known.id.clone(),
            direction: known.direction.clone(),
            primary_key: f.string("primaryKey")?.or_else(|| known.primary_key.clone()),
            default_action: f.string("defaultAction")?,
            fortiguard_filters: f.list("fortiguardFilters")?,
            youtube_channel_filter: f.object("youtubeChannelFilter")?,
            youtube: f.boolean("youtube")?,
            vimeo: f.boolean("vimeo")?,
            dailymotion: f.boolean("dailymotion")?,
        })
    }

    fn import(id: &str) -> Result<VideoFilterProfile, CoreError> {
        let (direction, key) = import_directional(id)?;
        Ok(VideoFilterProfile {
            id: Some(key.clone()),
            direction: Some(direction),
            primary_key: Some(key),
            ..VideoFilterProfile::default()
        })
    }
}
