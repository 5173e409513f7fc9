// ── Datasource references ──
//
// Soft foreign keys: a reference names an object by primary key inside one
// of a fixed set of collections. Only the collection is validated locally.

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::codec::{Body, DecodeError, Expand, Fields, Flatten};
use crate::schema::{Attribute, Schema};

/// Collections a reference may point into.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    IntoStaticStr,
    EnumIter,
)]
pub enum Datasource {
    #[serde(rename = "auth/users")]
    #[strum(serialize = "auth/users")]
    AuthUsers,
    #[serde(rename = "auth/user-groups")]
    #[strum(serialize = "auth/user-groups")]
    AuthUserGroups,
    #[serde(rename = "auth/ldap-servers")]
    #[strum(serialize = "auth/ldap-servers")]
    AuthLdapServers,
    #[serde(rename = "auth/radius-servers")]
    #[strum(serialize = "auth/radius-servers")]
    AuthRadiusServers,
    #[serde(rename = "auth/fsso-users")]
    #[strum(serialize = "auth/fsso-users")]
    AuthFssoUsers,
    #[serde(rename = "network/hosts")]
    #[strum(serialize = "network/hosts")]
    NetworkHosts,
    #[serde(rename = "network/host-groups")]
    #[strum(serialize = "network/host-groups")]
    NetworkHostGroups,
    #[serde(rename = "network/internet-services")]
    #[strum(serialize = "network/internet-services")]
    NetworkInternetServices,
    #[serde(rename = "network/wildcard-fqdn-customs")]
    #[strum(serialize = "network/wildcard-fqdn-customs")]
    NetworkWildcardFqdns,
    #[serde(rename = "security/services")]
    #[strum(serialize = "security/services")]
    SecurityServices,
    #[serde(rename = "security/service-groups")]
    #[strum(serialize = "security/service-groups")]
    SecurityServiceGroups,
    #[serde(rename = "security/onetime-schedules")]
    #[strum(serialize = "security/onetime-schedules")]
    SecurityOnetimeSchedules,
    #[serde(rename = "security/recurring-schedules")]
    #[strum(serialize = "security/recurring-schedules")]
    SecurityRecurringSchedules,
    #[serde(rename = "security/schedule-groups")]
    #[strum(serialize = "security/schedule-groups")]
    SecurityScheduleGroups,
    #[serde(rename = "security/profile-groups")]
    #[strum(serialize = "security/profile-groups")]
    SecurityProfileGroups,
    #[serde(rename = "security/dlp-dictionaries")]
    #[strum(serialize = "security/dlp-dictionaries")]
    SecurityDlpDictionaries,
    #[serde(rename = "security/dlp-file-patterns")]
    #[strum(serialize = "security/dlp-file-patterns")]
    SecurityDlpFilePatterns,
    #[serde(rename = "security/fortiguard-categories")]
    #[strum(serialize = "security/fortiguard-categories")]
    SecurityFortiguardCategories,
    #[serde(rename = "security/fortiguard-local-categories")]
    #[strum(serialize = "security/fortiguard-local-categories")]
    SecurityLocalCategories,
    #[serde(rename = "security/video-filter-youtube-channel-filters")]
    #[strum(serialize = "security/video-filter-youtube-channel-filters")]
    SecurityYoutubeChannelFilters,
    #[serde(rename = "endpoint/connection-profiles")]
    #[strum(serialize = "endpoint/connection-profiles")]
    EndpointConnectionProfiles,
    #[serde(rename = "endpoint/protection-profiles")]
    #[strum(serialize = "endpoint/protection-profiles")]
    EndpointProtectionProfiles,
    #[serde(rename = "endpoint/sandbox-profiles")]
    #[strum(serialize = "endpoint/sandbox-profiles")]
    EndpointSandboxProfiles,
    #[serde(rename = "system/certificate/local-certificates")]
    #[strum(serialize = "system/certificate/local-certificates")]
    LocalCertificates,
    #[serde(rename = "system/certificate/ca-certificates")]
    #[strum(serialize = "system/certificate/ca-certificates")]
    CaCertificates,
}

impl Datasource {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

/// `{primary_key, datasource}` in state; `{primaryKey, datasource}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub primary_key: String,
    pub datasource: Datasource,
}

impl Reference {
    pub fn new(primary_key: impl Into<String>, datasource: Datasource) -> Self {
        Self {
            primary_key: primary_key.into(),
            datasource,
        }
    }

    /// Nested schema restricting `datasource` to `allowed`.
    pub fn schema(allowed: &[Datasource]) -> Schema {
        Schema::new("Reference to an existing configuration object")
            .attr(
                "primary_key",
                Attribute::string().required().length(1, 79),
            )
            .attr(
                "datasource",
                Attribute::string()
                    .required()
                    .one_of(allowed.iter().map(|d| d.as_str())),
            )
    }
}

impl Expand for Reference {
    fn expand(&self) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", Some(&self.primary_key))
            .put_str("datasource", Some(self.datasource.as_str()));
        body.into_map()
    }
}

impl Flatten for Reference {
    fn flatten(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        let missing = |key: &str| DecodeError {
            path: join(fields.path(), key),
            expected: "a string",
            found: "null",
        };
        let primary_key = fields
            .string("primaryKey")?
            .ok_or_else(|| missing("primaryKey"))?;
        let raw = fields
            .string("datasource")?
            .ok_or_else(|| missing("datasource"))?;
        let datasource = raw.parse().map_err(|_| DecodeError {
            path: join(fields.path(), "datasource"),
            expected: "a known datasource",
            found: "an unknown collection",
        })?;
        Ok(Self {
            primary_key,
            datasource,
        })
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}
