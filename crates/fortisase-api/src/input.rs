// Request description shared by every resource endpoint.
//
// Resources never build URLs themselves: they hand the client a path
// template such as `security/{direction}/web-filter-profile` plus an
// `InputModel` carrying the object key, template values, query string,
// and JSON body.

use std::collections::BTreeMap;

use serde_json::Value;
use url::Url;

use crate::error::Error;

/// Untyped JSON object, the wire representation of every request and response body.
pub type JsonMap = serde_json::Map<String, Value>;

/// Everything needed to address and populate one API request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputModel {
    /// Object key appended as the final path segment (`.../ldap-servers/{mkey}`).
    pub mkey: Option<String>,
    /// Values for `{name}` placeholders in the path template.
    pub path_params: BTreeMap<String, String>,
    /// Query string parameters.
    pub url_params: Vec<(String, String)>,
    /// JSON request body. Ignored for GET and DELETE.
    pub body: JsonMap,
}

impl InputModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address a single object by key.
    pub fn keyed(mkey: impl Into<String>) -> Self {
        Self {
            mkey: Some(mkey.into()),
            ..Self::default()
        }
    }

    pub fn with_mkey(mut self, mkey: impl Into<String>) -> Self {
        self.mkey = Some(mkey.into());
        self
    }

    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.url_params.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: JsonMap) -> Self {
        self.body = body;
        self
    }

    /// Resolve a path template against `base`.
    ///
    /// Every template segment is pushed as its own (percent-encoded) URL
    /// segment, `{name}` placeholders are replaced from `path_params`, and
    /// `mkey` (when set) becomes the last segment.
    pub fn resolve(&self, base: &Url, template: &str) -> Result<Url, Error> {
        let mut url = base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidBaseUrl(base.to_string()))?;
            segments.pop_if_empty();

            for segment in template.split('/').filter(|s| !s.is_empty()) {
                match placeholder(segment) {
                    Some(name) => {
                        let value =
                            self.path_params
                                .get(name)
                                .ok_or_else(|| Error::MissingPathParam {
                                    name: name.to_owned(),
                                    template: template.to_owned(),
                                })?;
                        segments.push(value);
                    }
                    None => {
                        segments.push(segment);
                    }
                }
            }

            if let Some(ref mkey) = self.mkey {
                segments.push(mkey);
            }
        }

        if !self.url_params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in &self.url_params {
                query.append_pair(name, value);
            }
        }

        Ok(url)
    }
}

/// `{name}` → `Some("name")`.
fn placeholder(segment: &str) -> Option<&str> {
    segment.strip_prefix('{').and_then(|s| s.strip_suffix('}'))
}
