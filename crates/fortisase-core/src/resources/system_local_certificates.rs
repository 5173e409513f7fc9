// ── Local certificates ──
//
// Uploaded once: the certificate content and its password are write-only
// on the API side, so changing either replaces the certificate.

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};

use crate::codec::{Body, DecodeError, Fields};
use crate::error::CoreError;
use crate::resource::{ApiObject, require_import_id};
use crate::schema::{Attribute, Schema};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalCertificate {
    pub id: Option<String>,
    pub primary_key: Option<String>,
    pub format: Option<String>,
    pub file_content: Option<String>,
    pub password: Option<String>,
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub valid_to: Option<String>,
    pub source: Option<String>,
}

pub struct LocalCertificates;

impl ApiObject for LocalCertificates {
    type Model = LocalCertificate;

    const TYPE_NAME: &'static str = "fortisase_system_local_certificates";
    const PATH: &'static str = "system/certificate/local-certificates";

    fn schema() -> Schema {
        Schema::new("Certificate and private key uploaded to the tenant.")
            .with_id()
            .attr(
                "primary_key",
                Attribute::string().required().length(1, 35).requires_replace(),
            )
            .attr(
                "format",
                Attribute::string()
                    .optional_computed()
                    .one_of(["pem", "pkcs12"])
                    .requires_replace(),
            )
            .attr(
                "file_content",
                Attribute::string()
                    .required()
                    .sensitive()
                    .requires_replace()
                    .describe("Base64-encoded certificate bundle."),
            )
            .attr(
                "password",
                Attribute::string()
                    .optional()
                    .sensitive()
                    .requires_replace()
                    .describe("Passphrase protecting the private key."),
            )
            .attr("subject", Attribute::string().computed())
            .attr("issuer", Attribute::string().computed())
            .attr("valid_to", Attribute::string().computed())
            .attr("source", Attribute::string().computed())
    }

    fn primary_key(model: &LocalCertificate) -> Option<String> {
        model.primary_key.clone()
    }

    fn id(model: &LocalCertificate) -> Option<&str> {
        model.id.as_deref()
    }

    fn set_id(model: &mut LocalCertificate, id: String) {
        model.id = Some(id);
    }

    /// Upload fields only go out on create.
    fn expand(model: &LocalCertificate, prior: Option<&LocalCertificate>) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref())
            .put_str("format", model.format.as_deref());
        if prior.is_none() {
            body.put_str("fileContent", model.file_content.as_deref())
                .put_str("password", model.password.as_deref());
        }
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &LocalCertificate) -> Result<LocalCertificate, DecodeError> {
        let f = Fields::root(data);
        Ok(LocalCertificate {
            id: known.id.clone(),
            primary_key: f.string("primaryKey")?.or_else(|| known.primary_key.clone()),
            format: f.string("format")?.or_else(|| known.format.clone()),
            file_content: known.file_content.clone(),
            password: known.password.clone(),
            subject: f.string("subject")?,
            issuer: f.string("issuer")?,
            valid_to: f.string("validTo")?,
            source: f.string("source")?,
        })
    }

    fn import(id: &str) -> Result<LocalCertificate, CoreError> {
        let key = require_import_id(id)?;
        Ok(LocalCertificate {
            id: Some(key.clone()),
            primary_key: Some(key),
            ..LocalCertificate::default()
        })
    }
}
