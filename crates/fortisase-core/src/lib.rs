//! Resource layer between `fortisase-api` and a Terraform-style host.
//!
//! This crate owns the schemas, lifecycle orchestration and wire codecs
//! for FortiSASE configuration objects:
//!
//! - **[`ResourceRegistry`]**: Every resource type by Terraform type name,
//!   exposed as type-erased [`DynResource`] handlers that take and return
//!   `serde_json::Value` state plus [`Diagnostics`].
//!
//! - **[`Resource`]**: The typed create/read/update/delete/import
//!   lifecycle. [`StandardResource`] implements it for plain collections
//!   and singletons described by an [`ApiObject`], [`ActionResource`] for
//!   fire-and-settle operations described by an [`Action`].
//!
//! - **[`Schema`]**: Declarative attribute metadata: kinds, modes,
//!   validators and plan modifiers. Drives validation, replacement planning
//!   and redaction.
//!
//! - **Codec** ([`codec`]): `Body` and `Fields` convert between typed
//!   models and the API's JSON maps without panicking on unexpected shapes.
//!
//! - **[`ProviderContext`]**: The API handle, the named [`LockRegistry`],
//!   poll settings and the cancellation token shared by every handler.

pub mod codec;
pub mod config;
pub mod context;
pub mod diag;
pub mod error;
pub mod lock;
pub mod poll;
pub mod reference;
pub mod resource;
pub mod resources;
pub mod schema;

// ── Primary re-exports ──────────────────────────────────────────────
pub use codec::DecodeError;
pub use config::{AuthCredentials, PollSettings, ProviderConfig, TlsVerification};
pub use context::ProviderContext;
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use error::CoreError;
pub use lock::{LockRegistry, NamedGuard};
pub use poll::{PollPolicy, PollStatus};
pub use reference::{Datasource, Reference};
pub use resource::{
    Action, ActionResource, ApiObject, DynResource, ObjectKind, Plan, PlanAction, Resource,
    ResourceRegistry, Response, StandardResource,
};
pub use schema::{AttrKind, AttrMode, Attribute, PlanModifier, Schema, Validator};
