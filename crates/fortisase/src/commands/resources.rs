//! Resource type introspection: `resources list` and `resources schema`.

use serde::Serialize;
use tabled::Tabled;

use fortisase_core::{AttrKind, AttrMode, Attribute, PlanModifier};

use crate::cli::{GlobalOpts, ResourcesArgs, ResourcesCommand};
use crate::error::CliError;
use crate::output;

use super::Session;

// ── Row types ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct TypeSummary {
    type_name: &'static str,
    description: &'static str,
    attributes: usize,
}

#[derive(Tabled)]
struct TypeRow {
    #[tabled(rename = "Type")]
    type_name: &'static str,
    #[tabled(rename = "Attributes")]
    attributes: usize,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled)]
struct AttrRow {
    #[tabled(rename = "Attribute")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Flags")]
    flags: String,
}

/// First sentence, capped so tables stay readable.
fn short(description: &str) -> String {
    let first = description.split(". ").next().unwrap_or(description);
    if first.chars().count() > 60 {
        let cut: String = first.chars().take(57).collect();
        format!("{cut}...")
    } else {
        first.trim_end_matches('.').to_owned()
    }
}

pub(crate) fn kind_label(kind: &AttrKind) -> String {
    match kind {
        AttrKind::String => "string".into(),
        AttrKind::Number => "number".into(),
        AttrKind::Bool => "bool".into(),
        AttrKind::List(inner) => format!("list({})", kind_label(inner)),
        AttrKind::Map(inner) => format!("map({})", kind_label(inner)),
        AttrKind::Object(_) => "object".into(),
        AttrKind::ListObject(_) => "list(object)".into(),
    }
}

fn flags(attr: &Attribute) -> String {
    let mut flags = Vec::new();
    if attr.sensitive {
        flags.push("sensitive");
    }
    if attr.has_modifier(PlanModifier::RequiresReplace) {
        flags.push("forces replacement");
    }
    flags.join(", ")
}

/// Flatten nested object attributes into dotted rows.
fn attr_rows(prefix: &str, attributes: &indexmap::IndexMap<&'static str, Attribute>) -> Vec<AttrRow> {
    let mut rows = Vec::new();
    for (name, attr) in attributes {
        let path = if prefix.is_empty() {
            (*name).to_owned()
        } else {
            format!("{prefix}.{name}")
        };
        let mode = match attr.mode {
            AttrMode::OptionalComputed => "optional+computed".to_owned(),
            other => other.to_string(),
        };
        rows.push(AttrRow {
            name: path.clone(),
            kind: kind_label(&attr.kind),
            mode,
            flags: flags(attr),
        });
        match &attr.kind {
            AttrKind::Object(nested) => rows.extend(attr_rows(&path, &nested.attributes)),
            AttrKind::ListObject(nested) => {
                rows.extend(attr_rows(&format!("{path}[]"), &nested.attributes));
            }
            _ => {}
        }
    }
    rows
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ResourcesArgs, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ResourcesCommand::List => {
            let summaries: Vec<TypeSummary> = session
                .registry
                .iter()
                .map(|res| {
                    let schema = res.schema();
                    TypeSummary {
                        type_name: res.type_name(),
                        description: schema.description,
                        attributes: schema.attributes.len(),
                    }
                })
                .collect();
            let out = output::render_list(
                global.output,
                &summaries,
                |s| TypeRow {
                    type_name: s.type_name,
                    attributes: s.attributes,
                    description: short(s.description),
                },
                |s| s.type_name.to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ResourcesCommand::Schema { type_name } => {
            let resource = session.resource(&type_name)?;
            let schema = resource.schema();
            let out = match global.output {
                crate::cli::OutputFormat::Table => {
                    let rows = attr_rows("", &schema.attributes);
                    format!(
                        "{}\n\n{}",
                        schema.description,
                        tabled::Table::new(rows).with(tabled::settings::Style::rounded())
                    )
                }
                format => output::render_single(
                    format,
                    &schema,
                    |_| String::new(),
                    |s| {
                        s.attributes
                            .keys()
                            .copied()
                            .collect::<Vec<_>>()
                            .join("\n")
                    },
                )?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
