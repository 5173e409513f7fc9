//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use fortisase_core::{Diagnostic, Diagnostics, Severity};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled on stderr.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views are not
/// tabular.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Print warnings and errors to stderr, one block per diagnostic.
pub fn print_diagnostics(diags: &Diagnostics, color: bool) {
    let mut stderr = io::stderr().lock();
    for diag in diags {
        let _ = writeln!(stderr, "{}", format_diagnostic(diag, color));
    }
}

fn format_diagnostic(diag: &Diagnostic, color: bool) -> String {
    let label = match (diag.severity, color) {
        (Severity::Error, true) => "Error:".red().bold().to_string(),
        (Severity::Warning, true) => "Warning:".yellow().bold().to_string(),
        (Severity::Error, false) => "Error:".into(),
        (Severity::Warning, false) => "Warning:".into(),
    };
    let mut out = format!("{label} {}", diag.summary);
    if let Some(attr) = &diag.attribute {
        out.push_str(&format!("\n  on attribute {attr}"));
    }
    for line in diag.detail.lines() {
        out.push_str("\n  ");
        out.push_str(line);
    }
    out
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(rendered)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}

/// Key/value lines for a JSON object, used by single-item table views.
pub fn detail_lines(value: &serde_json::Value) -> String {
    let Some(obj) = value.as_object() else {
        return value.to_string();
    };
    let width = obj.keys().map(String::len).max().unwrap_or(0);
    obj.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let shown = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{k:<width$}  {shown}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn detail_lines_align_and_skip_nulls() {
        let out = detail_lines(&json!({ "id": "web01", "subnet": null, "location": "internal" }));
        assert_eq!(out, "id        web01\nlocation  internal");
    }

    #[test]
    fn diagnostic_block_without_color() {
        let diag = Diagnostic::error("Invalid configuration", "line one\nline two").at("type");
        assert_eq!(
            format_diagnostic(&diag, false),
            "Error: Invalid configuration\n  on attribute type\n  line one\n  line two"
        );
    }
}
