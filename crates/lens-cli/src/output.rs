use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => render_table(value),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn render_table<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let value = serde_json::to_value(value)?;
    match value {
        Value::Object(map) => {
            let width = map.keys().map(String::len).max().unwrap_or(0);
            let mut lines = Vec::with_capacity(map.len());
            for (key, value) in map {
                lines.push(format!("{key:width$}  {}", value_to_cell(&value)));
            }
            Ok(lines.join("\n"))
        }
        Value::Array(items) => {
            if items.is_empty() {
                return Ok(String::from("(no rows)"));
            }
            let lines = items
                .iter()
                .map(value_to_cell)
                .collect::<Vec<_>>();
            Ok(lines.join("\n"))
        }
        scalar => Ok(value_to_cell(&scalar)),
    }
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            if items.is_empty() {
                String::from("-")
            } else {
                items
                    .iter()
                    .map(value_to_cell)
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_else(|_| String::from("{..}")),
        other => other.to_string(),
    }
}
