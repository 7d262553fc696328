//! Output formatting, adapted from the teacher's `memory-cli/src/output.rs`
//! `OutputFormat`/`Output` pair. `Yaml` is dropped: the workspace doesn't
//! carry `serde_yaml`, and every verb envelope is already a flat JSON
//! object, so Human/Json cover the cases spec.md §6 needs.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

impl OutputFormat {
    pub fn print(self, value: &Value) {
        match self {
            OutputFormat::Human => print_human(value),
            OutputFormat::Json => {
                if let Ok(pretty) = serde_json::to_string_pretty(value) {
                    println!("{pretty}");
                }
            }
        }
    }
}

/// Render a verb envelope the way a human reads it: lead with
/// success/failure, then each payload field on its own line.
fn print_human(value: &Value) {
    let Value::Object(map) = value else {
        println!("{value}");
        return;
    };

    let success = map.get("success").and_then(Value::as_bool).unwrap_or(true);
    let verb = map.get("verb").and_then(Value::as_str).unwrap_or("response");
    if success {
        println!("{verb}: ok");
    } else {
        let error = map.get("error").and_then(Value::as_str).unwrap_or("unknown error");
        println!("{verb}: failed - {error}");
    }

    for (key, field_value) in map {
        if matches!(key.as_str(), "success" | "verb" | "error" | "zptState") {
            continue;
        }
        println!("  {key}: {}", compact(field_value));
    }

    if let Some(zpt) = map.get("zptState") {
        println!("  zptState: {}", compact(zpt));
    }
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

/// Print any serializable value under a given format; used for non-envelope
/// output such as `completion`.
pub fn print_output<T: Serialize>(format: OutputFormat, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_value(value)?;
    format.print(&json);
    Ok(())
}
