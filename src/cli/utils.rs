use serde_json::{json, Value};
use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a single value: pretty JSON, or one `key: value` line per field
pub fn output_value(output_format: &OutputFormat, value: &Value) -> anyhow::Result<()> {
    match (output_format, value) {
        (OutputFormat::Text, Value::Object(map)) => {
            for (key, field) in map {
                match field {
                    Value::String(s) => println!("{}: {}", key, s),
                    other => println!("{}: {}", key, other),
                }
            }
        }
        (OutputFormat::Text, Value::String(s)) => println!("{}", s),
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Trim a trailing slash so paths can be appended
pub fn base_url(url: &str) -> &str {
    url.trim_end_matches('/')
}
