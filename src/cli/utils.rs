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
            println!("{}", serde_json::to_string_pretty(&success_body(message, data))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "success": false, "error": message }))?
            );
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

fn success_body(message: &str, data: Option<Value>) -> Value {
    let mut response = json!({
        "success": true,
        "message": message
    });

    if let (Some(Value::Object(extra)), Some(target)) = (data, response.as_object_mut()) {
        target.extend(extra);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_object_data_into_the_envelope() {
        let body = success_body("Created", Some(json!({ "id": 7 })));
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Created");
        assert_eq!(body["id"], 7);
    }

    #[test]
    fn ignores_non_object_data() {
        let body = success_body("Done", Some(json!([1, 2])));
        assert_eq!(body, json!({ "success": true, "message": "Done" }));
    }
}
