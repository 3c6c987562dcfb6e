use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format. In JSON mode the
/// fields of `data` are merged next to `success` and `message`.
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = Map::new();
            response.insert("success".to_string(), json!(true));
            response.insert("message".to_string(), json!(message));

            if let Some(Value::Object(fields)) = data {
                response.extend(fields);
            }

            println!("{}", serde_json::to_string_pretty(&Value::Object(response))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&error_response(message, error_code))?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// JSON body printed for a failed command.
pub fn error_response(message: &str, error_code: Option<&str>) -> Value {
    let mut response = json!({
        "success": false,
        "error": message
    });

    if let Some(code) = error_code {
        response["error_code"] = json!(code);
    }
    response
}

/// Print a failed command's error exactly once: structured on stdout for
/// `--json`, on stderr otherwise. `verbose` prints the whole error chain.
pub fn report_error(output_format: &OutputFormat, err: &anyhow::Error, verbose: bool) {
    let message = if verbose { format!("{err:?}") } else { err.to_string() };
    if let Err(print_err) = output_error(output_format, &message, error_code(err)) {
        eprintln!("Error: {} ({})", message, print_err);
    }
}

/// Output a titled list. Text mode prints one `label` per line, JSON mode
/// prints the raw `items` under `collection_name`.
pub fn output_list(
    output_format: &OutputFormat,
    collection_name: &str,
    items: Value,
    labels: &[String],
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: items }))?);
        }
        OutputFormat::Text => {
            if labels.is_empty() {
                println!("No {} found", collection_name);
            } else {
                println!("{} ({}):", collection_name, labels.len());
                for label in labels {
                    println!("  {}", label);
                }
            }
        }
    }
    Ok(())
}

/// Stable code for the error kinds the console knows about.
pub fn error_code(err: &anyhow::Error) -> Option<&'static str> {
    use crate::error::ClientError;
    use crate::form::ValidationError;
    use crate::login::{AllocationError, FieldError};
    use crate::state::StateError;

    if let Some(e) = err.downcast_ref::<ClientError>() {
        return Some(e.error_code());
    }
    if let Some(e) = err.downcast_ref::<AllocationError>() {
        return Some(match e {
            AllocationError::Lookup { source, .. } => source.error_code(),
            AllocationError::Timeout { .. } => "TIMEOUT",
            AllocationError::Exhausted { .. } => "LOGIN_EXHAUSTED",
        });
    }
    if err.downcast_ref::<ValidationError>().is_some() {
        return Some("VALIDATION_ERROR");
    }
    if err.downcast_ref::<FieldError>().is_some() {
        return Some("UNKNOWN_DOMAIN");
    }
    if err.downcast_ref::<StateError>().is_some() {
        return Some("STATE_ERROR");
    }
    None
}
