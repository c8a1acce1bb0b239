//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    endpoint: String,
    camera: String,
    wire_frame: String,
    initial_fps: u32,
    display_sink: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let target_height = contracts::capture_target_height(
                blueprint.camera.width,
                blueprint.camera.height,
                blueprint.capture.target_width,
            );

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    endpoint: blueprint.channel.endpoint.clone(),
                    camera: format!(
                        "{}x{} @ {} fps ({})",
                        blueprint.camera.width,
                        blueprint.camera.height,
                        blueprint.camera.frame_rate,
                        blueprint.camera.device_id
                    ),
                    wire_frame: format!(
                        "{}x{} JPEG q{}",
                        blueprint.capture.target_width, target_height, blueprint.capture.jpeg_quality
                    ),
                    initial_fps: blueprint.capture.initial_fps,
                    display_sink: format!("{:?}", blueprint.display.sink),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::ClientBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.channel.endpoint.starts_with("ws://") {
        warnings.push("Endpoint is unencrypted (ws://) - frames travel in the clear".to_string());
    }

    if blueprint.channel.reconnect_delay_ms < 500 {
        warnings.push(format!(
            "Reconnect delay of {} ms may hammer the service after an outage",
            blueprint.channel.reconnect_delay_ms
        ));
    }

    if blueprint.capture.jpeg_quality >= 80 {
        warnings.push(format!(
            "JPEG quality {} inflates frame payloads and round-trip latency",
            blueprint.capture.jpeg_quality
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Endpoint: {}", summary.endpoint);
            println!("  Camera: {}", summary.camera);
            println!("  Wire frame: {}", summary.wire_frame);
            println!("  Initial rate: {} fps", summary.initial_fps);
            println!("  Display sink: {}", summary.display_sink);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validate_good_config() {
        let file = write_config(
            r#"
[channel]
endpoint = "wss://inference.example.com/stream"

[camera]
width = 1920
height = 1080
frame_rate = 30.0
"#,
        );
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(result.valid, "error: {:?}", result.error);
        assert!(result.warnings.is_none());
    }

    #[test]
    fn test_validate_flags_plaintext_endpoint() {
        let file = write_config(
            r#"
[channel]
endpoint = "ws://10.0.0.5:5000/stream"
reconnect_delay_ms = 100

[camera]
width = 1280
height = 720
frame_rate = 30.0
"#,
        );
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_validate_bad_config() {
        let file = write_config("[channel]\nendpoint = \"http://nope\"\n");
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_validate_missing_file() {
        let args = ValidateArgs {
            config: "/nonexistent/config.toml".into(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
    }
}
