//! Human-readable error descriptions and structured JSON error formatting.

use tof_core::RangerError;

/// Exit code when the sensor failed to initialize and the controller halted.
pub const EXIT_HALTED: i32 = 3;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(re) = err.downcast_ref::<RangerError>() {
        return match re {
            RangerError::Halted(detail) => format!(
                "What happened: The range sensor failed to initialize ({detail}). It is halted and will produce no measurements until restart.\nLikely causes: Sensor unpowered, wrong i2c bus or address, or XSHUT held low.\nHow to fix: Check wiring and [sensor] address/bus in the config, then restart."
            ),
            RangerError::Timeout => "What happened: The sensor did not respond in time.\nLikely causes: Loose i2c wiring or a bus held by another device.\nHow to fix: Check SDA/SCL and pull-ups, then rerun.".to_string(),
            RangerError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values.\nHow to fix: Edit the config file, then rerun."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("invalid config") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nHow to fix: Edit the TOML config and try again."
        );
    }
    if lower.contains("failed to read config") {
        return format!("What happened: {msg}.\nHow to fix: Pass an existing file to --config.");
    }

    let cause = err
        .chain()
        .nth(1)
        .map(|src| format!(" Cause: {src}"))
        .unwrap_or_default();
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Halted sensor maps to 3; every other error is 1. Usage errors exit 2 via clap.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<RangerError>() {
        Some(RangerError::Halted(_)) => EXIT_HALTED,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<RangerError>() {
        Some(RangerError::Halted(_)) => "Halted",
        Some(RangerError::Timeout) => "Timeout",
        Some(RangerError::Config(_)) => "Config",
        Some(RangerError::Hardware(_) | RangerError::HardwareFault(_)) => "Hardware",
        Some(RangerError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "message": humanize(err),
        "exit_code": exit_code_for_error(err),
    })
    .to_string()
}
