//! User-Friendly Error Formatting
//!
//! Turns errors from the replay tool into readable reports with
//! troubleshooting hints.

use std::fmt::Write;

/// Format error for user consumption
///
/// Inspects the whole error chain, picks a category, and appends the
/// technical details underneath.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    let error_msg = format!("{:#}", error);

    if error_msg.contains("trace") {
        format_trace_error(&mut output);
    } else if error_msg.contains("config")
        || error_msg.contains("[speculation]")
        || error_msg.contains("history_size")
    {
        format_config_error(&mut output);
    } else if error_msg.contains("runtime") {
        format_runtime_error(&mut output);
    } else {
        format_generic_error(&mut output, &error_msg);
    }

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{:#}", error).ok();
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(
        &mut output,
        "Run with -vv for per-tick scores and transitions."
    )
    .ok();

    output
}

fn format_trace_error(output: &mut String) {
    writeln!(output, "Pointer Trace Error").ok();
    writeln!(output).ok();
    writeln!(output, "The trace file could not be used for replay.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. File missing or not JSON").ok();
    writeln!(
        output,
        "     → Expected: {{\"samples\": [{{\"x\":..,\"y\":..,\"t\":..}}], \"commits\": [..]}}"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. Samples out of order").ok();
    writeln!(output, "     → Timestamps must never decrease").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Commit names an unknown target").ok();
    writeln!(output, "     → Every commit target needs a [[targets]] entry").ok();
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with configuration file.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Value out of range").ok();
    writeln!(output, "     → sensitivity and deceleration_weight: 0.0-1.0").ok();
    writeln!(output, "     → abort_ratio: at least 0.0 and below 1.0").ok();
    writeln!(
        output,
        "     → history_size: at least 3 and no more than sampler.buffer_size"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  3. Duplicate or inverted targets").ok();
    writeln!(output, "     → Target names must be unique; right >= left, bottom >= top").ok();
}

fn format_runtime_error(output: &mut String) {
    writeln!(output, "Runtime Error").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "Speculation controllers need a tokio runtime to run actions and timers."
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  → Create controllers from within #[tokio::main] or a runtime handle").ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Replay Error").ok();
    writeln!(output).ok();
    writeln!(output, "An error occurred while replaying the trace.").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
}
