//! JSON output for tool results and errors.
//!
//! A single command prints one pretty JSON document. `serve` reads one
//! JSON request per line and answers each with one compact JSON line, so
//! a failing call never ends the loop.

use crate::{Session, ToolCall};
use detective_core::{DetectiveError, Result};
use serde_json::{Value as JsonValue, json};
use std::io::{BufRead, Write};

/// Exit code for a failed command.
pub const EXIT_FAILURE: i32 = 1;

/// JSON payload describing an error: `{"error": kind, "message": text}`.
pub fn error_payload(err: &DetectiveError) -> JsonValue {
    json!({
        "error": err.kind(),
        "message": err.to_string(),
    })
}

/// Converts a tool outcome into the JSON document and exit code to report.
pub fn render(outcome: Result<JsonValue>) -> (JsonValue, i32) {
    match outcome {
        Ok(value) => (value, 0),
        Err(err) => {
            tracing::error!(kind = err.kind(), error = %err, "Tool call failed");
            (error_payload(&err), EXIT_FAILURE)
        }
    }
}

/// Writes one outcome as pretty JSON and returns the exit code.
pub fn emit<W: Write>(writer: &mut W, outcome: Result<JsonValue>) -> std::io::Result<i32> {
    let (value, code) = render(outcome);
    let text = serde_json::to_string_pretty(&value).map_err(std::io::Error::other)?;
    writeln!(writer, "{text}")?;
    writer.flush()?;
    Ok(code)
}

/// Parses one request line into a tool call.
pub fn parse_request(line: &str) -> Result<ToolCall> {
    serde_json::from_str(line).map_err(|e| DetectiveError::invalid_input("request", e.to_string()))
}

/// Answers line-delimited JSON requests until the reader is exhausted.
///
/// Blank lines are skipped. Returns the number of requests answered.
pub fn serve<R: BufRead, W: Write>(
    session: &mut Session,
    reader: R,
    writer: &mut W,
) -> std::io::Result<usize> {
    let mut answered: usize = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let outcome = parse_request(&line).and_then(|call| session.dispatch(&call));
        let (value, _) = render(outcome);
        let text = serde_json::to_string(&value).map_err(std::io::Error::other)?;
        writeln!(writer, "{text}")?;
        writer.flush()?;
        answered = answered.saturating_add(1);
    }
    tracing::info!(requests = answered, "Input closed, serve loop finished");
    Ok(answered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_payload_shape() {
        let err = DetectiveError::UnknownSource {
            name: "ghost".to_string(),
        };
        let payload = error_payload(&err);
        assert_eq!(payload["error"], "UnknownSource");
        assert_eq!(payload["message"], "Source 'ghost' is not registered.");
    }

    #[test]
    fn test_emit_exit_codes() {
        let mut out = Vec::new();
        assert_eq!(emit(&mut out, Ok(json!({"ok": true}))).unwrap(), 0);
        let err = DetectiveError::invalid_input("table", "must not be empty.");
        assert_eq!(emit(&mut out, Err(err)).unwrap(), EXIT_FAILURE);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"ok\": true"));
        assert!(text.contains("\"error\": \"InvalidInput\""));
    }

    #[test]
    fn test_parse_request_rejects_garbage() {
        let err = parse_request("not json").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("request"));
    }
}
