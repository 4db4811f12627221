//! JSON line I/O for the CLI
//!
//! - Input: one JSON document per line
//! - Output: one JSON object per line, `{"status": "ok", "data": ...}` or
//!   `{"status": "error", "code": ..., "severity": ..., "message": ...}`
//! - UTF-8 only

use std::io::{BufRead, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read JSON documents line by line, skipping blank lines
pub fn read_documents<R: BufRead>(input: R) -> impl Iterator<Item = CliResult<Value>> {
    input
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(serde_json::from_str(&line).map_err(|source| CliError::Input {
                line: index + 1,
                source,
            })),
            Err(e) => Some(Err(CliError::from(e))),
        })
}

/// Write a success line
pub fn write_response_to<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(out, &response)
}

/// Write an error line
pub fn write_error_to<W: Write>(out: &mut W, err: &CliError) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": err.code(),
        "severity": err.severity().to_string(),
        "message": err.to_string()
    });
    write_line(out, &response)
}

fn write_line<W: Write>(out: &mut W, response: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
