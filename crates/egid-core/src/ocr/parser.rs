//! Scraping the structured record out of the OCR program's output.

use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;
use crate::models::record::ExtractedRecord;

/// Find the first line of `output` that starts with `{`.
pub fn find_structured_line(output: &str) -> Option<&str> {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('{'))
}

/// Parse the OCR program's output into a record.
///
/// Everything other than the first `{` line is treated as log noise.
pub fn parse_output(output: &str) -> Result<ExtractedRecord, ParseError> {
    let line = find_structured_line(output)
        .ok_or_else(|| ParseError::NoStructuredOutput(output.to_string()))?;

    debug!("Structured line: {}", line);

    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => Ok(ExtractedRecord::from_map(map)),
        Ok(_) => Err(ParseError::MalformedOutput {
            line: line.to_string(),
            reason: "not a JSON object".to_string(),
        }),
        Err(e) => Err(ParseError::MalformedOutput {
            line: line.to_string(),
            reason: e.to_string(),
        }),
    }
}
