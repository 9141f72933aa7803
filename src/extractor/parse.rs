use thiserror::Error;

use crate::record::CompanyFacts;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedOutput {
    #[error("no JSON object in model reply")]
    NoObject,
    #[error("unterminated JSON object in model reply")]
    Unterminated,
    #[error("reply does not match the six-field schema: {0}")]
    Schema(String),
}

/// First balanced `{...}` span, skipping braces inside JSON strings.
pub fn first_object(raw: &str) -> Result<&str, MalformedOutput> {
    let start = raw.find('{').ok_or(MalformedOutput::NoObject)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in raw[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&raw[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    Err(MalformedOutput::Unterminated)
}

/// Strict decode: all six keys, string values, nothing extra.
pub fn parse_response(raw: &str) -> Result<CompanyFacts, MalformedOutput> {
    let object = first_object(raw)?;
    serde_json::from_str(object).map_err(|e| MalformedOutput::Schema(e.to_string()))
}
