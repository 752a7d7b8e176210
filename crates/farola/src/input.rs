//! Record file loading for `normalize` and `stats`.

use std::io::Read;
use std::path::Path;

use serde_json::Value;

use farola_core::RawRecord;

use crate::error::CliError;

/// `-` means stdin.
pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn label(path: &Path) -> String {
    if is_stdin(path) {
        "<stdin>".into()
    } else {
        path.display().to_string()
    }
}

pub fn read_text(path: &Path) -> Result<String, CliError> {
    let read_err = |source| CliError::ReadInput {
        path: label(path),
        source,
    };
    if is_stdin(path) {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(read_err)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).map_err(read_err)
    }
}

/// Read `(id, raw)` pairs from a file or stdin.
pub fn read_records(path: &Path) -> Result<Vec<(String, RawRecord)>, CliError> {
    let text = read_text(path)?;
    let value: Value = serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: label(path),
        source,
    })?;
    parse_records(value)
}

/// Accepts `{"<id>": {...}, ...}` or `[{"id": "<id>", ...}, ...]`.
///
/// Array entries need a string or numeric `id`; the rest of the entry is
/// the raw record, `id` included.
pub fn parse_records(value: Value) -> Result<Vec<(String, RawRecord)>, CliError> {
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let id = match raw.get("id") {
                    Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => {
                        return Err(CliError::Validation {
                            field: format!("record {index}"),
                            reason: "missing string or numeric \"id\"".into(),
                        });
                    }
                };
                Ok((id, raw))
            })
            .collect(),
        _ => Err(CliError::Validation {
            field: "input".into(),
            reason: "expected a JSON object keyed by id or an array of records".into(),
        }),
    }
}
