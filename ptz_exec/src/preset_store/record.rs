//! Preset file records.
//!
//! One record per line, fields separated by whitespace: `token pan tilt zoom name`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ptz_if::{preset::is_token_char, Pose, Preset};
use std::{collections::BTreeMap, str};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Replaces whitespace in names and unusable characters in tokens.
const FIELD_FILL: char = '_';

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Result of parsing a whole preset file.
#[derive(Debug, Default)]
pub(crate) struct Parsed {
    /// Presets read before the first malformed line.
    pub presets: BTreeMap<String, Preset>,

    /// 1-based line number and error of the first malformed line, if any.
    pub stopped_at: Option<(usize, RecordError)>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons a record line is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("missing the {0} field")]
    MissingField(&'static str),

    #[error("the {field} field (\"{value}\") is not a finite number")]
    BadNumber { field: &'static str, value: String },

    #[error("unexpected trailing field \"{0}\"")]
    TrailingField(String),

    #[error("the line is not valid UTF-8")]
    NotUtf8,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse the contents of a preset file.
///
/// Parsing stops at the first malformed line, any records after it are dropped. A line which is
/// not valid UTF-8 is malformed. Blank lines are skipped. A repeated token keeps the last record.
pub(crate) fn parse(contents: &[u8]) -> Parsed {
    let mut parsed = Parsed::default();

    for (idx, raw) in contents.split(|&b| b == b'\n').enumerate() {
        let line = match str::from_utf8(raw) {
            Ok(l) => l,
            Err(_) => {
                parsed.stopped_at = Some((idx + 1, RecordError::NotUtf8));
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match parse_line(line) {
            Ok(p) => {
                parsed.presets.insert(p.token.clone(), p);
            }
            Err(e) => {
                parsed.stopped_at = Some((idx + 1, e));
                break;
            }
        }
    }

    parsed
}

/// Parse a single record line.
pub(crate) fn parse_line(line: &str) -> Result<Preset, RecordError> {
    let mut fields = line.split_whitespace();

    let token = fields.next().ok_or(RecordError::MissingField("token"))?;
    let pan_deg = number(fields.next(), "pan")?;
    let tilt_deg = number(fields.next(), "tilt")?;
    let zoom = number(fields.next(), "zoom")?;
    let name = fields.next().ok_or(RecordError::MissingField("name"))?;

    if let Some(extra) = fields.next() {
        return Err(RecordError::TrailingField(extra.to_string()));
    }

    Ok(Preset {
        token: token.to_string(),
        name: name.to_string(),
        pose: Pose::new(pan_deg, tilt_deg),
        zoom,
    })
}

/// Format a preset as a record line, without the newline.
pub(crate) fn format_record(preset: &Preset) -> String {
    let name = if preset.name.is_empty() {
        &preset.token
    } else {
        &preset.name
    };

    format!(
        "{} {} {} {} {}",
        sanitise(&preset.token),
        preset.pose.pan_deg,
        preset.pose.tilt_deg,
        preset.zoom,
        sanitise(name)
    )
}

/// Make a supplied token usable by the rig, replacing any character outside the token set.
pub(crate) fn sanitise_token(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| if is_token_char(c) { c } else { FIELD_FILL })
        .collect()
}

/// Make a value fit into a single field.
pub(crate) fn sanitise(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { FIELD_FILL } else { c })
        .collect()
}

fn number(field: Option<&str>, name: &'static str) -> Result<f64, RecordError> {
    let value = field.ok_or(RecordError::MissingField(name))?;

    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(RecordError::BadNumber {
            field: name,
            value: value.to_string(),
        }),
    }
}
