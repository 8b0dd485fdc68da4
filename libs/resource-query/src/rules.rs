//! Declarative value rules attached to descriptor columns.
//!
//! A rule both validates a raw query-string value and decides how it is bound:
//! numbers and booleans bind as integers, everything else as text.

use crate::compiler::BindValue;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ValueRule {
    String {
        #[serde(default, rename = "maxLength", skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    Number,
    Boolean,
    Enum {
        values: Vec<String>,
    },
    Range {
        min: i64,
        max: i64,
    },
}

impl ValueRule {
    /// Checks `raw` against the rule and converts it into the value to bind.
    pub fn coerce(&self, param: &str, raw: &str) -> Result<BindValue> {
        match self {
            Self::String { max_length } => {
                if let Some(max) = max_length {
                    if raw.chars().count() > *max {
                        return Err(Error::validation(
                            param,
                            format!("must be at most {max} characters"),
                        ));
                    }
                }
                Ok(BindValue::Text(raw.to_string()))
            }
            Self::Number => {
                let trimmed = raw.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(BindValue::Integer(i));
                }
                match trimmed.parse::<f64>() {
                    Ok(f) if f.is_finite() => Ok(BindValue::Real(f)),
                    _ => Err(Error::validation(param, format!("'{raw}' is not a number"))),
                }
            }
            Self::Boolean => parse_bool(raw)
                .map(|b| BindValue::Integer(i64::from(b)))
                .ok_or_else(|| Error::validation(param, format!("'{raw}' is not a boolean"))),
            Self::Enum { values } => values
                .iter()
                .find(|v| v.eq_ignore_ascii_case(raw))
                .map(|v| BindValue::Text(v.clone()))
                .ok_or_else(|| {
                    Error::validation(param, format!("must be one of: {}", values.join(", ")))
                }),
            Self::Range { min, max } => {
                let value = raw.trim().parse::<i64>().map_err(|_| {
                    Error::validation(param, format!("'{raw}' is not an integer"))
                })?;
                if value < *min || value > *max {
                    return Err(Error::validation(
                        param,
                        format!("must be between {min} and {max}"),
                    ));
                }
                Ok(BindValue::Integer(value))
            }
        }
    }

    /// Rules that cannot be prefix-matched with `LIKE`.
    pub(crate) fn is_textual(&self) -> bool {
        matches!(self, Self::String { .. } | Self::Enum { .. })
    }
}

/// Parses the boolean spellings accepted in query strings.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Coerces `raw` with the optional rule; columns without a rule bind text.
pub(crate) fn coerce(rule: Option<&ValueRule>, param: &str, raw: &str) -> Result<BindValue> {
    match rule {
        Some(rule) => rule.coerce(param, raw),
        None => Ok(BindValue::Text(raw.to_string())),
    }
}
