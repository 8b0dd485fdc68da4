//! Named parameter handling for compiled statements.
//!
//! Compiled SQL refers to its values as `@name` placeholders. Before execution
//! they are rewritten to SQLite's numbered `?NNN` form; for diagnostics they are
//! replaced by literal values instead.

use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A value bound to a named SQL parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BindValue {
    Text(String),
    Integer(i64),
    Real(f64),
}

impl BindValue {
    /// SQL literal form used in logged statements. Text is quoted but not escaped.
    pub fn literal(&self) -> String {
        match self {
            Self::Text(s) => format!("'{s}'"),
            Self::Integer(i) => i.to_string(),
            Self::Real(f) => f.to_string(),
        }
    }
}

impl fmt::Display for BindValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
        }
    }
}

/// Bound parameters keyed by placeholder name (without the `@`).
pub type BindParams = BTreeMap<String, BindValue>;

/// Copies `sql` through, replacing every `@name` placeholder that is not inside
/// a quoted literal or identifier with the output of `f`.
fn rewrite<F>(sql: &str, mut f: F) -> Result<String>
where
    F: FnMut(&str) -> Result<String>,
{
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.char_indices().peekable();
    let mut quote: Option<char> = None;

    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                out.push(c);
            }
            '@' => {
                let start = i + 1;
                let mut end = start;
                if matches!(chars.peek(), Some(&(_, n)) if n.is_ascii_alphabetic() || n == '_') {
                    while let Some(&(j, n)) = chars.peek() {
                        if n.is_ascii_alphanumeric() || n == '_' {
                            end = j + n.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }

                if end == start {
                    out.push(c);
                } else {
                    out.push_str(&f(&sql[start..end])?);
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Placeholder names referenced by `sql`, in order of first appearance.
pub fn placeholders(sql: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let _ = rewrite(sql, |name| {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        Ok(String::new())
    });
    names
}

/// Rewrites named placeholders into numbered `?NNN` placeholders and returns the
/// values in parameter-index order. Repeated names share one index.
pub fn positional(sql: &str, params: &BindParams) -> Result<(String, Vec<BindValue>)> {
    let mut names: Vec<String> = Vec::new();
    let rewritten = rewrite(sql, |name| {
        let index = match names.iter().position(|n| n == name) {
            Some(existing) => existing + 1,
            None => {
                if !params.contains_key(name) {
                    return Err(Error::UnboundParameter(name.to_string()));
                }
                names.push(name.to_string());
                names.len()
            }
        };
        Ok(format!("?{index}"))
    })?;

    let values = names
        .iter()
        .filter_map(|name| params.get(name).cloned())
        .collect();

    Ok((rewritten, values))
}

/// Human-readable SQL with bound values substituted as literals. Never executed.
pub fn logged(sql: &str, params: &BindParams) -> String {
    rewrite(sql, |name| {
        Ok(params
            .get(name)
            .map(BindValue::literal)
            .unwrap_or_else(|| format!("@{name}")))
    })
    .unwrap_or_else(|_| sql.to_string())
}
