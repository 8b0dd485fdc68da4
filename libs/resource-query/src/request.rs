//! Per-request query model.
//!
//! A [`QueryRequest`] is built from the raw query-string pairs of one HTTP
//! request and consumed by a single compile/execute/assemble cycle.

use crate::descriptor::ResourceDescriptor;
use crate::rules::{self, parse_bool};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Control parameters that never constrain a query.
pub const RESERVED_PARAMS: &[&str] = &[
    "page",
    "size",
    "resources",
    "communities",
    "facets",
    "stats",
    "xml",
    "limit",
    "offset",
    "refreshCache",
    "resourceId",
    "sortBy",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_PARAMS.contains(&name)
}

/// A parameter value as received: one value, or several for a repeated key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

impl ParamValue {
    pub fn values(&self) -> &[String] {
        match self {
            Self::Single(v) => std::slice::from_ref(v),
            Self::Multi(vs) => vs,
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::Single(first) => {
                *self = Self::Multi(vec![std::mem::take(first), value]);
            }
            Self::Multi(vs) => vs.push(value),
        }
    }
}

/// Page-size policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            default_size: 30,
            max_size: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Descriptor name of the target resource.
    pub resource: String,
    pub params: BTreeMap<String, ParamValue>,
    /// Primary-key value when a single record is requested.
    pub resource_id: Option<String>,
    pub page: u32,
    pub size: u32,
    pub sort_by: Option<String>,
    pub want_facets: bool,
    pub want_stats: bool,
    pub refresh_cache: bool,
}

impl QueryRequest {
    /// An unfiltered first-page request.
    pub fn new(resource: impl Into<String>, paging: &Paging) -> Self {
        Self {
            resource: resource.into(),
            params: BTreeMap::new(),
            resource_id: None,
            page: 1,
            size: paging.default_size,
            sort_by: None,
            want_facets: false,
            want_stats: false,
            refresh_cache: false,
        }
    }

    /// Builds a request from query-string pairs, validating control flags and
    /// the values of parameters that name a column with a rule.
    pub fn parse<I, K, V>(descriptor: &ResourceDescriptor, items: I, paging: &Paging) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut request = Self::new(&descriptor.name, paging);
        let mut raw: BTreeMap<String, ParamValue> = BTreeMap::new();

        for (key, value) in items {
            let key = key.into();
            let value = value.into();
            match raw.get_mut(&key) {
                Some(existing) => existing.push(value),
                None => {
                    raw.insert(key, ParamValue::Single(value));
                }
            }
        }

        for (key, value) in raw {
            if !is_reserved(&key) {
                request.params.insert(key, value);
                continue;
            }

            let last = value.values().last().map(String::as_str).unwrap_or("");
            match key.as_str() {
                "page" => {
                    let page = parse_int(&key, last)?;
                    request.page = u32::try_from(page.max(1)).unwrap_or(u32::MAX);
                }
                "size" => {
                    let size = parse_int(&key, last)?;
                    if size < 1 || size > i64::from(paging.max_size) {
                        return Err(Error::validation(
                            &key,
                            format!("must be between 1 and {}", paging.max_size),
                        ));
                    }
                    request.size = size as u32;
                }
                "facets" => request.want_facets = parse_flag(&key, last)?,
                "stats" => request.want_stats = parse_flag(&key, last)?,
                "refreshCache" => request.refresh_cache = parse_flag(&key, last)?,
                "sortBy" => request.sort_by = Some(last.to_string()),
                "resourceId" => {
                    if !last.is_empty() {
                        request.resource_id = Some(last.to_string());
                    }
                }
                _ => {}
            }
        }

        if let Some(ParamValue::Single(id)) = request.params.get(&descriptor.primary_key) {
            request.resource_id = Some(id.clone());
        }
        if let Some(id) = request.resource_id.clone() {
            request = request.with_resource_id(descriptor, id);
        }

        for (key, value) in &request.params {
            let Some(column) = descriptor.column(key) else {
                continue;
            };
            for raw in value.values() {
                rules::coerce(column.rule.as_ref(), key, raw)?;
            }
        }

        Ok(request)
    }

    /// Turns the request into a single-record lookup and echoes the id under
    /// the primary-key name.
    pub fn with_resource_id(mut self, descriptor: &ResourceDescriptor, id: impl Into<String>) -> Self {
        let id = id.into();
        self.params
            .insert(descriptor.primary_key.clone(), ParamValue::Single(id.clone()));
        self.resource_id = Some(id);
        self
    }

    pub fn is_single_record(&self) -> bool {
        self.resource_id.is_some()
    }

    /// Parameters echoed back in the envelope: everything that is not a control flag.
    pub fn search_criteria(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.size)
    }
}

fn parse_int(param: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| Error::validation(param, format!("'{raw}' is not an integer")))
}

fn parse_flag(param: &str, raw: &str) -> Result<bool> {
    parse_bool(raw).ok_or_else(|| Error::validation(param, format!("'{raw}' is not a boolean")))
}
