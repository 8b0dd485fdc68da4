//! Response assembly: turns executed rows into the linked, paginated envelope.

use crate::cache_key::canonical_query;
use crate::descriptor::ResourceDescriptor;
use crate::request::{ParamValue, QueryRequest};
use crate::results::{QueryResults, Row};
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Href {
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: Href,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Href>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Href>,
}

/// A neighbouring page number, rendered as `""` when there is none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef(pub Option<u32>);

impl Serialize for PageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(page) => serializer.serialize_u32(page),
            None => serializer.serialize_str(""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageCursors {
    pub from: u64,
    pub to: u64,
    pub prevpage: PageRef,
    pub nextpage: PageRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "search-criteria")]
    pub search_criteria: BTreeMap<String, ParamValue>,
    #[serde(rename = "num-of-records")]
    pub num_of_records: u64,
    #[serde(rename = "_links")]
    pub links: Links,
    /// Multi-record envelopes only.
    #[serde(flatten)]
    pub cursors: Option<PageCursors>,
    pub records: Vec<Row>,
    #[serde(rename = "related-records", skip_serializing_if = "Option::is_none")]
    pub related_records: Option<BTreeMap<String, Vec<Row>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<BTreeMap<String, Vec<Row>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<BTreeMap<String, Vec<Row>>>,
}

impl ResponseEnvelope {
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Builds the envelope for `request` from executed `results`.
///
/// `base_url` is the absolute API root (for example `https://host/v2`); every
/// link in the envelope is built beneath it.
pub fn assemble(
    results: QueryResults,
    request: &QueryRequest,
    descriptor: &ResourceDescriptor,
    base_url: &str,
) -> ResponseEnvelope {
    let base_url = base_url.trim_end_matches('/');
    let resource_path = descriptor.path();
    let criteria = request.search_criteria();

    let criteria_pairs: Vec<(&str, &str)> = criteria
        .iter()
        .flat_map(|(k, v)| v.values().iter().map(move |v| (k.as_str(), v.as_str())))
        .collect();
    let self_link = Href {
        href: link(base_url, &resource_path, criteria_pairs.clone()),
    };

    let records: Vec<Row> = results
        .records
        .into_iter()
        .map(|row| with_self_link(row, base_url, &resource_path, &descriptor.primary_key))
        .collect();

    if request.is_single_record() {
        let related = results
            .related
            .into_iter()
            .map(|(name, rows)| {
                let rows = match descriptor.queries.related.iter().find(|r| r.name == name) {
                    Some(target) => {
                        let path = target.resource.to_ascii_lowercase();
                        rows.into_iter()
                            .map(|row| with_self_link(row, base_url, &path, &target.id_column))
                            .collect()
                    }
                    None => rows,
                };
                (name, rows)
            })
            .collect();

        return ResponseEnvelope {
            search_criteria: criteria.clone(),
            num_of_records: records.len() as u64,
            links: Links {
                self_link,
                prev: None,
                next: None,
            },
            cursors: None,
            records,
            related_records: Some(related),
            facets: None,
            stats: None,
        };
    }

    let page = request.page.max(1);
    let size = request.size;
    let returned = records.len() as u64;

    let from = u64::from(page - 1) * u64::from(size) + 1;
    let to = from + returned.min(u64::from(size)) - 1;
    let prevpage = page - 1;
    let nextpage = (returned >= u64::from(size)).then(|| page.saturating_add(1));

    let page_link = |target: u32| {
        let page = target.to_string();
        let size = size.to_string();
        let mut pairs = criteria_pairs.clone();
        pairs.push(("page", page.as_str()));
        pairs.push(("size", size.as_str()));
        Href {
            href: link(base_url, &resource_path, pairs),
        }
    };

    let has_records = results.num_of_records > 0;

    ResponseEnvelope {
        search_criteria: criteria.clone(),
        num_of_records: results.num_of_records,
        links: Links {
            self_link,
            prev: (prevpage > 0).then(|| page_link(prevpage)),
            next: nextpage.map(&page_link),
        },
        cursors: Some(PageCursors {
            from,
            to,
            prevpage: PageRef(Some(prevpage)),
            nextpage: PageRef(nextpage),
        }),
        records,
        related_records: None,
        facets: (request.want_facets && has_records).then_some(results.facets),
        stats: (request.want_stats && has_records).then_some(results.stats),
    }
}

fn link<'a>(base_url: &str, path: &str, pairs: Vec<(&'a str, &'a str)>) -> String {
    if pairs.is_empty() {
        return format!("{base_url}/{path}");
    }
    format!("{base_url}/{path}?{}", canonical_query(pairs))
}

/// Adds `_links.self` pointing at the record's own lookup URL, when the row
/// carries its id column.
fn with_self_link(mut row: Row, base_url: &str, path: &str, id_column: &str) -> Row {
    let id = match row.get(id_column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return row,
    };
    let href = link(base_url, path, vec![(id_column, id.as_str())]);
    row.insert("_links".to_string(), json!({ "self": { "href": href } }));
    row
}
