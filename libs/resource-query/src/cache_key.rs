//! Canonical cache keys for query requests.

use crate::request::QueryRequest;
use std::fmt;

/// Key under which an assembled envelope is cached.
///
/// Requests that differ only in parameter order, in `refreshCache`, or in
/// spelling a default control value explicitly share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    /// One namespace per resource.
    pub segment: String,
    pub query: String,
}

impl CacheKey {
    pub fn for_request(request: &QueryRequest) -> Self {
        let page = request.page.to_string();
        let size = request.size.to_string();
        let facets = request.want_facets.to_string();
        let stats = request.want_stats.to_string();

        let mut pairs: Vec<(&str, &str)> = request
            .params
            .iter()
            .flat_map(|(k, v)| v.values().iter().map(move |v| (k.as_str(), v.as_str())))
            .collect();
        pairs.push(("page", page.as_str()));
        pairs.push(("size", size.as_str()));
        pairs.push(("facets", facets.as_str()));
        pairs.push(("stats", stats.as_str()));
        if let Some(sort_by) = request.sort_by.as_deref() {
            pairs.push(("sortBy", sort_by));
        }

        Self {
            segment: request.resource.clone(),
            query: canonical_query(pairs),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?{}", self.segment, self.query)
    }
}

/// Form-urlencodes `pairs` sorted by key. Values of a repeated key keep their order.
pub fn canonical_query<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = pairs.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        serializer.append_pair(k, v);
    }
    serializer.finish()
}
