use anyhow::{bail, Context, Result};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use zenodeo_query::{
    compile, CacheKey, CompiledStatement, Paging, QueryMode, QueryRequest, ResourceCatalog,
};

pub fn load_catalog(path: Option<&Path>) -> Result<Arc<ResourceCatalog>> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading resource descriptors");
            let catalog = ResourceCatalog::from_path(path)
                .with_context(|| format!("Failed to load descriptors from {}", path.display()))?;
            Ok(Arc::new(catalog))
        }
        None => ResourceCatalog::builtin().context("Failed to load builtin descriptors"),
    }
}

/// Splits `key=value` arguments. Values may themselves contain `=`.
pub fn parse_pairs(args: &[String]) -> Result<Vec<(String, String)>> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => bail!("Expected key=value, got '{arg}'"),
        })
        .collect()
}

pub fn resources(catalog: &ResourceCatalog) -> String {
    let mut out = String::new();
    for descriptor in catalog.iter() {
        let _ = writeln!(out, "{} (/{})", descriptor.name, descriptor.path());
        if let Some(summary) = &descriptor.summary {
            let _ = writeln!(out, "  {summary}");
        }
        let _ = writeln!(out, "  primary key: {}", descriptor.primary_key);

        for column in &descriptor.columns {
            let mode = match column.query_mode {
                QueryMode::None => continue,
                QueryMode::Equal => "equal",
                QueryMode::Like => "prefix",
                QueryMode::FulltextMatch => "fulltext",
            };
            let sortable = if column.sortable { ", sortable" } else { "" };
            let _ = writeln!(out, "    {} ({mode}{sortable})", column.name);
        }

        let queries = &descriptor.queries;
        let groups = [
            ("related", queries.related.iter().map(|r| r.name.as_str()).collect::<Vec<_>>()),
            ("facets", queries.facets.iter().map(|f| f.name.as_str()).collect()),
            ("stats", queries.stats.iter().map(|s| s.name.as_str()).collect()),
        ];
        for (group, names) in groups {
            if !names.is_empty() {
                let _ = writeln!(out, "  {group}: {}", names.join(", "));
            }
        }
    }
    out.trim_end().to_string()
}

pub fn validate(catalog: &ResourceCatalog) -> String {
    let names: Vec<&str> = catalog.iter().map(|d| d.name.as_str()).collect();
    format!("ok: {} resources ({})", names.len(), names.join(", "))
}

/// Compiles a request and renders each statement, labelled and in execution order.
pub fn explain(
    catalog: &ResourceCatalog,
    resource: &str,
    pairs: &[(String, String)],
    page_size: u32,
    placeholders: bool,
) -> Result<String> {
    let descriptor = catalog.require(resource)?;
    let defaults = Paging::default();
    let paging = Paging {
        default_size: page_size,
        max_size: defaults.max_size.max(page_size),
    };

    let request = QueryRequest::parse(
        &descriptor,
        pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        &paging,
    )?;
    let compiled = compile(&descriptor, &request)?;

    let mut out = String::new();
    let _ = writeln!(out, "-- cache key: {}", CacheKey::for_request(&request));
    for (label, statement) in compiled.statements() {
        let _ = writeln!(out, "\n-- {label}");
        let _ = writeln!(out, "{};", render(statement, placeholders));
        if placeholders && !statement.params.is_empty() {
            let bound: Vec<String> = statement
                .params
                .iter()
                .map(|(name, value)| format!("@{name} = {}", value.literal()))
                .collect();
            let _ = writeln!(out, "-- params: {}", bound.join(", "));
        }
    }
    Ok(out.trim_end().to_string())
}

fn render(statement: &CompiledStatement, placeholders: bool) -> &str {
    if placeholders {
        &statement.sql
    } else {
        &statement.logged
    }
}
