//! Resource descriptors: the declarative, per-resource description that drives
//! query compilation and response assembly.
//!
//! Descriptors are loaded once at startup, validated, and then shared immutably
//! between requests. A catalog that fails validation is never partially used.

use crate::compiler::bind::placeholders;
use crate::request::is_reserved;
use crate::rules::ValueRule;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

static BUILTIN_DESCRIPTORS: &str = include_str!("../resources/descriptors.json");

static BUILTIN_CATALOG: Lazy<std::result::Result<Arc<ResourceCatalog>, String>> =
    Lazy::new(|| {
        ResourceCatalog::from_json(BUILTIN_DESCRIPTORS)
            .map(Arc::new)
            .map_err(|e| e.to_string())
    });

/// How a column may be constrained by a query parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryMode {
    #[default]
    None,
    Equal,
    Like,
    FulltextMatch,
}

/// Virtual full-text table paired with a `fulltextMatch` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulltextSpec {
    /// Virtual table joined into the statement when the column is constrained.
    pub table: String,
    /// Left-hand side of the `MATCH` predicate.
    pub column: String,
    /// Join condition between the resource table and the virtual table.
    pub join_on: String,
}

impl FulltextSpec {
    pub fn join_clause(&self) -> String {
        format!("JOIN {} ON {}", self.table, self.join_on)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub name: String,
    /// SQL expression used in predicates and ORDER BY. Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(default)]
    pub query_mode: QueryMode,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulltext: Option<FulltextSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<ValueRule>,
}

impl ColumnSpec {
    pub fn sql_expr(&self) -> &str {
        self.expr.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Accepts exactly `asc` or `desc`, in any case.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    /// Column names that may appear in `sortBy`.
    pub columns: Vec<String>,
    pub default_column: String,
    pub default_direction: SortDirection,
}

/// SQL fragments for one query kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTemplate {
    pub select: Vec<String>,
    /// Base table followed by join clauses; later joins may use earlier aliases.
    pub from: Vec<String>,
    /// Always-applied predicates, placed before parameter-derived ones.
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    /// Fixed ordering for templates without a sort spec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default)]
    pub paginated: bool,
}

impl QueryTemplate {
    fn fragments(&self) -> impl Iterator<Item = &str> {
        self.select
            .iter()
            .chain(self.from.iter())
            .chain(self.constraints.iter())
            .map(String::as_str)
            .chain(self.group_by.as_deref())
            .chain(self.order_by.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedTemplate {
    pub name: String,
    #[serde(flatten)]
    pub template: QueryTemplate,
}

/// Records related to a single looked-up record, linked by their own id column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedTemplate {
    pub name: String,
    /// Resource the related rows link to.
    pub resource: String,
    pub id_column: String,
    #[serde(flatten)]
    pub template: QueryTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTemplates {
    pub count: QueryTemplate,
    pub data: QueryTemplate,
    #[serde(default)]
    pub related: Vec<RelatedTemplate>,
    #[serde(default)]
    pub facets: Vec<NamedTemplate>,
    #[serde(default)]
    pub stats: Vec<NamedTemplate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub primary_key: String,
    pub columns: Vec<ColumnSpec>,
    pub queries: QueryTemplates,
}

impl ResourceDescriptor {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The primary-key column. Validated descriptors always have one.
    pub fn primary_key_column(&self) -> Option<&ColumnSpec> {
        self.column(&self.primary_key)
    }

    /// URL path segment for the resource.
    pub fn path(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// Checks the structural invariants the compiler relies on.
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| Err(Error::descriptor(&self.name, message));

        if self.name.trim().is_empty() {
            return Err(Error::descriptor("<unnamed>", "resource name is empty"));
        }
        if self.columns.is_empty() {
            return fail("no columns declared".to_string());
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !is_identifier(&column.name) {
                return fail(format!(
                    "column name '{}' is not a valid parameter name",
                    column.name
                ));
            }
            if is_reserved(&column.name) {
                return fail(format!(
                    "column name '{}' collides with a reserved parameter",
                    column.name
                ));
            }
            if !seen.insert(column.name.as_str()) {
                return fail(format!("duplicate column '{}'", column.name));
            }
            match (column.query_mode, &column.fulltext) {
                (QueryMode::FulltextMatch, None) => {
                    return fail(format!(
                        "column '{}' is full-text queryable but declares no full-text table",
                        column.name
                    ));
                }
                (QueryMode::FulltextMatch, Some(_)) => {}
                (_, Some(_)) => {
                    return fail(format!(
                        "column '{}' declares a full-text table but is not full-text queryable",
                        column.name
                    ));
                }
                _ => {}
            }
            if column.query_mode == QueryMode::Like
                && column.rule.as_ref().is_some_and(|r| !r.is_textual())
            {
                return fail(format!(
                    "column '{}' is prefix-matched but its rule is not textual",
                    column.name
                ));
            }
        }

        match self.primary_key_column() {
            None => {
                return fail(format!(
                    "primary key '{}' is not a declared column",
                    self.primary_key
                ))
            }
            Some(pk) if pk.query_mode != QueryMode::Equal => {
                return fail(format!(
                    "primary key '{}' must be equal-queryable",
                    self.primary_key
                ))
            }
            Some(_) => {}
        }

        let queries = &self.queries;
        self.validate_template("count", &queries.count, &[])?;
        if queries.count.paginated {
            return fail("count template cannot be paginated".to_string());
        }

        let data_params: &[&str] = if queries.data.paginated {
            &["limit", "offset"]
        } else {
            &[]
        };
        self.validate_template("data", &queries.data, data_params)?;
        if let Some(sort) = &queries.data.sort {
            self.validate_sort(sort)?;
        }

        let pk = [self.primary_key.as_str()];
        let mut names = HashSet::new();
        for related in &queries.related {
            if !names.insert(related.name.as_str()) {
                return fail(format!("duplicate related query '{}'", related.name));
            }
            if related.resource.trim().is_empty() || related.id_column.trim().is_empty() {
                return fail(format!(
                    "related query '{}' must name a resource and an id column",
                    related.name
                ));
            }
            self.validate_template(&format!("related.{}", related.name), &related.template, &pk)?;
        }

        for (group, templates) in [("facets", &queries.facets), ("stats", &queries.stats)] {
            let mut names = HashSet::new();
            for named in templates {
                if !names.insert(named.name.as_str()) {
                    return fail(format!("duplicate {group} query '{}'", named.name));
                }
                let kind = format!("{group}.{}", named.name);
                self.validate_template(&kind, &named.template, &[])?;
                if group == "facets" && named.template.group_by.is_none() {
                    return fail(format!("{kind} must declare groupBy"));
                }
            }
        }

        Ok(())
    }

    fn validate_template(
        &self,
        kind: &str,
        template: &QueryTemplate,
        allowed_params: &[&str],
    ) -> Result<()> {
        let fail = |message: String| Err(Error::descriptor(&self.name, message));

        if template.select.is_empty() {
            return fail(format!("{kind} template selects nothing"));
        }
        if template.from.is_empty() {
            return fail(format!("{kind} template has no from clause"));
        }
        if template.sort.is_some() && kind != "data" {
            return fail(format!("{kind} template cannot declare a sort spec"));
        }
        if template.group_by.is_some() && !kind.starts_with("facets.") {
            return fail(format!("{kind} template cannot declare groupBy"));
        }
        if template.paginated && kind != "data" {
            return fail(format!("{kind} template cannot be paginated"));
        }

        for fragment in template.fragments() {
            for name in placeholders(fragment) {
                if !allowed_params.contains(&name.as_str()) {
                    return fail(format!(
                        "{kind} template references '@{name}', which is never bound for it"
                    ));
                }
            }
        }

        Ok(())
    }

    fn validate_sort(&self, sort: &SortSpec) -> Result<()> {
        let fail = |message: String| Err(Error::descriptor(&self.name, message));

        for name in &sort.columns {
            match self.column(name) {
                None => return fail(format!("sort column '{name}' is not a declared column")),
                Some(column) if !column.sortable => {
                    return fail(format!("sort column '{name}' is not sortable"))
                }
                Some(_) => {}
            }
        }
        if !sort.columns.contains(&sort.default_column) {
            return fail(format!(
                "default sort column '{}' is not in the allowed sort columns",
                sort.default_column
            ));
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The validated set of resource descriptors served by a process.
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    resources: Vec<Arc<ResourceDescriptor>>,
    by_name: HashMap<String, usize>,
}

impl ResourceCatalog {
    /// Builds a catalog, validating every descriptor and the uniqueness of names.
    pub fn new(descriptors: Vec<ResourceDescriptor>) -> Result<Self> {
        let mut resources = Vec::with_capacity(descriptors.len());
        let mut by_name = HashMap::with_capacity(descriptors.len());

        for descriptor in descriptors {
            descriptor.validate()?;
            let key = descriptor.name.to_ascii_lowercase();
            if by_name.contains_key(&key) {
                return Err(Error::descriptor(
                    &descriptor.name,
                    "resource name declared more than once",
                ));
            }
            by_name.insert(key, resources.len());
            resources.push(Arc::new(descriptor));
        }

        tracing::debug!(resources = resources.len(), "Resource catalog loaded");

        Ok(Self { resources, by_name })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let descriptors: Vec<ResourceDescriptor> = serde_json::from_str(json)?;
        Self::new(descriptors)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// The descriptors shipped with the crate.
    pub fn builtin() -> Result<Arc<Self>> {
        BUILTIN_CATALOG
            .as_ref()
            .map(Arc::clone)
            .map_err(|message| Error::descriptor("<builtin>", message.as_str()))
    }

    /// Case-insensitive lookup by resource name.
    pub fn get(&self, name: &str) -> Option<Arc<ResourceDescriptor>> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .map(|&i| Arc::clone(&self.resources[i]))
    }

    pub fn require(&self, name: &str) -> Result<Arc<ResourceDescriptor>> {
        self.get(name)
            .ok_or_else(|| Error::UnknownResource(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceDescriptor>> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
