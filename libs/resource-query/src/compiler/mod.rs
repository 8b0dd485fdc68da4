//! Query compiler: turns a resource descriptor and a request into the family of
//! parameterized statements needed to answer it.
//!
//! Compilation is pure. Every statement is built from fresh clause lists; the
//! shared descriptor is only read.

pub mod bind;
mod sort;

pub use bind::{logged, placeholders, positional, BindParams, BindValue};
pub use sort::{resolve_sort, ResolvedSort};

use crate::descriptor::{QueryMode, QueryTemplate, ResourceDescriptor};
use crate::request::QueryRequest;
use crate::rules;
use crate::{Error, Result};
use serde::Serialize;

/// Target of the per-row links attached to a statement's rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordLink {
    pub resource: String,
    pub id_column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledStatement {
    /// SQL with `@name` placeholders.
    pub sql: String,
    /// `sql` with literal values substituted. Diagnostics only.
    pub logged: String,
    /// Exactly the parameters `sql` references.
    pub params: BindParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<RecordLink>,
}

impl CompiledStatement {
    /// SQL and values in the numbered form the store executes.
    pub fn positional(&self) -> Result<(String, Vec<BindValue>)> {
        positional(&self.sql, &self.params)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedStatement {
    pub name: String,
    pub statement: CompiledStatement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuerySet {
    pub resource: String,
    pub primary_key: String,
    /// Absent on the single-record path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<CompiledStatement>,
    pub data: CompiledStatement,
    pub related: Vec<NamedStatement>,
    pub facets: Vec<NamedStatement>,
    pub stats: Vec<NamedStatement>,
}

impl CompiledQuerySet {
    pub fn is_single_record(&self) -> bool {
        self.count.is_none()
    }

    /// Every statement with a `kind` or `kind.name` label, in execution order.
    pub fn statements(&self) -> Vec<(String, &CompiledStatement)> {
        let mut out = Vec::new();
        if let Some(count) = &self.count {
            out.push(("count".to_string(), count));
        }
        out.push(("data".to_string(), &self.data));
        for (kind, group) in [
            ("related", &self.related),
            ("facets", &self.facets),
            ("stats", &self.stats),
        ] {
            for named in group {
                out.push((format!("{kind}.{}", named.name), &named.statement));
            }
        }
        out
    }
}

/// Predicates, joins and values derived from the request parameters.
#[derive(Debug, Default)]
struct Filter {
    joins: Vec<String>,
    predicates: Vec<String>,
    params: BindParams,
}

/// Clauses for one statement beyond what its template declares.
struct Clauses<'a> {
    joins: &'a [String],
    predicates: &'a [String],
    order_by: Option<String>,
    paginate: bool,
    link: Option<RecordLink>,
}

pub fn compile(descriptor: &ResourceDescriptor, request: &QueryRequest) -> Result<CompiledQuerySet> {
    let compiled = match &request.resource_id {
        Some(id) => compile_single(descriptor, id)?,
        None => compile_many(descriptor, request)?,
    };

    tracing::trace!(
        resource = %descriptor.name,
        statements = compiled.statements().len(),
        "Compiled query set"
    );

    Ok(compiled)
}

fn compile_single(descriptor: &ResourceDescriptor, id: &str) -> Result<CompiledQuerySet> {
    let pk = descriptor.primary_key_column().ok_or_else(|| {
        Error::compile(&descriptor.name, "primary key column is not declared")
    })?;

    let mut params = BindParams::new();
    let value = rules::coerce(pk.rule.as_ref(), &pk.name, id)
        .map_err(|e| Error::compile(&descriptor.name, e.to_string()))?;
    params.insert(pk.name.clone(), value);

    let predicates = vec![format!("{} = @{}", pk.sql_expr(), pk.name)];
    let data = build_statement(
        descriptor,
        &descriptor.queries.data,
        Clauses {
            joins: &[],
            predicates: &predicates,
            order_by: None,
            paginate: false,
            link: None,
        },
        &params,
    )?;

    let related = descriptor
        .queries
        .related
        .iter()
        .map(|related| {
            let statement = build_statement(
                descriptor,
                &related.template,
                Clauses {
                    joins: &[],
                    predicates: &[],
                    order_by: related.template.order_by.clone(),
                    paginate: false,
                    link: Some(RecordLink {
                        resource: related.resource.clone(),
                        id_column: related.id_column.clone(),
                    }),
                },
                &params,
            )?;
            Ok(NamedStatement {
                name: related.name.clone(),
                statement,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CompiledQuerySet {
        resource: descriptor.name.clone(),
        primary_key: descriptor.primary_key.clone(),
        count: None,
        data,
        related,
        facets: Vec::new(),
        stats: Vec::new(),
    })
}

fn compile_many(descriptor: &ResourceDescriptor, request: &QueryRequest) -> Result<CompiledQuerySet> {
    let filter = build_filter(descriptor, request)?;
    let queries = &descriptor.queries;

    let count = build_statement(
        descriptor,
        &queries.count,
        Clauses {
            joins: &filter.joins,
            predicates: &filter.predicates,
            order_by: None,
            paginate: false,
            link: None,
        },
        &filter.params,
    )?;

    let order_by = match &queries.data.sort {
        Some(spec) => Some(resolve_sort(spec, request.sort_by.as_deref()).order_by(descriptor)),
        None => queries.data.order_by.clone(),
    };

    let mut data_params = filter.params.clone();
    if queries.data.paginated {
        data_params.insert("limit".to_string(), BindValue::Integer(i64::from(request.size)));
        data_params.insert(
            "offset".to_string(),
            BindValue::Integer(i64::try_from(request.offset()).unwrap_or(i64::MAX)),
        );
    }

    let data = build_statement(
        descriptor,
        &queries.data,
        Clauses {
            joins: &filter.joins,
            predicates: &filter.predicates,
            order_by,
            paginate: queries.data.paginated,
            link: None,
        },
        &data_params,
    )?;

    let aggregate = |templates: &[crate::descriptor::NamedTemplate]| {
        templates
            .iter()
            .map(|named| {
                let statement = build_statement(
                    descriptor,
                    &named.template,
                    Clauses {
                        joins: &filter.joins,
                        predicates: &filter.predicates,
                        order_by: named.template.order_by.clone(),
                        paginate: false,
                        link: None,
                    },
                    &filter.params,
                )?;
                Ok(NamedStatement {
                    name: named.name.clone(),
                    statement,
                })
            })
            .collect::<Result<Vec<_>>>()
    };

    let facets = if request.want_facets {
        aggregate(&queries.facets)?
    } else {
        Vec::new()
    };
    let stats = if request.want_stats {
        aggregate(&queries.stats)?
    } else {
        Vec::new()
    };

    Ok(CompiledQuerySet {
        resource: descriptor.name.clone(),
        primary_key: descriptor.primary_key.clone(),
        count: Some(count),
        data,
        related: Vec::new(),
        facets,
        stats,
    })
}

fn build_filter(descriptor: &ResourceDescriptor, request: &QueryRequest) -> Result<Filter> {
    let mut filter = Filter::default();

    for (name, value) in &request.params {
        let Some(column) = descriptor.column(name) else {
            continue;
        };
        if column.query_mode == QueryMode::None {
            continue;
        }

        let mut alternatives = Vec::new();
        for (i, raw) in value.values().iter().enumerate() {
            let param = if i == 0 {
                name.clone()
            } else {
                format!("{name}__{}", i + 1)
            };

            let value = rules::coerce(column.rule.as_ref(), name, raw)
                .map_err(|e| Error::compile(&descriptor.name, e.to_string()))?;

            let predicate = match column.query_mode {
                QueryMode::Equal => {
                    filter.params.insert(param.clone(), value);
                    format!("{} = @{param}", column.sql_expr())
                }
                QueryMode::Like => {
                    filter
                        .params
                        .insert(param.clone(), BindValue::Text(format!("{value}%")));
                    format!("{} LIKE @{param}", column.sql_expr())
                }
                QueryMode::FulltextMatch => {
                    let fulltext = column.fulltext.as_ref().ok_or_else(|| {
                        Error::compile(
                            &descriptor.name,
                            format!("column '{name}' has no full-text table"),
                        )
                    })?;
                    let join = fulltext.join_clause();
                    if !filter.joins.contains(&join) {
                        filter.joins.push(join);
                    }
                    filter.params.insert(param.clone(), value);
                    format!("{} MATCH @{param}", fulltext.column)
                }
                QueryMode::None => continue,
            };
            alternatives.push(predicate);
        }

        match alternatives.len() {
            0 => {}
            1 => filter.predicates.append(&mut alternatives),
            _ => filter
                .predicates
                .push(format!("({})", alternatives.join(" OR "))),
        }
    }

    Ok(filter)
}

fn build_statement(
    descriptor: &ResourceDescriptor,
    template: &QueryTemplate,
    clauses: Clauses<'_>,
    available: &BindParams,
) -> Result<CompiledStatement> {
    let mut from: Vec<&str> = template.from.iter().map(String::as_str).collect();
    for join in clauses.joins {
        if !from.contains(&join.as_str()) {
            from.push(join.as_str());
        }
    }

    let mut sql = format!("SELECT {} FROM {}", template.select.join(", "), from.join(" "));

    let predicates: Vec<&str> = template
        .constraints
        .iter()
        .chain(clauses.predicates.iter())
        .map(String::as_str)
        .collect();
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }

    if let Some(group_by) = &template.group_by {
        sql.push_str(" GROUP BY ");
        sql.push_str(group_by);
    }
    if let Some(order_by) = &clauses.order_by {
        sql.push_str(" ORDER BY ");
        sql.push_str(order_by);
    }
    if clauses.paginate {
        sql.push_str(" LIMIT @limit OFFSET @offset");
    }

    let mut params = BindParams::new();
    for name in placeholders(&sql) {
        let value = available.get(&name).cloned().ok_or_else(|| {
            Error::compile(
                &descriptor.name,
                format!("statement references unbound parameter '@{name}'"),
            )
        })?;
        params.insert(name, value);
    }

    let logged = logged(&sql, &params);

    Ok(CompiledStatement {
        sql,
        logged,
        params,
        link: clauses.link,
    })
}
