use crate::descriptor::{ResourceDescriptor, SortDirection, SortSpec};

/// The sort actually applied to a data statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSort {
    pub column: String,
    pub direction: SortDirection,
}

impl ResolvedSort {
    pub fn order_by(&self, descriptor: &ResourceDescriptor) -> String {
        let expr = descriptor
            .column(&self.column)
            .map(|c| c.sql_expr())
            .unwrap_or(&self.column);
        format!("{expr} {}", self.direction)
    }
}

/// Resolves `sortBy=column:direction` against the allowed sort columns.
///
/// Column and direction fall back to their defaults independently, so
/// `sortBy=bogus:desc` keeps the descending direction.
pub fn resolve_sort(spec: &SortSpec, sort_by: Option<&str>) -> ResolvedSort {
    let (requested_column, requested_direction) = match sort_by {
        Some(raw) => match raw.split_once(':') {
            Some((column, direction)) => (column.trim(), Some(direction.trim())),
            None => (raw.trim(), None),
        },
        None => ("", None),
    };

    let column = spec
        .columns
        .iter()
        .find(|c| c.as_str() == requested_column)
        .unwrap_or(&spec.default_column)
        .clone();

    let direction = requested_direction
        .and_then(SortDirection::parse)
        .unwrap_or(spec.default_direction);

    ResolvedSort { column, direction }
}
