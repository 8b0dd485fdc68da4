//! Query construction and response assembly for the Zenodeo gateway.
//!
//! A [`ResourceDescriptor`] declares, per resource, which columns may be
//! queried and how, plus the SQL fragments for each query kind. From a
//! descriptor and a parsed [`QueryRequest`] the [`compile`] step produces a
//! [`CompiledQuerySet`]; once executed, [`assemble`] turns the rows into the
//! linked, paginated [`ResponseEnvelope`].
//!
//! ```
//! use zenodeo_query::{compile, Paging, QueryRequest, ResourceCatalog};
//!
//! let catalog = ResourceCatalog::builtin().unwrap();
//! let treatments = catalog.require("treatments").unwrap();
//! let request = QueryRequest::parse(
//!     &treatments,
//!     [("journalYear", "1999"), ("sortBy", "journalYear:ASC")],
//!     &Paging::default(),
//! )
//! .unwrap();
//! let compiled = compile(&treatments, &request).unwrap();
//! assert!(compiled.data.sql.ends_with("ORDER BY journalYear ASC LIMIT @limit OFFSET @offset"));
//! ```

pub mod cache_key;
pub mod compiler;
pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod request;
pub mod results;
pub mod rules;

pub use cache_key::{canonical_query, CacheKey};
pub use compiler::{
    compile, BindParams, BindValue, CompiledQuerySet, CompiledStatement, NamedStatement,
    RecordLink,
};
pub use descriptor::{
    ColumnSpec, FulltextSpec, NamedTemplate, QueryMode, QueryTemplate, QueryTemplates,
    RelatedTemplate, ResourceCatalog, ResourceDescriptor, SortDirection, SortSpec,
};
pub use envelope::{assemble, Href, Links, PageCursors, PageRef, ResponseEnvelope};
pub use error::{Error, Result};
pub use request::{is_reserved, ParamValue, Paging, QueryRequest, RESERVED_PARAMS};
pub use results::{QueryResults, Row, StatementFailure, StatementKind};
pub use rules::ValueRule;
