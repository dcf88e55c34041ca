//! # sqlsheet: named SQL statements as callables
//!
//! sqlsheet reads text files of named SQL statements, derives each one's
//! calling convention from its parameter markers, and pre-renders every
//! variant of statements whose parameters must be spliced into the SQL text.
//! It never talks to a database.
//!
//! ## Quick Example
//!
//! ```rust
//! use sqlsheet::prelude::*;
//!
//! let query = sqlsheet::parse_one(
//!     "-- name: list-users\nSELECT * FROM users WHERE role = :role ORDER BY :col{name,created_at}\n",
//! )?;
//! assert_eq!(query.id(), "list_users");
//!
//! let callable = Callable::new(&query);
//! let inv = callable.call(
//!     &CallArgs::new().kwarg("role", "admin").kwarg("col", "name"),
//!     Placeholder::Postgres,
//! )?;
//! assert_eq!(inv.sql, "SELECT * FROM users WHERE role = $1 ORDER BY name");
//! # Ok::<(), sqlsheet::SheetError>(())
//! ```
//!
//! ## Markers
//!
//! | Marker            | Meaning                                      |
//! |-------------------|----------------------------------------------|
//! | `-- name: x`      | Starts a definition                          |
//! | `@setter`         | Header annotation: assigns, needs 2+ `?args` |
//! | `:var`            | Keyword parameter                            |
//! | `?var`            | Positional parameter                         |
//! | `{a,b}`           | Whitelist, spliced verbatim                  |

pub mod args;
pub mod ast;
pub mod codegen;
pub mod config;
pub mod error;
pub mod expand;
pub mod ident;
pub mod parser;
pub mod query;
pub mod transpiler;

pub use error::{DefinitionError, SheetError, SheetResult};
pub use parser::{parse_all, parse_each, parse_one, scan_names};

pub mod prelude {
    pub use crate::args::{ArgDefault, ArgSpec, Bindings, CallArgs, KeywordArg};
    pub use crate::ast::*;
    pub use crate::codegen::{Callable, Generator, Invocation, StaticSql};
    pub use crate::config::SheetConfig;
    pub use crate::error::*;
    pub use crate::expand::{QueryTree, build_query_tree, check_fully_expanded};
    pub use crate::parser::{parse_all, parse_each, parse_one, scan_names};
    pub use crate::query::{Annotation, CallSpec, DEFAULT_DOCSTRING, Query};
    pub use crate::transpiler::{Placeholder, Rendered, ToSql};
}

/// Read and parse a sheet file.
pub fn parse_file(path: impl AsRef<std::path::Path>) -> SheetResult<Vec<query::Query>> {
    let content = std::fs::read_to_string(path)?;
    parse_all(&content)
}
