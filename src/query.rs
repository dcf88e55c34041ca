//! Named query definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::args::ArgSpec;
use crate::ast::Statement;
use crate::error::{DefinitionError, SheetError, SheetResult};
use crate::ident::to_ident;

/// Docstring used when a definition has no doc lines.
pub const DEFAULT_DOCSTRING: &str = "No documentation provided.";

/// Header annotation changing the calling convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Annotation {
    /// The query assigns a value rather than retrieving rows.
    Setter,
}

/// How a code generator should expose a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallSpec {
    Plain(String),
    Setter(String),
}

impl CallSpec {
    pub fn new(id: String, annotation: Option<Annotation>) -> Self {
        match annotation {
            Some(Annotation::Setter) => CallSpec::Setter(id),
            None => CallSpec::Plain(id),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            CallSpec::Plain(id) | CallSpec::Setter(id) => id,
        }
    }

    pub fn is_setter(&self) -> bool {
        matches!(self, CallSpec::Setter(_))
    }
}

impl fmt::Display for CallSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallSpec::Plain(id) => write!(f, "{}", id),
            CallSpec::Setter(id) => write!(f, "{} (setter)", id),
        }
    }
}

/// A named, documented statement with its derived calling convention.
///
/// Construction validates the definition; after that a query is never
/// mutated. Whitelist expansion derives copies with substituted statements
/// that keep the original's `id` and `args`. Deserialization goes through
/// [`Query::new`], so serialized `id` and `args` are re-derived, not trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuerySource")]
pub struct Query {
    name: String,
    annotation: Option<Annotation>,
    docstring: Option<String>,
    statement: Statement,
    id: String,
    args: ArgSpec,
}

/// The written parts of a query.
#[derive(Deserialize)]
struct QuerySource {
    name: String,
    annotation: Option<Annotation>,
    docstring: Option<String>,
    statement: Statement,
}

impl TryFrom<QuerySource> for Query {
    type Error = SheetError;

    fn try_from(source: QuerySource) -> SheetResult<Self> {
        Query::new(source.name, source.annotation, source.docstring, source.statement)
    }
}

impl Query {
    pub fn new(
        name: impl Into<String>,
        annotation: Option<Annotation>,
        docstring: Option<String>,
        statement: Statement,
    ) -> SheetResult<Self> {
        let name = name.into();
        let fail = |source: DefinitionError| SheetError::definition(name.as_str(), source);

        let id = to_ident(&name).ok_or_else(|| fail(DefinitionError::InvalidName { name: name.clone() }))?;

        for param in statement.parameters() {
            param.validate().map_err(fail)?;
        }

        let args = ArgSpec::derive(&statement).map_err(fail)?;

        if annotation == Some(Annotation::Setter) && args.positional.len() < 2 {
            return Err(fail(DefinitionError::SetterArity {
                found: args.positional.len(),
            }));
        }

        Ok(Self {
            name,
            annotation,
            docstring,
            statement,
            id,
            args,
        })
    }

    /// The name as written in the file.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotation(&self) -> Option<Annotation> {
        self.annotation
    }

    /// The doc lines, or [`DEFAULT_DOCSTRING`].
    pub fn docstring(&self) -> &str {
        self.docstring_or(DEFAULT_DOCSTRING)
    }

    pub fn docstring_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.docstring.as_deref().unwrap_or(fallback)
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// The normalized identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn args(&self) -> &ArgSpec {
        &self.args
    }

    /// Positional variables, then keyword variables.
    pub fn vars(&self) -> Vec<&str> {
        self.args.variables().collect()
    }

    pub fn call_spec(&self) -> CallSpec {
        CallSpec::new(self.id.clone(), self.annotation)
    }

    pub fn is_setter(&self) -> bool {
        self.annotation == Some(Annotation::Setter)
    }

    /// A copy differing only in its statement.
    pub fn with_statement(&self, statement: Statement) -> Query {
        Query {
            statement,
            ..self.clone()
        }
    }
}
