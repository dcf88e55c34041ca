//! SQL rendering for expanded statements.
//!
//! Converts a statement whose whitelisted parameters have all been
//! substituted into SQL text with driver placeholders.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ast::{Element, Statement};
use crate::error::{SheetError, SheetResult};
use crate::query::Query;

/// Placeholder dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placeholder {
    /// `$1`, numbered per distinct variable.
    #[default]
    Postgres,
    /// `?1`, numbered per distinct variable.
    Sqlite,
    /// `?` for every occurrence.
    Question,
    /// `:variable`.
    Named,
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::Postgres => write!(f, "postgres"),
            Placeholder::Sqlite => write!(f, "sqlite"),
            Placeholder::Question => write!(f, "question"),
            Placeholder::Named => write!(f, "named"),
        }
    }
}

impl FromStr for Placeholder {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Placeholder::Postgres),
            "sqlite" => Ok(Placeholder::Sqlite),
            "question" | "mysql" => Ok(Placeholder::Question),
            "named" => Ok(Placeholder::Named),
            other => Err(SheetError::Config(format!(
                "Unknown placeholder style '{}'. Expected: postgres, sqlite, question, or named",
                other
            ))),
        }
    }
}

/// SQL text plus the variables to bind, in bind order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub sql: String,
    pub binds: Vec<String>,
}

/// Trait for rendering nodes to SQL.
pub trait ToSql {
    /// Render to SQL with the given placeholder style.
    fn to_sql(&self, style: Placeholder) -> SheetResult<Rendered>;
}

impl ToSql for Statement {
    fn to_sql(&self, style: Placeholder) -> SheetResult<Rendered> {
        let mut sql = String::new();
        let mut binds: Vec<String> = Vec::new();

        for element in self.elements() {
            let param = match element {
                Element::Text(text) => {
                    sql.push_str(text);
                    continue;
                }
                Element::Param(p) if p.is_whitelisted() => {
                    return Err(SheetError::Unexpanded(p.variable.clone()));
                }
                Element::Param(p) => p,
            };

            match style {
                Placeholder::Question => {
                    sql.push('?');
                    binds.push(param.variable.clone());
                }
                Placeholder::Named => {
                    sql.push(':');
                    sql.push_str(&param.variable);
                    if !binds.contains(&param.variable) {
                        binds.push(param.variable.clone());
                    }
                }
                Placeholder::Postgres | Placeholder::Sqlite => {
                    let n = match binds.iter().position(|b| *b == param.variable) {
                        Some(i) => i + 1,
                        None => {
                            binds.push(param.variable.clone());
                            binds.len()
                        }
                    };
                    let prefix = if style == Placeholder::Postgres { '$' } else { '?' };
                    sql.push(prefix);
                    sql.push_str(&n.to_string());
                }
            }
        }

        Ok(Rendered { sql, binds })
    }
}

impl ToSql for Query {
    fn to_sql(&self, style: Placeholder) -> SheetResult<Rendered> {
        self.statement().to_sql(style)
    }
}
