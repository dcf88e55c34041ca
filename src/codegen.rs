//! Callables built from queries.
//!
//! A [`Callable`] is the runtime form of a query: bind arguments, dispatch
//! whitelisted values to the matching expansion, render SQL. [`Generator`]
//! writes the same dispatch out as Rust source for a build step.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Write as _;

use crate::args::{ArgDefault, ArgSpec, CallArgs};
use crate::config::SheetConfig;
use crate::error::{DefinitionError, SheetError, SheetResult};
use crate::expand::{QueryTree, build_query_tree};
use crate::query::{CallSpec, Query};
use crate::transpiler::{Placeholder, ToSql};

/// SQL text and the values to bind, ready for a driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    pub sql: String,
    pub params: Vec<Value>,
}

/// What generated functions return: the SQL and the variables to bind, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticSql {
    pub sql: &'static str,
    pub binds: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Callable {
    spec: CallSpec,
    docstring: String,
    args: ArgSpec,
    tree: QueryTree,
}

impl Callable {
    pub fn new(query: &Query) -> Self {
        Self {
            spec: query.call_spec(),
            docstring: query.docstring().to_string(),
            args: query.args().clone(),
            tree: build_query_tree(query, |_| {}),
        }
    }

    pub fn spec(&self) -> &CallSpec {
        &self.spec
    }

    pub fn docstring(&self) -> &str {
        &self.docstring
    }

    pub fn args(&self) -> &ArgSpec {
        &self.args
    }

    pub fn tree(&self) -> &QueryTree {
        &self.tree
    }

    /// Number of pre-rendered variants.
    pub fn expansions(&self) -> usize {
        self.tree.len()
    }

    /// Bind `args`, pick the expansion and render it.
    pub fn call(&self, args: &CallArgs, style: Placeholder) -> SheetResult<Invocation> {
        let bindings = self.args.bind(args)?;
        let query = self.tree.select(&bindings)?;
        let rendered = query.to_sql(style)?;

        let params = rendered
            .binds
            .iter()
            .map(|var| {
                bindings
                    .get(var)
                    .cloned()
                    .ok_or_else(|| SheetError::MissingRequiredArgument(var.clone()))
            })
            .collect::<SheetResult<Vec<_>>>()?;

        tracing::debug!("Calling {} with {} bound value(s)", self.spec, params.len());
        Ok(Invocation {
            sql: rendered.sql,
            params,
        })
    }
}

/// Emits a Rust module with one function per query.
///
/// Each function takes the whitelisted variables (`Option<&str>` when a
/// single-entry whitelist supplies a default), matches them against their
/// whitelists and returns a [`StaticSql`]. Other variables are bound by the
/// caller in the order of `binds`.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: SheetConfig,
}

impl Generator {
    pub fn new(config: SheetConfig) -> Self {
        Self { config }
    }

    pub fn emit(&self, queries: &[Query]) -> SheetResult<String> {
        let mut out = String::new();
        out.push_str("// Generated by sqlsheet. Do not edit.\n\n");
        out.push_str("use sqlsheet::SheetError;\n");
        out.push_str("use sqlsheet::codegen::StaticSql;\n");

        let mut ids: HashMap<&str, &str> = HashMap::new();
        for query in queries {
            if let Some(first) = ids.insert(query.id(), query.name()) {
                return Err(SheetError::definition(
                    query.name(),
                    DefinitionError::DuplicateId {
                        id: query.id().to_string(),
                        first: first.to_string(),
                    },
                ));
            }
            out.push('\n');
            self.emit_query(&mut out, query)?;
        }
        Ok(out)
    }

    fn emit_query(&self, out: &mut String, query: &Query) -> SheetResult<()> {
        let callable = Callable::new(query);

        for line in query.docstring_or(&self.config.docstring).lines() {
            let line = line.trim_end();
            if line.is_empty() {
                out.push_str("///\n");
            } else {
                writeln!(out, "/// {}", line)?;
            }
        }
        if callable.spec().is_setter() {
            out.push_str("///\n/// Setter: assigns a value rather than retrieving rows.\n");
        }

        let switches = callable.tree().switches();
        let params: Vec<(&str, Option<&str>)> = callable
            .args()
            .variables()
            .filter(|var| switches.contains(var))
            .map(|var| {
                let default = match callable.args().default_for(var) {
                    Some(ArgDefault::Value(v)) => Some(v.as_str()),
                    _ => None,
                };
                (var, default)
            })
            .collect();

        let signature: Vec<String> = params
            .iter()
            .map(|(var, default)| match default {
                Some(_) => format!("{}: Option<&str>", var),
                None => format!("{}: &str", var),
            })
            .collect();

        writeln!(
            out,
            "pub fn {}({}) -> Result<StaticSql, SheetError> {{",
            callable.spec().id(),
            signature.join(", ")
        )?;
        for (var, default) in &params {
            if let Some(default) = default {
                writeln!(out, "    let {} = {}.unwrap_or({:?});", var, var, default)?;
            }
        }
        let body = self.emit_tree(callable.tree(), 1)?;
        writeln!(out, "    {}", body)?;
        out.push_str("}\n");
        Ok(())
    }

    fn emit_tree(&self, tree: &QueryTree, depth: usize) -> SheetResult<String> {
        match tree {
            QueryTree::Leaf(query) => {
                let rendered = query.to_sql(self.config.placeholder)?;
                let binds: Vec<String> = rendered.binds.iter().map(|b| format!("{:?}", b)).collect();
                Ok(format!(
                    "Ok(StaticSql {{ sql: {:?}, binds: &[{}] }})",
                    rendered.sql,
                    binds.join(", ")
                ))
            }
            QueryTree::Branch {
                variable,
                whitelist,
                arms,
            } => {
                let indent = "    ".repeat(depth + 1);
                let close = "    ".repeat(depth);
                let mut out = format!("match {} {{\n", variable);
                for (entry, subtree) in arms {
                    let arm = self.emit_tree(subtree, depth + 1)?;
                    writeln!(out, "{}{:?} => {},", indent, entry, arm)?;
                }
                let entries: Vec<String> = whitelist.iter().map(|e| format!("{:?}", e)).collect();
                writeln!(
                    out,
                    "{}other => Err(SheetError::invalid_whitelist(other, &[{}])),",
                    indent,
                    entries.join(", ")
                )?;
                out.push_str(&close);
                out.push('}');
                Ok(out)
            }
        }
    }
}
