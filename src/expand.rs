//! Whitelist expansion.
//!
//! Parameters such as a sort column or direction have to be spliced into the
//! SQL text instead of bound, so each one is restricted to a whitelist and a
//! concrete statement is pre-rendered for every combination. At call time a
//! [`QueryTree`] picks the variant matching the supplied values.

use serde::Serialize;
use serde_json::Value;

use crate::args::Bindings;
use crate::error::{SheetError, SheetResult};
use crate::query::Query;

/// Decision tree over whitelisted variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum QueryTree {
    /// A fully expanded query.
    Leaf(Query),
    /// One arm per whitelist entry, in declaration order.
    Branch {
        variable: String,
        whitelist: Vec<String>,
        arms: Vec<(String, QueryTree)>,
    },
}

/// Expand every whitelisted parameter of `query`, calling `visit` once per
/// concrete expansion.
///
/// Whitelisted parameters are processed in statement order and entries in
/// declaration order, so both the visit order and the returned tree are
/// deterministic. `k` whitelisted occurrences of sizes `n1..nk` produce
/// `n1 * .. * nk` expansions; repeated occurrences of one variable branch
/// independently.
pub fn build_query_tree<F>(query: &Query, mut visit: F) -> QueryTree
where
    F: FnMut(&Query),
{
    let tree = expand(query.clone(), &mut visit);
    tracing::debug!("Expanded '{}' into {} variant(s)", query.name(), tree.len());
    tree
}

fn expand<F>(query: Query, visit: &mut F) -> QueryTree
where
    F: FnMut(&Query),
{
    let found = query
        .statement()
        .first_whitelisted()
        .map(|(index, p)| (index, p.variable.clone(), p.whitelist.clone().unwrap_or_default()));

    let Some((index, variable, whitelist)) = found else {
        visit(&query);
        return QueryTree::Leaf(query);
    };

    let arms = whitelist
        .iter()
        .map(|entry| {
            let branch = query.with_statement(query.statement().substitute(index, entry));
            (entry.clone(), expand(branch, visit))
        })
        .collect();

    QueryTree::Branch {
        variable,
        whitelist,
        arms,
    }
}

/// True when the statement has no whitelisted parameter left.
pub fn check_fully_expanded(query: &Query) -> bool {
    query.statement().is_fully_expanded()
}

impl QueryTree {
    /// Number of expansions.
    pub fn len(&self) -> usize {
        match self {
            QueryTree::Leaf(_) => 1,
            QueryTree::Branch { arms, .. } => arms.iter().map(|(_, t)| t.len()).sum(),
        }
    }

    /// Only possible with an empty whitelist, which query construction rejects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every expansion in visit order.
    pub fn leaves(&self) -> Vec<&Query> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Query>) {
        match self {
            QueryTree::Leaf(q) => out.push(q),
            QueryTree::Branch { arms, .. } => {
                for (_, tree) in arms {
                    tree.collect_leaves(out);
                }
            }
        }
    }

    /// Distinct whitelisted variables in first-branch order.
    pub fn switches(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        self.collect_switches(&mut out);
        out
    }

    fn collect_switches<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let QueryTree::Branch { variable, arms, .. } = self {
            if !out.contains(&variable.as_str()) {
                out.push(variable);
            }
            for (_, tree) in arms {
                tree.collect_switches(out);
            }
        }
    }

    /// Walk the tree with bound values and return the matching expansion.
    pub fn select(&self, bindings: &Bindings) -> SheetResult<&Query> {
        let mut node = self;
        loop {
            match node {
                QueryTree::Leaf(query) => return Ok(query),
                QueryTree::Branch {
                    variable,
                    whitelist,
                    arms,
                } => {
                    let value = bindings
                        .get(variable)
                        .ok_or_else(|| SheetError::MissingRequiredArgument(variable.clone()))?;
                    let text = whitelist_text(value);

                    node = arms
                        .iter()
                        .find(|(entry, _)| text.as_deref() == Some(entry.as_str()))
                        .map(|(_, tree)| tree)
                        .ok_or_else(|| SheetError::InvalidWhitelistValue {
                            value: text.unwrap_or_else(|| value.to_string()),
                            whitelist: whitelist.clone(),
                        })?;
                }
            }
        }
    }
}

/// Strings match as-is; numbers and booleans by their text form.
fn whitelist_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
