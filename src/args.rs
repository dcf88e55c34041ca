//! Calling-convention derivation and argument binding.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::ast::{ParamKind, Parameter, Statement};
use crate::error::{DefinitionError, SheetError, SheetResult};
use crate::ident::to_ident;

/// What a keyword argument falls back to when the caller omits it.
///
/// Backends disagree about what an absent value means (NULL, false, ...),
/// so nothing ever defaults to a null-like value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgDefault {
    /// Omitting the argument raises `MissingRequiredArgument`.
    Required,
    /// The single legal whitelist entry.
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordArg {
    pub variable: String,
    pub default: ArgDefault,
}

/// Positional variables followed by keyword variables with defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArgSpec {
    pub positional: Vec<String>,
    pub keyword: Vec<KeywordArg>,
}

impl ArgSpec {
    /// Derive the calling convention of a statement.
    ///
    /// Variables are deduplicated by their written name in first-occurrence
    /// order. A name used both as `?x` and `:x` is positional. Two written
    /// names that normalize to the same identifier are rejected, as is a
    /// variable whose occurrences declare different whitelists.
    pub fn derive(statement: &Statement) -> Result<Self, DefinitionError> {
        let mut positional: Vec<&Parameter> = Vec::new();
        for param in statement.parameters().filter(|p| p.kind == ParamKind::Positional) {
            if !positional.iter().any(|p| p.name == param.name) {
                positional.push(param);
            }
        }

        let mut keyword: Vec<&Parameter> = Vec::new();
        for param in statement.parameters().filter(|p| p.kind == ParamKind::Keyword) {
            if !positional.iter().chain(keyword.iter()).any(|p| p.name == param.name) {
                keyword.push(param);
            }
        }

        let mut whitelists: HashMap<&str, &[String]> = HashMap::new();
        for param in statement.parameters() {
            let Some(entries) = param.whitelist.as_deref() else {
                continue;
            };
            if let Some(first) = whitelists.insert(&param.name, entries) {
                if first != entries {
                    return Err(DefinitionError::ConflictingWhitelist {
                        variable: param.variable.clone(),
                    });
                }
            }
        }

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for param in positional.iter().chain(keyword.iter()) {
            if let Some(first) = seen.insert(&param.variable, &param.name) {
                return Err(DefinitionError::DuplicateVariable {
                    variable: param.variable.clone(),
                    names: vec![first.to_string(), param.name.clone()],
                });
            }
        }

        Ok(Self {
            positional: positional.iter().map(|p| p.variable.clone()).collect(),
            keyword: keyword
                .iter()
                .map(|p| KeywordArg {
                    variable: p.variable.clone(),
                    default: default_for(statement, &p.name),
                })
                .collect(),
        })
    }

    /// All variables, positional first.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.positional
            .iter()
            .map(String::as_str)
            .chain(self.keyword.iter().map(|k| k.variable.as_str()))
    }

    /// The default of a keyword variable; `None` for positional or unknown ones.
    pub fn default_for(&self, variable: &str) -> Option<&ArgDefault> {
        self.keyword
            .iter()
            .find(|k| k.variable == variable)
            .map(|k| &k.default)
    }

    /// Match supplied arguments against this convention.
    pub fn bind(&self, args: &CallArgs) -> SheetResult<Bindings> {
        if args.positional.len() != self.positional.len() {
            return Err(SheetError::Arity {
                expected: self.positional.len(),
                found: args.positional.len(),
            });
        }

        if let Some(unknown) = args
            .keyword
            .keys()
            .find(|key| self.default_for(key).is_none())
        {
            return Err(SheetError::UnexpectedArgument(unknown.clone()));
        }

        let mut values: HashMap<String, Value> = self
            .positional
            .iter()
            .cloned()
            .zip(args.positional.iter().cloned())
            .collect();

        for kw in &self.keyword {
            let value = match (args.keyword.get(&kw.variable), &kw.default) {
                (Some(value), _) => value.clone(),
                (None, ArgDefault::Value(default)) => Value::String(default.clone()),
                (None, ArgDefault::Required) => {
                    return Err(SheetError::MissingRequiredArgument(kw.variable.clone()));
                }
            };
            values.insert(kw.variable.clone(), value);
        }

        Ok(Bindings(values))
    }
}

/// Only a whitelist of exactly one entry may stand in as a default.
fn default_for(statement: &Statement, name: &str) -> ArgDefault {
    let whitelist = statement
        .parameters()
        .filter(|p| p.name == name)
        .find_map(|p| p.whitelist.as_deref());

    match whitelist {
        Some([only]) => ArgDefault::Value(only.clone()),
        _ => ArgDefault::Required,
    }
}

impl fmt::Display for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.positional.clone();
        if !self.keyword.is_empty() {
            parts.push("*".to_string());
            for kw in &self.keyword {
                match &kw.default {
                    ArgDefault::Required => parts.push(kw.variable.clone()),
                    ArgDefault::Value(v) => parts.push(format!("{} = {:?}", kw.variable, v)),
                }
            }
        }
        write!(f, "({})", parts.join(", "))
    }
}

/// Arguments supplied to a callable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    /// Keyed by normalized variable.
    pub keyword: BTreeMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument. The name is normalized like parameter names.
    pub fn kwarg(mut self, name: &str, value: impl Into<Value>) -> Self {
        let key = to_ident(name).unwrap_or_else(|| name.to_string());
        self.keyword.insert(key, value.into());
        self
    }
}

/// Every variable of a call resolved to a value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings(HashMap<String, Value>);

impl Bindings {
    pub fn get(&self, variable: &str) -> Option<&Value> {
        self.0.get(variable)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Bindings(iter.into_iter().collect())
    }
}
