//! Statement data model.
//!
//! A [`Statement`] is what the grammar hands back for one query body: literal
//! SQL text interleaved with [`Parameter`] placeholders. Statements are never
//! mutated; substitution builds a new value.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::DefinitionError;
use crate::ident::to_ident;

/// How a caller supplies a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// `?name`
    Positional,
    /// `:name`
    Keyword,
}

impl ParamKind {
    /// The marker character that introduces this kind in source text.
    pub fn marker(self) -> char {
        match self {
            ParamKind::Positional => '?',
            ParamKind::Keyword => ':',
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Positional => write!(f, "positional"),
            ParamKind::Keyword => write!(f, "keyword"),
        }
    }
}

/// A single placeholder occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// The name as written in the file (`user-id`).
    pub name: String,
    /// The normalized identifier (`user_id`).
    pub variable: String,
    pub kind: ParamKind,
    /// Literal strings this parameter may be spliced as. `None` means the
    /// value is bound through a database placeholder.
    pub whitelist: Option<Vec<String>>,
}

impl Parameter {
    /// Build a parameter from its written name. Names that do not normalize
    /// fall back to the written form; the grammar only produces names that do.
    pub fn new(name: impl Into<String>, kind: ParamKind, whitelist: Option<Vec<String>>) -> Self {
        let name = name.into();
        let variable = to_ident(&name).unwrap_or_else(|| name.clone());
        Self {
            name,
            variable,
            kind,
            whitelist,
        }
    }

    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Positional, None)
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Keyword, None)
    }

    /// Restrict this parameter to a whitelist.
    pub fn with_whitelist<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = Some(entries.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_whitelisted(&self) -> bool {
        self.whitelist.is_some()
    }

    /// Check the whitelist invariant: non-empty, distinct entries made of
    /// identifier characters, digits, `.` and spaces. Anything else could open
    /// a quote, comment or marker once spliced into the statement.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let Some(entries) = &self.whitelist else {
            return Ok(());
        };

        if entries.is_empty() {
            return Err(DefinitionError::EmptyWhitelist {
                variable: self.variable.clone(),
            });
        }

        let mut seen = HashSet::new();
        for entry in entries {
            if entry.trim().is_empty() {
                return Err(DefinitionError::BlankWhitelistEntry {
                    variable: self.variable.clone(),
                });
            }
            if !entry.chars().all(is_token_char) {
                return Err(DefinitionError::UnsafeWhitelistEntry {
                    variable: self.variable.clone(),
                    entry: entry.clone(),
                });
            }
            if !seen.insert(entry.as_str()) {
                return Err(DefinitionError::DuplicateWhitelistEntry {
                    variable: self.variable.clone(),
                    entry: entry.clone(),
                });
            }
        }
        Ok(())
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ' ')
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.marker(), self.name)?;
        if let Some(entries) = &self.whitelist {
            write!(f, "{{{}}}", entries.join(","))?;
        }
        Ok(())
    }
}

/// One piece of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
    Text(String),
    Param(Parameter),
}

/// An ordered sequence of literal fragments and parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Statement {
    elements: Vec<Element>,
}

impl Statement {
    /// Build a statement, merging adjacent text fragments and dropping empty ones.
    pub fn new(elements: impl IntoIterator<Item = Element>) -> Self {
        let mut merged: Vec<Element> = Vec::new();
        for element in elements {
            match element {
                Element::Text(text) if text.is_empty() => {}
                Element::Text(text) => match merged.last_mut() {
                    Some(Element::Text(prev)) => prev.push_str(&text),
                    _ => merged.push(Element::Text(text)),
                },
                param => merged.push(param),
            }
        }
        Self { elements: merged }
    }

    /// Parse statement body text (no header) with the statement grammar.
    pub fn parse(text: &str) -> crate::error::SheetResult<Self> {
        crate::parser::parse_statement(text)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Every parameter occurrence, in statement order.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.elements.iter().filter_map(|e| match e {
            Element::Param(p) => Some(p),
            Element::Text(_) => None,
        })
    }

    /// The first remaining whitelisted parameter and its element index.
    pub fn first_whitelisted(&self) -> Option<(usize, &Parameter)> {
        self.elements.iter().enumerate().find_map(|(i, e)| match e {
            Element::Param(p) if p.is_whitelisted() => Some((i, p)),
            _ => None,
        })
    }

    /// True when no whitelisted parameter is left.
    pub fn is_fully_expanded(&self) -> bool {
        self.first_whitelisted().is_none()
    }

    /// A new statement with the element at `index` replaced by literal text.
    pub fn substitute(&self, index: usize, literal: &str) -> Statement {
        let elements = self.elements.iter().enumerate().map(|(i, e)| {
            if i == index {
                Element::Text(literal.to_string())
            } else {
                e.clone()
            }
        });
        Statement::new(elements)
    }
}

/// Renders source syntax, so the output parses back to an equal statement.
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            match element {
                Element::Text(text) => write!(f, "{}", text)?,
                Element::Param(p) => write!(f, "{}", p)?,
            }
        }
        Ok(())
    }
}
