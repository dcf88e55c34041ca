//! sqlsheet file parser using nom.
//!
//! # Syntax Overview
//!
//! ```text
//! -- name: list-users
//! -- Every user with a role, sorted by a whitelisted column.
//! SELECT * FROM users
//! WHERE role = :role
//! ORDER BY :order_by{name,created_at} ?dir{ASC,DESC}
//! ```
//!
//! `:name` is a keyword parameter, `?name` a positional one, and a trailing
//! `{a,b}` restricts it to literal strings spliced into the SQL text.

pub mod grammar;
mod scanner;

#[cfg(test)]
mod tests;

pub use scanner::scan_names;

use std::borrow::Cow;

use nom::Offset;
use nom::combinator::all_consuming;
use nom::error::ErrorKind;

use crate::ast::Statement;
use crate::error::{SheetError, SheetResult};
use crate::query::Query;
use grammar::{Piece, RawDefinition};

/// Parse every definition in `text`.
///
/// A grammar error fails the whole file; the first definition error is
/// returned as well. Use [`parse_each`] to keep the good definitions.
pub fn parse_all(text: &str) -> SheetResult<Vec<Query>> {
    parse_each(text)?.into_iter().collect()
}

/// Parse every definition, reporting definition errors per query.
///
/// The outer result fails only when the file itself does not parse.
pub fn parse_each(text: &str) -> SheetResult<Vec<SheetResult<Query>>> {
    let source = with_line_ending(text);
    let source = source.as_ref();

    let (rest, definitions) = grammar::file(source).map_err(|e| error_at(source, e))?;
    if !rest.is_empty() {
        return Err(SheetError::parse(
            source.offset(rest),
            format!(
                "Unexpected content outside of a named definition: '{}'",
                first_line(rest)
            ),
        ));
    }

    let queries: Vec<SheetResult<Query>> = definitions
        .into_iter()
        .map(|def| build_query(source, def))
        .collect();

    tracing::debug!("Parsed {} definition(s)", queries.len());
    Ok(queries)
}

/// Parse text holding exactly one definition.
pub fn parse_one(text: &str) -> SheetResult<Query> {
    let mut queries = parse_all(text)?;
    match queries.len() {
        1 => Ok(queries.remove(0)),
        n => Err(SheetError::parse(
            0,
            format!("Expected exactly one definition, found {}", n),
        )),
    }
}

/// Parse statement body text without a header.
pub fn parse_statement(text: &str) -> SheetResult<Statement> {
    statement_in(text, text)
}

/// The grammar detects end of line uniformly only when the last line is terminated.
fn with_line_ending(text: &str) -> Cow<'_, str> {
    if text.is_empty() || text.ends_with('\n') {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("{}\n", text))
    }
}

fn build_query(source: &str, def: RawDefinition<'_>) -> SheetResult<Query> {
    let name = def.header.name;
    let body = def.body.trim();
    if body.is_empty() {
        return Err(SheetError::parse(
            source.offset(def.body),
            format!("Definition '{}' has an empty statement body", name),
        ));
    }

    let statement = statement_in(source, body)?;
    let docstring = def.doc.join("\n").trim().to_string();
    let docstring = (!docstring.is_empty()).then_some(docstring);

    Query::new(name, def.header.annotation, docstring, statement)
}

/// Parse `body`, a slice of `source`, reporting positions relative to `source`.
fn statement_in(source: &str, body: &str) -> SheetResult<Statement> {
    match all_consuming(grammar::statement)(body) {
        Ok((_, pieces)) => Ok(Statement::new(pieces.into_iter().map(Piece::into_element))),
        Err(e) => Err(error_at(source, e)),
    }
}

fn error_at(source: &str, err: nom::Err<nom::error::Error<&str>>) -> SheetError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let what = match e.code {
                ErrorKind::Char => "expected a closing delimiter",
                ErrorKind::Tag => "unexpected token",
                ErrorKind::CrLf => "expected end of line",
                ErrorKind::TakeTill1 => "expected a name",
                ErrorKind::Eof => "unexpected content",
                _ => "malformed definition",
            };
            let near = first_line(e.input);
            let message = if near.is_empty() {
                format!("{} at end of input", what)
            } else {
                format!("{} near '{}'", what, near)
            };
            SheetError::parse(source.offset(e.input), message)
        }
        nom::Err::Incomplete(_) => SheetError::parse(source.len(), "Unexpected end of input"),
    }
}

fn first_line(input: &str) -> String {
    input.lines().next().unwrap_or("").trim().chars().take(32).collect()
}
