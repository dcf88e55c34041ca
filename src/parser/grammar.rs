//! nom combinators for sqlsheet files.
//!
//! ```text
//! -- name: list-users @setter      header
//! -- Doc line.                     doc lines (contiguous comments)
//! SELECT * FROM :table{users,orders}
//! WHERE id = ?id                   body, up to the next header
//! ```

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case, take_till1, take_while, take_while1},
    character::complete::{anychar, char, line_ending, not_line_ending, satisfy, space0, space1},
    combinator::{cut, map, not, opt, peek, recognize, value},
    multi::many0,
    sequence::{pair, preceded, terminated, tuple},
};

use crate::ast::{Element, ParamKind, Parameter};
use crate::query::Annotation;

/// A parsed `-- name:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header<'a> {
    pub name: &'a str,
    pub annotation: Option<Annotation>,
}

/// One definition before statement parsing.
#[derive(Debug, Clone)]
pub struct RawDefinition<'a> {
    pub header: Header<'a>,
    pub doc: Vec<&'a str>,
    pub body: &'a str,
}

/// A statement piece borrowed from the input.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece<'a> {
    Text(&'a str),
    Param(Parameter),
}

impl Piece<'_> {
    pub fn into_element(self) -> Element {
        match self {
            Piece::Text(text) => Element::Text(text.to_string()),
            Piece::Param(p) => Element::Param(p),
        }
    }
}

// =============================================================================
// Definitions
// =============================================================================

/// Parse a whole file: leading filler, then definitions.
pub fn file(input: &str) -> IResult<&str, Vec<RawDefinition<'_>>> {
    preceded(many0(filler_line), many0(definition))(input)
}

/// Parse a header, its doc lines and its body.
pub fn definition(input: &str) -> IResult<&str, RawDefinition<'_>> {
    let (input, header) = header(input)?;
    let (input, doc) = many0(doc_line)(input)?;
    let (input, body) = recognize(many0(body_line))(input)?;

    Ok((input, RawDefinition { header, doc, body }))
}

/// Parse a header line. Once `-- name:` is seen the rest of the line must parse.
pub fn header(input: &str) -> IResult<&str, Header<'_>> {
    preceded(header_prefix, cut(header_rest))(input)
}

fn header_prefix(input: &str) -> IResult<&str, &str> {
    recognize(tuple((space0, tag("--"), space0, tag_no_case("name:"))))(input)
}

fn header_rest(input: &str) -> IResult<&str, Header<'_>> {
    let (input, _) = space0(input)?;
    let (input, name) = take_till1(|c: char| c.is_whitespace())(input)?;
    let (input, annotation) = opt(preceded(space1, annotation))(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = line_ending(input)?;

    Ok((input, Header { name, annotation }))
}

/// Parse `@setter`.
fn annotation(input: &str) -> IResult<&str, Annotation> {
    preceded(char('@'), cut(value(Annotation::Setter, tag_no_case("setter"))))(input)
}

/// A comment line directly after the header, returned without its `--`.
fn doc_line(input: &str) -> IResult<&str, &str> {
    let (input, _) = not(header_prefix)(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag("--")(input)?;
    let (input, text) = not_line_ending(input)?;
    let (input, _) = line_ending(input)?;

    Ok((input, text.strip_prefix(' ').unwrap_or(text).trim_end()))
}

fn body_line(input: &str) -> IResult<&str, &str> {
    preceded(
        not(header_prefix),
        recognize(terminated(not_line_ending, line_ending)),
    )(input)
}

/// Blank lines and comments before the first header.
fn filler_line(input: &str) -> IResult<&str, &str> {
    preceded(
        not(header_prefix),
        recognize(tuple((
            space0,
            opt(pair(tag("--"), not_line_ending)),
            line_ending,
        ))),
    )(input)
}

// =============================================================================
// Statements
// =============================================================================

/// Parse statement text into pieces.
pub fn statement(input: &str) -> IResult<&str, Vec<Piece<'_>>> {
    many0(piece)(input)
}

fn piece(input: &str) -> IResult<&str, Piece<'_>> {
    alt((
        map(single_quoted, Piece::Text),
        map(double_quoted, Piece::Text),
        map(line_comment, Piece::Text),
        // Postgres cast, never a parameter
        map(tag("::"), Piece::Text),
        map(parameter, Piece::Param),
        map(is_not("'\":?-"), Piece::Text),
        map(recognize(anychar), Piece::Text),
    ))(input)
}

/// `'...'` with `''` as the escaped quote.
fn single_quoted(input: &str) -> IResult<&str, &str> {
    recognize(preceded(
        char('\''),
        cut(terminated(many0(alt((tag("''"), is_not("'")))), char('\''))),
    ))(input)
}

/// `"..."` with `""` as the escaped quote.
fn double_quoted(input: &str) -> IResult<&str, &str> {
    recognize(preceded(
        char('"'),
        cut(terminated(many0(alt((tag("\"\""), is_not("\"")))), char('"'))),
    ))(input)
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("--"), not_line_ending))(input)
}

/// Parse `:name`, `?name`, optionally followed by `{a,b}`.
fn parameter(input: &str) -> IResult<&str, Parameter> {
    let (input, kind) = alt((
        value(ParamKind::Keyword, char(':')),
        value(ParamKind::Positional, char('?')),
    ))(input)?;
    let (input, name) = param_name(input)?;
    let (input, whitelist) = opt(whitelist)(input)?;

    Ok((input, Parameter::new(name, kind, whitelist)))
}

/// `[A-Za-z_][A-Za-z0-9_]*`, where `-` is allowed before a letter (`user-id`).
fn param_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
        many0(alt((
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            recognize(terminated(
                char('-'),
                peek(satisfy(|c: char| c.is_ascii_alphabetic())),
            )),
        ))),
    ))(input)
}

/// `{a, b, c}` on a single line. `{}` is an empty list.
fn whitelist(input: &str) -> IResult<&str, Vec<String>> {
    let (input, _) = char('{')(input)?;
    let (input, content) = cut(terminated(
        take_while(|c: char| c != '}' && c != '\n'),
        char('}'),
    ))(input)?;

    let entries = if content.trim().is_empty() {
        Vec::new()
    } else {
        content.split(',').map(|e| e.trim().to_string()).collect()
    };
    Ok((input, entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_plain() {
        let (rest, h) = header("-- name: get-user\nSELECT 1\n").unwrap();
        assert_eq!(h.name, "get-user");
        assert_eq!(h.annotation, None);
        assert_eq!(rest, "SELECT 1\n");
    }

    #[test]
    fn test_header_setter() {
        let (_, h) = header("--name: set-email!  @Setter \n").unwrap();
        assert_eq!(h.name, "set-email!");
        assert_eq!(h.annotation, Some(Annotation::Setter));
    }

    #[test]
    fn test_header_unknown_annotation_is_failure() {
        assert!(matches!(
            header("-- name: foo @getter\n"),
            Err(nom::Err::Failure(_))
        ));
    }

    #[test]
    fn test_not_a_header() {
        assert!(matches!(header("-- just a comment\n"), Err(nom::Err::Error(_))));
        assert!(matches!(header("SELECT 1\n"), Err(nom::Err::Error(_))));
    }

    #[test]
    fn test_param_name_dashes() {
        assert_eq!(param_name("user-id = 1"), Ok((" = 1", "user-id")));
        assert_eq!(param_name("id-1"), Ok(("-1", "id")));
        assert!(param_name("1abc").is_err());
    }

    #[test]
    fn test_parameter_with_whitelist() {
        let (rest, p) = parameter(":dir{ ASC , DESC } LIMIT").unwrap();
        assert_eq!(rest, " LIMIT");
        assert_eq!(p.kind, ParamKind::Keyword);
        assert_eq!(p.whitelist, Some(vec!["ASC".to_string(), "DESC".to_string()]));
    }

    #[test]
    fn test_quoted_regions_hide_markers() {
        let (rest, pieces) = statement("'a:b ?c' \"x:y\" -- :z\n").unwrap();
        assert_eq!(rest, "");
        assert!(pieces.iter().all(|p| matches!(p, Piece::Text(_))));
    }

    #[test]
    fn test_escaped_quote() {
        assert_eq!(single_quoted("'it''s' x"), Ok((" x", "'it''s'")));
        assert_eq!(single_quoted("'' x"), Ok((" x", "''")));
    }

    #[test]
    fn test_unterminated_quote_fails() {
        assert!(matches!(statement("WHERE a = 'oops"), Err(nom::Err::Failure(_))));
    }
}
