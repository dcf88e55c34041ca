use super::*;
use crate::ast::{Element, ParamKind};
use crate::error::DefinitionError;
use crate::query::{Annotation, CallSpec, DEFAULT_DOCSTRING};
use pretty_assertions::assert_eq;

#[test]
fn test_parse_simple_query() {
    let q = parse_one("-- name: get-user\nSELECT * FROM users WHERE id = ?id\n").unwrap();
    assert_eq!(q.name(), "get-user");
    assert_eq!(q.id(), "get_user");
    assert_eq!(q.annotation(), None);
    assert_eq!(q.docstring(), DEFAULT_DOCSTRING);
    assert_eq!(q.statement().to_string(), "SELECT * FROM users WHERE id = ?id");
    assert_eq!(q.args().positional, vec!["id"]);
}

#[test]
fn test_parse_docstring_and_setter() {
    let input = "\
-- name: set-email! @setter
-- Change a user's email.
--
-- Returns nothing.
UPDATE users SET email = ?email WHERE id = ?id
";
    let q = parse_one(input).unwrap();
    assert_eq!(q.annotation(), Some(Annotation::Setter));
    assert_eq!(q.docstring(), "Change a user's email.\n\nReturns nothing.");
    assert_eq!(q.call_spec(), CallSpec::Setter("set_email".into()));
}

#[test]
fn test_parse_without_trailing_newline() {
    let q = parse_one("-- name: count\nSELECT count(*) FROM t").unwrap();
    assert_eq!(q.statement().to_string(), "SELECT count(*) FROM t");
}

#[test]
fn test_parse_multiple_queries() {
    let input = r#"
-- Users
-- name: find-user
SELECT * FROM users WHERE id = :id

-- name: list-users
SELECT * FROM users
ORDER BY :col{name,email}

-- name: delete-user
DELETE FROM users WHERE id = ?id
-- trailing note

"#;
    let queries = parse_all(input).unwrap();
    let names: Vec<&str> = queries.iter().map(|q| q.id()).collect();
    assert_eq!(names, vec!["find_user", "list_users", "delete_user"]);
    assert_eq!(
        queries[1].statement().to_string(),
        "SELECT * FROM users\nORDER BY :col{name,email}"
    );
    assert_eq!(
        queries[2].statement().to_string(),
        "DELETE FROM users WHERE id = ?id\n-- trailing note"
    );
}

#[test]
fn test_parse_empty_text() {
    assert!(parse_all("").unwrap().is_empty());
    assert!(parse_all("\n-- only comments\n\n").unwrap().is_empty());
}

#[test]
fn test_parse_one_rejects_many() {
    let input = "-- name: a\nSELECT 1\n-- name: b\nSELECT 2\n";
    assert!(matches!(parse_one(input), Err(SheetError::Parse { .. })));
}

#[test]
fn test_content_before_first_header() {
    match parse_all("SELECT 1\n-- name: a\nSELECT 2\n") {
        Err(SheetError::Parse { position, message }) => {
            assert_eq!(position, 0);
            assert!(message.contains("SELECT 1"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_empty_body_is_parse_error() {
    assert!(matches!(
        parse_all("-- name: a\n\n-- name: b\nSELECT 1\n"),
        Err(SheetError::Parse { .. })
    ));
}

#[test]
fn test_unknown_annotation_is_parse_error() {
    match parse_all("-- name: a @getter\nSELECT 1\n") {
        Err(SheetError::Parse { position, .. }) => assert_eq!(position, 12),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_unterminated_quote_position() {
    let input = "-- name: a\nSELECT 'oops\n";
    match parse_all(input) {
        Err(SheetError::Parse { position, .. }) => assert_eq!(position, input.trim_end().len()),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_unterminated_whitelist() {
    assert!(matches!(
        parse_all("-- name: a\nSELECT * FROM :t{a,b\n"),
        Err(SheetError::Parse { .. })
    ));
}

#[test]
fn test_parameter_kinds_and_whitelists() {
    let stmt = parse_statement("SELECT :a, ?b, :c{x, y}, ?d{z}").unwrap();
    let params: Vec<_> = stmt.parameters().collect();
    assert_eq!(params.len(), 4);
    assert_eq!(params[0].kind, ParamKind::Keyword);
    assert_eq!(params[1].kind, ParamKind::Positional);
    assert_eq!(params[2].whitelist, Some(vec!["x".to_string(), "y".to_string()]));
    assert_eq!(params[3].whitelist, Some(vec!["z".to_string()]));
}

#[test]
fn test_non_parameters_stay_literal() {
    let text = "SELECT a::int, data ? 'k', arr[1:2], 'x:y', \"a?b\" FROM t -- :nope";
    let stmt = parse_statement(text).unwrap();
    assert_eq!(stmt.parameters().count(), 0);
    assert_eq!(stmt.elements(), &[Element::Text(text.to_string())]);
}

#[test]
fn test_empty_whitelist_is_definition_error() {
    match parse_all("-- name: a\nSELECT * FROM :t{}\n") {
        Err(SheetError::Definition { query, source }) => {
            assert_eq!(query, "a");
            assert_eq!(source, DefinitionError::EmptyWhitelist { variable: "t".into() });
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_quote_in_whitelist_is_definition_error() {
    match parse_one("-- name: by-kind\nSELECT * FROM t WHERE kind = :k{it's,x?y{z}\n") {
        Err(SheetError::Definition { query, source }) => {
            assert_eq!(query, "by-kind");
            assert_eq!(
                source,
                DefinitionError::UnsafeWhitelistEntry {
                    variable: "k".into(),
                    entry: "it's".into()
                }
            );
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_conflicting_whitelists_are_definition_error() {
    match parse_one("-- name: sorted\nSELECT :c{x} FROM t ORDER BY :c{y}\n") {
        Err(SheetError::Definition { query, source }) => {
            assert_eq!(query, "sorted");
            assert_eq!(source, DefinitionError::ConflictingWhitelist { variable: "c".into() });
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_parse_each_keeps_good_definitions() {
    let input = "\
-- name: bad @setter
UPDATE t SET a = ?a
-- name: good
SELECT 1
";
    let results = parse_each(input).unwrap();
    assert_eq!(results.len(), 2);
    assert!(matches!(
        &results[0],
        Err(SheetError::Definition { source: DefinitionError::SetterArity { found: 1 }, .. })
    ));
    assert_eq!(results[1].as_ref().unwrap().id(), "good");
}

#[test]
fn test_round_trip_of_expansion() {
    let q = parse_one("-- name: t\nSELECT * FROM :table{users,orders} WHERE id = :id\n").unwrap();
    let expanded = q
        .statement()
        .substitute(q.statement().first_whitelisted().unwrap().0, "orders");

    let reparsed = parse_statement(&expanded.to_string()).unwrap();
    assert!(reparsed.is_fully_expanded());
    assert_eq!(reparsed, expanded);
}
