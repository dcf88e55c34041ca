use pretty_assertions::assert_eq;
use serde_json::json;
use sqlsheet::prelude::*;

const USERS: &str = include_str!("fixtures/users.sql");

fn query(name: &str) -> Query {
    parse_all(USERS)
        .expect("Failed to parse fixture")
        .into_iter()
        .find(|q| q.name() == name)
        .expect("Query not in fixture")
}

#[test]
fn test_fixture_parses_fully() {
    let queries = parse_all(USERS).expect("Failed to parse fixture");
    let specs: Vec<CallSpec> = queries.iter().map(|q| q.call_spec()).collect();
    assert_eq!(
        specs,
        vec![
            CallSpec::Plain("get_user".into()),
            CallSpec::Plain("list_users".into()),
            CallSpec::Plain("from_table".into()),
            CallSpec::Setter("set_user_email".into()),
        ]
    );
}

#[test]
fn test_scanner_agrees_with_full_parse() {
    let scanned = scan_names(USERS);
    let parsed: Vec<CallSpec> = parse_all(USERS).unwrap().iter().map(|q| q.call_spec()).collect();
    assert_eq!(scanned, parsed);
}

#[test]
fn test_vars_cover_every_parameter() {
    for q in parse_all(USERS).unwrap() {
        let mut expected: Vec<&str> = q.statement().parameters().map(|p| p.variable.as_str()).collect();
        expected.sort();
        expected.dedup();

        let mut vars = q.vars();
        let total = vars.len();
        vars.sort();
        vars.dedup();

        assert_eq!(vars.len(), total, "duplicate variable in {}", q.name());
        assert_eq!(vars, expected, "vars mismatch in {}", q.name());
    }
}

#[test]
fn test_list_users_convention() {
    let q = query("list-users");
    assert_eq!(q.args().positional, Vec::<String>::new());
    assert_eq!(q.args().default_for("role"), Some(&ArgDefault::Required));
    assert_eq!(q.args().default_for("order_by"), Some(&ArgDefault::Required));
    assert_eq!(q.args().default_for("dir"), Some(&ArgDefault::Value("ASC".into())));
    assert_eq!(q.args().to_string(), "(*, role, order_by, dir = \"ASC\", limit)");
}

#[test]
fn test_list_users_call() {
    let callable = Callable::new(&query("list-users"));
    let inv = callable
        .call(
            &CallArgs::new()
                .kwarg("role", "admin")
                .kwarg("order-by", "created_at")
                .kwarg("limit", 20),
            Placeholder::Postgres,
        )
        .unwrap();

    assert_eq!(
        inv.sql,
        "SELECT id, email, role\nFROM users\nWHERE role = $1\nORDER BY created_at ASC\nLIMIT $2"
    );
    assert_eq!(inv.params, vec![json!("admin"), json!(20)]);
}

#[test]
fn test_from_table_expansions() {
    let q = query("from-table");
    let mut rendered = Vec::new();
    let tree = build_query_tree(&q, |leaf| {
        assert!(check_fully_expanded(leaf));
        rendered.push(leaf.to_sql(Placeholder::Named).unwrap().sql);
    });

    assert_eq!(tree.len(), 3);
    assert_eq!(
        rendered[2],
        "SELECT count(*) FROM invoices WHERE created_at > :since::timestamptz"
    );

    let err = Callable::new(&q)
        .call(
            &CallArgs::new().kwarg("table", "pg_shadow").kwarg("since", "2024-01-01"),
            Placeholder::Postgres,
        )
        .unwrap_err();
    match err {
        SheetError::InvalidWhitelistValue { value, whitelist } => {
            assert_eq!(value, "pg_shadow");
            assert_eq!(whitelist, vec!["users", "orders", "invoices"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_setter_call() {
    let q = query("set-user-email!");
    assert!(q.is_setter());
    assert_eq!(q.docstring(), "Change a user's email.");

    let inv = Callable::new(&q)
        .call(&CallArgs::new().arg("a@b.c").arg(9), Placeholder::Question)
        .unwrap();
    assert_eq!(
        inv.sql,
        "UPDATE users\nSET email = ?, updated_at = now()\nWHERE id = ? AND email <> 'pending:review'"
    );
    assert_eq!(inv.params, vec![json!("a@b.c"), json!(9)]);
}

#[test]
fn test_expanded_text_round_trips() {
    for q in parse_all(USERS).unwrap() {
        build_query_tree(&q, |leaf| {
            let reparsed = Statement::parse(&leaf.statement().to_string()).unwrap();
            assert!(reparsed.is_fully_expanded());
            assert_eq!(&reparsed, leaf.statement());
        });
    }
}

#[test]
fn test_generated_module_lists_every_query() {
    let code = Generator::default().emit(&parse_all(USERS).unwrap()).unwrap();
    for name in ["get_user", "list_users", "from_table", "set_user_email"] {
        assert!(code.contains(&format!("pub fn {}(", name)), "missing {}", name);
    }
    assert!(code.contains("pub fn list_users(order_by: &str, dir: Option<&str>)"));
    assert!(code.contains("pub fn from_table(table: &str)"));
}
