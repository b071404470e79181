//! Error recovery and grammar edge cases.
//!
//! Covers:
//! 1. Multiple independent syntax errors reported in one pass
//! 2. Errors positioned by token range vs. by node handle
//! 3. Declaration ordering and statement termination errors
//! 4. Nesting limits

use shed_lexer::tokenise;
use shed_parser::ParseResult;
use shed_types::ast::*;
use shed_types::{ErrorKind, ErrorLocation, SourcePosition};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse(source: &str) -> ParseResult {
    shed_parser::parse(&tokenise(source).tokens)
}

fn error_count(source: &str) -> usize {
    parse(source).errors.len()
}

fn messages(source: &str) -> Vec<String> {
    parse(source)
        .errors
        .iter()
        .map(|e| e.message.clone())
        .collect()
}

fn declaration_names(result: &ParseResult) -> Vec<String> {
    result
        .tree
        .source_file()
        .declarations
        .iter()
        .map(|&id| match result.tree.node(id) {
            Node::Let(d) => d.name.clone(),
            Node::Fun(d) => d.name.clone(),
            Node::Class(d) => d.name.clone(),
            other => format!("{other:?}"),
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────
// Recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_multiple_errors_in_one_pass() {
    let source = "let a =\nlet b = 2\nfun f( { }\nlet c = )\nlet d = 4\n";
    let result = parse(source);
    assert!(!result.success);
    assert_eq!(result.errors.len(), 3);
    assert!(result.errors.iter().all(|e| e.kind == ErrorKind::Syntax));
    assert_eq!(declaration_names(&result), vec!["b", "d"]);
}

#[test]
fn test_errors_are_in_source_order() {
    let result = parse("let a =\nlet b = )\n");
    let lines: Vec<u32> = result
        .errors
        .iter()
        .map(|e| match e.location {
            ErrorLocation::Range(r) => r.start.line,
            ErrorLocation::Node(_) => 0,
        })
        .collect();
    assert_eq!(lines, vec![2, 2]);
    assert_eq!(
        messages("let a =\nlet b = )\n"),
        vec!["expected expression, got 'let'", "expected expression, got ')'"]
    );
}

#[test]
fn test_recovery_inside_blocks() {
    let source = "fun f() {\n    let = 1\n    let ok = 2\n    return )\n}\nlet after = 3";
    let result = parse(source);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(declaration_names(&result), vec!["f", "after"]);
}

#[test]
fn test_missing_closing_paren() {
    assert_eq!(messages("let x = (1 + 2"), vec!["expected ')', got 'end of input'"]);
}

#[test]
fn test_missing_closing_brace() {
    assert_eq!(error_count("fun f() {\n    return 1\n"), 1);
}

#[test]
fn test_stray_closing_brace_at_top_level() {
    let result = parse("}\nlet x = 1");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(declaration_names(&result), vec!["x"]);
}

#[test]
fn test_statement_at_top_level_is_error() {
    assert_eq!(
        messages("print(\"hi\")"),
        vec!["expected 'import', 'let', 'var', 'fun' or 'class', got 'identifier'"]
    );
}

#[test]
fn test_missing_terminator() {
    let result = parse("let a = 1 let b = 2");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors.iter().next().unwrap().message,
        "expected ';' or a line break, got 'let'"
    );
    assert_eq!(declaration_names(&result), vec!["b"]);
}

#[test]
fn test_bad_class_member() {
    let result = parse("class C() {\n    return 1\n    let ok = 2\n}");
    assert_eq!(result.errors.len(), 1);
    let Node::Class(class) = result.tree.node(result.tree.source_file().declarations[0]) else {
        panic!("expected class");
    };
    assert_eq!(class.members.len(), 1);
}

#[test]
fn test_lambda_needs_body() {
    assert_eq!(
        messages("let f = fun(a: Number) a"),
        vec!["expected '=>' or '{' after lambda parameters, got 'identifier'"]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Node-located errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_invalid_assignment_target_is_node_located() {
    let result = parse("fun f() { a.b = 1 }");
    assert_eq!(result.errors.len(), 1);
    let error = result.errors.iter().next().unwrap();
    assert_eq!(error.message, "invalid assignment target");
    let ErrorLocation::Node(node) = error.location else {
        panic!("expected a node location");
    };
    let range = error.resolve(&result.locations).unwrap();
    assert_eq!(Some(range), result.locations.locate(node));
    assert_eq!(range.start, SourcePosition::new(1, 11));
    assert_eq!(range.end, SourcePosition::new(1, 14));
}

#[test]
fn test_duplicate_parameter() {
    let result = parse("fun f(a: Number, a: String) { }");
    assert_eq!(result.errors.len(), 1);
    let error = result.errors.iter().next().unwrap();
    assert_eq!(error.message, "duplicate parameter 'a'");
    let range = error.resolve(&result.locations).unwrap();
    assert_eq!(range.start, SourcePosition::new(1, 18));
    // The declaration itself is still built.
    assert_eq!(declaration_names(&result), vec!["f"]);
}

#[test]
fn test_import_after_declaration() {
    let result = parse("let x = 1\nimport a.b");
    assert_eq!(result.errors.len(), 1);
    let error = result.errors.iter().next().unwrap();
    assert_eq!(error.message, "imports must precede declarations");
    assert!(matches!(error.location, ErrorLocation::Node(_)));
    assert!(error.resolve(&result.locations).is_ok());
    assert_eq!(result.tree.imports().count(), 0);
}

#[test]
fn test_every_error_resolves() {
    let sources = [
        "let a =",
        "fun f(a: Number, a: Number) { 1 = 2 }",
        "class C( { }",
        "let x = (((1",
        "import\nlet y = 2\nimport z",
    ];
    for source in sources {
        let result = parse(source);
        assert!(!result.success, "{source:?} should fail");
        for error in result.errors.iter() {
            assert!(
                error.resolve(&result.locations).is_ok(),
                "{source:?}: cannot resolve {error}"
            );
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Limits
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_deep_nesting_is_reported_once() {
    let source = format!("let x = {}1{}", "(".repeat(300), ")".repeat(300));
    let errors = messages(&source);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("nesting is too deep"));
}

#[test]
fn test_moderate_nesting_is_fine() {
    let source = format!("let x = {}1{}", "(".repeat(20), ")".repeat(20));
    assert_eq!(error_count(&source), 0);
}

#[test]
fn test_long_operator_chain_is_reported_once() {
    for op in [" + ", " * ", " && ", " == "] {
        let source = format!("let x = {}\nlet y = 2", vec!["1"; 5000].join(op));
        let result = parse(&source);
        let errors: Vec<_> = result.errors.iter().map(|e| e.message.clone()).collect();
        assert_eq!(errors.len(), 1, "{op:?}: {errors:?}");
        assert!(errors[0].starts_with("nesting is too deep"));
        // Recovery resumes at the next line.
        assert_eq!(declaration_names(&result), vec!["y"]);
    }
}

#[test]
fn test_operator_chain_within_limit_is_fine() {
    let source = format!("let x = {}", vec!["1"; 150].join(" + "));
    assert_eq!(error_count(&source), 0);
    // Lower-precedence levels each spend their own links.
    let mixed = format!("let x = {} < 1 || true", vec!["1"; 100].join(" * "));
    assert_eq!(error_count(&mixed), 0);
}

#[test]
fn test_long_postfix_chains_are_reported_once() {
    for source in [
        format!("let x = a{}", ".b".repeat(5000)),
        format!("let x = f{}", "()".repeat(5000)),
    ] {
        let errors = messages(&source);
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].starts_with("nesting is too deep"));
    }
}

#[test]
fn test_postfix_chain_within_limit_is_fine() {
    assert_eq!(error_count(&format!("let x = a{}", ".b".repeat(150))), 0);
    assert_eq!(error_count(&format!("let x = f{}", "(1)".repeat(150))), 0);
}
