//! Integration tests for the Shed JavaScript code generator.
//!
//! Tests validate:
//! - Declaration lowering (let/var, functions, classes, lambdas)
//! - Module envelopes for each wrap strategy and import strategy
//! - Identifier spelling (builtins, reserved names)
//! - SIMPLE folding and compact rendering
//! - Invariant violations surface as errors, never panics
//! - Deterministic output (same input → same text)

use std::collections::HashMap;

use shed_codegen::{
    write, BrowserImports, BrowserModuleWrapper, CodeGenerator, CodegenError, CommonJsImports,
    CommonJsModuleWrapper, ImportGenerator, ModuleWrapper, NoWrapper, OptimisationLevel,
};
use shed_types::ast::{Expr, ModulePath, Node, SyntaxTree};
use shed_types::{Resolution, ResolutionTable};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Parse Shed source into a syntax tree (panics on lexical or syntax errors).
fn parse(source: &str) -> SyntaxTree {
    let lexed = shed_lexer::tokenise(source);
    assert!(lexed.errors.is_empty(), "lexical errors in {source:?}");
    let result = shed_parser::parse(&lexed.tokens);
    if !result.success {
        panic!(
            "parse errors:\n{}",
            result
                .errors
                .iter()
                .map(|e| format!("  {e}"))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
    result.tree
}

/// A stand-in for the checker's resolution table: `print` and `alert` are
/// host builtins, import bindings are imports, everything else is declared.
fn resolve(tree: &SyntaxTree) -> ResolutionTable {
    let builtins: HashMap<&str, &str> =
        HashMap::from([("print", "console.log"), ("alert", "window.alert")]);
    let imports: HashMap<String, ModulePath> = tree
        .imports()
        .map(|(_, import)| (import.binding_name().to_string(), import.path.clone()))
        .collect();

    let mut table = ResolutionTable::new();
    for id in tree.reachable() {
        if let Node::Expr(Expr::Ident(name)) = tree.node(id) {
            let resolution = if let Some(js) = builtins.get(name.as_str()) {
                Resolution::Builtin { js: js.to_string() }
            } else if let Some(module) = imports.get(name) {
                Resolution::Import {
                    module: module.clone(),
                }
            } else {
                Resolution::Declared
            };
            table.insert(id, resolution);
        }
    }
    table
}

fn generate_with(
    source: &str,
    imports: &dyn ImportGenerator,
    wrapper: &dyn ModuleWrapper,
    level: OptimisationLevel,
) -> String {
    let tree = parse(source);
    let resolutions = resolve(&tree);
    let generator = CodeGenerator::new(imports, wrapper, level);
    let program = generator
        .generate(&ModulePath::parse("snippet"), &tree, &resolutions)
        .unwrap_or_else(|e| panic!("codegen failed: {e}"));
    write(&program, level)
}

/// Browser strategies, pretty output.
fn browser(source: &str) -> String {
    generate_with(source, &BrowserImports, &BrowserModuleWrapper, OptimisationLevel::None)
}

/// No envelope, pretty output.
fn bare(source: &str) -> String {
    generate_with(source, &BrowserImports, &NoWrapper, OptimisationLevel::None)
}

/// No envelope, SIMPLE output.
fn bare_simple(source: &str) -> String {
    generate_with(source, &BrowserImports, &NoWrapper, OptimisationLevel::Simple)
}

// ══════════════════════════════════════════════════════════════════════════════
// Module envelopes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_browser_module_envelope() {
    assert_eq!(
        browser("let x = 1"),
        "SHED.exportModule(\"snippet\", function() {\n    const x = 1;\n    return {\n        x: x\n    };\n});\n"
    );
}

#[test]
fn test_empty_module_exports_empty_object() {
    assert_eq!(
        browser(""),
        "SHED.exportModule(\"snippet\", function() {\n    return {};\n});\n"
    );
}

#[test]
fn test_commonjs_envelope() {
    let js = generate_with(
        "let x = 1\nvar y = 2",
        &CommonJsImports,
        &CommonJsModuleWrapper,
        OptimisationLevel::None,
    );
    assert_eq!(
        js,
        "const x = 1;\nlet y = 2;\nmodule.exports = {\n    x: x,\n    get y() {\n        return y;\n    }\n};\n"
    );
}

#[test]
fn test_no_wrapper_drops_exports() {
    assert_eq!(bare("let x = 1\nlet y = x"), "const x = 1;\nconst y = x;\n");
}

#[test]
fn test_exports_follow_declaration_order() {
    let js = browser("fun b(): Unit { }\nlet a = 1\nclass C() { }");
    let b = js.find("b: b").unwrap();
    let a = js.find("a: a").unwrap();
    let c = js.find("C: C").unwrap();
    assert!(b < a && a < c, "{js}");
}

// ══════════════════════════════════════════════════════════════════════════════
// Imports
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_browser_import_precedes_declarations() {
    let js = browser("import shed.core.strings\nlet s = strings.repeat(\"a\", 2)");
    assert_eq!(
        js,
        "SHED.exportModule(\"snippet\", function() {\n    var strings = SHED.importModule(\"shed.core.strings\");\n    const s = strings.repeat(\"a\", 2);\n    return {\n        s: s\n    };\n});\n"
    );
}

#[test]
fn test_aliased_commonjs_import() {
    let js = generate_with(
        "import shed.core.numbers as n\nlet m = n.max(1, 2)",
        &CommonJsImports,
        &NoWrapper,
        OptimisationLevel::None,
    );
    assert_eq!(
        js,
        "var n = require(\"./shed/core/numbers\");\nconst m = n.max(1, 2);\n"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Declarations and statements
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_function_with_control_flow() {
    let source = "fun f(n: Number): Number {\n    var i = 0\n    while i < n {\n        i = i + 1\n    }\n    if i == n {\n        return i\n    } else if i > n {\n        return 0\n    } else {\n        return -1\n    }\n}";
    assert_eq!(
        bare(source),
        "function f(n) {\n    let i = 0;\n    while (i < n) {\n        i = i + 1;\n    }\n    if (i === n) {\n        return i;\n    } else if (i > n) {\n        return 0;\n    } else {\n        return -1;\n    }\n}\n"
    );
}

#[test]
fn test_class_lowering() {
    let source = "class Counter(start: Number) {\n    let step = 1\n    var count = start\n    fun bump(): Unit {\n        count = count + step\n    }\n}";
    assert_eq!(
        bare(source),
        "function Counter(start) {\n    const step = 1;\n    let count = start;\n    function bump() {\n        count = count + step;\n    }\n    return {\n        start: start,\n        step: step,\n        get count() {\n            return count;\n        },\n        bump: bump\n    };\n}\n"
    );
}

#[test]
fn test_lambdas() {
    assert_eq!(
        bare("let double = fun(a: Number) => a * 2"),
        "const double = function(a) {\n    return a * 2;\n};\n"
    );
    assert_eq!(
        bare("let f = fun() { print(\"x\") }"),
        "const f = function() {\n    console.log(\"x\");\n};\n"
    );
}

#[test]
fn test_unit_and_strict_equality() {
    assert_eq!(
        bare("let u = ()\nlet same = 1 != 2"),
        "const u = undefined;\nconst same = 1 !== 2;\n"
    );
}

#[test]
fn test_grouping_follows_precedence() {
    assert_eq!(bare("let x = (1 + 2) * 3"), "const x = (1 + 2) * 3;\n");
    assert_eq!(bare("let y = 1 + (2 * 3)"), "const y = 1 + 2 * 3;\n");
    assert_eq!(bare("let z = -(1 + 2)"), "const z = -(1 + 2);\n");
    assert_eq!(bare("let w = !(true && false)"), "const w = !(true && false);\n");
}

#[test]
fn test_string_escapes_in_output() {
    assert_eq!(
        bare("let s = \"a\\\"b\\n\""),
        "const s = \"a\\\"b\\n\";\n"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Identifier spelling
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_builtins_use_host_paths() {
    assert_eq!(
        bare("fun f(): Unit {\n    print(\"hi\")\n    alert(\"!\")\n}"),
        "function f() {\n    console.log(\"hi\");\n    window.alert(\"!\");\n}\n"
    );
}

#[test]
fn test_reserved_names_escaped_but_keys_kept() {
    let js = browser("let this = 1\nlet y = this");
    assert!(js.contains("const this$ = 1;"), "{js}");
    assert!(js.contains("const y = this$;"), "{js}");
    assert!(js.contains("this: this$"), "{js}");
}

#[test]
fn test_member_names_not_escaped() {
    assert_eq!(
        bare("import a.b\nlet x = b.new"),
        "var b = SHED.importModule(\"a.b\");\nconst x = b.new;\n"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// SIMPLE
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_simple_folds_and_compacts() {
    assert_eq!(bare_simple("let x = 1 + 2 * 3"), "const x=7;\n");
    assert_eq!(bare_simple("let s = \"a\" + \"b\""), "const s=\"ab\";\n");
    assert_eq!(bare_simple("let b = !(1 > 2)"), "const b=true;\n");
}

#[test]
fn test_simple_keeps_division_by_zero() {
    assert_eq!(bare_simple("let x = 1 / 0"), "const x=1/0;\n");
}

#[test]
fn test_simple_elides_constant_branches() {
    let source = "fun f(): Unit {\n    if 1 < 2 {\n        print(\"a\")\n    } else {\n        print(\"b\")\n    }\n    while false {\n        print(\"c\")\n    }\n}";
    assert_eq!(bare_simple(source), "function f(){console.log(\"a\");}\n");
}

#[test]
fn test_simple_browser_envelope() {
    let js = generate_with(
        "var n = 2 * 21",
        &BrowserImports,
        &BrowserModuleWrapper,
        OptimisationLevel::Simple,
    );
    assert_eq!(
        js,
        "SHED.exportModule(\"snippet\",function(){let n=42;return {get n(){return n;}};});\n"
    );
}

#[test]
fn test_none_does_not_fold() {
    assert_eq!(bare("let x = 1 + 2"), "const x = 1 + 2;\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Invariants
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_missing_resolution_is_an_error() {
    let tree = parse("let x = y");
    let generator = CodeGenerator::new(&BrowserImports, &NoWrapper, OptimisationLevel::None);
    let result = generator.generate(&ModulePath::parse("snippet"), &tree, &ResolutionTable::new());
    assert!(matches!(
        result,
        Err(CodegenError::UnresolvedIdentifier { ref name, .. }) if name == "y"
    ));
}

#[test]
fn test_generator_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CodeGenerator<'static>>();
}

#[test]
fn test_deterministic_output() {
    let source = "import shed.core.strings\nclass P(x: Number) {\n    var y = x\n}\nfun g(a: Number): Number {\n    return a + 1\n}\nlet p = P(1)";
    let first = browser(source);
    for _ in 0..100 {
        assert_eq!(browser(source), first);
    }
}
