//! Mapping Shed identifiers to JavaScript identifiers.
//!
//! Shed identifiers never contain `$`, so appending one gives a name that
//! cannot collide with any other Shed binding.

/// Reserved words, plus the host globals that generated code itself refers
/// to and that a Shed binding must therefore never shadow.
const RESERVED: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "const", "continue", "debugger", "default",
    "delete", "do", "enum", "eval", "export", "extends", "finally", "for", "function", "implements",
    "in", "instanceof", "interface", "new", "null", "package", "private", "protected", "public",
    "static", "super", "switch", "this", "throw", "try", "typeof", "void", "with", "yield",
    // Globals used by lowering, builtins and module wrappers.
    "Infinity", "NaN", "String", "SHED", "console", "exports", "module", "require", "undefined",
    "window",
];

/// The JavaScript name for the Shed binding `name`.
pub fn js_name(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("{name}$")
    } else {
        name.to_string()
    }
}
