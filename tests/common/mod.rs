#![allow(dead_code)]

use simple_schema::{Schema, format, parse, parse_str};

/// Parse `input`, format it, and require the exact same text back.
pub fn roundtrip(input: &str) {
    let schema = parse("roundtrip.ss", input).expect("parse failed");
    let output = format(&schema);
    assert_eq!(
        output, input,
        "round-trip mismatch:\n--- expected ---\n{input}\n--- got ---\n{output}"
    );
}

/// Parse `input` and return its canonical formatting.
pub fn normalize(input: &str) -> String {
    format(&parse_str(input).expect("parse failed"))
}

/// Helper: format an AST, parse it back, assert the formatting is stable.
pub fn assert_ast_roundtrip(original: &Schema) {
    let formatted = format(original);
    let parsed = parse_str(&formatted).unwrap_or_else(|e| {
        panic!(
            "failed to re-parse formatted output: {e}\n\
             --- formatted ---\n{formatted}"
        )
    });

    assert_eq!(
        original.decls.len(),
        parsed.decls.len(),
        "declaration count mismatch\n--- formatted ---\n{formatted}"
    );
    assert_eq!(
        formatted,
        format(&parsed),
        "formatting is not stable\n--- formatted ---\n{formatted}"
    );
}
