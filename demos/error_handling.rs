//! Demonstrate error handling for invalid schema input.

fn main() {
    // Unknown escape in a string literal
    match simple_schema::parse("bad.ss", "type t \"tab\\q\"\n") {
        Ok(_) => println!("Parsed OK (unexpected)"),
        Err(simple_schema::Error::Lex(e)) => {
            println!("Lex error: {e}");
            println!("  Kind: {:?}", e.kind);
            println!("  Location: row {}, column {}", e.loc.row, e.loc.col);
        }
        Err(simple_schema::Error::Parse(e)) => {
            println!("Parse error: {e}");
        }
    }

    println!();

    // Index expression never closed
    match simple_schema::parse("bad.ss", "type buf u8[16\n") {
        Ok(_) => println!("Parsed OK (unexpected)"),
        Err(simple_schema::Error::Lex(e)) => {
            println!("Lex error: {e}");
        }
        Err(simple_schema::Error::Parse(e)) => {
            println!("Parse error: {e}");
            println!("  Kind: {:?}", e.kind);
            println!("  Offending token: {}", e.token);
            println!("  Location: row {}, column {}", e.token.loc.row, e.token.loc.col);
        }
    }

    println!();

    // Keyword where a name is expected
    if let Err(e) = simple_schema::parse_str("module struct\n") {
        println!("Error at {}: {e}", e.location());
    }
}
