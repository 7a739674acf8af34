//! Parse a schema string and re-format it.

use simple_schema::Decl;

fn main() {
    let input = "\
# sensor record
module sensors

[[doc = \"one reading\"]]
type reading struct {
  id   : u32
  temp : f32 = 0.0
  tags : u8[4] options { packed = true; }
}

proc publish(r : reading) -> bool
";

    let schema = simple_schema::parse("sensors.ss", input).expect("parse failed");

    println!("Declarations: {}", schema.decls.len());
    for decl in &schema.decls {
        let kind = match decl {
            Decl::Module(_) => "module",
            Decl::Type(_) => "type",
            Decl::Proc(_) => "proc",
            Decl::Annotated(_) => "annotated",
            Decl::Field(_) | Decl::Options(_) => "entry",
        };
        if let Some(name) = decl.name() {
            println!("  {kind} {} at {}", name.name(), name.token.loc);
        }
    }

    let output = simple_schema::format(&schema);
    println!("\nFormatted output:\n{output}");
}
