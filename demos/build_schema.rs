//! Build a schema programmatically using the builder API.

use simple_schema::{
    AnnotatedDecl, Block, Expr, Field, Literal, ModuleDecl, ProcDecl, PrototypeDef, Schema,
    TypeDecl,
};

fn main() {
    let header = Block::new()
        .options(Block::new().field(Field::new("packed").value(Expr::ident("true"))))
        .field(
            Field::new("magic")
                .ty(Expr::ident("u32"))
                .value(Literal::hex(0xCAFE).into()),
        )
        .field(Field::new("flags").ty(Expr::ident("u8")).options(
            Block::new().field(Field::new("bits").value(Expr::int(3))),
        ))
        .field(Field::new("payload").ty(Expr::index(
            Expr::ident("u8"),
            Expr::binary("-", Expr::ident("MTU"), Expr::int(8)),
        )));

    let schema = Schema::new()
        .decl(ModuleDecl::new("link"))
        .decl(
            AnnotatedDecl::new(TypeDecl::new("frame", Expr::struct_def(header)))
                .annotation("endian", Expr::string("big")),
        )
        .decl(ProcDecl::new(
            "send",
            PrototypeDef::new(Expr::ident("bool"))
                .param(Field::new("f").ty(Expr::ident("frame")))
                .param(Field::new("retries").ty(Expr::ident("u8")).value(Expr::int(3))),
        ));

    print!("{schema}");
}
