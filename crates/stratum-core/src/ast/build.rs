// Terse constructors for building trees by hand: tests, benchmarks and
// front ends that synthesise code. Positions default to unknown; use
// `Located::at` where a test cares about them.

use super::*;

pub trait Located: Sized {
    fn at(self, line: u32, column: u32) -> Self;
}

impl Located for Expr {
    fn at(mut self, line: u32, column: u32) -> Self {
        self.pos = Pos::new(line, column);
        self
    }
}

impl Located for Stmt {
    fn at(mut self, line: u32, column: u32) -> Self {
        self.pos = Pos::new(line, column);
        self
    }
}

impl Located for Ident {
    fn at(mut self, line: u32, column: u32) -> Self {
        self.pos = Pos::new(line, column);
        self
    }
}

pub fn name(name: &str) -> Ident {
    Ident::new(name, Pos::default())
}

pub fn id(name: &str) -> Expr {
    Expr::ident(name, Pos::default())
}

pub fn int(value: i64) -> Expr {
    Expr::int(value, Pos::default())
}

/// Interpreted string literal holding `text`.
pub fn string(text: &str) -> Expr {
    Expr::string(text, Pos::default())
}

/// Raw string literal, written between backquotes.
pub fn raw_string(text: &str) -> Expr {
    Expr::new(
        ExprKind::BasicLit {
            kind: LitKind::String,
            value: format!("`{text}`"),
        },
        Pos::default(),
    )
}

/// `pkg.name`
pub fn sel(pkg: &str, name: &str) -> Expr {
    Expr::qualified(pkg, name, Pos::default())
}

pub fn field_of(base: Expr, sel: &str) -> Expr {
    let pos = base.pos;
    Expr::new(
        ExprKind::Selector {
            base: Box::new(base),
            sel: sel.to_string(),
        },
        pos,
    )
}

pub fn call(fun: Expr, args: Vec<Expr>) -> Expr {
    Expr::call(fun, args)
}

/// Call to a plain identifier: built-in or file-local function.
pub fn call_fn(name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(id(name), args)
}

/// `name(args...)`, spreading the last argument.
pub fn call_spread(name: &str, args: Vec<Expr>) -> Expr {
    let mut call = call_fn(name, args);
    if let ExprKind::Call { ellipsis, .. } = &mut call.kind {
        *ellipsis = true;
    }
    call
}

pub fn index(base: Expr, index: Expr) -> Expr {
    let pos = base.pos;
    Expr::new(
        ExprKind::Index {
            base: Box::new(base),
            indices: vec![index],
        },
        pos,
    )
}

pub fn slice_expr(base: Expr, low: Option<Expr>, high: Option<Expr>) -> Expr {
    let pos = base.pos;
    Expr::new(
        ExprKind::Slice {
            base: Box::new(base),
            low: low.map(Box::new),
            high: high.map(Box::new),
            max: None,
        },
        pos,
    )
}

pub fn paren(inner: Expr) -> Expr {
    let pos = inner.pos;
    Expr::new(ExprKind::Paren(Box::new(inner)), pos)
}

pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::binary(op, left, right)
}

/// `left ++ right`
pub fn concat(left: Expr, right: Expr) -> Expr {
    Expr::binary(BinaryOp::Concat, left, right)
}

pub fn not(operand: Expr) -> Expr {
    unary(UnaryOp::Not, operand)
}

pub fn recv(chan: Expr) -> Expr {
    unary(UnaryOp::Recv, chan)
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    let pos = operand.pos;
    Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        pos,
    )
}

/// Named or primitive type.
pub fn ty(name: &str) -> Expr {
    id(name)
}

/// `[]elem`
pub fn slice_ty(elem: Expr) -> Expr {
    Expr::slice_of(elem)
}

/// `[len]elem`
pub fn array_ty(len: i64, elem: Expr) -> Expr {
    Expr::new(
        ExprKind::ArrayType {
            len: Some(Box::new(int(len))),
            elem: Box::new(elem),
        },
        Pos::default(),
    )
}

pub fn map_ty(key: Expr, value: Expr) -> Expr {
    Expr::new(
        ExprKind::MapType {
            key: Box::new(key),
            value: Box::new(value),
        },
        Pos::default(),
    )
}

pub fn chan_ty(elem: Expr) -> Expr {
    Expr::new(
        ExprKind::ChanType {
            dir: ChanDir::Both,
            elem: Box::new(elem),
        },
        Pos::default(),
    )
}

pub fn ptr_ty(inner: Expr) -> Expr {
    Expr::deref(inner)
}

pub fn struct_ty(fields: Vec<Field>) -> Expr {
    Expr::new(ExprKind::StructType(fields), Pos::default())
}

pub fn field(name: &str, ty: Expr) -> Field {
    Field {
        names: vec![self::name(name)],
        ty,
        tag: None,
    }
}

/// Unnamed parameter or result.
pub fn anon(ty: Expr) -> Field {
    Field {
        names: Vec::new(),
        ty,
        tag: None,
    }
}

/// Composite literal `ty{elts}`.
pub fn lit(ty: Expr, elts: Vec<Expr>) -> Expr {
    let pos = ty.pos;
    Expr::new(
        ExprKind::CompositeLit {
            ty: Some(Box::new(ty)),
            elts,
        },
        pos,
    )
}

/// Composite literal with its type elided.
pub fn elided(elts: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::CompositeLit { ty: None, elts }, Pos::default())
}

pub fn kv(key: Expr, value: Expr) -> Expr {
    let pos = key.pos;
    Expr::new(
        ExprKind::KeyValue {
            key: Box::new(key),
            value: Box::new(value),
        },
        pos,
    )
}

/// `func(params) results { body }`
pub fn func_lit(params: Vec<Field>, results: Vec<Field>, body: Vec<Stmt>) -> Expr {
    Expr::new(
        ExprKind::FuncLit {
            ty: FuncType {
                type_params: Vec::new(),
                params,
                results,
            },
            body: block(body),
        },
        Pos::default(),
    )
}

pub fn block(stmts: Vec<Stmt>) -> Block {
    Block {
        stmts,
        pos: Pos::default(),
    }
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    let pos = expr.pos;
    Stmt::new(StmtKind::Expr(expr), pos)
}

/// `name := value`
pub fn define(name: &str, value: Expr) -> Stmt {
    define_many(&[name], vec![value])
}

pub fn define_many(names: &[&str], values: Vec<Expr>) -> Stmt {
    Stmt::new(
        StmtKind::Assign {
            lhs: names.iter().map(|n| id(n)).collect(),
            op: AssignOp::Define,
            rhs: values,
        },
        Pos::default(),
    )
}

pub fn assign(target: Expr, value: Expr) -> Stmt {
    assign_op(target, AssignOp::Assign, value)
}

pub fn assign_op(target: Expr, op: AssignOp, value: Expr) -> Stmt {
    let pos = target.pos;
    Stmt::new(
        StmtKind::Assign {
            lhs: vec![target],
            op,
            rhs: vec![value],
        },
        pos,
    )
}

pub fn inc(target: Expr) -> Stmt {
    let pos = target.pos;
    Stmt::new(StmtKind::IncDec { target, inc: true }, pos)
}

pub fn dec(target: Expr) -> Stmt {
    let pos = target.pos;
    Stmt::new(StmtKind::IncDec { target, inc: false }, pos)
}

pub fn send(chan: Expr, value: Expr) -> Stmt {
    Stmt::new(StmtKind::Send { chan, value }, Pos::default())
}

pub fn ret(values: Vec<Expr>) -> Stmt {
    Stmt::new(StmtKind::Return(values), Pos::default())
}

pub fn if_stmt(cond: Expr, then: Vec<Stmt>) -> Stmt {
    Stmt::new(
        StmtKind::If {
            init: None,
            cond,
            then: block(then),
            els: None,
        },
        Pos::default(),
    )
}

pub fn block_stmt(stmts: Vec<Stmt>) -> Stmt {
    Stmt::new(StmtKind::Block(block(stmts)), Pos::default())
}

/// `for key, value := range target { body }`
pub fn range(key: Option<&str>, value: Option<&str>, target: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::new(
        StmtKind::Range {
            key: key.map(id),
            value: value.map(id),
            define: key.is_some(),
            target,
            body: block(body),
        },
        Pos::default(),
    )
}

fn value_spec(names: &[&str], ty: Option<Expr>, values: Vec<Expr>) -> Spec {
    Spec::Value(ValueSpec {
        names: names.iter().map(|n| name(n)).collect(),
        ty,
        values,
    })
}

/// `var name ty = value`
pub fn var(name: &str, ty: Option<Expr>, value: Option<Expr>) -> GenDecl {
    GenDecl {
        kind: DeclKind::Var,
        specs: vec![value_spec(&[name], ty, value.into_iter().collect())],
        grouped: false,
        pos: Pos::default(),
    }
}

/// `const name = value`, with the name declared at `pos`.
pub fn constant(name: &str, value: Expr, pos: Pos) -> GenDecl {
    GenDecl {
        kind: DeclKind::Const,
        specs: vec![Spec::Value(ValueSpec {
            names: vec![Ident::new(name, pos)],
            ty: None,
            values: vec![value],
        })],
        grouped: false,
        pos,
    }
}

/// Parenthesised `const ( ... )` group.
pub fn constants(specs: Vec<(&str, Expr, Pos)>) -> GenDecl {
    let pos = specs.first().map(|(_, _, pos)| *pos).unwrap_or_default();
    GenDecl {
        kind: DeclKind::Const,
        specs: specs
            .into_iter()
            .map(|(name, value, pos)| {
                Spec::Value(ValueSpec {
                    names: vec![Ident::new(name, pos)],
                    ty: None,
                    values: vec![value],
                })
            })
            .collect(),
        grouped: true,
        pos,
    }
}

pub fn type_decl(name: &str, ty: Expr) -> GenDecl {
    GenDecl {
        kind: DeclKind::Type,
        specs: vec![Spec::Type(TypeSpec {
            name: self::name(name),
            type_params: Vec::new(),
            alias: false,
            ty,
        })],
        grouped: false,
        pos: Pos::default(),
    }
}

pub fn decl_stmt(decl: GenDecl) -> Stmt {
    let pos = decl.pos;
    Stmt::new(StmtKind::Decl(decl), pos)
}

pub fn func(name: &str, params: Vec<Field>, results: Vec<Field>, body: Vec<Stmt>) -> Decl {
    Decl::Func(FuncDecl {
        recv: None,
        name: self::name(name),
        ty: FuncType {
            type_params: Vec::new(),
            params,
            results,
        },
        body: Some(block(body)),
        pos: Pos::default(),
    })
}

pub fn file(decls: Vec<Decl>) -> File {
    let mut file = File::new("main.st", "main");
    file.decls = decls;
    file
}

/// `package main` with a single `func main() { stmts }`.
pub fn main_file(stmts: Vec<Stmt>) -> File {
    file(vec![func("main", Vec::new(), Vec::new(), stmts)])
}

/// Rendered statements of the body of the function called `name`.
pub fn body_source(file: &File, name: &str) -> Vec<String> {
    file.decls
        .iter()
        .find_map(|decl| match decl {
            Decl::Func(func) if func.name.name == name => func.body.as_ref(),
            _ => None,
        })
        .map(|body| body.stmts.iter().map(|stmt| stmt.to_source()).collect())
        .unwrap_or_default()
}
