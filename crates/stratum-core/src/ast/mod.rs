// Tree model shared with the Stratum front end.
// The front end hands over one `File` per source file (as JSON); the lowering
// passes mutate it in place and `source_gen` prints the result.

pub mod build;
pub mod source_gen;
pub use source_gen::ToSource;

#[cfg(test)]
mod source_gen_tests;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source position, 1-based. `0:0` means the position is unknown
/// (nodes synthesised by a pass inherit the position of what they replace).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    pub fn is_known(&self) -> bool {
        self.line != 0
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    #[serde(default)]
    pub pos: Pos,
}

impl Ident {
    pub fn new(name: impl Into<String>, pos: Pos) -> Self {
        Self {
            name: name.into(),
            pos,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

/// One source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    #[serde(default)]
    pub name: String,
    pub package: Ident,
    #[serde(default)]
    pub imports: Vec<ImportDecl>,
    #[serde(default)]
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub specs: Vec<ImportSpec>,
    #[serde(default)]
    pub grouped: bool,
    #[serde(default)]
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSpec {
    #[serde(default)]
    pub alias: Option<String>,
    pub path: String,
    #[serde(default)]
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    Gen(GenDecl),
    Func(FuncDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclKind {
    Const,
    Var,
    Type,
}

impl DeclKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            DeclKind::Const => "const",
            DeclKind::Var => "var",
            DeclKind::Type => "type",
        }
    }
}

/// `const`, `var` or `type` declaration, single or parenthesised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenDecl {
    pub kind: DeclKind,
    pub specs: Vec<Spec>,
    #[serde(default)]
    pub grouped: bool,
    #[serde(default)]
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Spec {
    Value(ValueSpec),
    Type(TypeSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    #[serde(default)]
    pub ty: Option<Expr>,
    #[serde(default)]
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: Ident,
    #[serde(default)]
    pub type_params: Vec<Field>,
    #[serde(default)]
    pub alias: bool,
    pub ty: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    #[serde(default)]
    pub recv: Option<Field>,
    pub name: Ident,
    pub ty: FuncType,
    #[serde(default)]
    pub body: Option<Block>,
    #[serde(default)]
    pub pos: Pos,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuncType {
    #[serde(default)]
    pub type_params: Vec<Field>,
    #[serde(default)]
    pub params: Vec<Field>,
    #[serde(default)]
    pub results: Vec<Field>,
}

/// Parameter, result, struct field or interface method.
/// An empty `names` list is an anonymous (or embedded) field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default)]
    pub names: Vec<Ident>,
    pub ty: Expr,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    #[serde(default)]
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    #[serde(default)]
    pub pos: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Define,
    Add,
    Sub,
    Mul,
    Quo,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
}

impl AssignOp {
    pub fn token(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Define => ":=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Quo => "/=",
            AssignOp::Rem => "%=",
            AssignOp::And => "&=",
            AssignOp::Or => "|=",
            AssignOp::Xor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::AndNot => "&^=",
        }
    }

    /// True for every operator that writes to an existing binding.
    pub fn mutates(&self) -> bool {
        !matches!(self, AssignOp::Define)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    Expr(Expr),
    Assign {
        lhs: Vec<Expr>,
        op: AssignOp,
        rhs: Vec<Expr>,
    },
    IncDec {
        target: Expr,
        inc: bool,
    },
    Decl(GenDecl),
    Block(Block),
    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Block,
        els: Option<Box<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        target: Expr,
        body: Block,
    },
    Switch {
        init: Option<Box<Stmt>>,
        tag: Option<Expr>,
        clauses: Vec<CaseClause>,
    },
    Return(Vec<Expr>),
    Branch {
        kind: BranchKind,
        label: Option<Ident>,
    },
    Send {
        chan: Expr,
        value: Expr,
    },
    Go(Expr),
    Defer(Expr),
    Labeled {
        label: Ident,
        stmt: Box<Stmt>,
    },
    Empty,
}

/// `case a, b:` clause; an empty `exprs` list is `default:`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseClause {
    pub exprs: Vec<Expr>,
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    #[serde(default)]
    pub pos: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    Addr,
    Recv,
}

impl UnaryOp {
    pub fn token(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "^",
            UnaryOp::Addr => "&",
            UnaryOp::Recv => "<-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Quo,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    Eql,
    Neq,
    Lss,
    Leq,
    Gtr,
    Geq,
    /// Stratum `++`: string/slice concatenation. Never survives lowering.
    Concat,
}

impl BinaryOp {
    pub fn token(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Quo => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::AndNot => "&^",
            BinaryOp::LAnd => "&&",
            BinaryOp::LOr => "||",
            BinaryOp::Eql => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lss => "<",
            BinaryOp::Leq => "<=",
            BinaryOp::Gtr => ">",
            BinaryOp::Geq => ">=",
            BinaryOp::Concat => "++",
        }
    }

    /// Binding strength as used by the base language's printer.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::LOr => 1,
            BinaryOp::LAnd => 2,
            BinaryOp::Eql
            | BinaryOp::Neq
            | BinaryOp::Lss
            | BinaryOp::Leq
            | BinaryOp::Gtr
            | BinaryOp::Geq => 3,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::Xor | BinaryOp::Concat => 4,
            BinaryOp::Mul
            | BinaryOp::Quo
            | BinaryOp::Rem
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::And
            | BinaryOp::AndNot => 5,
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eql | BinaryOp::Neq | BinaryOp::Lss | BinaryOp::Leq | BinaryOp::Gtr | BinaryOp::Geq
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Expressions. As in the base language's own tree, type expressions are
/// expressions too (`ArrayType`, `MapType`, `Star` as pointer type, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Ident(String),
    /// `value` is the literal exactly as written, quotes included.
    BasicLit {
        kind: LitKind,
        value: String,
    },
    CompositeLit {
        ty: Option<Box<Expr>>,
        elts: Vec<Expr>,
    },
    KeyValue {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    FuncLit {
        ty: FuncType,
        body: Block,
    },
    Paren(Box<Expr>),
    Selector {
        base: Box<Expr>,
        sel: String,
    },
    /// `x[i]`, or an explicit instantiation `f[T1, T2]`.
    Index {
        base: Box<Expr>,
        indices: Vec<Expr>,
    },
    Slice {
        base: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
    },
    TypeAssert {
        base: Box<Expr>,
        ty: Option<Box<Expr>>,
    },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
        #[serde(default)]
        ellipsis: bool,
    },
    /// Dereference in value position, pointer type in type position.
    Star(Box<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    ArrayType {
        len: Option<Box<Expr>>,
        elem: Box<Expr>,
    },
    MapType {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    ChanType {
        dir: ChanDir,
        elem: Box<Expr>,
    },
    StructType(Vec<Field>),
    InterfaceType(Vec<Field>),
    FuncType(FuncType),
    Ellipsis(Option<Box<Expr>>),
}

/// Interpreted string literal for `text`, escaped the way the base language
/// reads it back.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// Construction helpers used by the passes and by tests.
impl Expr {
    pub fn new(kind: ExprKind, pos: Pos) -> Self {
        Self { kind, pos }
    }

    pub fn ident(name: impl Into<String>, pos: Pos) -> Self {
        Self::new(ExprKind::Ident(name.into()), pos)
    }

    pub fn int(value: impl fmt::Display, pos: Pos) -> Self {
        Self::new(
            ExprKind::BasicLit {
                kind: LitKind::Int,
                value: value.to_string(),
            },
            pos,
        )
    }

    pub fn string(text: &str, pos: Pos) -> Self {
        Self::new(
            ExprKind::BasicLit {
                kind: LitKind::String,
                value: quote(text),
            },
            pos,
        )
    }

    /// `pkg.name`
    pub fn qualified(pkg: &str, name: &str, pos: Pos) -> Self {
        Self::new(
            ExprKind::Selector {
                base: Box::new(Self::ident(pkg, pos)),
                sel: name.to_string(),
            },
            pos,
        )
    }

    pub fn call(fun: Expr, args: Vec<Expr>) -> Self {
        let pos = fun.pos;
        Self::new(
            ExprKind::Call {
                fun: Box::new(fun),
                args,
                ellipsis: false,
            },
            pos,
        )
    }

    /// `fun[type_args...]`; returns `fun` unchanged when there are no type arguments.
    pub fn instantiate(fun: Expr, type_args: Vec<Expr>) -> Self {
        if type_args.is_empty() {
            return fun;
        }
        let pos = fun.pos;
        Self::new(
            ExprKind::Index {
                base: Box::new(fun),
                indices: type_args,
            },
            pos,
        )
    }

    pub fn deref(inner: Expr) -> Self {
        let pos = inner.pos;
        Self::new(ExprKind::Star(Box::new(inner)), pos)
    }

    pub fn addr(inner: Expr) -> Self {
        let pos = inner.pos;
        Self::new(
            ExprKind::Unary {
                op: UnaryOp::Addr,
                operand: Box::new(inner),
            },
            pos,
        )
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        let pos = left.pos;
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            pos,
        )
    }

    pub fn slice_of(elem: Expr) -> Self {
        let pos = elem.pos;
        Self::new(
            ExprKind::ArrayType {
                len: None,
                elem: Box::new(elem),
            },
            pos,
        )
    }

    /// Replace `self` with a placeholder and return the previous value.
    pub fn take(&mut self) -> Expr {
        std::mem::replace(self, Expr::ident("_", self.pos))
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// `pkg.name` -> `Some(("pkg", "name"))`
    pub fn as_qualified(&self) -> Option<(&str, &str)> {
        match &self.kind {
            ExprKind::Selector { base, sel } => base.as_ident().map(|pkg| (pkg, sel.as_str())),
            _ => None,
        }
    }

    pub fn is_string_lit(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::BasicLit {
                kind: LitKind::String,
                ..
            }
        )
    }

    /// Strip redundant parentheses.
    pub fn unparen(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) => inner.unparen(),
            _ => self,
        }
    }
}

impl Stmt {
    pub fn new(kind: StmtKind, pos: Pos) -> Self {
        Self { kind, pos }
    }

    pub fn assign(lhs: Expr, rhs: Expr) -> Self {
        let pos = lhs.pos;
        Self::new(
            StmtKind::Assign {
                lhs: vec![lhs],
                op: AssignOp::Assign,
                rhs: vec![rhs],
            },
            pos,
        )
    }
}

impl File {
    pub fn new(name: impl Into<String>, package: &str) -> Self {
        Self {
            name: name.into(),
            package: Ident::new(package, Pos::new(1, 9)),
            imports: Vec::new(),
            decls: Vec::new(),
        }
    }

    /// Every import path the file already declares.
    pub fn import_paths(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .flat_map(|decl| decl.specs.iter())
            .map(|spec| spec.path.as_str())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_source())
    }
}
