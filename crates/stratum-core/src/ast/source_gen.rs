// Source code generation from the tree.
// Output follows the base language's canonical layout (tab indentation, one
// statement per line) so the lowered file can go straight to its toolchain.

use super::*;

/// Trait for types that can generate their source code representation
pub trait ToSource {
    fn to_source(&self) -> String;
}

const UNARY_PREC: u8 = 6;
const PRIMARY_PREC: u8 = 7;

fn expr_prec(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Binary { op, .. } => op.precedence(),
        ExprKind::Unary { .. } | ExprKind::Star(_) => UNARY_PREC,
        _ => PRIMARY_PREC,
    }
}

/// Stateful printer; carries the indentation level so that function
/// literals nested inside expressions lay out their bodies correctly.
#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn finish(self) -> String {
        self.out
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    fn list(&mut self, exprs: &[Expr]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(expr);
        }
    }

    fn expr_with_prec(&mut self, expr: &Expr, min_prec: u8) {
        if expr_prec(expr) < min_prec {
            self.out.push('(');
            self.expr(expr);
            self.out.push(')');
        } else {
            self.expr(expr);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) => self.out.push_str(name),
            ExprKind::BasicLit { value, .. } => self.out.push_str(value),
            ExprKind::CompositeLit { ty, elts } => {
                if let Some(ty) = ty {
                    self.expr(ty);
                }
                self.out.push('{');
                self.list(elts);
                self.out.push('}');
            }
            ExprKind::KeyValue { key, value } => {
                self.expr(key);
                self.out.push_str(": ");
                self.expr(value);
            }
            ExprKind::FuncLit { ty, body } => {
                self.out.push_str("func");
                self.signature(ty);
                self.out.push(' ');
                self.block(body);
            }
            ExprKind::Paren(inner) => {
                self.out.push('(');
                self.expr(inner);
                self.out.push(')');
            }
            ExprKind::Selector { base, sel } => {
                self.expr_with_prec(base, PRIMARY_PREC);
                self.out.push('.');
                self.out.push_str(sel);
            }
            ExprKind::Index { base, indices } => {
                self.expr_with_prec(base, PRIMARY_PREC);
                self.out.push('[');
                self.list(indices);
                self.out.push(']');
            }
            ExprKind::Slice {
                base,
                low,
                high,
                max,
            } => {
                self.expr_with_prec(base, PRIMARY_PREC);
                self.out.push('[');
                if let Some(low) = low {
                    self.expr(low);
                }
                self.out.push(':');
                if let Some(high) = high {
                    self.expr(high);
                }
                if let Some(max) = max {
                    self.out.push(':');
                    self.expr(max);
                }
                self.out.push(']');
            }
            ExprKind::TypeAssert { base, ty } => {
                self.expr_with_prec(base, PRIMARY_PREC);
                self.out.push_str(".(");
                match ty {
                    Some(ty) => self.expr(ty),
                    None => self.out.push_str("type"),
                }
                self.out.push(')');
            }
            ExprKind::Call {
                fun,
                args,
                ellipsis,
            } => {
                match fun.kind {
                    // `func(...)(x)` and `*T(x)` need wrapping to parse as conversions
                    ExprKind::FuncType(_) | ExprKind::Star(_) => {
                        self.out.push('(');
                        self.expr(fun);
                        self.out.push(')');
                    }
                    _ => self.expr_with_prec(fun, PRIMARY_PREC),
                }
                self.out.push('(');
                self.list(args);
                if *ellipsis {
                    self.out.push_str("...");
                }
                self.out.push(')');
            }
            ExprKind::Star(inner) => {
                self.out.push('*');
                self.expr_with_prec(inner, UNARY_PREC);
            }
            ExprKind::Unary { op, operand } => {
                self.out.push_str(op.token());
                self.expr_with_prec(operand, UNARY_PREC);
            }
            ExprKind::Binary { op, left, right } => {
                let prec = op.precedence();
                self.expr_with_prec(left, prec);
                self.out.push(' ');
                self.out.push_str(op.token());
                self.out.push(' ');
                self.expr_with_prec(right, prec + 1);
            }
            ExprKind::ArrayType { len, elem } => {
                self.out.push('[');
                if let Some(len) = len {
                    self.expr(len);
                }
                self.out.push(']');
                self.expr(elem);
            }
            ExprKind::MapType { key, value } => {
                self.out.push_str("map[");
                self.expr(key);
                self.out.push(']');
                self.expr(value);
            }
            ExprKind::ChanType { dir, elem } => {
                self.out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.expr(elem);
            }
            ExprKind::StructType(fields) => {
                self.field_block("struct", fields, "; ");
            }
            ExprKind::InterfaceType(fields) => {
                self.field_block("interface", fields, "; ");
            }
            ExprKind::FuncType(ty) => {
                self.out.push_str("func");
                self.signature(ty);
            }
            ExprKind::Ellipsis(elem) => {
                self.out.push_str("...");
                if let Some(elem) = elem {
                    self.expr(elem);
                }
            }
        }
    }

    fn field_block(&mut self, keyword: &str, fields: &[Field], sep: &str) {
        self.out.push_str(keyword);
        if fields.is_empty() {
            self.out.push_str("{}");
            return;
        }
        let methods = keyword == "interface";
        self.out.push_str(" { ");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.out.push_str(sep);
            }
            if methods {
                self.method(field);
            } else {
                self.field(field);
            }
        }
        self.out.push_str(" }");
    }

    // interface methods print as `Name(args) result`
    fn method(&mut self, field: &Field) {
        match (&field.ty.kind, field.names.first()) {
            (ExprKind::FuncType(ty), Some(name)) => {
                self.out.push_str(&name.name);
                self.signature(ty);
            }
            _ => self.field(field),
        }
    }

    fn field(&mut self, field: &Field) {
        if !field.names.is_empty() {
            let names: Vec<&str> = field.names.iter().map(|n| n.name.as_str()).collect();
            self.out.push_str(&names.join(", "));
            self.out.push(' ');
        }
        self.expr(&field.ty);
        if let Some(tag) = &field.tag {
            self.out.push(' ');
            self.out.push_str(tag);
        }
    }

    fn fields(&mut self, fields: &[Field]) {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.field(field);
        }
    }

    fn signature(&mut self, ty: &FuncType) {
        if !ty.type_params.is_empty() {
            self.out.push('[');
            self.fields(&ty.type_params);
            self.out.push(']');
        }
        self.out.push('(');
        self.fields(&ty.params);
        self.out.push(')');
        match ty.results.as_slice() {
            [] => {}
            [single] if single.names.is_empty() => {
                self.out.push(' ');
                self.expr(&single.ty);
            }
            results => {
                self.out.push_str(" (");
                self.fields(results);
                self.out.push(')');
            }
        }
    }

    fn block(&mut self, block: &Block) {
        self.out.push('{');
        self.indent += 1;
        for stmt in &block.stmts {
            self.newline();
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.newline();
        self.out.push('}');
    }

    fn simple_header(&mut self, init: &Option<Box<Stmt>>) {
        if let Some(init) = init {
            self.stmt(init);
            self.out.push_str("; ");
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(expr) => self.expr(expr),
            StmtKind::Assign { lhs, op, rhs } => {
                self.list(lhs);
                self.out.push(' ');
                self.out.push_str(op.token());
                self.out.push(' ');
                self.list(rhs);
            }
            StmtKind::IncDec { target, inc } => {
                self.expr(target);
                self.out.push_str(if *inc { "++" } else { "--" });
            }
            StmtKind::Decl(decl) => self.gen_decl(decl),
            StmtKind::Block(block) => self.block(block),
            StmtKind::If {
                init,
                cond,
                then,
                els,
            } => {
                self.out.push_str("if ");
                self.simple_header(init);
                self.expr(cond);
                self.out.push(' ');
                self.block(then);
                if let Some(els) = els {
                    self.out.push_str(" else ");
                    self.stmt(els);
                }
            }
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => {
                self.out.push_str("for ");
                if init.is_some() || post.is_some() {
                    self.simple_header(init);
                    if let Some(cond) = cond {
                        self.expr(cond);
                    }
                    self.out.push_str("; ");
                    if let Some(post) = post {
                        self.stmt(post);
                    }
                    self.out.push(' ');
                } else if let Some(cond) = cond {
                    self.expr(cond);
                    self.out.push(' ');
                }
                self.block(body);
            }
            StmtKind::Range {
                key,
                value,
                define,
                target,
                body,
            } => {
                self.out.push_str("for ");
                if let Some(key) = key {
                    self.expr(key);
                    if let Some(value) = value {
                        self.out.push_str(", ");
                        self.expr(value);
                    }
                    self.out.push_str(if *define { " := " } else { " = " });
                }
                self.out.push_str("range ");
                self.expr(target);
                self.out.push(' ');
                self.block(body);
            }
            StmtKind::Switch { init, tag, clauses } => {
                self.out.push_str("switch ");
                self.simple_header(init);
                if let Some(tag) = tag {
                    self.expr(tag);
                    self.out.push(' ');
                }
                self.out.push('{');
                for clause in clauses {
                    self.newline();
                    if clause.exprs.is_empty() {
                        self.out.push_str("default:");
                    } else {
                        self.out.push_str("case ");
                        self.list(&clause.exprs);
                        self.out.push(':');
                    }
                    self.indent += 1;
                    for stmt in &clause.body {
                        self.newline();
                        self.stmt(stmt);
                    }
                    self.indent -= 1;
                }
                self.newline();
                self.out.push('}');
            }
            StmtKind::Return(results) => {
                self.out.push_str("return");
                if !results.is_empty() {
                    self.out.push(' ');
                    self.list(results);
                }
            }
            StmtKind::Branch { kind, label } => {
                self.out.push_str(match kind {
                    BranchKind::Break => "break",
                    BranchKind::Continue => "continue",
                    BranchKind::Goto => "goto",
                    BranchKind::Fallthrough => "fallthrough",
                });
                if let Some(label) = label {
                    self.out.push(' ');
                    self.out.push_str(&label.name);
                }
            }
            StmtKind::Send { chan, value } => {
                self.expr(chan);
                self.out.push_str(" <- ");
                self.expr(value);
            }
            StmtKind::Go(call) => {
                self.out.push_str("go ");
                self.expr(call);
            }
            StmtKind::Defer(call) => {
                self.out.push_str("defer ");
                self.expr(call);
            }
            StmtKind::Labeled { label, stmt } => {
                self.out.push_str(&label.name);
                self.out.push(':');
                self.newline();
                self.stmt(stmt);
            }
            StmtKind::Empty => {}
        }
    }

    fn spec(&mut self, kind: DeclKind, spec: &Spec) {
        match spec {
            Spec::Value(value) => {
                let names: Vec<&str> = value.names.iter().map(|n| n.name.as_str()).collect();
                self.out.push_str(&names.join(", "));
                if let Some(ty) = &value.ty {
                    self.out.push(' ');
                    self.expr(ty);
                }
                if !value.values.is_empty() {
                    self.out.push_str(" = ");
                    self.list(&value.values);
                }
            }
            Spec::Type(ty) => {
                debug_assert_eq!(kind, DeclKind::Type);
                self.out.push_str(&ty.name.name);
                if !ty.type_params.is_empty() {
                    self.out.push('[');
                    self.fields(&ty.type_params);
                    self.out.push(']');
                }
                self.out.push_str(if ty.alias { " = " } else { " " });
                self.expr(&ty.ty);
            }
        }
    }

    fn gen_decl(&mut self, decl: &GenDecl) {
        self.out.push_str(decl.kind.keyword());
        if decl.grouped || decl.specs.len() != 1 {
            self.out.push_str(" (");
            self.indent += 1;
            for spec in &decl.specs {
                self.newline();
                self.spec(decl.kind, spec);
            }
            self.indent -= 1;
            self.newline();
            self.out.push(')');
        } else {
            self.out.push(' ');
            self.spec(decl.kind, &decl.specs[0]);
        }
    }

    fn func_decl(&mut self, func: &FuncDecl) {
        self.out.push_str("func ");
        if let Some(recv) = &func.recv {
            self.out.push('(');
            self.field(recv);
            self.out.push_str(") ");
        }
        self.out.push_str(&func.name.name);
        self.signature(&func.ty);
        if let Some(body) = &func.body {
            self.out.push(' ');
            self.block(body);
        }
    }

    fn import_spec(&mut self, spec: &ImportSpec) {
        if let Some(alias) = &spec.alias {
            self.out.push_str(alias);
            self.out.push(' ');
        }
        self.out.push_str(&format!("{:?}", spec.path));
    }

    fn file(&mut self, file: &File) {
        self.out.push_str("package ");
        self.out.push_str(&file.package.name);
        self.out.push('\n');

        for import in &file.imports {
            self.out.push_str("\nimport ");
            if import.grouped || import.specs.len() != 1 {
                self.out.push('(');
                for spec in &import.specs {
                    self.out.push_str("\n\t");
                    self.import_spec(spec);
                }
                self.out.push_str("\n)");
            } else {
                self.import_spec(&import.specs[0]);
            }
            self.out.push('\n');
        }

        for decl in &file.decls {
            self.out.push('\n');
            match decl {
                Decl::Gen(gen) => self.gen_decl(gen),
                Decl::Func(func) => self.func_decl(func),
            }
            self.out.push('\n');
        }
    }
}

impl ToSource for Expr {
    fn to_source(&self) -> String {
        let mut printer = Printer::default();
        printer.expr(self);
        printer.finish()
    }
}

impl ToSource for Stmt {
    fn to_source(&self) -> String {
        let mut printer = Printer::default();
        printer.stmt(self);
        printer.finish()
    }
}

impl ToSource for Block {
    fn to_source(&self) -> String {
        let mut printer = Printer::default();
        printer.block(self);
        printer.finish()
    }
}

impl ToSource for GenDecl {
    fn to_source(&self) -> String {
        let mut printer = Printer::default();
        printer.gen_decl(self);
        printer.finish()
    }
}

impl ToSource for FuncDecl {
    fn to_source(&self) -> String {
        let mut printer = Printer::default();
        printer.func_decl(self);
        printer.finish()
    }
}

impl ToSource for File {
    fn to_source(&self) -> String {
        let mut printer = Printer::default();
        printer.file(self);
        printer.finish()
    }
}
