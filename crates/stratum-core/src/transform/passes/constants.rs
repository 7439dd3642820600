//! Constant demotion.
//!
//! A `const` of the dialect may be initialized with anything immutable,
//! including slices, maps and `str` values. Once those are lowered to
//! pointers and runtime calls the base language can no longer evaluate them
//! at compile time, so a declaration with such an initializer is emitted as
//! `var`. The const checker has already run on the dialect tree, so the
//! names keep their read-only guarantee.

use tracing::debug;

use crate::ast::{DeclKind, GenDecl, Spec, ToSource};
use crate::errors::{TransformError, TransformResult};
use crate::transform::{PassContext, RewritePass};

pub struct ConstDemotion;

impl RewritePass for ConstDemotion {
    fn name(&self) -> &'static str {
        "const-demotion"
    }

    fn description(&self) -> &'static str {
        "Declare constants whose lowered initializers are not base-language constants as variables"
    }

    fn exit_gen_decl(&mut self, decl: &mut GenDecl, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        if decl.kind != DeclKind::Const {
            return Ok(false);
        }

        let mut values = decl.specs.iter().flat_map(|spec| match spec {
            Spec::Value(spec) => spec.values.as_slice(),
            Spec::Type(_) => &[][..],
        });
        let Some(runtime_only) = values.find(|value| !cx.tracker.is_constant_expr(value)) else {
            return Ok(false);
        };

        // `const ( A = ..; B )` repeats A's initializer; a `var` cannot
        let repeated = decl.specs.iter().find_map(|spec| match spec {
            Spec::Value(spec) if spec.values.is_empty() => spec.names.first(),
            _ => None,
        });
        if let Some(name) = repeated {
            return Err(TransformError::unsupported(
                format!(
                    "`{}` repeats a constant initializer that has no base-language constant form: `{}`",
                    name.name,
                    runtime_only.to_source()
                ),
                name.pos,
            ));
        }

        debug!(pos = %decl.pos, value = %runtime_only.to_source(), "constant declared as var");
        decl.kind = DeclKind::Var;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::ast::{Decl, Pos};
    use crate::transform::passes::{test_support::run, ConcatLowering, Pointerize, StringLiterals};

    fn lower(decls: Vec<Decl>) -> TransformResult<String> {
        let mut file = file(decls);
        run(
            vec![
                Box::new(Pointerize),
                Box::new(StringLiterals),
                Box::new(ConcatLowering),
                Box::new(ConstDemotion),
            ],
            &mut file,
        )?;
        Ok(file.to_source())
    }

    #[test]
    fn test_slice_constant_becomes_var() {
        let source = lower(vec![
            Decl::Gen(constant("Primes", lit(slice_ty(ty("int")), vec![int(2), int(3)]), Pos::new(1, 7))),
            Decl::Gen(constant("Limit", int(10), Pos::new(2, 7))),
        ])
        .unwrap();
        assert!(source.contains("var Primes = &[]int{2, 3}"));
        assert!(source.contains("const Limit = 10"));
    }

    #[test]
    fn test_string_constants_stay_constant() {
        let source = lower(vec![
            Decl::Gen(constant("Greeting", string("hi"), Pos::new(1, 7))),
            Decl::Gen(constant("Shout", concat(id("Greeting"), string("!")), Pos::new(2, 7))),
            Decl::Gen(constant("Both", concat(concat(string("a"), string("b")), id("Shout")), Pos::new(3, 7))),
        ])
        .unwrap();
        assert!(source.contains(r#"const Greeting = "hi""#));
        assert!(source.contains(r#"const Shout = Greeting + "!""#));
        assert!(source.contains(r#"const Both = "a" + "b" + Shout"#));
    }

    #[test]
    fn test_constant_built_from_demoted_constant_is_demoted() {
        let source = lower(vec![
            Decl::Gen(constant("Base", lit(slice_ty(ty("int")), vec![int(1)]), Pos::new(1, 7))),
            Decl::Gen(constant("Alias", id("Base"), Pos::new(2, 7))),
        ])
        .unwrap();
        assert!(source.contains("var Base = &[]int{1}"));
        assert!(source.contains("var Alias = Base"));
    }

    #[test]
    fn test_repeated_initializer_cannot_be_demoted() {
        let mut group = constants(vec![
            ("A", lit(slice_ty(ty("int")), vec![]), Pos::new(2, 2)),
            ("B", int(0), Pos::new(3, 2)),
        ]);
        if let Spec::Value(spec) = &mut group.specs[1] {
            spec.values.clear();
        }

        let err = lower(vec![Decl::Gen(group)]).unwrap_err();
        match err {
            TransformError::UnsupportedConstruct { message, pos } => {
                assert_eq!(pos, Pos::new(3, 2));
                assert!(message.contains("`B`"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
