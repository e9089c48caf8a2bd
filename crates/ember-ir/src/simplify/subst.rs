//! Variable substitution for statement trees.

use crate::{Block, Expr, For};

/// Replace every free occurrence of `var` in `expr` with `replacement`.
///
/// A loop that rebinds `var` shadows it: its bounds are rewritten but its
/// body is not.
pub fn substitute(expr: Expr, var: &str, replacement: &Expr) -> Expr {
    match expr {
        Expr::Var(ref v) if v.name == var => replacement.clone(),
        Expr::IntImm(_) | Expr::FloatImm(_) | Expr::BoolImm(_) | Expr::Var(_) | Expr::Tensor(_) => {
            expr
        }
        Expr::Binary(op, lhs, rhs) => Expr::Binary(
            op,
            Box::new(substitute(*lhs, var, replacement)),
            Box::new(substitute(*rhs, var, replacement)),
        ),
        Expr::Load { tensor, indices } => Expr::Load {
            tensor,
            indices: subst_all(indices, var, replacement),
        },
        Expr::Store {
            tensor,
            indices,
            value,
        } => Expr::Store {
            tensor,
            indices: subst_all(indices, var, replacement),
            value: Box::new(substitute(*value, var, replacement)),
        },
        Expr::For(f) => {
            let min = substitute(*f.min, var, replacement);
            let extent = substitute(*f.extent, var, replacement);
            let body = if f.var.name == var {
                *f.body
            } else {
                substitute(*f.body, var, replacement)
            };
            Expr::For(For {
                var: f.var,
                min: Box::new(min),
                extent: Box::new(extent),
                attrs: f.attrs,
                body: Box::new(body),
            })
        }
        Expr::Block(b) => Expr::Block(Block::new(subst_all(b.stmts, var, replacement))),
    }
}

fn subst_all(exprs: Vec<Expr>, var: &str, replacement: &Expr) -> Vec<Expr> {
    exprs
        .into_iter()
        .map(|e| substitute(e, var, replacement))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinOp, LoopAttrs, Var};

    #[test]
    fn test_substitute_in_indices() {
        let load = Expr::Load {
            tensor: "x".into(),
            indices: vec![Expr::var("i"), Expr::var("j")],
        };
        let out = substitute(load, "i", &Expr::IntImm(0));
        assert_eq!(
            out,
            Expr::Load {
                tensor: "x".into(),
                indices: vec![Expr::IntImm(0), Expr::var("j")],
            }
        );
    }

    #[test]
    fn test_shadowing_loop_body_untouched() {
        let body = Expr::binary(BinOp::Add, Expr::var("i"), Expr::IntImm(1));
        let lp = Expr::for_loop(
            Var::new("i"),
            Expr::var("i"),
            Expr::IntImm(4),
            LoopAttrs::empty(),
            body.clone(),
        );
        let Expr::For(f) = substitute(lp, "i", &Expr::IntImm(7)) else {
            panic!("expected a loop");
        };
        assert_eq!(*f.min, Expr::IntImm(7));
        assert_eq!(*f.body, body);
    }
}
