//! Constant folding for index arithmetic.
//!
//! Only integer and boolean constants are folded. Float arithmetic is left
//! alone so that rounding stays with code generation.

use crate::{BinOp, Block, Expr, For};

/// Fold constant subexpressions bottom-up.
pub fn fold_expr(expr: Expr) -> Expr {
    match expr {
        Expr::Binary(op, lhs, rhs) => fold_binary(op, fold_expr(*lhs), fold_expr(*rhs)),
        Expr::Load { tensor, indices } => Expr::Load {
            tensor,
            indices: indices.into_iter().map(fold_expr).collect(),
        },
        Expr::Store {
            tensor,
            indices,
            value,
        } => Expr::Store {
            tensor,
            indices: indices.into_iter().map(fold_expr).collect(),
            value: Box::new(fold_expr(*value)),
        },
        Expr::For(f) => Expr::For(For {
            var: f.var,
            min: Box::new(fold_expr(*f.min)),
            extent: Box::new(fold_expr(*f.extent)),
            attrs: f.attrs,
            body: Box::new(fold_expr(*f.body)),
        }),
        Expr::Block(b) => Expr::Block(Block::new(b.stmts.into_iter().map(fold_expr).collect())),
        other => other,
    }
}

fn fold_binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    match (op, &lhs, &rhs) {
        (_, Expr::IntImm(a), Expr::IntImm(b)) => {
            if let Some(n) = fold_int(op, *a, *b) {
                return Expr::IntImm(n);
            }
        }
        (BinOp::And, Expr::BoolImm(a), Expr::BoolImm(b)) => return Expr::BoolImm(*a && *b),
        (BinOp::Or, Expr::BoolImm(a), Expr::BoolImm(b)) => return Expr::BoolImm(*a || *b),
        (BinOp::Add, Expr::IntImm(0), _) | (BinOp::Mul, Expr::IntImm(1), _) => return rhs,
        (BinOp::Add | BinOp::Sub, _, Expr::IntImm(0)) | (BinOp::Mul, _, Expr::IntImm(1)) => {
            return lhs
        }
        (BinOp::Mul, Expr::IntImm(0), _) | (BinOp::Mul, _, Expr::IntImm(0)) => {
            return Expr::IntImm(0)
        }
        _ => {}
    }
    Expr::binary(op, lhs, rhs)
}

fn fold_int(op: BinOp, a: i64, b: i64) -> Option<i64> {
    match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::Max => Some(a.max(b)),
        BinOp::Min => Some(a.min(b)),
        BinOp::And | BinOp::Or => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_int_arith() {
        let e = Expr::binary(
            BinOp::Add,
            Expr::binary(BinOp::Mul, Expr::IntImm(3), Expr::IntImm(4)),
            Expr::IntImm(2),
        );
        assert_eq!(fold_expr(e), Expr::IntImm(14));
    }

    #[test]
    fn test_fold_identities() {
        let e = Expr::binary(
            BinOp::Add,
            Expr::binary(BinOp::Mul, Expr::IntImm(0), Expr::var("j")),
            Expr::var("k"),
        );
        assert_eq!(fold_expr(e), Expr::var("k"));

        let e = Expr::binary(BinOp::Mul, Expr::var("j"), Expr::IntImm(1));
        assert_eq!(fold_expr(e), Expr::var("j"));
    }

    #[test]
    fn test_float_left_alone() {
        let e = Expr::binary(BinOp::Add, Expr::FloatImm(1.0), Expr::FloatImm(2.0));
        assert_eq!(fold_expr(e.clone()), e);
    }

    #[test]
    fn test_overflow_not_folded() {
        let e = Expr::binary(BinOp::Add, Expr::IntImm(i64::MAX), Expr::IntImm(1));
        assert_eq!(fold_expr(e.clone()), e);
    }
}
