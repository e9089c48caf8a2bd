//! Unit loop removal.
//!
//! Replaces `for i in min..min+1 { body }` with `body[i := min]`.

use crate::{Block, Expr, For};

use super::{fold::fold_expr, subst::substitute};

/// Remove every loop whose trip count is the constant one, in place.
///
/// Returns the number of loops removed.
pub fn simplify_for_loops(expr: &mut Expr) -> usize {
    let mut removed = 0;
    let taken = std::mem::replace(expr, Expr::block(Vec::new()));
    *expr = remove_unit_loops(taken, &mut removed);
    removed
}

fn remove_unit_loops(expr: Expr, removed: &mut usize) -> Expr {
    match expr {
        Expr::For(f) => {
            let body = remove_unit_loops(*f.body, removed);
            if f.extent.as_int() == Some(1) {
                *removed += 1;
                fold_expr(substitute(body, &f.var.name, &f.min))
            } else {
                Expr::For(For {
                    var: f.var,
                    min: f.min,
                    extent: f.extent,
                    attrs: f.attrs,
                    body: Box::new(body),
                })
            }
        }
        Expr::Block(b) => Expr::Block(Block::new(
            b.stmts
                .into_iter()
                .map(|s| remove_unit_loops(s, removed))
                .collect(),
        )),
        other => other,
    }
}
