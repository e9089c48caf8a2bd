//! Block flattening.
//!
//! A block that appears directly as a statement of another block is
//! spliced into it, so `{ a; { b; c } }` becomes `{ a; b; c }`.

use crate::{Block, Expr, For};

/// Flatten nested blocks, in place.
///
/// Returns the number of blocks spliced into their parent.
pub fn simplify_blocks(expr: &mut Expr) -> usize {
    let mut flattened = 0;
    let taken = std::mem::replace(expr, Expr::block(Vec::new()));
    *expr = flatten(taken, &mut flattened);
    flattened
}

fn flatten(expr: Expr, flattened: &mut usize) -> Expr {
    match expr {
        Expr::Block(b) => {
            let mut stmts = Vec::with_capacity(b.stmts.len());
            for stmt in b.stmts {
                match flatten(stmt, flattened) {
                    Expr::Block(inner) => {
                        *flattened += 1;
                        stmts.extend(inner.stmts);
                    }
                    other => stmts.push(other),
                }
            }
            Expr::Block(Block::new(stmts))
        }
        Expr::For(f) => Expr::For(For {
            var: f.var,
            min: f.min,
            extent: f.extent,
            attrs: f.attrs,
            body: Box::new(flatten(*f.body, flattened)),
        }),
        other => other,
    }
}
