//! Modules of root expressions.
//!
//! Some schedules produce more than one root expression, e.g. a two-pass
//! block reduction writes a partial result in its first root and consumes
//! it in the second. Later compiler stages expect a single executable unit,
//! so a [`ModuleExpr`] can fuse its roots with [`ModuleExpr::merge_exprs`].

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Expr, IrError};

/// An ordered collection of root expressions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleExpr {
    exprs: Vec<Expr>,
}

impl ModuleExpr {
    /// Creates a module from root expressions, in execution order.
    #[must_use]
    pub fn new(exprs: Vec<Expr>) -> Self {
        Self { exprs }
    }

    /// Returns the root expressions.
    #[must_use]
    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }

    /// Consumes the module, returning its root expressions.
    #[must_use]
    pub fn into_exprs(self) -> Vec<Expr> {
        self.exprs
    }

    /// Fuses all root expressions into a single root.
    ///
    /// The statements of every root are concatenated, in order, into one
    /// block. A root that is itself a block contributes its statements;
    /// any other root contributes itself. A module that already has a
    /// single root is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`IrError::EmptyModule`] if the module has no roots.
    pub fn merge_exprs(&mut self) -> Result<(), IrError> {
        match self.exprs.len() {
            0 => return Err(IrError::EmptyModule),
            1 => return Ok(()),
            _ => {}
        }

        trace!(roots = self.exprs.len(), "merging module roots");
        let mut stmts = Vec::new();
        for expr in std::mem::take(&mut self.exprs) {
            match expr {
                Expr::Block(block) => stmts.extend(block.stmts),
                other => stmts.push(other),
            }
        }
        self.exprs = vec![Expr::block(stmts)];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(name: &str, v: i64) -> Expr {
        Expr::Store {
            tensor: name.to_string(),
            indices: vec![Expr::IntImm(0)],
            value: Box::new(Expr::IntImm(v)),
        }
    }

    #[test]
    fn test_merge_empty_module() {
        let mut module = ModuleExpr::default();
        assert_eq!(module.merge_exprs(), Err(IrError::EmptyModule));
    }

    #[test]
    fn test_merge_single_root_unchanged() {
        let root = Expr::block(vec![store("a", 1)]);
        let mut module = ModuleExpr::new(vec![root.clone()]);
        module.merge_exprs().unwrap();
        assert_eq!(module.exprs(), &[root]);
    }

    #[test]
    fn test_merge_preserves_order() {
        let mut module = ModuleExpr::new(vec![
            Expr::block(vec![store("tmp", 1), store("tmp", 2)]),
            store("out", 3),
        ]);
        module.merge_exprs().unwrap();

        assert_eq!(module.exprs().len(), 1);
        assert_eq!(
            module.exprs()[0],
            Expr::block(vec![store("tmp", 1), store("tmp", 2), store("out", 3)])
        );
    }
}
