//! Pretty-printing for the IR.
//!
//! Renders statement trees as indented pseudo-code, suitable for dumps and
//! debugging. Uses standard `fmt::Display` trait.

use std::fmt;

use crate::{BinOp, DType, Dim, Expr, ModuleExpr, Shape, Tensor, TensorOp};

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Static(n) => write!(f, "{n}"),
            Dim::Symbolic(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, dim) in self.dims().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{dim}")?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}{}", self.name, self.dtype, self.shape)?;
        if let TensorOp::Reduce {
            kind,
            input,
            axes,
            keepdim,
        } = &self.op
        {
            write!(
                f,
                " = reduce_{kind:?}({}, axes={axes:?}, keepdim={keepdim})",
                input.name
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_stmt(f, self, 0)
    }
}

impl fmt::Display for ModuleExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, expr) in self.exprs().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "// root {i}")?;
            write!(f, "{expr}")?;
        }
        Ok(())
    }
}

fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    write!(f, "{:width$}", "", width = depth * 2)
}

fn write_stmt(f: &mut fmt::Formatter<'_>, expr: &Expr, depth: usize) -> fmt::Result {
    match expr {
        Expr::For(lp) => {
            indent(f, depth)?;
            write!(f, "for {} in ", lp.var.name)?;
            write_value(f, &lp.min)?;
            write!(f, "..+")?;
            write_value(f, &lp.extent)?;
            if !lp.attrs.is_empty() {
                write!(f, " {:?}", lp.attrs)?;
            }
            writeln!(f, " {{")?;
            write_body(f, &lp.body, depth + 1)?;
            indent(f, depth)?;
            writeln!(f, "}}")
        }
        Expr::Block(block) => {
            indent(f, depth)?;
            writeln!(f, "{{")?;
            for stmt in &block.stmts {
                write_stmt(f, stmt, depth + 1)?;
            }
            indent(f, depth)?;
            writeln!(f, "}}")
        }
        Expr::Store {
            tensor,
            indices,
            value,
        } => {
            indent(f, depth)?;
            write!(f, "{tensor}")?;
            write_indices(f, indices)?;
            write!(f, " = ")?;
            write_value(f, value)?;
            writeln!(f)
        }
        other => {
            indent(f, depth)?;
            write_value(f, other)?;
            writeln!(f)
        }
    }
}

/// Loop bodies print their block's statements without extra braces.
fn write_body(f: &mut fmt::Formatter<'_>, body: &Expr, depth: usize) -> fmt::Result {
    match body {
        Expr::Block(block) => {
            for stmt in &block.stmts {
                write_stmt(f, stmt, depth)?;
            }
            Ok(())
        }
        other => write_stmt(f, other, depth),
    }
}

fn write_indices(f: &mut fmt::Formatter<'_>, indices: &[Expr]) -> fmt::Result {
    write!(f, "[")?;
    for (i, idx) in indices.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_value(f, idx)?;
    }
    write!(f, "]")
}

fn write_value(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    match expr {
        Expr::IntImm(n) => write!(f, "{n}"),
        Expr::FloatImm(x) => write!(f, "{x:?}"),
        Expr::BoolImm(b) => write!(f, "{b}"),
        Expr::Var(v) => f.write_str(&v.name),
        Expr::Tensor(t) => f.write_str(&t.name),
        Expr::Binary(op @ (BinOp::Max | BinOp::Min), lhs, rhs) => {
            write!(f, "{}(", op.symbol())?;
            write_value(f, lhs)?;
            write!(f, ", ")?;
            write_value(f, rhs)?;
            write!(f, ")")
        }
        Expr::Binary(op, lhs, rhs) => {
            write!(f, "(")?;
            write_value(f, lhs)?;
            write!(f, " {} ", op.symbol())?;
            write_value(f, rhs)?;
            write!(f, ")")
        }
        Expr::Load { tensor, indices } => {
            write!(f, "{tensor}")?;
            write_indices(f, indices)
        }
        Expr::Store { .. } | Expr::For(_) | Expr::Block(_) => write!(f, "<stmt>"),
    }
}
