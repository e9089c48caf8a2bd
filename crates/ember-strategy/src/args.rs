//! Packed arguments for compute and schedule functions.
//!
//! A stored function receives one [`ArgPack`]. Its entries are
//! heterogeneous: tensors, statement trees, strings, numbers and nested
//! packs. A statement tree that is just a tensor handle counts as a tensor.

use ember_ir::{Expr, Tensor};

/// One entry of an [`ArgPack`].
#[derive(Clone, Debug, PartialEq)]
pub enum PackedArg {
    /// Integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// String.
    Str(String),
    /// Statement or expression tree.
    Expr(Expr),
    /// Tensor.
    Tensor(Tensor),
    /// Nested pack.
    Pack(ArgPack),
}

impl PackedArg {
    /// Returns the string if this entry is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the tensor if this entry is one, either directly or as a
    /// tensor-handle expression.
    #[must_use]
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Self::Tensor(t) => Some(t),
            Self::Expr(e) => e.as_tensor(),
            _ => None,
        }
    }

    /// Returns the statement tree if this entry is one that is not a
    /// tensor handle.
    #[must_use]
    pub fn as_stmt(&self) -> Option<&Expr> {
        match self {
            Self::Expr(Expr::Tensor(_)) => None,
            Self::Expr(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the nested pack if this entry is one.
    #[must_use]
    pub fn as_pack(&self) -> Option<&ArgPack> {
        match self {
            Self::Pack(p) => Some(p),
            _ => None,
        }
    }

    /// Returns true if this entry is a tensor.
    #[must_use]
    pub fn is_tensor(&self) -> bool {
        self.as_tensor().is_some()
    }
}

impl From<Tensor> for PackedArg {
    fn from(t: Tensor) -> Self {
        Self::Tensor(t)
    }
}

impl From<Expr> for PackedArg {
    fn from(e: Expr) -> Self {
        Self::Expr(e)
    }
}

impl From<&str> for PackedArg {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for PackedArg {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<ArgPack> for PackedArg {
    fn from(p: ArgPack) -> Self {
        Self::Pack(p)
    }
}

/// An ordered list of packed arguments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArgPack(Vec<PackedArg>);

impl ArgPack {
    /// Creates a pack from its entries.
    #[must_use]
    pub fn new(args: Vec<PackedArg>) -> Self {
        Self(args)
    }

    /// Creates a pack holding `inner` as its only entry.
    ///
    /// Compute and schedule functions expect their entries wrapped this way.
    #[must_use]
    pub fn wrap(inner: ArgPack) -> Self {
        Self(vec![PackedArg::Pack(inner)])
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PackedArg> {
        self.0.get(index)
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, PackedArg> {
        self.0.iter()
    }
}

impl From<Vec<PackedArg>> for ArgPack {
    fn from(args: Vec<PackedArg>) -> Self {
        Self(args)
    }
}

impl FromIterator<PackedArg> for ArgPack {
    fn from_iter<I: IntoIterator<Item = PackedArg>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ArgPack {
    type Item = &'a PackedArg;
    type IntoIter = std::slice::Iter<'a, PackedArg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ir::{DType, Shape};

    fn tensor() -> Tensor {
        Tensor::placeholder("x", Shape::from_static([4]), DType::Float32)
    }

    #[test]
    fn test_tensor_handle_expr_is_tensor() {
        let direct = PackedArg::Tensor(tensor());
        let handle = PackedArg::Expr(Expr::Tensor(tensor()));
        assert!(direct.is_tensor());
        assert!(handle.is_tensor());
        assert!(handle.as_stmt().is_none());
    }

    #[test]
    fn test_stmt_is_not_tensor() {
        let stmt = PackedArg::Expr(Expr::block(vec![]));
        assert!(!stmt.is_tensor());
        assert!(stmt.as_stmt().is_some());
    }

    #[test]
    fn test_wrap() {
        let inner = ArgPack::new(vec![tensor().into(), "out".into()]);
        let outer = ArgPack::wrap(inner.clone());
        assert_eq!(outer.len(), 1);
        assert_eq!(outer.get(0).and_then(PackedArg::as_pack), Some(&inner));
        assert_eq!(inner.get(1).and_then(PackedArg::as_str), Some("out"));
    }
}
