//! # Ember IR
//!
//! This crate defines the intermediate representation consumed and produced
//! by operator strategies in the Ember tensor compiler.
//!
//! ## Overview
//!
//! The IR has two layers:
//!
//! - **Tensors**: named, shaped, typed values. A tensor either is a
//!   placeholder (a program input) or records the computation that produces
//!   it, e.g. a reduction over a set of axes.
//! - **Statement trees** ([`Expr`]): explicit loop nests, blocks, loads and
//!   stores. Compute stages lower tensors to these trees and schedule stages
//!   transform them.
//!
//! ## IR Pipeline Position
//!
//! ```text
//! [Graph]
//!     |
//!     v
//! [Op strategy: compute]   <- tensors
//!     |
//!     v
//! [Lowering]               <- statement trees (this crate)
//!     |
//!     v
//! [Op strategy: schedule]  <- simplified, merged statement trees
//!     |
//!     v
//! [Codegen]
//! ```
//!
//! ## Main Types
//!
//! - [`DType`]: Element types
//! - [`Shape`]: Tensor dimensions, static or symbolic
//! - [`Tensor`]: A tensor value and its producer
//! - [`Expr`]: Statement/expression tree
//! - [`ModuleExpr`]: An ordered set of root expressions

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod module;
pub mod pretty;
pub mod simplify;

pub use module::ModuleExpr;
pub use simplify::{simplify_blocks, simplify_for_loops, SimplifyStats};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Tensor element types (data types).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// Boolean (1 byte).
    Bool,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit floating point (half precision).
    Float16,
    /// Brain floating point (bfloat16).
    BFloat16,
    /// 32-bit floating point (single precision).
    Float32,
    /// 64-bit floating point (double precision).
    Float64,
}

impl DType {
    /// Returns true if this is the boolean type.
    #[must_use]
    pub const fn is_bool(self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Returns true if this is a floating-point type.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(
            self,
            Self::Float16 | Self::BFloat16 | Self::Float32 | Self::Float64
        )
    }

    /// Returns the short name used in diagnostics and dumps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::Float16 => "float16",
            Self::BFloat16 => "bfloat16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

/// A dimension size (may be static or symbolic).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dim {
    /// A statically known dimension.
    Static(usize),
    /// A dimension only known at run time, named by a symbol.
    Symbolic(String),
}

impl Dim {
    /// Returns true if this dimension is statically known.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }

    /// The loop extent covering this dimension.
    #[must_use]
    pub fn extent(&self) -> Expr {
        match self {
            Self::Static(n) => Expr::IntImm(*n as i64),
            Self::Symbolic(name) => Expr::Var(Var::new(name.clone())),
        }
    }
}

/// Tensor shape (list of dimensions).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape(SmallVec<[Dim; 4]>);

impl Shape {
    /// Creates a new shape from dimensions.
    #[must_use]
    pub fn new(dims: impl IntoIterator<Item = Dim>) -> Self {
        Self(dims.into_iter().collect())
    }

    /// Creates a shape from static dimensions.
    #[must_use]
    pub fn from_static(dims: impl IntoIterator<Item = usize>) -> Self {
        Self(dims.into_iter().map(Dim::Static).collect())
    }

    /// Returns the rank (number of dimensions).
    #[must_use]
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Returns the dimensions.
    #[must_use]
    pub fn dims(&self) -> &[Dim] {
        &self.0
    }

    /// Returns true if all dimensions are statically known.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.0.iter().all(Dim::is_static)
    }

    /// The shape left after reducing `axes`.
    ///
    /// Reduced dimensions become `1` when `keepdim` is set and are dropped
    /// otherwise. A reduction that drops every dimension yields `[1]`.
    /// `axes` must be sorted, unique and in range.
    #[must_use]
    pub fn reduced(&self, axes: &[usize], keepdim: bool) -> Self {
        let mut dims: SmallVec<[Dim; 4]> = SmallVec::with_capacity(self.rank());
        for (i, dim) in self.0.iter().enumerate() {
            if axes.binary_search(&i).is_ok() {
                if keepdim {
                    dims.push(Dim::Static(1));
                }
            } else {
                dims.push(dim.clone());
            }
        }
        if dims.is_empty() {
            dims.push(Dim::Static(1));
        }
        Self(dims)
    }
}

/// Reduction kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReduceKind {
    /// Sum reduction.
    Sum,
    /// Product reduction.
    Prod,
    /// Maximum reduction.
    Max,
    /// Minimum reduction.
    Min,
    /// Logical and.
    All,
    /// Logical or.
    Any,
}

impl ReduceKind {
    /// The binary operator that combines two partial results.
    #[must_use]
    pub const fn combiner(self) -> BinOp {
        match self {
            Self::Sum => BinOp::Add,
            Self::Prod => BinOp::Mul,
            Self::Max => BinOp::Max,
            Self::Min => BinOp::Min,
            Self::All => BinOp::And,
            Self::Any => BinOp::Or,
        }
    }

    /// The initial accumulator value for this reduction.
    #[must_use]
    pub fn identity(self, dtype: DType) -> Expr {
        match self {
            Self::Sum if dtype.is_float() => Expr::FloatImm(0.0),
            Self::Sum => Expr::IntImm(0),
            Self::Prod if dtype.is_float() => Expr::FloatImm(1.0),
            Self::Prod => Expr::IntImm(1),
            Self::Max if dtype.is_float() => Expr::FloatImm(f64::NEG_INFINITY),
            Self::Max => Expr::IntImm(i64::MIN),
            Self::Min if dtype.is_float() => Expr::FloatImm(f64::INFINITY),
            Self::Min => Expr::IntImm(i64::MAX),
            Self::All => Expr::BoolImm(true),
            Self::Any => Expr::BoolImm(false),
        }
    }

    /// Returns true for the reductions defined only over booleans.
    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::All | Self::Any)
    }
}

/// How a tensor is produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TensorOp {
    /// A program input.
    Placeholder,
    /// A reduction over `axes` of `input`.
    Reduce {
        /// The reduction kind.
        kind: ReduceKind,
        /// The reduced tensor.
        input: Box<Tensor>,
        /// Sorted, unique reduction axes.
        axes: Vec<usize>,
        /// Whether reduced axes are kept with extent one.
        keepdim: bool,
    },
}

/// A tensor value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    /// Tensor name, unique within a program.
    pub name: String,
    /// Tensor shape.
    pub shape: Shape,
    /// Element type.
    pub dtype: DType,
    /// The producer of this tensor.
    pub op: TensorOp,
}

impl Tensor {
    /// Creates a placeholder tensor.
    #[must_use]
    pub fn placeholder(name: impl Into<String>, shape: Shape, dtype: DType) -> Self {
        Self {
            name: name.into(),
            shape,
            dtype,
            op: TensorOp::Placeholder,
        }
    }

    /// Returns the rank of this tensor.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }
}

/// A scalar variable (loop index or symbolic dimension).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Var {
    /// Variable name.
    pub name: String,
}

impl Var {
    /// Creates a variable.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Binary operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Maximum.
    Max,
    /// Minimum.
    Min,
    /// Logical and.
    And,
    /// Logical or.
    Or,
}

impl BinOp {
    /// Returns the operator symbol or function name.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Max => "max",
            Self::Min => "min",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

bitflags! {
    /// Loop attributes.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct LoopAttrs: u32 {
        /// Loop iterates a reduction axis.
        const REDUCTION = 0b0000_0001;
    }
}

/// A counted loop: `for var in min..min+extent { body }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct For {
    /// Loop variable.
    pub var: Var,
    /// Lower bound (inclusive).
    pub min: Box<Expr>,
    /// Trip count.
    pub extent: Box<Expr>,
    /// Loop attributes.
    pub attrs: LoopAttrs,
    /// Loop body.
    pub body: Box<Expr>,
}

/// A sequence of statements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Statements in execution order.
    pub stmts: Vec<Expr>,
}

impl Block {
    /// Creates a block.
    #[must_use]
    pub fn new(stmts: Vec<Expr>) -> Self {
        Self { stmts }
    }
}

/// Statement and expression tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer constant.
    IntImm(i64),
    /// Floating-point constant.
    FloatImm(f64),
    /// Boolean constant.
    BoolImm(bool),
    /// Variable reference.
    Var(Var),
    /// A tensor handle.
    Tensor(Tensor),
    /// Binary operation.
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// Element load: `tensor[indices]`.
    Load {
        /// Name of the loaded tensor.
        tensor: String,
        /// Index per dimension.
        indices: Vec<Expr>,
    },
    /// Element store: `tensor[indices] = value`.
    Store {
        /// Name of the stored tensor.
        tensor: String,
        /// Index per dimension.
        indices: Vec<Expr>,
        /// Stored value.
        value: Box<Expr>,
    },
    /// Counted loop.
    For(For),
    /// Statement block.
    Block(Block),
}

impl Expr {
    /// Creates a variable reference.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(Var::new(name))
    }

    /// Creates a binary expression.
    #[must_use]
    pub fn binary(op: BinOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    /// Creates a loop.
    #[must_use]
    pub fn for_loop(var: Var, min: Self, extent: Self, attrs: LoopAttrs, body: Self) -> Self {
        Self::For(For {
            var,
            min: Box::new(min),
            extent: Box::new(extent),
            attrs,
            body: Box::new(body),
        })
    }

    /// Creates a block.
    #[must_use]
    pub fn block(stmts: Vec<Self>) -> Self {
        Self::Block(Block::new(stmts))
    }

    /// Returns the tensor if this expression is a tensor handle.
    #[must_use]
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Self::Tensor(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the integer value if this is an integer constant.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::IntImm(n) => Some(*n),
            _ => None,
        }
    }

    /// Counts the loops in this tree.
    #[must_use]
    pub fn count_loops(&self) -> usize {
        match self {
            Self::For(f) => 1 + f.body.count_loops(),
            Self::Block(b) => b.stmts.iter().map(Self::count_loops).sum(),
            _ => 0,
        }
    }
}

/// Errors in IR operations.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrError {
    /// A module was built with no expressions.
    #[error("module has no expressions")]
    EmptyModule,
}
