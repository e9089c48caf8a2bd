//! Primitive emitters for reductions.
//!
//! These are the tensor-level building blocks that reduction strategies
//! bind to. Each emitter infers the output shape and records the reduction
//! on the output tensor; [`lower_reduction`] turns that record into a naive
//! loop nest.
//!
//! Three families exist per reduction kind:
//!
//! - `reduce_*`: the naive axis reduction, one output tensor
//! - `two_step_block_reduce_*`: a partial reduction into a temporary
//!   followed by a final one, two tensors
//! - `block_shuffle_reduce_*`: a single-pass GPU block reduction, one tensor

#![warn(missing_docs)]

use ember_ir::{Expr, LoopAttrs, ReduceKind, Shape, Tensor, TensorOp, Var};
use thiserror::Error;
use tracing::trace;

/// Signature of a naive reduction emitter.
pub type ReduceFn = fn(&Tensor, &[usize], bool, &str) -> Tensor;

/// Signature of a block reduction emitter.
pub type BlockReduceFn = fn(&Tensor, &[usize], bool, &str) -> Vec<Tensor>;

/// Errors that can occur while lowering a reduction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PeError {
    /// The tensor is not produced by a reduction.
    #[error("tensor `{tensor}` is not produced by a reduction")]
    NotAReduction {
        /// The tensor name.
        tensor: String,
    },
}

/// Build the output tensor of reducing `x` over `axes`.
///
/// `axes` must already be sorted, unique and within `x`'s rank.
#[must_use]
pub fn reduce(kind: ReduceKind, x: &Tensor, axes: &[usize], keepdim: bool, name: &str) -> Tensor {
    trace!(?kind, input = %x.name, ?axes, keepdim, "emitting reduction");
    Tensor {
        name: name.to_string(),
        shape: x.shape.reduced(axes, keepdim),
        dtype: x.dtype,
        op: TensorOp::Reduce {
            kind,
            input: Box::new(x.clone()),
            axes: axes.to_vec(),
            keepdim,
        },
    }
}

fn two_step_block_reduce(
    kind: ReduceKind,
    x: &Tensor,
    axes: &[usize],
    keepdim: bool,
    name: &str,
) -> Vec<Tensor> {
    // The first step reduces the innermost axis into a temporary that keeps
    // every dimension; the second finishes the remaining axes.
    let Some((&last, rest)) = axes.split_last() else {
        return vec![reduce(kind, x, axes, keepdim, name)];
    };
    let partial = reduce(kind, x, &[last], true, &format!("{name}_tmp"));
    let mut remaining: Vec<usize> = rest.to_vec();
    remaining.push(last);
    let out = reduce(kind, &partial, &remaining, keepdim, name);
    vec![partial, out]
}

fn block_shuffle_reduce(
    kind: ReduceKind,
    x: &Tensor,
    axes: &[usize],
    keepdim: bool,
    name: &str,
) -> Vec<Tensor> {
    vec![reduce(kind, x, axes, keepdim, name)]
}

macro_rules! reduce_family {
    ($kind:ident, $naive:ident, $two_step:ident, $shuffle:ident) => {
        #[doc = concat!("Naive `", stringify!($kind), "` reduction.")]
        #[must_use]
        pub fn $naive(x: &Tensor, axes: &[usize], keepdim: bool, name: &str) -> Tensor {
            reduce(ReduceKind::$kind, x, axes, keepdim, name)
        }

        #[doc = concat!("Two-step block `", stringify!($kind), "` reduction.")]
        #[must_use]
        pub fn $two_step(x: &Tensor, axes: &[usize], keepdim: bool, name: &str) -> Vec<Tensor> {
            two_step_block_reduce(ReduceKind::$kind, x, axes, keepdim, name)
        }

        #[doc = concat!("Block-shuffle `", stringify!($kind), "` reduction.")]
        #[must_use]
        pub fn $shuffle(x: &Tensor, axes: &[usize], keepdim: bool, name: &str) -> Vec<Tensor> {
            block_shuffle_reduce(ReduceKind::$kind, x, axes, keepdim, name)
        }
    };
}

reduce_family!(Sum, reduce_sum, two_step_block_reduce_sum, block_shuffle_reduce_sum);
reduce_family!(Prod, reduce_prod, two_step_block_reduce_prod, block_shuffle_reduce_prod);
reduce_family!(Max, reduce_max, two_step_block_reduce_max, block_shuffle_reduce_max);
reduce_family!(Min, reduce_min, two_step_block_reduce_min, block_shuffle_reduce_min);
reduce_family!(All, reduce_all, two_step_block_reduce_all, block_shuffle_reduce_all);
reduce_family!(Any, reduce_any, two_step_block_reduce_any, block_shuffle_reduce_any);

/// Lower a reduction output tensor to a naive loop nest.
///
/// The result is a block of two nests: one initialising every output
/// element to the reduction identity, one iterating the full input shape
/// and combining each element into its output slot. Reduction loops carry
/// [`LoopAttrs::REDUCTION`]. Output dimensions kept by `keepdim` become
/// loops of extent one.
///
/// # Errors
///
/// Returns [`PeError::NotAReduction`] if `out` is not produced by a
/// reduction.
pub fn lower_reduction(out: &Tensor) -> Result<Expr, PeError> {
    let TensorOp::Reduce {
        kind,
        input,
        axes,
        keepdim,
    } = &out.op
    else {
        return Err(PeError::NotAReduction {
            tensor: out.name.clone(),
        });
    };

    let init = loop_nest(&out.shape, "j", |_| LoopAttrs::empty(), |vars| Expr::Store {
        tensor: out.name.clone(),
        indices: vars.to_vec(),
        value: Box::new(kind.identity(out.dtype)),
    });

    let combine = loop_nest(
        &input.shape,
        "i",
        |axis| {
            if axes.contains(&axis) {
                LoopAttrs::REDUCTION
            } else {
                LoopAttrs::empty()
            }
        },
        |vars| {
            let mut out_indices: Vec<Expr> = Vec::with_capacity(vars.len());
            for (axis, var) in vars.iter().enumerate() {
                if !axes.contains(&axis) {
                    out_indices.push(var.clone());
                } else if *keepdim {
                    out_indices.push(Expr::IntImm(0));
                }
            }
            if out_indices.is_empty() {
                out_indices.push(Expr::IntImm(0));
            }
            let acc = Expr::Load {
                tensor: out.name.clone(),
                indices: out_indices.clone(),
            };
            let elem = Expr::Load {
                tensor: input.name.clone(),
                indices: vars.to_vec(),
            };
            Expr::Store {
                tensor: out.name.clone(),
                indices: out_indices,
                value: Box::new(Expr::binary(kind.combiner(), acc, elem)),
            }
        },
    );

    Ok(Expr::block(vec![init, combine]))
}

/// Build a perfect loop nest over `shape`, outermost dimension first.
fn loop_nest(
    shape: &Shape,
    prefix: &str,
    attrs: impl Fn(usize) -> LoopAttrs,
    body: impl FnOnce(&[Expr]) -> Expr,
) -> Expr {
    let vars: Vec<Var> = (0..shape.rank())
        .map(|i| Var::new(format!("{prefix}{i}")))
        .collect();
    let var_exprs: Vec<Expr> = vars.iter().cloned().map(Expr::Var).collect();

    let mut nest = body(&var_exprs);
    for (axis, (var, dim)) in vars.into_iter().zip(shape.dims()).enumerate().rev() {
        nest = Expr::for_loop(
            var,
            Expr::IntImm(0),
            dim.extent(),
            attrs(axis),
            Expr::block(vec![nest]),
        );
    }
    nest
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ir::{simplify, DType, Dim};

    fn input(shape: &[usize]) -> Tensor {
        Tensor::placeholder("x", Shape::from_static(shape.iter().copied()), DType::Float32)
    }

    #[test]
    fn test_reduce_shape_inference() {
        let out = reduce_sum(&input(&[2, 3, 4]), &[2], false, "out");
        assert_eq!(out.name, "out");
        assert_eq!(out.shape, Shape::from_static([2, 3]));
        assert_eq!(out.dtype, DType::Float32);

        let kept = reduce_max(&input(&[2, 3, 4]), &[0, 2], true, "out");
        assert_eq!(kept.shape, Shape::from_static([1, 3, 1]));
    }

    #[test]
    fn test_full_reduction_is_rank_one() {
        let out = reduce_prod(&input(&[4]), &[0], false, "out");
        assert_eq!(out.shape, Shape::from_static([1]));
    }

    #[test]
    fn test_two_step_produces_temporary() {
        let outs = two_step_block_reduce_sum(&input(&[8, 16]), &[0, 1], false, "out");
        assert_eq!(outs.len(), 2);
        assert_eq!(outs[0].name, "out_tmp");
        assert_eq!(outs[0].shape, Shape::from_static([8, 1]));
        assert_eq!(outs[1].name, "out");
        assert_eq!(outs[1].shape, Shape::from_static([1]));
    }

    #[test]
    fn test_block_shuffle_single_output() {
        let outs = block_shuffle_reduce_any(&input(&[8]), &[0], false, "out");
        assert_eq!(outs.len(), 1);
    }

    #[test]
    fn test_lower_reduction_loop_counts() {
        let out = reduce_sum(&input(&[2, 3, 4]), &[2], false, "out");
        let body = lower_reduction(&out).unwrap();
        // two init loops + three combine loops
        assert_eq!(body.count_loops(), 5);
    }

    #[test]
    fn test_keepdim_lowering_has_unit_loops() {
        let out = reduce_sum(&input(&[2, 3, 4]), &[2], true, "out");
        let mut body = lower_reduction(&out).unwrap();
        assert_eq!(body.count_loops(), 6);
        let stats = simplify::simplify(&mut body);
        assert_eq!(stats.loops_removed, 1);
        assert_eq!(body.count_loops(), 5);
    }

    #[test]
    fn test_symbolic_extent_lowered_to_var() {
        let x = Tensor::placeholder(
            "x",
            Shape::new([Dim::Symbolic("N".into()), Dim::Static(4)]),
            DType::Bool,
        );
        let out = reduce_all(&x, &[1], false, "out");
        let body = lower_reduction(&out).unwrap();
        assert!(body.to_string().contains("for i0 in 0..+N"));
    }

    #[test]
    fn test_lower_placeholder_rejected() {
        let err = lower_reduction(&input(&[4])).unwrap_err();
        assert_eq!(
            err,
            PeError::NotAReduction {
                tensor: "x".to_string()
            }
        );
    }
}
