//! Reduction strategies.
//!
//! All six reductions share one construction per shape regime; they
//! differ only in the emitters bound from [`REDUCE_OPS`].

use std::fmt;

use ember_ir::{DType, ReduceKind, Shape, Tensor};
use ember_pe::{
    block_shuffle_reduce_all, block_shuffle_reduce_any, block_shuffle_reduce_max,
    block_shuffle_reduce_min, block_shuffle_reduce_prod, block_shuffle_reduce_sum, reduce_all,
    reduce_any, reduce_max, reduce_min, reduce_prod, reduce_sum, two_step_block_reduce_all,
    two_step_block_reduce_any, two_step_block_reduce_max, two_step_block_reduce_min,
    two_step_block_reduce_prod, two_step_block_reduce_sum, BlockReduceFn, ReduceFn,
};
use ember_session::{AxisBound, StrategyOptions};
use ember_target::Target;
use tracing::{debug, instrument};

use crate::attrs::AttrStore;
use crate::axis::resolve_axes;
use crate::compute::build_compute;
use crate::error::{StrategyError, StrategyResult};
use crate::schedule::build_schedule;
use crate::strategy::OpStrategy;

/// Whether operator shapes are fully known when the strategy is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeRegime {
    /// Every dimension is a constant.
    Static,
    /// Some dimensions are symbolic; scheduling happens later.
    Symbolic,
}

impl fmt::Display for ShapeRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("static"),
            Self::Symbolic => f.write_str("symbolic"),
        }
    }
}

/// The emitters bound to one reduction operator.
#[derive(Clone, Copy)]
pub struct ReduceEntry {
    /// Operator name.
    pub name: &'static str,
    /// Reduction kind.
    pub kind: ReduceKind,
    /// Naive emitter used by the compute function.
    pub reduce: ReduceFn,
    /// Two-step GPU block emitter.
    pub two_step: BlockReduceFn,
    /// Single-pass GPU block emitter.
    pub block_shuffle: BlockReduceFn,
    /// Element type the operator requires, if any.
    pub dtype: Option<DType>,
}

impl fmt::Debug for ReduceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReduceEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("dtype", &self.dtype)
            .finish_non_exhaustive()
    }
}

impl ReduceEntry {
    /// Look up the entry of a reduction operator by name.
    #[must_use]
    pub fn find(name: &str) -> Option<&'static ReduceEntry> {
        REDUCE_OPS.iter().find(|entry| entry.name == name)
    }
}

/// Every reduction operator.
pub static REDUCE_OPS: [ReduceEntry; 6] = [
    ReduceEntry {
        name: "reduce_sum",
        kind: ReduceKind::Sum,
        reduce: reduce_sum,
        two_step: two_step_block_reduce_sum,
        block_shuffle: block_shuffle_reduce_sum,
        dtype: None,
    },
    ReduceEntry {
        name: "reduce_prod",
        kind: ReduceKind::Prod,
        reduce: reduce_prod,
        two_step: two_step_block_reduce_prod,
        block_shuffle: block_shuffle_reduce_prod,
        dtype: None,
    },
    ReduceEntry {
        name: "reduce_max",
        kind: ReduceKind::Max,
        reduce: reduce_max,
        two_step: two_step_block_reduce_max,
        block_shuffle: block_shuffle_reduce_max,
        dtype: None,
    },
    ReduceEntry {
        name: "reduce_min",
        kind: ReduceKind::Min,
        reduce: reduce_min,
        two_step: two_step_block_reduce_min,
        block_shuffle: block_shuffle_reduce_min,
        dtype: None,
    },
    ReduceEntry {
        name: "reduce_all",
        kind: ReduceKind::All,
        reduce: reduce_all,
        two_step: two_step_block_reduce_all,
        block_shuffle: block_shuffle_reduce_all,
        dtype: Some(DType::Bool),
    },
    ReduceEntry {
        name: "reduce_any",
        kind: ReduceKind::Any,
        reduce: reduce_any,
        two_step: two_step_block_reduce_any,
        block_shuffle: block_shuffle_reduce_any,
        dtype: Some(DType::Bool),
    },
];

/// Name of the implementation registered for `op`.
///
/// The `x86` suffix is historical and applies to every target.
#[must_use]
pub fn impl_name(op: &str) -> String {
    format!("strategy.{op}.x86")
}

/// Build the static-shape strategy of a reduction.
///
/// The strategy holds one implementation with both a compute and a
/// schedule function.
///
/// # Errors
///
/// Returns an error if there is no input tensor or the axis attributes
/// are invalid for it.
pub fn strategy_for_reduce(
    entry: &ReduceEntry,
    options: &StrategyOptions,
    attrs: &AttrStore,
    inputs: &[Tensor],
    out_types: &[DType],
    output_shapes: &[Shape],
    target: &Target,
) -> StrategyResult<OpStrategy> {
    assemble(
        entry,
        ShapeRegime::Static,
        options,
        attrs,
        inputs,
        out_types,
        output_shapes,
        target,
    )
}

/// Build the symbolic-shape strategy of a reduction.
///
/// The strategy holds one implementation with a compute function only.
/// Axes must be strictly below the input rank.
///
/// # Errors
///
/// Returns an error if there is no input tensor or the axis attributes
/// are invalid for it.
pub fn strategy_for_reduce_symbolic(
    entry: &ReduceEntry,
    options: &StrategyOptions,
    attrs: &AttrStore,
    inputs: &[Tensor],
    out_types: &[DType],
    output_shapes: &[Shape],
    target: &Target,
) -> StrategyResult<OpStrategy> {
    assemble(
        entry,
        ShapeRegime::Symbolic,
        options,
        attrs,
        inputs,
        out_types,
        output_shapes,
        target,
    )
}

#[allow(clippy::too_many_arguments)]
#[instrument(
    level = "debug",
    skip_all,
    fields(op = entry.name, regime = %regime, arch = %target.arch)
)]
fn assemble(
    entry: &ReduceEntry,
    regime: ShapeRegime,
    options: &StrategyOptions,
    attrs: &AttrStore,
    inputs: &[Tensor],
    out_types: &[DType],
    output_shapes: &[Shape],
    target: &Target,
) -> StrategyResult<OpStrategy> {
    let input = inputs.first().ok_or_else(|| StrategyError::MissingInput {
        op: entry.name.to_string(),
    })?;
    let bound = match regime {
        ShapeRegime::Static => options.static_axis_bound,
        ShapeRegime::Symbolic => AxisBound::Exclusive,
    };
    let resolved = resolve_axes(entry.name, attrs, input.rank(), bound)?;
    debug!(
        axes = ?resolved.axes,
        keepdim = resolved.keepdim,
        ?out_types,
        outputs = output_shapes.len(),
        "building reduce strategy"
    );

    let compute = build_compute(
        entry.name,
        resolved.axes,
        resolved.keepdim,
        target.arch,
        entry.reduce,
    );
    let schedule = match regime {
        ShapeRegime::Static => Some(build_schedule(entry.name, target.arch, options)),
        ShapeRegime::Symbolic => None,
    };

    let mut strategy = OpStrategy::new();
    strategy.add_impl(compute, schedule, impl_name(entry.name), options.priority);
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ir::Dim;
    use ember_target::targets;

    fn entry(name: &str) -> &'static ReduceEntry {
        ReduceEntry::find(name).unwrap()
    }

    fn input(shape: Shape) -> Vec<Tensor> {
        vec![Tensor::placeholder("x", shape, DType::Float32)]
    }

    #[test]
    fn test_table_names_unique() {
        let mut names: Vec<_> = REDUCE_OPS.iter().map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), REDUCE_OPS.len());
    }

    #[test]
    fn test_table_kinds_match_names() {
        for entry in &REDUCE_OPS {
            let kind = format!("{:?}", entry.kind).to_lowercase();
            assert_eq!(entry.name, format!("reduce_{kind}"));
            assert_eq!(entry.dtype.is_some(), entry.kind.is_logical());
        }
    }

    #[test]
    fn test_static_strategy_has_schedule() {
        let attrs = AttrStore::new().with("axis", vec![1i64]);
        let strategy = strategy_for_reduce(
            entry("reduce_sum"),
            &StrategyOptions::default(),
            &attrs,
            &input(Shape::from_static([4, 8])),
            &[DType::Float32],
            &[Shape::from_static([4])],
            &targets::x86(),
        )
        .unwrap();

        assert_eq!(strategy.impls().len(), 1);
        let imp = &strategy.impls()[0];
        assert_eq!(imp.name, "strategy.reduce_sum.x86");
        assert_eq!(imp.priority, 1);
        assert!(imp.schedule.is_some());
    }

    #[test]
    fn test_symbolic_strategy_has_no_schedule() {
        let attrs = AttrStore::new().with("axis", vec![0i64]);
        let shape = Shape::new([Dim::Symbolic("N".into()), Dim::Static(4)]);
        let strategy = strategy_for_reduce_symbolic(
            entry("reduce_max"),
            &StrategyOptions::default(),
            &attrs,
            &input(shape),
            &[DType::Float32],
            &[Shape::from_static([4])],
            &targets::nvgpu(),
        )
        .unwrap();

        let imp = &strategy.impls()[0];
        assert_eq!(imp.name, "strategy.reduce_max.x86");
        assert!(imp.schedule.is_none());
    }

    #[test]
    fn test_axis_equal_rank_by_regime() {
        let attrs = AttrStore::new().with("axis", vec![2i64]);
        let inputs = input(Shape::from_static([4, 8]));
        let options = StrategyOptions::default();
        let target = targets::x86();

        assert!(strategy_for_reduce(
            entry("reduce_min"),
            &options,
            &attrs,
            &inputs,
            &[],
            &[],
            &target
        )
        .is_ok());
        assert!(matches!(
            strategy_for_reduce_symbolic(
                entry("reduce_min"),
                &options,
                &attrs,
                &inputs,
                &[],
                &[],
                &target
            ),
            Err(StrategyError::AxisOutOfRange { .. })
        ));
    }

    #[test]
    fn test_exclusive_static_bound() {
        let attrs = AttrStore::new().with("axis", vec![2i64]);
        let options = StrategyOptions {
            static_axis_bound: AxisBound::Exclusive,
            ..StrategyOptions::default()
        };
        assert!(matches!(
            strategy_for_reduce(
                entry("reduce_prod"),
                &options,
                &attrs,
                &input(Shape::from_static([4, 8])),
                &[],
                &[],
                &targets::x86()
            ),
            Err(StrategyError::AxisOutOfRange { .. })
        ));
    }

    #[test]
    fn test_missing_input() {
        let attrs = AttrStore::new().with("axis", vec![0i64]);
        assert_eq!(
            strategy_for_reduce(
                entry("reduce_any"),
                &StrategyOptions::default(),
                &attrs,
                &[],
                &[],
                &[],
                &targets::x86()
            )
            .unwrap_err(),
            StrategyError::MissingInput {
                op: "reduce_any".to_string()
            }
        );
    }

    #[test]
    fn test_priority_from_options() {
        let attrs = AttrStore::new().with("axis", true);
        let options = StrategyOptions {
            priority: 7,
            ..StrategyOptions::default()
        };
        let strategy = strategy_for_reduce(
            entry("reduce_sum"),
            &options,
            &attrs,
            &input(Shape::from_static([3])),
            &[],
            &[],
            &targets::arm(),
        )
        .unwrap();
        assert_eq!(strategy.best_impl().map(|i| i.priority), Some(7));
    }
}
