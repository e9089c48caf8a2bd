//! Property tests for axis resolution and reduction strategies.

use ember_ir::{DType, Shape, Tensor};
use ember_session::{AxisBound, StrategyOptions};
use ember_strategy::{
    resolve_axes, strategy_for_reduce, ArgPack, AttrStore, PackedArg, ReduceEntry, StrategyError,
};
use ember_target::targets;
use proptest::prelude::*;
use proptest::sample::subsequence;

/// A rank and a shuffled, duplicate-free subset of its axes.
fn rank_and_axes() -> impl Strategy<Value = (usize, Vec<i64>)> {
    (1usize..8).prop_flat_map(|rank| {
        let all: Vec<i64> = (0..rank as i64).collect();
        (Just(rank), subsequence(all, 0..=rank).prop_shuffle())
    })
}

fn resolve(axes: Vec<i64>, rank: usize) -> Result<Vec<usize>, StrategyError> {
    let attrs = AttrStore::new().with("axis", axes);
    resolve_axes("reduce_sum", &attrs, rank, AxisBound::Inclusive).map(|r| r.axes)
}

// ============================================================
// Axis resolution
// ============================================================

proptest! {
    #[test]
    fn resolved_axes_are_sorted_subset((rank, axes) in rank_and_axes()) {
        prop_assume!(!axes.is_empty());
        let mut expected: Vec<usize> = axes.iter().map(|&a| a as usize).collect();
        expected.sort_unstable();
        prop_assert_eq!(resolve(axes, rank).unwrap(), expected);
    }

    #[test]
    fn all_axes_markers_agree(rank in 0usize..8) {
        let expected: Vec<usize> = (0..rank).collect();
        prop_assert_eq!(resolve(Vec::new(), rank).unwrap(), expected.clone());

        let attrs = AttrStore::new().with("axis", true);
        let resolved = resolve_axes("reduce_sum", &attrs, rank, AxisBound::Exclusive).unwrap();
        prop_assert_eq!(resolved.axes, expected);
    }

    #[test]
    fn negative_axis_wraps(rank in 1usize..8, offset in 1usize..8) {
        prop_assume!(offset <= rank);
        let v = -(offset as i64);
        prop_assert_eq!(resolve(vec![v], rank).unwrap(), vec![rank - offset]);
    }

    #[test]
    fn repeated_axis_rejected(rank in 2usize..8) {
        let is_duplicate = matches!(
            resolve(vec![1, 1], rank),
            Err(StrategyError::DuplicateAxis { axis: 1, .. })
        );
        prop_assert!(is_duplicate);
    }

    #[test]
    fn static_bound_tolerates_rank(rank in 1usize..8) {
        prop_assert_eq!(resolve(vec![rank as i64], rank).unwrap(), vec![rank]);
        let is_out_of_range = matches!(
            resolve(vec![rank as i64 + 1], rank),
            Err(StrategyError::AxisOutOfRange { .. })
        );
        prop_assert!(is_out_of_range);
    }

    #[test]
    fn keepdim_preserved(rank in 1usize..8, keepdim in any::<Option<bool>>()) {
        let mut attrs = AttrStore::new().with("axis", vec![0i64]);
        if let Some(k) = keepdim {
            attrs.insert("keepdim", k);
        }
        let resolved = resolve_axes("reduce_max", &attrs, rank, AxisBound::Inclusive).unwrap();
        prop_assert_eq!(resolved.keepdim, keepdim.unwrap_or(false));
    }
}

// ============================================================
// Compute output shape
// ============================================================

proptest! {
    #[test]
    fn compute_output_rank(
        dims in prop::collection::vec(1usize..6, 1..5),
        keepdim in any::<bool>(),
    ) {
        let rank = dims.len();
        let x = Tensor::placeholder("x", Shape::from_static(dims), DType::Float32);
        let attrs = AttrStore::new()
            .with("axis", vec![-1i64])
            .with("keepdim", keepdim);
        let entry = ReduceEntry::find("reduce_sum").unwrap();
        let strategy = strategy_for_reduce(
            entry,
            &StrategyOptions::default(),
            &attrs,
            std::slice::from_ref(&x),
            &[],
            &[],
            &targets::x86(),
        )
        .unwrap();

        let out = strategy
            .best_impl()
            .unwrap()
            .compute(&ArgPack::wrap(ArgPack::new(vec![
                PackedArg::Tensor(x),
                PackedArg::from("out"),
            ])))
            .unwrap();
        let out = out.get(0).and_then(PackedArg::as_tensor).unwrap();

        let expected_rank = if keepdim { rank } else { (rank - 1).max(1) };
        prop_assert_eq!(out.rank(), expected_rank);
    }
}
