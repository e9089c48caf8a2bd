//! Reduction axis resolution.
//!
//! Turns the raw `axis` and `keepdim` attributes into a sorted, unique
//! list of non-negative axes and a `keepdim` flag. The `axis` attribute
//! may be a list of 32- or 64-bit integers, or the boolean `true` meaning
//! "every axis". An empty list also means every axis.

use ember_session::AxisBound;
use tracing::{instrument, trace};

use crate::attrs::{AttrStore, AttrValue};
use crate::error::{StrategyError, StrategyResult};

/// Attribute key of the reduction axes.
pub const AXIS_ATTR: &str = "axis";

/// Attribute key of the keep-dimensions flag.
pub const KEEPDIM_ATTR: &str = "keepdim";

/// Validated reduction axes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ReduceAxes {
    /// Sorted, unique axes.
    pub axes: Vec<usize>,
    /// Whether reduced axes stay in the output with size one.
    pub keepdim: bool,
}

/// Resolve the reduction axes of `op` for an input of the given rank.
///
/// `bound` decides whether the largest axis may equal `rank`.
///
/// # Errors
///
/// - [`StrategyError::MissingAttribute`] if `axis` is absent
/// - [`StrategyError::InvalidAttributeType`] if `axis` is neither an
///   integer list nor `true`
/// - [`StrategyError::AxisOutOfRange`] if there are more axes than `rank`,
///   an axis stays negative after normalisation, or the largest axis fails
///   `bound`
/// - [`StrategyError::DuplicateAxis`] if an axis repeats
/// - [`StrategyError::InvalidKeepdim`] if `keepdim` is present but not a
///   boolean
#[instrument(level = "trace", skip(attrs))]
pub fn resolve_axes(
    op: &str,
    attrs: &AttrStore,
    rank: usize,
    bound: AxisBound,
) -> StrategyResult<ReduceAxes> {
    let raw = attrs
        .get(AXIS_ATTR)
        .ok_or_else(|| StrategyError::MissingAttribute {
            op: op.to_string(),
            attr: AXIS_ATTR,
        })?;

    let mut axes: Vec<i64> = match raw {
        AttrValue::I64List(list) => list.clone(),
        AttrValue::I32List(list) => list.iter().copied().map(i64::from).collect(),
        AttrValue::Bool(true) => Vec::new(),
        other => {
            return Err(StrategyError::InvalidAttributeType {
                op: op.to_string(),
                attr: AXIS_ATTR,
                found: other.type_name(),
            })
        }
    };

    let signed_rank = i64::try_from(rank).unwrap_or(i64::MAX);
    if axes.is_empty() {
        axes = (0..signed_rank).collect();
    } else {
        for axis in &mut axes {
            if *axis < 0 {
                *axis += signed_rank;
            }
        }
    }
    axes.sort_unstable();

    let out_of_range = || StrategyError::AxisOutOfRange {
        op: op.to_string(),
        axes: axes.clone(),
        rank,
    };
    if axes.len() > rank {
        return Err(out_of_range());
    }

    let mut resolved = Vec::with_capacity(axes.len());
    for &axis in &axes {
        let axis = usize::try_from(axis).map_err(|_| out_of_range())?;
        resolved.push(axis);
    }
    if let Some(&last) = resolved.last() {
        if !bound.admits(last, rank) {
            return Err(out_of_range());
        }
    }
    if let Some(pair) = resolved.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(StrategyError::DuplicateAxis {
            op: op.to_string(),
            axis: pair[0],
        });
    }

    let keepdim = match attrs.get(KEEPDIM_ATTR) {
        None => false,
        Some(AttrValue::Bool(b)) => *b,
        Some(other) => {
            return Err(StrategyError::InvalidKeepdim {
                op: op.to_string(),
                found: other.type_name(),
            })
        }
    };

    trace!(axes = ?resolved, keepdim, "resolved reduce axes");
    Ok(ReduceAxes {
        axes: resolved,
        keepdim,
    })
}
