//! Compute functions for reductions.

use std::sync::Arc;

use ember_ir::DType;
use ember_pe::ReduceFn;
use ember_target::Arch;
use tracing::debug;

use crate::args::{ArgPack, PackedArg};
use crate::error::{Stage, StrategyError};
use crate::strategy::ComputeFn;

/// Reductions that only accept boolean inputs.
pub const BOOL_REDUCE_OPS: [&str; 2] = ["reduce_all", "reduce_any"];

/// Build the compute function of reduction `op`.
///
/// The returned function expects a pack whose first entry is a nested pack
/// of exactly two entries: the input tensor and the output tensor name. It
/// returns a pack holding the output tensor.
#[must_use]
pub fn build_compute(
    op: &str,
    axes: Vec<usize>,
    keepdim: bool,
    arch: Arch,
    reduce_fn: ReduceFn,
) -> ComputeFn {
    let op = op.to_string();
    Arc::new(move |args: &ArgPack| {
        let first = args.get(0).ok_or_else(|| StrategyError::EmptyArguments {
            op: op.clone(),
            stage: Stage::Compute,
        })?;
        let pack = first.as_pack().ok_or_else(|| StrategyError::NotAPack {
            op: op.clone(),
            stage: Stage::Compute,
        })?;
        if pack.len() != 2 {
            return Err(StrategyError::ArityMismatch {
                op: op.clone(),
                stage: Stage::Compute,
                min: 2,
                max: 2,
                got: pack.len(),
            });
        }
        let name = pack
            .get(1)
            .and_then(PackedArg::as_str)
            .ok_or_else(|| StrategyError::NotAString {
                op: op.clone(),
                stage: Stage::Compute,
                index: 1,
            })?;
        let x = pack
            .get(0)
            .and_then(PackedArg::as_tensor)
            .ok_or_else(|| StrategyError::NotATensor {
                op: op.clone(),
                stage: Stage::Compute,
                index: 0,
            })?;
        if BOOL_REDUCE_OPS.contains(&op.as_str()) && x.dtype != DType::Bool {
            return Err(StrategyError::TypeMismatch {
                op: op.clone(),
                tensor: x.name.clone(),
                expected: DType::Bool,
                found: x.dtype,
            });
        }

        debug!(op = %op, input = %x.name, output = name, ?axes, keepdim, "do reduce compute");
        // Every family binds the naive emitter for now.
        let out = match arch {
            Arch::NvGpu => reduce_fn(x, &axes, keepdim, name),
            Arch::HygonDcuHip | Arch::HygonDcuSycl => reduce_fn(x, &axes, keepdim, name),
            Arch::Unknown | Arch::X86 | Arch::Arm => reduce_fn(x, &axes, keepdim, name),
        };
        Ok(ArgPack::new(vec![PackedArg::Tensor(out)]))
    })
}
