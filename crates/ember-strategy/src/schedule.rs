//! Schedule functions for reductions.
//!
//! A reduction's lowered body may arrive as several root statement trees
//! (a two-pass block reduction writes a temporary in one root and reads it
//! in the next) with tensor handles mixed in. The schedule function
//! simplifies every tree, fuses the roots into one, and checks that the
//! target architecture has a schedule at all.
//!
//! Shape inference upstream can reintroduce loops of extent one, which the
//! reduction schedule does not expect; they are removed before merging.

use std::sync::Arc;

use ember_ir::{
    simplify_blocks, simplify_for_loops, Expr, IrError, ModuleExpr, SimplifyStats, Tensor,
};
use ember_session::StrategyOptions;
use ember_target::Arch;
use tracing::debug;

use crate::args::{ArgPack, PackedArg};
use crate::error::{Stage, StrategyError};
use crate::strategy::ScheduleFn;

/// Build the schedule function of reduction `op` for `arch`.
///
/// The returned function takes between `options.min_schedule_args` and
/// `options.max_schedule_args` entries, given either directly or as a
/// single nested pack. Statement-tree entries are scheduled; tensor
/// entries only count towards the arity. It returns a pack holding the
/// merged statement tree.
#[must_use]
pub fn build_schedule(op: &str, arch: Arch, options: &StrategyOptions) -> ScheduleFn {
    let op = op.to_string();
    let (min, max) = (options.min_schedule_args, options.max_schedule_args);
    Arc::new(move |args: &ArgPack| {
        if args.is_empty() {
            return Err(StrategyError::EmptyArguments {
                op: op.clone(),
                stage: Stage::Schedule,
            });
        }
        let entries = match args.get(0) {
            Some(PackedArg::Pack(inner)) if args.len() == 1 => inner,
            _ => args,
        };
        if !(min..=max).contains(&entries.len()) {
            return Err(StrategyError::ArityMismatch {
                op: op.clone(),
                stage: Stage::Schedule,
                min,
                max,
                got: entries.len(),
            });
        }

        let mut exprs: Vec<Expr> = Vec::new();
        let mut tensors: Vec<&Tensor> = Vec::new();
        let mut stats = SimplifyStats::default();
        for entry in entries {
            if let Some(tensor) = entry.as_tensor() {
                tensors.push(tensor);
            } else if let Some(stmt) = entry.as_stmt() {
                let mut stmt = stmt.clone();
                stats.merge(&SimplifyStats {
                    loops_removed: simplify_for_loops(&mut stmt),
                    blocks_flattened: simplify_blocks(&mut stmt),
                });
                exprs.push(stmt);
            }
        }
        if exprs.is_empty() {
            return Err(StrategyError::EmptyExpressionSet { op: op.clone() });
        }
        debug!(
            op = %op,
            exprs = exprs.len(),
            tensors = tensors.len(),
            loops_removed = stats.loops_removed,
            blocks_flattened = stats.blocks_flattened,
            "do reduce schedule"
        );

        let mut module = ModuleExpr::new(exprs);
        module.merge_exprs()?;
        let merged = module
            .into_exprs()
            .into_iter()
            .next()
            .ok_or(IrError::EmptyModule)?;

        match arch {
            Arch::Unknown => Err(StrategyError::UnsupportedArchitecture {
                op: op.clone(),
                arch,
            }),
            Arch::X86 | Arch::Arm => Ok(ArgPack::new(vec![PackedArg::Expr(merged)])),
            Arch::NvGpu => Ok(ArgPack::new(vec![PackedArg::Expr(merged)])),
            Arch::HygonDcuHip | Arch::HygonDcuSycl => {
                Ok(ArgPack::new(vec![PackedArg::Expr(merged)]))
            }
        }
    })
}
