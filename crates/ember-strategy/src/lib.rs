//! # Ember Operator Strategies
//!
//! A strategy tells the compiler how to implement one operator: a
//! *compute* function that builds the operator's output tensor from its
//! inputs, and a *schedule* function that transforms the lowered statement
//! trees for the target architecture.
//!
//! ## Two-phase evaluation
//!
//! Strategies are built once per operator instance, when attributes and
//! input tensors are known. The stored compute and schedule functions run
//! later, once per call site, on packed argument lists:
//!
//! ```text
//! attrs + inputs + target
//!     |
//!     v
//! [resolve_axes]          <- validate and normalise `axis` / `keepdim`
//!     |
//!     v
//! [OpStrategy]            <- compute fn + schedule fn, name, priority
//!     |
//!     |  later, per call site
//!     v
//! compute(args) -> [output tensor]
//! schedule(args) -> [merged statement tree]
//! ```
//!
//! ## Shape regimes
//!
//! Every reduction is registered twice. The static-shape strategy carries
//! both functions; the symbolic-shape strategy carries only the compute
//! function because scheduling happens in a later, shape-agnostic phase.
//!
//! ## Main Types
//!
//! - [`AttrStore`]: operator attributes
//! - [`ArgPack`]: packed arguments passed to compute/schedule functions
//! - [`OpStrategy`]: the strategy object
//! - [`OpRegistry`]: operator name to registration record

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod args;
pub mod attrs;
pub mod axis;
pub mod compute;
pub mod error;
pub mod reduce;
pub mod registry;
pub mod schedule;
pub mod strategy;

pub use args::{ArgPack, PackedArg};
pub use attrs::{AttrStore, AttrValue};
pub use axis::{resolve_axes, ReduceAxes};
pub use compute::build_compute;
pub use error::{Stage, StrategyError, StrategyResult};
pub use reduce::{
    strategy_for_reduce, strategy_for_reduce_symbolic, ReduceEntry, ShapeRegime, REDUCE_OPS,
};
pub use registry::{
    global_registry, init_global_registry, register_reduce_ops, OpPatternKind, OpRecord,
    OpRegistry, RegistryError, StrategyFn,
};
pub use schedule::build_schedule;
pub use strategy::{ComputeFn, OpImpl, OpStrategy, ScheduleFn};
