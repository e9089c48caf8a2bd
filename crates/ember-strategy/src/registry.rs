//! Operator registry.
//!
//! Maps operator names to their registration records. The process-wide
//! registry is filled once by [`init_global_registry`] and is read-only
//! afterwards, so lookups from several compilation threads need no locking.

use std::fmt;
use std::sync::{Arc, OnceLock};

use ember_ir::{DType, Shape, Tensor};
use ember_session::StrategyOptions;
use ember_target::Target;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::attrs::AttrStore;
use crate::error::StrategyResult;
use crate::reduce::{strategy_for_reduce, strategy_for_reduce_symbolic, REDUCE_OPS};
use crate::strategy::OpStrategy;

/// Builds the strategy of one operator instance from its attributes,
/// input tensors, output element types, output shapes and target.
pub type StrategyFn = Arc<
    dyn Fn(&AttrStore, &[Tensor], &[DType], &[Shape], &Target) -> StrategyResult<OpStrategy>
        + Send
        + Sync,
>;

/// Fusion pattern of an operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpPatternKind {
    /// One output element per input element.
    ElementWise,
    /// Broadcasts its input.
    Broadcast,
    /// Any other injective mapping.
    Injective,
    /// Reduces one or more axes.
    Reduction,
    /// Fusible with following elementwise operators.
    OutFusible,
    /// Never fused.
    NonFusible,
}

/// Registration record of one operator.
#[derive(Clone)]
pub struct OpRecord {
    /// Operator name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Number of input tensors.
    pub num_inputs: usize,
    /// Number of output tensors.
    pub num_outputs: usize,
    /// Static-shape strategy.
    pub strategy: StrategyFn,
    /// Symbolic-shape strategy.
    pub strategy_symbolic: StrategyFn,
    /// Fusion pattern.
    pub pattern: OpPatternKind,
    /// Support level.
    pub support_level: u32,
    /// Element type the operator requires, if any.
    pub dtype: Option<DType>,
}

impl fmt::Debug for OpRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpRecord")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("num_inputs", &self.num_inputs)
            .field("num_outputs", &self.num_outputs)
            .field("pattern", &self.pattern)
            .field("support_level", &self.support_level)
            .field("dtype", &self.dtype)
            .finish_non_exhaustive()
    }
}

/// Errors raised while registering operators.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// An operator with this name is already registered.
    #[error("operator `{0}` is already registered")]
    DuplicateOperator(String),
    /// The global registry was initialised twice.
    #[error("the global operator registry is already initialised")]
    AlreadyInitialized,
    /// The global registry was read before initialisation.
    #[error("the global operator registry is not initialised")]
    NotInitialized,
}

/// Operator name to registration record.
#[derive(Clone, Debug, Default)]
pub struct OpRegistry {
    ops: FxHashMap<String, OpRecord>,
}

impl OpRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateOperator`] if the name is taken.
    pub fn register(&mut self, record: OpRecord) -> Result<(), RegistryError> {
        if self.ops.contains_key(&record.name) {
            return Err(RegistryError::DuplicateOperator(record.name));
        }
        debug!(op = %record.name, pattern = ?record.pattern, "registered operator");
        self.ops.insert(record.name.clone(), record);
        Ok(())
    }

    /// Looks up a record by operator name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OpRecord> {
        self.ops.get(name)
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Number of registered operators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Registered operator names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ops.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Register the six reduction operators.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateOperator`] if any of them is already
/// registered.
pub fn register_reduce_ops(
    registry: &mut OpRegistry,
    options: &StrategyOptions,
) -> Result<(), RegistryError> {
    for entry in &REDUCE_OPS {
        let static_options = options.clone();
        let symbolic_options = options.clone();
        let strategy: StrategyFn = Arc::new(
            move |attrs: &AttrStore,
                  inputs: &[Tensor],
                  out_types: &[DType],
                  shapes: &[Shape],
                  target: &Target| {
                strategy_for_reduce(entry, &static_options, attrs, inputs, out_types, shapes, target)
            },
        );
        let strategy_symbolic: StrategyFn = Arc::new(
            move |attrs: &AttrStore,
                  inputs: &[Tensor],
                  out_types: &[DType],
                  shapes: &[Shape],
                  target: &Target| {
                strategy_for_reduce_symbolic(
                    entry,
                    &symbolic_options,
                    attrs,
                    inputs,
                    out_types,
                    shapes,
                    target,
                )
            },
        );

        registry.register(OpRecord {
            name: entry.name.to_string(),
            description: format!("{} function", entry.name),
            num_inputs: 1,
            num_outputs: 1,
            strategy,
            strategy_symbolic,
            pattern: OpPatternKind::Reduction,
            support_level: options.support_level,
            dtype: entry.dtype,
        })?;
    }
    info!(count = REDUCE_OPS.len(), "registered reduction operators");
    Ok(())
}

static GLOBAL_REGISTRY: OnceLock<OpRegistry> = OnceLock::new();

/// Build and install the process-wide registry.
///
/// Must be called once at startup, before any thread reads the registry.
///
/// # Errors
///
/// Returns [`RegistryError::AlreadyInitialized`] on a second call.
pub fn init_global_registry(
    options: &StrategyOptions,
) -> Result<&'static OpRegistry, RegistryError> {
    if GLOBAL_REGISTRY.get().is_some() {
        return Err(RegistryError::AlreadyInitialized);
    }
    let mut registry = OpRegistry::new();
    register_reduce_ops(&mut registry, options)?;
    GLOBAL_REGISTRY
        .set(registry)
        .map_err(|_| RegistryError::AlreadyInitialized)?;
    global_registry()
}

/// The process-wide registry.
///
/// # Errors
///
/// Returns [`RegistryError::NotInitialized`] before [`init_global_registry`]
/// has run.
pub fn global_registry() -> Result<&'static OpRegistry, RegistryError> {
    GLOBAL_REGISTRY.get().ok_or(RegistryError::NotInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_target::targets;

    fn registry() -> OpRegistry {
        let mut registry = OpRegistry::new();
        register_reduce_ops(&mut registry, &StrategyOptions::default()).unwrap();
        registry
    }

    #[test]
    fn test_six_reductions_registered() {
        let registry = registry();
        assert_eq!(
            registry.names(),
            vec![
                "reduce_all",
                "reduce_any",
                "reduce_max",
                "reduce_min",
                "reduce_prod",
                "reduce_sum"
            ]
        );
    }

    #[test]
    fn test_record_metadata() {
        let registry = registry();
        let sum = registry.get("reduce_sum").unwrap();
        assert_eq!(sum.description, "reduce_sum function");
        assert_eq!((sum.num_inputs, sum.num_outputs), (1, 1));
        assert_eq!(sum.pattern, OpPatternKind::Reduction);
        assert_eq!(sum.support_level, 4);
        assert_eq!(sum.dtype, None);

        let any = registry.get("reduce_any").unwrap();
        assert_eq!(any.dtype, Some(DType::Bool));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = registry();
        assert_eq!(
            register_reduce_ops(&mut registry, &StrategyOptions::default()),
            Err(RegistryError::DuplicateOperator("reduce_sum".to_string()))
        );
    }

    #[test]
    fn test_record_strategies_callable() {
        let registry = registry();
        let record = registry.get("reduce_prod").unwrap();
        let attrs = AttrStore::new().with("axis", vec![0i64]);
        let inputs = vec![Tensor::placeholder(
            "x",
            Shape::from_static([2, 3]),
            DType::Int32,
        )];

        let strategy =
            (record.strategy)(&attrs, &inputs, &[DType::Int32], &[], &targets::x86()).unwrap();
        assert!(strategy.impls()[0].schedule.is_some());

        let symbolic =
            (record.strategy_symbolic)(&attrs, &inputs, &[DType::Int32], &[], &targets::x86())
                .unwrap();
        assert!(symbolic.impls()[0].schedule.is_none());
    }
}
