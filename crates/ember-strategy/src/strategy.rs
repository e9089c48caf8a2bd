//! Strategy objects.

use std::fmt;
use std::sync::Arc;

use crate::args::ArgPack;
use crate::error::StrategyResult;

/// A stored compute function: packed inputs to packed output tensors.
pub type ComputeFn = Arc<dyn Fn(&ArgPack) -> StrategyResult<ArgPack> + Send + Sync>;

/// A stored schedule function: packed statement trees to one merged tree.
pub type ScheduleFn = Arc<dyn Fn(&ArgPack) -> StrategyResult<ArgPack> + Send + Sync>;

/// One implementation of an operator.
#[derive(Clone)]
pub struct OpImpl {
    /// Builds the output tensors.
    pub compute: ComputeFn,
    /// Schedules the lowered statement trees. Absent for symbolic-shape
    /// strategies.
    pub schedule: Option<ScheduleFn>,
    /// Implementation name, e.g. `strategy.reduce_sum.x86`.
    pub name: String,
    /// Selection priority; higher wins.
    pub priority: i32,
}

impl OpImpl {
    /// Run the compute function.
    ///
    /// # Errors
    ///
    /// Propagates the compute function's error.
    pub fn compute(&self, args: &ArgPack) -> StrategyResult<ArgPack> {
        (self.compute)(args)
    }

    /// Run the schedule function, if there is one.
    ///
    /// # Errors
    ///
    /// Propagates the schedule function's error.
    pub fn schedule(&self, args: &ArgPack) -> Option<StrategyResult<ArgPack>> {
        self.schedule.as_ref().map(|schedule| schedule(args))
    }
}

impl fmt::Debug for OpImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpImpl")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("has_schedule", &self.schedule.is_some())
            .finish_non_exhaustive()
    }
}

/// The set of implementations available for one operator instance.
#[derive(Clone, Debug, Default)]
pub struct OpStrategy {
    impls: Vec<OpImpl>,
}

impl OpStrategy {
    /// Creates a strategy with no implementations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an implementation.
    pub fn add_impl(
        &mut self,
        compute: ComputeFn,
        schedule: Option<ScheduleFn>,
        name: impl Into<String>,
        priority: i32,
    ) {
        self.impls.push(OpImpl {
            compute,
            schedule,
            name: name.into(),
            priority,
        });
    }

    /// All implementations, in insertion order.
    #[must_use]
    pub fn impls(&self) -> &[OpImpl] {
        &self.impls
    }

    /// The implementation with the highest priority. Ties go to the one
    /// added first.
    #[must_use]
    pub fn best_impl(&self) -> Option<&OpImpl> {
        self.impls
            .iter()
            .rev()
            .max_by_key(|imp| imp.priority)
    }

    /// Returns true if there are no implementations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.impls.is_empty()
    }
}
