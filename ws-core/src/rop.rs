//! Railway-oriented chaining of pipeline steps.
//!
//! A [`Railway`] is an ordered list of [`Step`]s over a context value `C`.
//! Each step consumes the context and hands back the next one:
//!
//! - [`Step::AndThen`] wraps a [`FallibleStep`]. An `Err` it returns ends the
//!   run and becomes the railway's result.
//! - [`Step::Map`] wraps an [`InfallibleStep`]. Its output is re-wrapped in
//!   `Ok` and passed on.
//!
//! Steps run strictly in declaration order and nothing after the first
//! failure is invoked.

use async_trait::async_trait;
use tracing::{debug, warn};

/// A step that may fail, ending the railway with its error.
#[async_trait]
pub trait FallibleStep<C: Send, E>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, context: C) -> Result<C, E>;
}

/// A total transformer of the context.
pub trait InfallibleStep<C>: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, context: C) -> C;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    AndThen,
    Map,
}

pub enum Step<C: Send, E> {
    AndThen(Box<dyn FallibleStep<C, E>>),
    Map(Box<dyn InfallibleStep<C>>),
}

impl<C: Send, E> Step<C, E> {
    pub fn and_then(step: impl FallibleStep<C, E> + 'static) -> Self {
        Step::AndThen(Box::new(step))
    }

    pub fn map(step: impl InfallibleStep<C> + 'static) -> Self {
        Step::Map(Box::new(step))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::AndThen(step) => step.name(),
            Step::Map(step) => step.name(),
        }
    }

    pub fn mode(&self) -> StepMode {
        match self {
            Step::AndThen(_) => StepMode::AndThen,
            Step::Map(_) => StepMode::Map,
        }
    }
}

pub struct Railway<C: Send, E> {
    steps: Vec<Step<C, E>>,
}

impl<C: Send, E> Railway<C, E> {
    pub fn new(steps: Vec<Step<C, E>>) -> Self {
        Self { steps }
    }

    /// Names and modes of the steps, in execution order.
    pub fn describe(&self) -> Vec<(&'static str, StepMode)> {
        self.steps
            .iter()
            .map(|step| (step.name(), step.mode()))
            .collect()
    }

    /// Run every step in order, stopping at the first error.
    pub async fn run(&self, context: C) -> Result<C, E> {
        let mut context = context;

        for step in &self.steps {
            context = match step {
                Step::AndThen(step) => {
                    debug!(step = step.name(), "Running fallible step");
                    match step.run(context).await {
                        Ok(next) => next,
                        Err(err) => {
                            warn!(step = step.name(), "Step failed, skipping remaining steps");
                            return Err(err);
                        }
                    }
                }
                Step::Map(step) => {
                    debug!(step = step.name(), "Running transformer step");
                    step.apply(context)
                }
            };
        }

        Ok(context)
    }
}
