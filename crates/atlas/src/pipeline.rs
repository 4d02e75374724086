//! Named processing pipelines
//!
//! A pipeline is an ordered list of named steps. Each step receives a shared
//! context, the value produced by the previous step and a mutable side value,
//! and returns the next value. One step may be pinned to run last regardless of
//! when it was registered. Steps can be skipped for a single run by name.

use std::fmt;

use crate::error::{OrmError, OrmResult};

/// A single pipeline step
pub type Step<C, V, S> = Box<dyn Fn(&C, V, &mut Option<S>) -> OrmResult<V> + Send + Sync>;

struct NamedStep<C, V, S> {
    name: String,
    step: Step<C, V, S>,
}

/// Ordered, named steps over a context `C`, a value `V` and a side value `S`
pub struct Pipeline<C, V, S = ()> {
    steps: Vec<NamedStep<C, V, S>>,
    final_step: Option<NamedStep<C, V, S>>,
}

impl<C, V, S> fmt::Debug for Pipeline<C, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.steps.iter().map(|s| s.name.as_str()).collect::<Vec<_>>())
            .field("final_step", &self.final_step.as_ref().map(|s| s.name.as_str()))
            .finish()
    }
}

impl<C, V, S> Default for Pipeline<C, V, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, V, S> Pipeline<C, V, S> {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            final_step: None,
        }
    }

    /// Append a step; fails if the name is already taken
    pub fn add_step<F>(&mut self, name: &str, step: F) -> OrmResult<&mut Self>
    where
        F: Fn(&C, V, &mut Option<S>) -> OrmResult<V> + Send + Sync + 'static,
    {
        if self.has_step(name) {
            return Err(OrmError::DuplicateStep(name.to_string()));
        }
        self.steps.push(NamedStep {
            name: name.to_string(),
            step: Box::new(step),
        });
        Ok(self)
    }

    /// Pin the step that always runs after every regular step.
    ///
    /// A later call with a different name replaces the pinned step.
    pub fn add_final_step<F>(&mut self, name: &str, step: F) -> OrmResult<&mut Self>
    where
        F: Fn(&C, V, &mut Option<S>) -> OrmResult<V> + Send + Sync + 'static,
    {
        if self.has_step(name) {
            return Err(OrmError::DuplicateStep(name.to_string()));
        }
        self.final_step = Some(NamedStep {
            name: name.to_string(),
            step: Box::new(step),
        });
        Ok(self)
    }

    /// Swap the body of an existing step, keeping its position
    pub fn replace_step<F>(&mut self, name: &str, step: F) -> OrmResult<&mut Self>
    where
        F: Fn(&C, V, &mut Option<S>) -> OrmResult<V> + Send + Sync + 'static,
    {
        let slot = self
            .steps
            .iter_mut()
            .chain(self.final_step.iter_mut())
            .find(|s| s.name == name)
            .ok_or_else(|| OrmError::Configuration(format!("no pipeline step named '{}'", name)))?;
        slot.step = Box::new(step);
        Ok(self)
    }

    /// Remove a step by name, returning whether it existed
    pub fn remove_step(&mut self, name: &str) -> bool {
        if self.final_step.as_ref().is_some_and(|s| s.name == name) {
            self.final_step = None;
            return true;
        }
        let before = self.steps.len();
        self.steps.retain(|s| s.name != name);
        self.steps.len() != before
    }

    pub fn has_step(&self, name: &str) -> bool {
        self.steps.iter().any(|s| s.name == name)
            || self.final_step.as_ref().is_some_and(|s| s.name == name)
    }

    /// Step names in execution order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps
            .iter()
            .chain(self.final_step.iter())
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len() + usize::from(self.final_step.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every step in order and return the last step's value
    pub fn run(&self, ctx: &C, value: V, side: &mut Option<S>) -> OrmResult<V> {
        self.run_without(&[], ctx, value, side)
    }

    /// Run every step except the named ones; unknown names are ignored
    pub fn run_without(&self, skip: &[&str], ctx: &C, value: V, side: &mut Option<S>) -> OrmResult<V> {
        let mut value = value;
        for named in self.steps.iter().chain(self.final_step.iter()) {
            if skip.contains(&named.name.as_str()) {
                continue;
            }
            tracing::trace!(step = %named.name, "running pipeline step");
            value = (named.step)(ctx, value, side)?;
        }
        Ok(value)
    }
}
