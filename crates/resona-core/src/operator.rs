//! The executable operator contract.

use crate::environment::Environment;
use crate::settings::OperatorSettings;
use crate::vertex_data::{InputVertexData, OutputVertexData};

/// Which per-cycle passes an operator takes part in.
///
/// An absent capability keeps the operator out of that execution table
/// entirely — the engine never calls a pass the operator did not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// The operator renders during the execute pass.
    pub execute: bool,
    /// The operator participates in the reverse-order post-execute pass.
    pub post_execute: bool,
    /// The operator re-initializes state on reset.
    pub reset: bool,
}

impl Capabilities {
    /// No passes at all (a pure data holder).
    pub const NONE: Self = Self {
        execute: false,
        post_execute: false,
        reset: false,
    };

    /// Execute only — the common case.
    pub const EXECUTE: Self = Self {
        execute: true,
        post_execute: false,
        reset: false,
    };

    /// Every pass.
    pub const ALL: Self = Self {
        execute: true,
        post_execute: true,
        reset: true,
    };

    /// Adds the post-execute capability.
    pub fn with_post_execute(mut self) -> Self {
        self.post_execute = true;
        self
    }

    /// Adds the reset capability.
    pub fn with_reset(mut self) -> Self {
        self.reset = true;
        self
    }
}

/// Context passed to [`Operator::reset`].
pub struct ResetParams<'a> {
    /// Settings of the render instance being reset.
    pub settings: &'a OperatorSettings,
    /// Environment the graph was built with.
    pub environment: &'a Environment,
}

/// The runtime, per-node executable unit.
///
/// Operators are produced by node factories at build time (or live-inserted
/// by the dynamic engine) and hold typed references to their bound data.
/// [`bind_inputs`](Self::bind_inputs) is the single place an operator
/// acquires its input references; it is called at build time and again
/// whenever an upstream rebind changes this operator's inputs.
/// [`bind_outputs`](Self::bind_outputs) publishes the operator's output
/// references — rebinding inputs may change which storage the outputs
/// alias, which is why the engine always calls both and propagates any
/// output identity change forward.
pub trait Operator: Send {
    /// Re-acquires input references from `inputs`.
    fn bind_inputs(&mut self, inputs: &mut InputVertexData);

    /// Publishes output references into `outputs`.
    fn bind_outputs(&mut self, outputs: &mut OutputVertexData);

    /// Declares which passes this operator participates in.
    fn capabilities(&self) -> Capabilities;

    /// Renders one block. Called only when [`Capabilities::execute`] is set.
    fn execute(&mut self) {}

    /// Runs after every execute in reverse operator order; used to push
    /// results backwards (for example parameter read-back). Called only
    /// when [`Capabilities::post_execute`] is set.
    fn post_execute(&mut self) {}

    /// Re-initializes internal state, for example after a transport seek.
    /// Called only when [`Capabilities::reset`] is set.
    fn reset(&mut self, params: &ResetParams<'_>) {
        let _ = params;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_builders() {
        let caps = Capabilities::EXECUTE.with_reset();
        assert!(caps.execute);
        assert!(!caps.post_execute);
        assert!(caps.reset);
        assert_eq!(Capabilities::default(), Capabilities::NONE);
    }
}
