//! Vertex declarations for node and operator interfaces.

use crate::data::GraphData;
use crate::literal::Literal;

/// Access qualifier declared on a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexAccess {
    /// Bindable to read, write, or value references.
    Reference,
    /// Bindable only to immutable value references.
    Value,
}

/// A named, typed input slot on a node or operator.
#[derive(Debug, Clone)]
pub struct InputVertex {
    name: String,
    data_type: &'static str,
    access: VertexAccess,
    default_literal: Literal,
}

impl InputVertex {
    /// Declares a reference-qualified input of data type `T` with a default.
    pub fn new<T: GraphData>(name: impl Into<String>, default: impl Into<Literal>) -> Self {
        Self {
            name: name.into(),
            data_type: T::TYPE_NAME,
            access: VertexAccess::Reference,
            default_literal: default.into(),
        }
    }

    /// Overrides the access qualifier.
    pub fn with_access(mut self, access: VertexAccess) -> Self {
        self.access = access;
        self
    }

    /// Returns the vertex name, unique among the node's inputs.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared data-type name.
    #[inline]
    pub fn data_type(&self) -> &'static str {
        self.data_type
    }

    /// Returns the declared access qualifier.
    #[inline]
    pub fn access(&self) -> VertexAccess {
        self.access
    }

    /// Returns the declared default literal.
    #[inline]
    pub fn default_literal(&self) -> &Literal {
        &self.default_literal
    }
}

/// A named, typed output slot on a node or operator.
#[derive(Debug, Clone)]
pub struct OutputVertex {
    name: String,
    data_type: &'static str,
    access: VertexAccess,
}

impl OutputVertex {
    /// Declares a reference-qualified output of data type `T`.
    pub fn new<T: GraphData>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: T::TYPE_NAME,
            access: VertexAccess::Reference,
        }
    }

    /// Overrides the access qualifier.
    pub fn with_access(mut self, access: VertexAccess) -> Self {
        self.access = access;
        self
    }

    /// Returns the vertex name, unique among the node's outputs.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared data-type name.
    #[inline]
    pub fn data_type(&self) -> &'static str {
        self.data_type
    }

    /// Returns the declared access qualifier.
    #[inline]
    pub fn access(&self) -> VertexAccess {
        self.access
    }
}

/// Declared inputs and outputs of a node, name-unique per side.
#[derive(Debug, Clone, Default)]
pub struct VertexInterface {
    inputs: Vec<InputVertex>,
    outputs: Vec<OutputVertex>,
}

impl VertexInterface {
    /// Creates an interface from input and output declarations.
    pub fn new(inputs: Vec<InputVertex>, outputs: Vec<OutputVertex>) -> Self {
        debug_assert!(
            inputs
                .iter()
                .enumerate()
                .all(|(i, a)| inputs[..i].iter().all(|b| a.name() != b.name())),
            "duplicate input vertex name"
        );
        debug_assert!(
            outputs
                .iter()
                .enumerate()
                .all(|(i, a)| outputs[..i].iter().all(|b| a.name() != b.name())),
            "duplicate output vertex name"
        );
        Self { inputs, outputs }
    }

    /// Returns the input declarations.
    pub fn inputs(&self) -> &[InputVertex] {
        &self.inputs
    }

    /// Returns the output declarations.
    pub fn outputs(&self) -> &[OutputVertex] {
        &self.outputs
    }

    /// Looks up an input vertex by name.
    pub fn input(&self, name: &str) -> Option<&InputVertex> {
        self.inputs.iter().find(|v| v.name() == name)
    }

    /// Looks up an output vertex by name.
    pub fn output(&self, name: &str) -> Option<&OutputVertex> {
        self.outputs.iter().find(|v| v.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::AudioBuffer;

    #[test]
    fn test_interface_lookup() {
        let interface = VertexInterface::new(
            vec![
                InputVertex::new::<f32>("Freq", 440.0),
                InputVertex::new::<AudioBuffer>("In", Literal::None),
            ],
            vec![OutputVertex::new::<AudioBuffer>("Out")],
        );
        assert_eq!(interface.input("Freq").unwrap().data_type(), "float");
        assert_eq!(interface.output("Out").unwrap().data_type(), "audio");
        assert!(interface.input("Out").is_none());
    }

    #[test]
    fn test_value_qualifier() {
        let v = InputVertex::new::<bool>("Enabled", true).with_access(VertexAccess::Value);
        assert_eq!(v.access(), VertexAccess::Value);
        assert_eq!(v.default_literal(), &Literal::Bool(true));
    }
}
