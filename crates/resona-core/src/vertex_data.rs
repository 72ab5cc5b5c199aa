//! Bound vertex data: the references an operator's interface resolves to.
//!
//! A built operator carries one [`VertexInterfaceData`]: its declared
//! vertices plus the [`AnyDataReference`] each vertex is currently bound
//! to. Binding is checked — the reference's data-type name must match the
//! vertex declaration, and a value-qualified vertex only accepts value
//! references. Reference-qualified vertices accept read, write, or value
//! references.

use std::collections::HashMap;

use crate::data::GraphData;
use crate::reference::{AccessKind, AnyDataReference, ReadRef, ValueRef, WriteRef};
use crate::settings::OperatorSettings;
use crate::vertex::{InputVertex, OutputVertex, VertexAccess, VertexInterface};

/// Error binding a reference to a vertex.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BindError {
    /// The interface declares no vertex with this name.
    #[error("no vertex named \"{0}\" on this interface")]
    MissingVertex(String),

    /// The reference carries a different data type than the vertex declares.
    #[error("vertex \"{name}\" expects data type \"{expected}\", reference carries \"{actual}\"")]
    DataTypeMismatch {
        /// Vertex name.
        name: String,
        /// Declared data-type name.
        expected: &'static str,
        /// Data-type name of the offered reference.
        actual: &'static str,
    },

    /// A value-qualified vertex was offered a non-value reference.
    #[error("vertex \"{name}\" is value-qualified and only accepts value references, got {actual:?}")]
    AccessViolation {
        /// Vertex name.
        name: String,
        /// Access kind of the offered reference.
        actual: AccessKind,
    },
}

fn check_binding(
    name: &str,
    declared_type: &'static str,
    declared_access: VertexAccess,
    reference: &AnyDataReference,
) -> Result<(), BindError> {
    if declared_type != reference.data_type() {
        return Err(BindError::DataTypeMismatch {
            name: name.to_owned(),
            expected: declared_type,
            actual: reference.data_type(),
        });
    }
    if declared_access == VertexAccess::Value && reference.access() != AccessKind::Value {
        return Err(BindError::AccessViolation {
            name: name.to_owned(),
            actual: reference.access(),
        });
    }
    Ok(())
}

/// Input-side bound data for one operator.
#[derive(Debug, Clone, Default)]
pub struct InputVertexData {
    vertices: Vec<InputVertex>,
    bound: HashMap<String, AnyDataReference>,
}

impl InputVertexData {
    /// Creates unbound data for the given input declarations.
    pub fn new(vertices: impl IntoIterator<Item = InputVertex>) -> Self {
        Self {
            vertices: vertices.into_iter().collect(),
            bound: HashMap::new(),
        }
    }

    /// Returns the input declarations.
    pub fn vertices(&self) -> &[InputVertex] {
        &self.vertices
    }

    /// Looks up an input declaration by name.
    pub fn vertex(&self, name: &str) -> Option<&InputVertex> {
        self.vertices.iter().find(|v| v.name() == name)
    }

    /// Binds a reference to a named vertex, replacing any previous binding.
    pub fn bind(&mut self, name: &str, reference: AnyDataReference) -> Result<(), BindError> {
        let vertex = self
            .vertex(name)
            .ok_or_else(|| BindError::MissingVertex(name.to_owned()))?;
        check_binding(name, vertex.data_type(), vertex.access(), &reference)?;
        self.bound.insert(name.to_owned(), reference);
        Ok(())
    }

    /// Adds a vertex declaration, replacing any same-named one.
    ///
    /// Used when a graph-level interface grows at runtime (a node vertex
    /// exposed as a graph input after the build).
    pub fn add_vertex(&mut self, vertex: InputVertex) {
        self.vertices.retain(|v| v.name() != vertex.name());
        self.vertices.push(vertex);
    }

    /// Removes a vertex declaration and its binding.
    pub fn remove_vertex(&mut self, name: &str) -> Option<InputVertex> {
        self.bound.remove(name);
        let position = self.vertices.iter().position(|v| v.name() == name)?;
        Some(self.vertices.remove(position))
    }

    /// Removes the binding for a vertex, returning the displaced reference.
    pub fn unbind(&mut self, name: &str) -> Option<AnyDataReference> {
        self.bound.remove(name)
    }

    /// Returns the reference bound to a vertex, if any.
    pub fn reference(&self, name: &str) -> Option<&AnyDataReference> {
        self.bound.get(name)
    }

    /// Returns true if the vertex currently has a binding.
    pub fn is_bound(&self, name: &str) -> bool {
        self.bound.contains_key(name)
    }

    /// Returns the access kind of the vertex's binding, or
    /// [`AccessKind::None`] when unbound.
    pub fn access_kind(&self, name: &str) -> AccessKind {
        self.bound
            .get(name)
            .map_or(AccessKind::None, AnyDataReference::access)
    }

    /// Returns a typed read view of a bound vertex.
    pub fn get_read<T: GraphData>(&self, name: &str) -> Option<ReadRef<T>> {
        self.bound.get(name)?.as_read::<T>()
    }

    /// Returns a typed read view, materializing the vertex's declared
    /// default literal when unbound.
    ///
    /// The created default is cached as the vertex's binding, so repeated
    /// calls — and later identity comparisons — observe the same storage.
    pub fn get_or_default<T: GraphData>(
        &mut self,
        name: &str,
        settings: &OperatorSettings,
    ) -> Result<ReadRef<T>, BindError> {
        if let Some(reference) = self.bound.get(name) {
            return reference
                .as_read::<T>()
                .ok_or_else(|| BindError::DataTypeMismatch {
                    name: name.to_owned(),
                    expected: T::TYPE_NAME,
                    actual: reference.data_type(),
                });
        }
        let vertex = self
            .vertex(name)
            .ok_or_else(|| BindError::MissingVertex(name.to_owned()))?;
        if vertex.data_type() != T::TYPE_NAME {
            return Err(BindError::DataTypeMismatch {
                name: name.to_owned(),
                expected: vertex.data_type(),
                actual: T::TYPE_NAME,
            });
        }
        let value = ValueRef::new(T::from_literal(vertex.default_literal(), settings));
        let read = value.as_read();
        self.bound.insert(name.to_owned(), value.into());
        Ok(read)
    }

    /// Iterates over the bound vertices as `(name, reference)` pairs.
    pub fn iter_bound(&self) -> impl Iterator<Item = (&str, &AnyDataReference)> {
        self.bound.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Output-side bound data for one operator.
#[derive(Debug, Clone, Default)]
pub struct OutputVertexData {
    vertices: Vec<OutputVertex>,
    bound: HashMap<String, AnyDataReference>,
}

impl OutputVertexData {
    /// Creates unbound data for the given output declarations.
    pub fn new(vertices: impl IntoIterator<Item = OutputVertex>) -> Self {
        Self {
            vertices: vertices.into_iter().collect(),
            bound: HashMap::new(),
        }
    }

    /// Returns the output declarations.
    pub fn vertices(&self) -> &[OutputVertex] {
        &self.vertices
    }

    /// Looks up an output declaration by name.
    pub fn vertex(&self, name: &str) -> Option<&OutputVertex> {
        self.vertices.iter().find(|v| v.name() == name)
    }

    /// Binds a reference to a named vertex, replacing any previous binding.
    pub fn bind(&mut self, name: &str, reference: AnyDataReference) -> Result<(), BindError> {
        let vertex = self
            .vertex(name)
            .ok_or_else(|| BindError::MissingVertex(name.to_owned()))?;
        check_binding(name, vertex.data_type(), vertex.access(), &reference)?;
        self.bound.insert(name.to_owned(), reference);
        Ok(())
    }

    /// Adds a vertex declaration, replacing any same-named one.
    pub fn add_vertex(&mut self, vertex: OutputVertex) {
        self.vertices.retain(|v| v.name() != vertex.name());
        self.vertices.push(vertex);
    }

    /// Removes a vertex declaration and its binding.
    pub fn remove_vertex(&mut self, name: &str) -> Option<OutputVertex> {
        self.bound.remove(name);
        let position = self.vertices.iter().position(|v| v.name() == name)?;
        Some(self.vertices.remove(position))
    }

    /// Publishes a writable handle as the vertex's binding.
    pub fn bind_write<T: GraphData>(
        &mut self,
        name: &str,
        reference: &WriteRef<T>,
    ) -> Result<(), BindError> {
        self.bind(name, reference.clone().into())
    }

    /// Publishes an immutable value as the vertex's binding.
    pub fn bind_value<T: GraphData>(
        &mut self,
        name: &str,
        reference: &ValueRef<T>,
    ) -> Result<(), BindError> {
        self.bind(name, reference.clone().into())
    }

    /// Removes the binding for a vertex, returning the displaced reference.
    pub fn unbind(&mut self, name: &str) -> Option<AnyDataReference> {
        self.bound.remove(name)
    }

    /// Returns the reference bound to a vertex, if any.
    pub fn reference(&self, name: &str) -> Option<&AnyDataReference> {
        self.bound.get(name)
    }

    /// Returns true if the vertex currently has a binding.
    pub fn is_bound(&self, name: &str) -> bool {
        self.bound.contains_key(name)
    }

    /// Returns the access kind of the vertex's binding, or
    /// [`AccessKind::None`] when unbound.
    pub fn access_kind(&self, name: &str) -> AccessKind {
        self.bound
            .get(name)
            .map_or(AccessKind::None, AnyDataReference::access)
    }

    /// Returns a typed read view of a bound vertex.
    pub fn get_read<T: GraphData>(&self, name: &str) -> Option<ReadRef<T>> {
        self.bound.get(name)?.as_read::<T>()
    }

    /// Iterates over the bound vertices as `(name, reference)` pairs.
    pub fn iter_bound(&self) -> impl Iterator<Item = (&str, &AnyDataReference)> {
        self.bound.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Combined input and output bound data for one operator.
#[derive(Debug, Clone, Default)]
pub struct VertexInterfaceData {
    inputs: InputVertexData,
    outputs: OutputVertexData,
}

impl VertexInterfaceData {
    /// Creates unbound data for the given interface.
    pub fn new(interface: &VertexInterface) -> Self {
        Self {
            inputs: InputVertexData::new(interface.inputs().iter().cloned()),
            outputs: OutputVertexData::new(interface.outputs().iter().cloned()),
        }
    }

    /// Returns the input-side data.
    pub fn inputs(&self) -> &InputVertexData {
        &self.inputs
    }

    /// Returns the input-side data mutably.
    pub fn inputs_mut(&mut self) -> &mut InputVertexData {
        &mut self.inputs
    }

    /// Returns the output-side data.
    pub fn outputs(&self) -> &OutputVertexData {
        &self.outputs
    }

    /// Returns the output-side data mutably.
    pub fn outputs_mut(&mut self) -> &mut OutputVertexData {
        &mut self.outputs
    }

    /// Returns both sides mutably; used when an operator rebinds inputs and
    /// republishes outputs in one step.
    pub fn split_mut(&mut self) -> (&mut InputVertexData, &mut OutputVertexData) {
        (&mut self.inputs, &mut self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;

    fn interface() -> VertexInterface {
        VertexInterface::new(
            vec![
                InputVertex::new::<f32>("Gain", 1.0),
                InputVertex::new::<bool>("Enabled", true).with_access(VertexAccess::Value),
            ],
            vec![OutputVertex::new::<f32>("Out")],
        )
    }

    #[test]
    fn test_bind_checks_data_type() {
        let mut data = VertexInterfaceData::new(&interface());
        let err = data
            .inputs_mut()
            .bind("Gain", WriteRef::new(1i32).into())
            .unwrap_err();
        assert!(matches!(err, BindError::DataTypeMismatch { .. }));
        assert!(
            data.inputs_mut()
                .bind("Gain", WriteRef::new(1.0f32).into())
                .is_ok()
        );
    }

    #[test]
    fn test_bind_checks_missing_vertex() {
        let mut data = VertexInterfaceData::new(&interface());
        let err = data
            .inputs_mut()
            .bind("Nope", WriteRef::new(1.0f32).into())
            .unwrap_err();
        assert!(matches!(err, BindError::MissingVertex(_)));
    }

    #[test]
    fn test_value_vertex_rejects_write_reference() {
        let mut data = VertexInterfaceData::new(&interface());
        let err = data
            .inputs_mut()
            .bind("Enabled", WriteRef::new(true).into())
            .unwrap_err();
        assert!(matches!(err, BindError::AccessViolation { .. }));
        assert!(
            data.inputs_mut()
                .bind("Enabled", ValueRef::new(true).into())
                .is_ok()
        );
    }

    #[test]
    fn test_reference_vertex_accepts_any_access() {
        let mut data = InputVertexData::new(vec![InputVertex::new::<f32>("In", Literal::None)]);
        assert!(data.bind("In", WriteRef::new(0.0f32).into()).is_ok());
        assert!(
            data.bind("In", WriteRef::new(0.0f32).as_read().into())
                .is_ok()
        );
        assert!(data.bind("In", ValueRef::new(0.0f32).into()).is_ok());
    }

    #[test]
    fn test_get_or_default_materializes_and_caches() {
        let settings = OperatorSettings::default();
        let mut data = InputVertexData::new(vec![InputVertex::new::<f32>("Gain", 0.25)]);
        assert_eq!(data.access_kind("Gain"), AccessKind::None);

        let first = data.get_or_default::<f32>("Gain", &settings).unwrap();
        assert_eq!(*first.read(), 0.25);
        assert_eq!(data.access_kind("Gain"), AccessKind::Value);

        let second = data.get_or_default::<f32>("Gain", &settings).unwrap();
        assert_eq!(first.id(), second.id());
    }

    #[test]
    fn test_output_publish_and_read() {
        let mut data = OutputVertexData::new(vec![OutputVertex::new::<f32>("Out")]);
        let w = WriteRef::new(0.0f32);
        data.bind_write("Out", &w).unwrap();
        *w.write() = 4.0;
        assert_eq!(*data.get_read::<f32>("Out").unwrap().read(), 4.0);
        assert_eq!(data.reference("Out").unwrap().id(), w.id());
    }
}
