//! Data-type registry: literal construction for types known only by name.
//!
//! The engine sometimes has to materialize a value for a data type it only
//! knows as a string — installing a silence replacement when an audio edge
//! is removed, or seeding a graph input default. The registry maps each
//! [`GraphData::TYPE_NAME`] to type-erased constructors. It is an explicit
//! service: hosts build one (usually [`with_core_types`](DataTypeRegistry::with_core_types)
//! plus their own types) and inject it into the builder and transactor.

use std::collections::HashMap;

use crate::buffer::AudioBuffer;
use crate::data::GraphData;
use crate::literal::Literal;
use crate::reference::{AnyDataReference, ValueRef, WriteRef};
use crate::settings::OperatorSettings;

type Factory = fn(&Literal, &OperatorSettings) -> AnyDataReference;

#[derive(Clone, Copy)]
struct Entry {
    create_value: Factory,
    create_write: Factory,
}

fn value_factory<T: GraphData>(
    literal: &Literal,
    settings: &OperatorSettings,
) -> AnyDataReference {
    ValueRef::new(T::from_literal(literal, settings)).into()
}

fn write_factory<T: GraphData>(
    literal: &Literal,
    settings: &OperatorSettings,
) -> AnyDataReference {
    WriteRef::new(T::from_literal(literal, settings)).into()
}

/// Registry of data types the engine can construct by name.
#[derive(Clone, Default)]
pub struct DataTypeRegistry {
    entries: HashMap<&'static str, Entry>,
}

impl DataTypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the core data types registered:
    /// `float`, `int`, `bool`, `string`, and `audio`.
    pub fn with_core_types() -> Self {
        let mut registry = Self::new();
        registry.register::<f32>();
        registry.register::<i32>();
        registry.register::<bool>();
        registry.register::<String>();
        registry.register::<AudioBuffer>();
        registry
    }

    /// Registers a data type, replacing any previous registration of the
    /// same name.
    pub fn register<T: GraphData>(&mut self) {
        self.entries.insert(
            T::TYPE_NAME,
            Entry {
                create_value: value_factory::<T>,
                create_write: write_factory::<T>,
            },
        );
    }

    /// Returns true if the named type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Materializes an immutable value reference for a named type.
    pub fn create_value(
        &self,
        type_name: &str,
        literal: &Literal,
        settings: &OperatorSettings,
    ) -> Option<AnyDataReference> {
        let entry = self.entries.get(type_name)?;
        Some((entry.create_value)(literal, settings))
    }

    /// Materializes a writable reference for a named type.
    pub fn create_write(
        &self,
        type_name: &str,
        literal: &Literal,
        settings: &OperatorSettings,
    ) -> Option<AnyDataReference> {
        let entry = self.entries.get(type_name)?;
        Some((entry.create_write)(literal, settings))
    }
}
