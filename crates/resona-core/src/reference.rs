//! Access-qualified shared data references.
//!
//! Data flows between operators through shared cells: an upstream operator
//! holds a [`WriteRef`] to a value and every downstream consumer holds a
//! [`ReadRef`] to the same storage. The type-erased [`AnyDataReference`] is
//! what vertex bindings and transforms carry; it remembers the access kind
//! and the declared data-type name, and downcasts back to the typed
//! handles with the access rules enforced.
//!
//! Reference identity ([`DataReferenceId`]) is derived from the shared
//! storage address. Two references compare equal exactly when they alias
//! the same cell, which is how rebind propagation detects "did this
//! binding actually change" without comparing values.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::data::GraphData;

/// How a bound reference may be used by its holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// No reference bound.
    None,
    /// Read-only view of data another operator writes.
    Read,
    /// Writable data owned by the producing operator.
    Write,
    /// Immutable-after-construction value.
    Value,
}

/// Stable identity of the storage behind a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataReferenceId(usize);

fn read_cell<T>(cell: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    cell.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_cell<T>(cell: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    cell.write().unwrap_or_else(PoisonError::into_inner)
}

fn cell_id<T: ?Sized>(cell: &Arc<T>) -> DataReferenceId {
    DataReferenceId(Arc::as_ptr(cell) as *const () as usize)
}

/// Read-only view of a shared value.
#[derive(Debug)]
pub struct ReadRef<T> {
    cell: Arc<RwLock<T>>,
}

impl<T> Clone for ReadRef<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: GraphData> ReadRef<T> {
    /// Creates a new cell that will only ever be read.
    pub fn new(value: T) -> Self {
        Self {
            cell: Arc::new(RwLock::new(value)),
        }
    }

    /// Locks the value for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        read_cell(&self.cell)
    }

    /// Returns the storage identity of this reference.
    pub fn id(&self) -> DataReferenceId {
        cell_id(&self.cell)
    }
}

/// Writable handle to a shared value; the producing side of an edge.
#[derive(Debug)]
pub struct WriteRef<T> {
    cell: Arc<RwLock<T>>,
}

impl<T> Clone for WriteRef<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: GraphData> WriteRef<T> {
    /// Creates a new writable cell.
    pub fn new(value: T) -> Self {
        Self {
            cell: Arc::new(RwLock::new(value)),
        }
    }

    /// Locks the value for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        read_cell(&self.cell)
    }

    /// Locks the value for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        write_cell(&self.cell)
    }

    /// Returns a read-only view of the same storage.
    pub fn as_read(&self) -> ReadRef<T> {
        ReadRef {
            cell: Arc::clone(&self.cell),
        }
    }

    /// Returns the storage identity of this reference.
    pub fn id(&self) -> DataReferenceId {
        cell_id(&self.cell)
    }
}

/// Immutable-after-construction shared value.
#[derive(Debug)]
pub struct ValueRef<T> {
    cell: Arc<RwLock<T>>,
}

impl<T> Clone for ValueRef<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: GraphData> ValueRef<T> {
    /// Creates a new immutable cell.
    pub fn new(value: T) -> Self {
        Self {
            cell: Arc::new(RwLock::new(value)),
        }
    }

    /// Locks the value for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        read_cell(&self.cell)
    }

    /// Returns a read-only view of the same storage.
    pub fn as_read(&self) -> ReadRef<T> {
        ReadRef {
            cell: Arc::clone(&self.cell),
        }
    }

    /// Returns the storage identity of this reference.
    pub fn id(&self) -> DataReferenceId {
        cell_id(&self.cell)
    }
}

/// Type-erased reference carried by vertex bindings and transforms.
#[derive(Clone)]
pub struct AnyDataReference {
    access: AccessKind,
    type_name: &'static str,
    cell: Arc<dyn Any + Send + Sync>,
}

impl fmt::Debug for AnyDataReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyDataReference")
            .field("access", &self.access)
            .field("type", &self.type_name)
            .field("id", &self.id())
            .finish()
    }
}

impl AnyDataReference {
    /// Returns the access kind this reference was erased from.
    #[inline]
    pub fn access(&self) -> AccessKind {
        self.access
    }

    /// Returns the declared data-type name of the referenced value.
    #[inline]
    pub fn data_type(&self) -> &'static str {
        self.type_name
    }

    /// Returns the storage identity of this reference.
    ///
    /// Identity survives erasure: a typed handle and the erased reference
    /// to the same storage report the same id.
    pub fn id(&self) -> DataReferenceId {
        cell_id(&self.cell)
    }

    fn downcast_cell<T: GraphData>(&self) -> Option<Arc<RwLock<T>>> {
        if T::TYPE_NAME != self.type_name {
            return None;
        }
        Arc::clone(&self.cell).downcast::<RwLock<T>>().ok()
    }

    /// Downcasts to a read view. Permitted for every access kind.
    pub fn as_read<T: GraphData>(&self) -> Option<ReadRef<T>> {
        let cell = self.downcast_cell::<T>()?;
        Some(ReadRef { cell })
    }

    /// Downcasts to a writable handle. Only permitted for write references.
    pub fn as_write<T: GraphData>(&self) -> Option<WriteRef<T>> {
        if self.access != AccessKind::Write {
            return None;
        }
        let cell = self.downcast_cell::<T>()?;
        Some(WriteRef { cell })
    }

    /// Downcasts to an immutable value handle. Only permitted for value
    /// references.
    pub fn as_value<T: GraphData>(&self) -> Option<ValueRef<T>> {
        if self.access != AccessKind::Value {
            return None;
        }
        let cell = self.downcast_cell::<T>()?;
        Some(ValueRef { cell })
    }
}

impl<T: GraphData> From<ReadRef<T>> for AnyDataReference {
    fn from(reference: ReadRef<T>) -> Self {
        Self {
            access: AccessKind::Read,
            type_name: T::TYPE_NAME,
            cell: reference.cell,
        }
    }
}

impl<T: GraphData> From<WriteRef<T>> for AnyDataReference {
    fn from(reference: WriteRef<T>) -> Self {
        Self {
            access: AccessKind::Write,
            type_name: T::TYPE_NAME,
            cell: reference.cell,
        }
    }
}

impl<T: GraphData> From<ValueRef<T>> for AnyDataReference {
    fn from(reference: ValueRef<T>) -> Self {
        Self {
            access: AccessKind::Value,
            type_name: T::TYPE_NAME,
            cell: reference.cell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_share_storage() {
        let w = WriteRef::new(1.5f32);
        let r = w.as_read();
        assert_eq!(w.id(), r.id());
        *w.write() = 2.5;
        assert_eq!(*r.read(), 2.5);
    }

    #[test]
    fn test_identity_survives_erasure() {
        let w = WriteRef::new(0.0f32);
        let erased = AnyDataReference::from(w.clone());
        assert_eq!(erased.id(), w.id());
        let back = erased.as_read::<f32>().unwrap();
        assert_eq!(back.id(), w.id());
    }

    #[test]
    fn test_distinct_cells_have_distinct_ids() {
        let a = WriteRef::new(0.0f32);
        let b = WriteRef::new(0.0f32);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_downcast_enforces_type_name() {
        let erased = AnyDataReference::from(WriteRef::new(1.0f32));
        assert!(erased.as_read::<f32>().is_some());
        assert!(erased.as_read::<i32>().is_none());
    }

    #[test]
    fn test_downcast_enforces_access() {
        let value = AnyDataReference::from(ValueRef::new(3i32));
        assert_eq!(value.access(), AccessKind::Value);
        assert!(value.as_write::<i32>().is_none());
        assert!(value.as_value::<i32>().is_some());
        assert!(value.as_read::<i32>().is_some());

        let read = AnyDataReference::from(WriteRef::new(3i32).as_read());
        assert!(read.as_write::<i32>().is_none());
        assert!(read.as_value::<i32>().is_none());
    }

    #[test]
    fn test_value_reads_back() {
        let v = ValueRef::new(String::from("x"));
        let erased = AnyDataReference::from(v.clone());
        let r = erased.as_value::<String>().unwrap();
        assert_eq!(*r.read(), "x");
        assert_eq!(r.id(), v.id());
    }
}
