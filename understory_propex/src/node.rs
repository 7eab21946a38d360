// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property nodes.
//!
//! A [`Node`] owns exactly one policy-backed [`Storage`]. The policy and the
//! value type are fixed when the node is built; only the value changes
//! afterwards. [`AnyNode`] erases the concrete node type so that nodes of
//! different value types and policies can live side by side in a
//! [`Registry`](crate::Registry).

use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::error::Result;
use crate::ownership::{
    ByAtomic, ByReference, ByShared, ByValue, ReturnsReference, ReturnsValue, SharedCell,
    SharedWrite, Storage, StorageKind,
};

/// Runtime identity of a property's value type.
///
/// Two `ValueType`s compare equal exactly when they describe the same Rust
/// type. The name is carried for diagnostics only and does not take part in
/// comparisons.
///
/// # Example
///
/// ```rust
/// use understory_propex::ValueType;
///
/// assert_eq!(ValueType::of::<f64>(), ValueType::of::<f64>());
/// assert_ne!(ValueType::of::<f64>(), ValueType::of::<f32>());
/// assert_eq!(ValueType::of::<f64>().name(), "f64");
/// ```
#[derive(Copy, Clone)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
}

impl ValueType {
    /// Returns the identity of `T`.
    #[must_use]
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the value type.
    #[must_use]
    #[inline]
    pub fn id(self) -> TypeId {
        self.id
    }

    /// Returns the name of the value type.
    #[must_use]
    #[inline]
    pub fn name(self) -> &'static str {
        self.name
    }

    /// Returns `true` if this describes `T`.
    #[must_use]
    #[inline]
    pub fn is<T: ?Sized + 'static>(self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for ValueType {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValueType {}

impl Hash for ValueType {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueType").field(&self.name).finish()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A property node: one value held under one ownership policy.
///
/// `get` returns whatever the policy returns: a borrow for [`ByValue`],
/// [`ByReference`] and [`ByShared`], a copy for [`ByAtomic`].
///
/// # Example
///
/// ```rust
/// use understory_propex::{AtomicNode, OwnedNode, StorageKind};
///
/// let mut speed = OwnedNode::new(42.0_f64);
/// assert_eq!(*speed.get().unwrap(), 42.0);
/// speed.set(7.0).unwrap();
/// assert_eq!(*speed.get().unwrap(), 7.0);
///
/// let mut ticks = AtomicNode::new(1_u64);
/// ticks.set(2).unwrap();
/// let copy: u64 = ticks.get().unwrap();
/// assert_eq!(copy, 2);
/// assert_eq!(ticks.storage_kind(), StorageKind::Atomic);
/// ```
#[derive(Debug, Default)]
pub struct Node<S: Storage> {
    storage: S,
}

/// A node holding its value inline.
pub type OwnedNode<T> = Node<ByValue<T>>;
/// A node referring to caller-owned storage.
pub type ExternalNode<T> = Node<ByReference<T>>;
/// A node holding its value in a shared cell.
pub type SharedNode<T> = Node<ByShared<T>>;
/// A node holding its value in an atomic cell.
pub type AtomicNode<T> = Node<ByAtomic<T>>;

impl<S: Storage> Node<S> {
    /// Creates a node whose storage is built from `source`.
    ///
    /// `source` is whatever the policy accepts: a value, a reference to a
    /// [`SharedCell`], or an existing shared handle.
    #[must_use]
    #[inline]
    pub fn new<V>(source: V) -> Self
    where
        S: From<V>,
    {
        Self {
            storage: S::from(source),
        }
    }

    /// Creates a node around an already built storage.
    #[must_use]
    #[inline]
    pub const fn from_storage(storage: S) -> Self {
        Self { storage }
    }

    /// Reads the value.
    ///
    /// # Errors
    ///
    /// Propagates storage failures; see [`Storage::get`].
    #[inline]
    pub fn get(&self) -> Result<S::Read<'_>> {
        self.storage.get()
    }

    /// Replaces the value.
    ///
    /// # Errors
    ///
    /// Propagates storage failures; see [`Storage::set`].
    #[inline]
    pub fn set(&mut self, value: S::Value) -> Result<()> {
        self.storage.set(value)
    }

    /// Replaces the value through a shared reference.
    ///
    /// Available for every policy with interior mutability, so a node held
    /// behind an `Arc` or bound to several views can still be written.
    ///
    /// # Errors
    ///
    /// Propagates storage failures; see [`SharedWrite::write`].
    #[inline]
    pub fn write(&self, value: S::Value) -> Result<()>
    where
        S: SharedWrite,
    {
        self.storage.write(value)
    }

    /// Runs `f` on a borrow of the value.
    ///
    /// # Errors
    ///
    /// Propagates storage failures; see [`Storage::get`].
    pub fn with<R>(&self, f: impl FnOnce(&S::Value) -> R) -> Result<R>
    where
        S: ReturnsReference,
    {
        let value = self.storage.read()?;
        Ok(f(&value))
    }

    /// Loads the value from a value-returning storage.
    #[must_use]
    #[inline]
    pub fn load(&self) -> S::Value
    where
        S: ReturnsValue,
    {
        self.storage.load()
    }

    /// Stores a value through a shared reference.
    ///
    /// Only value-returning storages support this, which makes it safe to call
    /// from several threads at once.
    #[inline]
    pub fn store(&self, value: S::Value)
    where
        S: ReturnsValue,
    {
        self.storage.store(value);
    }

    /// Returns the identity of the stored value type.
    #[must_use]
    #[inline]
    pub fn value_type(&self) -> ValueType {
        ValueType::of::<S::Value>()
    }

    /// Returns the ownership policy of this node.
    #[must_use]
    #[inline]
    pub const fn storage_kind(&self) -> StorageKind {
        S::KIND
    }

    /// Returns `true` if [`get`](Self::get) borrows rather than copies.
    #[must_use]
    #[inline]
    pub const fn returns_reference(&self) -> bool {
        S::RETURNS_REFERENCE
    }

    /// Returns the underlying storage.
    #[must_use]
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consumes the node and returns its storage.
    #[must_use]
    #[inline]
    pub fn into_storage(self) -> S {
        self.storage
    }
}

impl<T: 'static> Node<ByShared<T>> {
    /// Returns the shared cell, for building further nodes on the same value.
    #[must_use]
    #[inline]
    pub fn handle(&self) -> &SharedCell<T> {
        self.storage.handle()
    }
}

/// Object-safe view of a [`Node`] with its concrete type erased.
///
/// Use [`value_type`](Self::value_type) and
/// [`storage_kind`](Self::storage_kind) to inspect a node, and
/// `downcast_ref`/`downcast_mut` on `dyn AnyNode` to recover it.
///
/// # Example
///
/// ```rust
/// use understory_propex::{AnyNode, ByValue, OwnedNode, ValueType};
///
/// let node: Box<dyn AnyNode> = Box::new(OwnedNode::new(3_i32));
/// assert_eq!(node.value_type(), ValueType::of::<i32>());
/// assert!(node.is::<ByValue<i32>>());
///
/// let typed = node.downcast_ref::<ByValue<i32>>().unwrap();
/// assert_eq!(*typed.get().unwrap(), 3);
/// ```
pub trait AnyNode: Any {
    /// Returns the identity of the stored value type.
    fn value_type(&self) -> ValueType;

    /// Returns the ownership policy of the node.
    fn storage_kind(&self) -> StorageKind;

    /// Returns the name of the concrete storage type, for diagnostics.
    fn storage_type_name(&self) -> &'static str;

    /// Upcasts to [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// Upcasts to [`Any`], mutably.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: Storage> AnyNode for Node<S> {
    #[inline]
    fn value_type(&self) -> ValueType {
        Self::value_type(self)
    }

    #[inline]
    fn storage_kind(&self) -> StorageKind {
        S::KIND
    }

    #[inline]
    fn storage_type_name(&self) -> &'static str {
        core::any::type_name::<S>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn AnyNode {
    /// Returns `true` if this is a `Node<S>`.
    #[must_use]
    #[inline]
    pub fn is<S: Storage>(&self) -> bool {
        self.as_any().is::<Node<S>>()
    }

    /// Downcasts to a `Node<S>`.
    #[must_use]
    pub fn downcast_ref<S: Storage>(&self) -> Option<&Node<S>> {
        self.as_any().downcast_ref()
    }

    /// Downcasts to a mutable `Node<S>`.
    #[must_use]
    pub fn downcast_mut<S: Storage>(&mut self) -> Option<&mut Node<S>> {
        self.as_any_mut().downcast_mut()
    }
}

impl fmt::Debug for dyn AnyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyNode")
            .field("value_type", &self.value_type())
            .field("storage_kind", &self.storage_kind())
            .finish_non_exhaustive()
    }
}
