// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ownership policies for property values.
//!
//! A policy decides how a property value is held and how long it lives. Each
//! policy is a distinct storage type implementing [`Storage`], the uniform
//! `get`/`set` adapter used by [`Node`](crate::Node) and
//! [`PropertyView`](crate::PropertyView):
//!
//! | Policy             | Holds                           | `get` returns       |
//! |--------------------|---------------------------------|---------------------|
//! | [`ByValue<T>`]     | the value inline                | `&T`                |
//! | [`ByReference<T>`] | a non-owning handle to a cell   | read guard          |
//! | [`ByShared<T>`]    | a reference-counted cell        | read guard          |
//! | [`ByAtomic<T>`]    | a lock-free atomic cell         | `T` (a copy)        |
//!
//! The reference-versus-value split is part of the type: [`Storage::Read`] is a
//! borrow for the first three policies and the value itself for atomics. The
//! marker traits [`ReturnsReference`] and [`ReturnsValue`] let generic code
//! name either side.
//!
//! Construction goes through `From`: every policy can be built from the
//! sources it accepts (a value, a [`SharedCell`], or a reference to one).
//!
//! [`ByReference`], [`ByShared`] and [`ByAtomic`] also implement
//! [`SharedWrite`]. The lock-backed policies never block; conflicting access
//! reports [`PropexError::AlreadyBorrowed`] instead.

use core::fmt;
use core::ops::Deref;
use core::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use parking_lot::{ArcRwLockReadGuard, RawRwLock, RwLock, RwLockReadGuard};

use crate::atomic::AtomicValue;
use crate::error::{PropexError, Result};

/// A heap cell that can be shared between [`ByShared`] nodes and referenced
/// by [`ByReference`] nodes.
pub type SharedCell<T> = Arc<RwLock<T>>;

/// Allocates a new [`SharedCell`] holding `value`.
#[must_use]
pub fn shared_cell<T>(value: T) -> SharedCell<T> {
    Arc::new(RwLock::new(value))
}

/// Which ownership policy a storage implements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StorageKind {
    /// The value is stored inline ([`ByValue`]).
    Owned,
    /// The value lives in caller-supplied storage ([`ByReference`]).
    External,
    /// The value lives in a reference-counted cell ([`ByShared`]).
    Shared,
    /// The value lives in a lock-free atomic cell ([`ByAtomic`]).
    Atomic,
}

impl StorageKind {
    /// Returns `true` if storages of this kind hand out a borrow from `get`.
    #[must_use]
    #[inline]
    pub const fn returns_reference(self) -> bool {
        !matches!(self, Self::Atomic)
    }

    /// Returns a short lowercase name for this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Owned => "owned",
            Self::External => "external",
            Self::Shared => "shared",
            Self::Atomic => "atomic",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniform access to a policy-backed value slot.
///
/// The storage kind is fixed by the implementing type, so a node never
/// switches policy at runtime.
pub trait Storage: 'static {
    /// The value type exposed by this storage.
    type Value: 'static;

    /// What [`get`](Self::get) hands back: a borrow (or read guard) for
    /// reference-returning policies, the value itself for atomics.
    type Read<'a>
    where
        Self: 'a;

    /// The ownership policy implemented by this storage.
    const KIND: StorageKind;

    /// Whether [`Read`](Self::Read) borrows the stored value.
    const RETURNS_REFERENCE: bool = Self::KIND.returns_reference();

    /// Reads the current value.
    ///
    /// # Errors
    ///
    /// Returns [`PropexError::DanglingReference`] if an external reference no
    /// longer points at live storage, and [`PropexError::AlreadyBorrowed`] if
    /// a lock-backed value is being written.
    fn get(&self) -> Result<Self::Read<'_>>;

    /// Replaces the current value.
    ///
    /// # Errors
    ///
    /// Returns [`PropexError::DanglingReference`] if an external reference no
    /// longer points at live storage, and [`PropexError::AlreadyBorrowed`] if
    /// a lock-backed value still has a live read guard.
    fn set(&mut self, value: Self::Value) -> Result<()>;
}

/// Storages that can be written through a shared reference.
///
/// Every policy except [`ByValue`] implements this.
pub trait SharedWrite: Storage {
    /// Replaces the current value through a shared reference.
    ///
    /// # Errors
    ///
    /// Same as [`Storage::set`].
    fn write(&self, value: Self::Value) -> Result<()>;
}

/// Storages whose reads borrow the stored value instead of copying it.
pub trait ReturnsReference: Storage {
    /// Borrows the current value.
    ///
    /// This is [`Storage::get`] with the borrow made explicit for generic code.
    ///
    /// # Errors
    ///
    /// Same as [`Storage::get`].
    fn read(&self) -> Result<impl Deref<Target = Self::Value> + '_>;
}

/// Storages whose reads return the value by copy.
///
/// These can also be written through a shared reference.
pub trait ReturnsValue: Storage<Value: Copy> {
    /// Loads the current value.
    fn load(&self) -> Self::Value;

    /// Stores a new value through a shared reference.
    fn store(&self, value: Self::Value);
}

fn already_borrowed() -> PropexError {
    tracing::trace!("lock-backed value is already borrowed");
    PropexError::AlreadyBorrowed
}

// =============================================================================
// ByValue
// =============================================================================

/// Stores the value inline.
///
/// `get` borrows the internal copy and `set` assigns in place. This policy has
/// no failure modes.
///
/// ```rust
/// use understory_propex::{ByValue, Storage};
///
/// let mut storage = ByValue::new(42);
/// assert_eq!(*storage.get().unwrap(), 42);
/// storage.set(7).unwrap();
/// assert_eq!(storage.into_inner(), 7);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ByValue<T> {
    value: T,
}

impl<T> ByValue<T> {
    /// Creates a storage holding `value`.
    #[must_use]
    #[inline]
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    /// Consumes the storage and returns the value.
    #[must_use]
    #[inline]
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> From<T> for ByValue<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: 'static> Storage for ByValue<T> {
    type Value = T;
    type Read<'a> = &'a T;

    const KIND: StorageKind = StorageKind::Owned;

    #[inline]
    fn get(&self) -> Result<&T> {
        Ok(&self.value)
    }

    #[inline]
    fn set(&mut self, value: T) -> Result<()> {
        self.value = value;
        Ok(())
    }
}

impl<T: 'static> ReturnsReference for ByValue<T> {
    #[inline]
    fn read(&self) -> Result<impl Deref<Target = T> + '_> {
        self.get()
    }
}

// =============================================================================
// ByReference
// =============================================================================

/// Refers to a value owned by someone else.
///
/// The storage holds a non-owning handle to a caller-supplied [`SharedCell`].
/// Changes made to the cell directly are visible through `get` without going
/// through `set`. The handle does not keep the cell alive: once every owner
/// drops it, or when the storage was created with
/// [`dangling`](Self::dangling), access fails with
/// [`PropexError::DanglingReference`].
///
/// No synchronization is added on top of the referent's own lock; keeping the
/// referent consistent is the owner's business. See the
/// [crate docs](crate#aliasing) for how live read guards interact with writes.
///
/// ```rust
/// use understory_propex::{ByReference, PropexError, Storage, shared_cell};
///
/// let external = shared_cell(99);
/// let storage = ByReference::new(&external);
///
/// *external.write() = 123;
/// assert_eq!(*storage.get().unwrap(), 123);
///
/// drop(external);
/// assert_eq!(storage.get().err(), Some(PropexError::DanglingReference));
/// ```
pub struct ByReference<T> {
    target: Weak<RwLock<T>>,
}

impl<T> ByReference<T> {
    /// Creates a storage referring to `cell`.
    #[must_use]
    #[inline]
    pub fn new(cell: &SharedCell<T>) -> Self {
        Self {
            target: Arc::downgrade(cell),
        }
    }

    /// Creates a storage that refers to nothing.
    ///
    /// Every access fails with [`PropexError::DanglingReference`].
    #[must_use]
    #[inline]
    pub const fn dangling() -> Self {
        Self {
            target: Weak::new(),
        }
    }

    /// Returns `true` if the referent is no longer reachable.
    #[must_use]
    #[inline]
    pub fn is_dangling(&self) -> bool {
        self.target.strong_count() == 0
    }

    fn target(&self) -> Result<SharedCell<T>> {
        self.target.upgrade().ok_or_else(|| {
            tracing::debug!("external reference accessed after its referent was dropped");
            PropexError::DanglingReference
        })
    }
}

impl<T> Clone for ByReference<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<T> Default for ByReference<T> {
    fn default() -> Self {
        Self::dangling()
    }
}

impl<T> fmt::Debug for ByReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByReference")
            .field("dangling", &self.is_dangling())
            .finish_non_exhaustive()
    }
}

impl<T> From<&SharedCell<T>> for ByReference<T> {
    #[inline]
    fn from(cell: &SharedCell<T>) -> Self {
        Self::new(cell)
    }
}

impl<T> From<Weak<RwLock<T>>> for ByReference<T> {
    #[inline]
    fn from(target: Weak<RwLock<T>>) -> Self {
        Self { target }
    }
}

impl<T: 'static> Storage for ByReference<T> {
    type Value = T;
    type Read<'a> = ArcRwLockReadGuard<RawRwLock, T>;

    const KIND: StorageKind = StorageKind::External;

    fn get(&self) -> Result<Self::Read<'_>> {
        self.target()?.try_read_arc().ok_or_else(already_borrowed)
    }

    #[inline]
    fn set(&mut self, value: T) -> Result<()> {
        self.write(value)
    }
}

impl<T: 'static> SharedWrite for ByReference<T> {
    fn write(&self, value: T) -> Result<()> {
        let cell = self.target()?;
        let mut slot = cell.try_write().ok_or_else(already_borrowed)?;
        *slot = value;
        Ok(())
    }
}

impl<T: 'static> ReturnsReference for ByReference<T> {
    #[inline]
    fn read(&self) -> Result<impl Deref<Target = T> + '_> {
        self.get()
    }
}

// =============================================================================
// ByShared
// =============================================================================

/// Shares the value through a reference-counted cell.
///
/// The cell lives as long as its longest-lived holder. Building from a value
/// allocates a fresh cell; building from an existing [`SharedCell`] shares it,
/// so every storage built from the same cell observes the others' writes.
///
/// ```rust
/// use understory_propex::{ByShared, Storage};
///
/// let mut a = ByShared::new(1);
/// let b = ByShared::from_handle(a.handle().clone());
///
/// a.set(2).unwrap();
/// assert_eq!(*b.get().unwrap(), 2);
/// ```
#[derive(Debug)]
pub struct ByShared<T> {
    cell: SharedCell<T>,
}

impl<T> ByShared<T> {
    /// Creates a storage holding `value` in a freshly allocated cell.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            cell: shared_cell(value),
        }
    }

    /// Creates a storage sharing an existing cell.
    #[must_use]
    #[inline]
    pub fn from_handle(cell: SharedCell<T>) -> Self {
        Self { cell }
    }

    /// Returns the shared cell.
    ///
    /// Cloning the handle extends the value's lifetime.
    #[must_use]
    #[inline]
    pub fn handle(&self) -> &SharedCell<T> {
        &self.cell
    }
}

impl<T> Clone for ByShared<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> From<T> for ByShared<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> From<SharedCell<T>> for ByShared<T> {
    #[inline]
    fn from(cell: SharedCell<T>) -> Self {
        Self::from_handle(cell)
    }
}

impl<T: 'static> Storage for ByShared<T> {
    type Value = T;
    type Read<'a> = RwLockReadGuard<'a, T>;

    const KIND: StorageKind = StorageKind::Shared;

    #[inline]
    fn get(&self) -> Result<RwLockReadGuard<'_, T>> {
        self.cell.try_read().ok_or_else(already_borrowed)
    }

    #[inline]
    fn set(&mut self, value: T) -> Result<()> {
        self.write(value)
    }
}

impl<T: 'static> SharedWrite for ByShared<T> {
    fn write(&self, value: T) -> Result<()> {
        *self.cell.try_write().ok_or_else(already_borrowed)? = value;
        Ok(())
    }
}

impl<T: 'static> ReturnsReference for ByShared<T> {
    #[inline]
    fn read(&self) -> Result<impl Deref<Target = T> + '_> {
        self.get()
    }
}

// =============================================================================
// ByAtomic
// =============================================================================

/// Keeps the value in a lock-free atomic cell.
///
/// `get` is an atomic load that always returns a copy, and `set` is an atomic
/// store. Both use [`Ordering::Relaxed`]: a reader never sees a torn value, but
/// no ordering with surrounding memory operations is implied.
///
/// Only the primitive scalars implementing [`AtomicValue`] can be stored.
///
/// ```rust
/// use understory_propex::{ByAtomic, ReturnsValue, Storage};
///
/// let storage = ByAtomic::new(5_u32);
/// storage.store(100);
/// assert_eq!(storage.get().unwrap(), 100);
/// ```
pub struct ByAtomic<T: AtomicValue> {
    cell: T::Cell,
}

impl<T: AtomicValue> ByAtomic<T> {
    /// Creates a storage holding `value`.
    #[must_use]
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            cell: T::new_cell(value),
        }
    }

    /// Consumes the storage and returns the value.
    #[must_use]
    #[inline]
    pub fn into_inner(self) -> T {
        T::into_inner(self.cell)
    }
}

impl<T: AtomicValue + fmt::Debug> fmt::Debug for ByAtomic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByAtomic")
            .field("value", &self.load())
            .finish()
    }
}

impl<T: AtomicValue + Default> Default for ByAtomic<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: AtomicValue> From<T> for ByAtomic<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: AtomicValue> Storage for ByAtomic<T> {
    type Value = T;
    type Read<'a> = T;

    const KIND: StorageKind = StorageKind::Atomic;

    #[inline]
    fn get(&self) -> Result<T> {
        Ok(self.load())
    }

    #[inline]
    fn set(&mut self, value: T) -> Result<()> {
        self.store(value);
        Ok(())
    }
}

impl<T: AtomicValue> SharedWrite for ByAtomic<T> {
    #[inline]
    fn write(&self, value: T) -> Result<()> {
        self.store(value);
        Ok(())
    }
}

impl<T: AtomicValue> ReturnsValue for ByAtomic<T> {
    #[inline]
    fn load(&self) -> T {
        T::load(&self.cell, Ordering::Relaxed)
    }

    #[inline]
    fn store(&self, value: T) {
        T::store(&self.cell, value, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_through<S: ReturnsReference>(storage: &S) -> S::Value
    where
        S::Value: Clone,
    {
        storage.read().map(|v| v.clone()).unwrap()
    }

    #[test]
    fn kinds_report_reference_semantics() {
        assert!(<ByValue<i32> as Storage>::RETURNS_REFERENCE);
        assert!(<ByReference<i32> as Storage>::RETURNS_REFERENCE);
        assert!(<ByShared<i32> as Storage>::RETURNS_REFERENCE);
        assert!(!<ByAtomic<i32> as Storage>::RETURNS_REFERENCE);
        assert_eq!(<ByAtomic<i32> as Storage>::KIND, StorageKind::Atomic);
        assert_eq!(StorageKind::External.to_string(), "external");
    }

    #[test]
    fn by_value_get_set() {
        let mut storage = ByValue::from(String::from("a"));
        assert_eq!(storage.get().unwrap(), "a");
        storage.set(String::from("b")).unwrap();
        assert_eq!(read_through(&storage), "b");
    }

    #[test]
    fn by_reference_sees_external_writes() {
        let external = shared_cell(99);
        let mut storage = ByReference::from(&external);
        assert_eq!(*storage.get().unwrap(), 99);

        *external.write() = 123;
        assert_eq!(*storage.get().unwrap(), 123);

        storage.set(5).unwrap();
        assert_eq!(*external.read(), 5);
        assert_eq!(read_through(&storage), 5);
    }

    #[test]
    fn by_reference_dangling() {
        let mut storage = ByReference::<i32>::dangling();
        assert!(storage.is_dangling());
        assert_eq!(storage.get().err(), Some(PropexError::DanglingReference));
        assert_eq!(storage.set(1), Err(PropexError::DanglingReference));

        let external = shared_cell(1);
        let storage = ByReference::new(&external);
        assert!(!storage.is_dangling());
        drop(external);
        assert!(storage.is_dangling());
        assert!(matches!(
            storage.get(),
            Err(PropexError::DanglingReference)
        ));
    }

    #[test]
    fn by_reference_does_not_extend_lifetime() {
        let external = shared_cell(1);
        let _storage = ByReference::new(&external);
        assert_eq!(Arc::strong_count(&external), 1);
    }

    #[test]
    fn by_reference_write_conflicts_with_live_guard() {
        let external = shared_cell(1);
        let mut storage = ByReference::new(&external);

        let guard = storage.get().unwrap();
        assert_eq!(storage.set(2), Err(PropexError::AlreadyBorrowed));
        assert_eq!(storage.write(2), Err(PropexError::AlreadyBorrowed));
        assert!(external.try_write().is_none());
        assert_eq!(*guard, 1);
        drop(guard);

        storage.set(2).unwrap();
        assert_eq!(*external.read(), 2);
    }

    #[test]
    fn by_reference_read_conflicts_with_host_writer() {
        let external = shared_cell(1);
        let storage = ByReference::new(&external);

        let mut host = external.write();
        *host = 3;
        assert!(matches!(storage.get(), Err(PropexError::AlreadyBorrowed)));
        drop(host);
        assert_eq!(*storage.get().unwrap(), 3);
    }

    #[test]
    fn by_shared_sibling_write_conflicts_with_live_guard() {
        let a = ByShared::new(1);
        let mut b = ByShared::from_handle(Arc::clone(a.handle()));

        let guard = a.get().unwrap();
        assert_eq!(b.set(2), Err(PropexError::AlreadyBorrowed));
        // Reads still share the lock.
        assert_eq!(*b.get().unwrap(), 1);
        drop(guard);

        b.set(2).unwrap();
        assert_eq!(*a.get().unwrap(), 2);
    }

    #[test]
    fn shared_write_through_shared_references() {
        fn write_all<S: SharedWrite<Value = u16>>(storages: &[&S], value: u16) {
            for storage in storages {
                storage.write(value).unwrap();
            }
        }

        let external = shared_cell(0_u16);
        let reference = ByReference::new(&external);
        let shared = ByShared::new(0_u16);
        let atomic = ByAtomic::new(0_u16);

        write_all(&[&reference, &reference.clone()], 4);
        write_all(&[&shared, &shared.clone()], 5);
        write_all(&[&atomic], 6);

        assert_eq!(*external.read(), 4);
        assert_eq!(*shared.get().unwrap(), 5);
        assert_eq!(atomic.load(), 6);
    }

    #[test]
    fn by_shared_from_value_allocates() {
        let a = ByShared::from(1);
        let b = ByShared::from(1);
        assert!(!Arc::ptr_eq(a.handle(), b.handle()));
    }

    #[test]
    fn by_shared_from_handle_shares() {
        let cell = shared_cell(7);
        let mut a: ByShared<i32> = ByShared::from(Arc::clone(&cell));
        let b = ByShared::from_handle(Arc::clone(&cell));

        a.set(44).unwrap();
        assert_eq!(*b.get().unwrap(), 44);

        *cell.write() = 45;
        assert_eq!(read_through(&a), 45);

        drop(cell);
        drop(a);
        assert_eq!(*b.get().unwrap(), 45);
    }

    #[test]
    fn by_atomic_get_set() {
        let mut storage = ByAtomic::from(5_i64);
        assert_eq!(storage.get().unwrap(), 5);
        storage.set(100).unwrap();
        assert_eq!(storage.load(), 100);
        storage.store(-1);
        assert_eq!(storage.into_inner(), -1);
    }

    #[test]
    fn debug_output() {
        let atomic = ByAtomic::new(3_u8);
        assert_eq!(format!("{atomic:?}"), "ByAtomic { value: 3 }");

        let reference = ByReference::<u8>::dangling();
        assert!(format!("{reference:?}").contains("dangling: true"));
    }
}
