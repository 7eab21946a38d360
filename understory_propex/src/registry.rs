// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat node registry.
//!
//! A [`Registry`] maps fully composed keys to owned nodes. Three choices are
//! made once, as type parameters:
//!
//! - **Pointer** (`P`): how nodes are owned. `Box<N>` owns each node
//!   exclusively; `Arc<N>` and `Rc<N>` let callers keep their own handle.
//! - **Map** (`M`): the associative container, any [`NodeMap`]. Defaults to a
//!   hash map; use `BTreeMap` for ordered iteration.
//! - **Keys** (`K`): the [`KeyTraits`] used to merge multi-fragment keys.
//!
//! The map has no internal locking. Structural changes need `&mut self`, so
//! sharing a registry across threads requires external synchronization.

use core::any::type_name;
use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{PropexError, Result};
use crate::key::{DefaultKey, KeyFragments, KeyTraits};
use crate::node::{AnyNode, Node};
use crate::ownership::Storage;
use crate::view::{PropertyView, SharedView};

// ============================================================================
// Pointers
// ============================================================================

/// A pointer that owns a registry entry.
///
/// Shared pointers hand out mutable access only while they are the sole
/// owner of their node.
pub trait NodePtr: Deref {
    /// Returns mutable access to the node, or `None` if the node is shared.
    fn get_mut(this: &mut Self) -> Option<&mut Self::Target>;
}

impl<N: ?Sized> NodePtr for Box<N> {
    #[inline]
    fn get_mut(this: &mut Self) -> Option<&mut N> {
        Some(&mut **this)
    }
}

impl<N: ?Sized> NodePtr for Arc<N> {
    #[inline]
    fn get_mut(this: &mut Self) -> Option<&mut N> {
        Arc::get_mut(this)
    }
}

impl<N: ?Sized> NodePtr for Rc<N> {
    #[inline]
    fn get_mut(this: &mut Self) -> Option<&mut N> {
        Rc::get_mut(this)
    }
}

// ============================================================================
// Maps
// ============================================================================

/// The associative container behind a [`Registry`].
///
/// Implemented for `hashbrown::HashMap` (with the `hashbrown` feature),
/// `std::collections::HashMap`, and `BTreeMap`, all keyed by `String`.
pub trait NodeMap<P>: Default {
    /// Inserts `node` at `key`, returning the entry it replaced.
    fn insert(&mut self, key: String, node: P) -> Option<P>;

    /// Returns the entry at `key`.
    fn get(&self, key: &str) -> Option<&P>;

    /// Returns the entry at `key`, mutably.
    fn get_mut(&mut self, key: &str) -> Option<&mut P>;

    /// Removes and returns the entry at `key`.
    fn remove(&mut self, key: &str) -> Option<P>;

    /// Returns `true` if there is an entry at `key`.
    fn contains_key(&self, key: &str) -> bool;

    /// Removes every entry.
    fn clear(&mut self);

    /// Returns the number of entries.
    fn len(&self) -> usize;

    /// Iterates over all entries in the map's own order.
    fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a String, &'a P)>
    where
        P: 'a;
}

macro_rules! impl_node_map_for_hash_map {
    ($map:ident) => {
        impl<P, S: BuildHasher + Default> NodeMap<P> for $map<String, P, S> {
            #[inline]
            fn insert(&mut self, key: String, node: P) -> Option<P> {
                $map::insert(self, key, node)
            }

            #[inline]
            fn get(&self, key: &str) -> Option<&P> {
                $map::get(self, key)
            }

            #[inline]
            fn get_mut(&mut self, key: &str) -> Option<&mut P> {
                $map::get_mut(self, key)
            }

            #[inline]
            fn remove(&mut self, key: &str) -> Option<P> {
                $map::remove(self, key)
            }

            #[inline]
            fn contains_key(&self, key: &str) -> bool {
                $map::contains_key(self, key)
            }

            #[inline]
            fn clear(&mut self) {
                $map::clear(self);
            }

            #[inline]
            fn len(&self) -> usize {
                $map::len(self)
            }

            fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a String, &'a P)>
            where
                P: 'a,
            {
                $map::iter(self)
            }
        }
    };
}

#[cfg(feature = "hashbrown")]
mod hashbrown_map {
    use super::NodeMap;
    use core::hash::BuildHasher;
    use hashbrown::HashMap;

    impl_node_map_for_hash_map!(HashMap);
}

mod std_map {
    use super::NodeMap;
    use core::hash::BuildHasher;
    use std::collections::HashMap;

    impl_node_map_for_hash_map!(HashMap);
}

impl<P> NodeMap<P> for BTreeMap<String, P> {
    #[inline]
    fn insert(&mut self, key: String, node: P) -> Option<P> {
        Self::insert(self, key, node)
    }

    #[inline]
    fn get(&self, key: &str) -> Option<&P> {
        Self::get(self, key)
    }

    #[inline]
    fn get_mut(&mut self, key: &str) -> Option<&mut P> {
        Self::get_mut(self, key)
    }

    #[inline]
    fn remove(&mut self, key: &str) -> Option<P> {
        Self::remove(self, key)
    }

    #[inline]
    fn contains_key(&self, key: &str) -> bool {
        Self::contains_key(self, key)
    }

    #[inline]
    fn clear(&mut self) {
        Self::clear(self);
    }

    #[inline]
    fn len(&self) -> usize {
        Self::len(self)
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a String, &'a P)>
    where
        P: 'a,
    {
        Self::iter(self)
    }
}

/// The map used when none is specified.
#[cfg(feature = "hashbrown")]
pub type DefaultMap<P> = hashbrown::HashMap<String, P>;

/// The map used when none is specified.
#[cfg(not(feature = "hashbrown"))]
pub type DefaultMap<P> = std::collections::HashMap<String, P>;

// ============================================================================
// Registry
// ============================================================================

/// A flat map from composed keys to owned nodes.
///
/// Registries are move-only. Adding under an existing key silently replaces
/// the previous entry, dropping it if the registry was its only owner.
///
/// # Example
///
/// ```rust
/// use understory_propex::{ByValue, ExclusiveRegistry, OwnedNode, PropexError};
///
/// let mut registry = ExclusiveRegistry::new();
/// registry.add_node(OwnedNode::new(42_i32), ("carA", "speed"));
///
/// let speed = registry.node::<ByValue<i32>>("carA:speed").unwrap();
/// assert_eq!(*speed.get().unwrap(), 42);
///
/// // A single fragment is used as the key verbatim.
/// registry.add_node(OwnedNode::new(7_i32), "carA:speed");
/// assert_eq!(registry.len(), 1);
///
/// let mut view = registry.view::<ByValue<i32>>("carA:speed").unwrap();
/// assert_eq!(*view.get().unwrap(), 7);
/// view.set(8).unwrap();
///
/// assert!(matches!(
///     registry.at("carA:mass"),
///     Err(PropexError::KeyNotFound { .. })
/// ));
/// ```
pub struct Registry<P, M = DefaultMap<P>, K = DefaultKey> {
    map: M,
    _marker: PhantomData<fn() -> (P, K)>,
}

/// A registry owning type-erased nodes exclusively.
pub type ExclusiveRegistry = Registry<Box<dyn AnyNode>>;

/// A registry sharing type-erased nodes with outside handles.
pub type SharedRegistry = Registry<Arc<dyn AnyNode>>;

/// A registry that iterates in key order.
pub type OrderedRegistry<P = Box<dyn AnyNode>, K = DefaultKey> =
    Registry<P, BTreeMap<String, P>, K>;

impl<P, M: Default, K> Default for Registry<P, M, K> {
    fn default() -> Self {
        Self {
            map: M::default(),
            _marker: PhantomData,
        }
    }
}

impl<P, M, K> Registry<P, M, K>
where
    P: NodePtr,
    M: NodeMap<P>,
    K: KeyTraits,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `node` under the key built from `fragments`.
    ///
    /// A single fragment is the key verbatim; a tuple of fragments is merged
    /// with [`KeyTraits::merge`]. Any previous entry at that key is replaced.
    pub fn add(&mut self, node: P, fragments: impl KeyFragments) {
        let key = fragments.into_key::<K>();
        trace!(key = %key, "Adding registry entry");
        if self.map.insert(key, node).is_some() {
            debug!("Replaced the previous entry under the same key");
        }
    }

    /// Returns the node at `key`, if any.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&P::Target> {
        self.map.get(key).map(Deref::deref)
    }

    /// Returns the node at `key` mutably.
    ///
    /// Returns `None` if there is no such entry, or if its pointer is shared
    /// with a handle outside the registry.
    #[must_use]
    pub fn find_mut(&mut self, key: &str) -> Option<&mut P::Target> {
        self.map.get_mut(key).and_then(P::get_mut)
    }

    /// Returns the pointer stored at `key`, if any.
    ///
    /// With a shared pointer type this lets callers clone out a handle.
    #[must_use]
    pub fn find_ptr(&self, key: &str) -> Option<&P> {
        self.map.get(key)
    }

    /// Returns the node at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PropexError::KeyNotFound`] if there is no such entry.
    pub fn at(&self, key: &str) -> Result<&P::Target> {
        self.find(key).ok_or_else(|| PropexError::KeyNotFound { key: key.into() })
    }

    /// Returns the node at `key` mutably.
    ///
    /// # Errors
    ///
    /// Returns [`PropexError::KeyNotFound`] if there is no such entry, and
    /// [`PropexError::NodeShared`] if its pointer is held outside the
    /// registry too.
    pub fn at_mut(&mut self, key: &str) -> Result<&mut P::Target> {
        let ptr = self
            .map
            .get_mut(key)
            .ok_or_else(|| PropexError::KeyNotFound { key: key.into() })?;
        P::get_mut(ptr).ok_or_else(|| PropexError::NodeShared { key: key.into() })
    }

    /// Returns `true` if there is an entry at `key`.
    #[must_use]
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Removes the entry at `key`, returning `true` if there was one.
    pub fn erase(&mut self, key: &str) -> bool {
        self.remove(key).is_some()
    }

    /// Removes the entry at `key` and returns its pointer.
    pub fn remove(&mut self, key: &str) -> Option<P> {
        let removed = self.map.remove(key);
        if removed.is_some() {
            trace!(key = %key, "Removed registry entry");
        }
        removed
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        debug!(len = self.map.len(), "Clearing registry");
        self.map.clear();
    }

    /// Returns the number of entries.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the registry has no entries.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over keys and nodes in the map's order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &P::Target)> {
        self.map.iter().map(|(key, ptr)| (key.as_str(), &**ptr))
    }

    /// Iterates over keys in the map's order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.iter().map(|(key, _)| key.as_str())
    }

    /// Returns the underlying map.
    #[must_use]
    #[inline]
    pub fn data(&self) -> &M {
        &self.map
    }

    /// Returns the underlying map mutably.
    ///
    /// Entries inserted this way bypass key composition.
    #[must_use]
    #[inline]
    pub fn data_mut(&mut self) -> &mut M {
        &mut self.map
    }
}

impl<P, M, K> Registry<P, M, K>
where
    P: NodePtr<Target = dyn AnyNode>,
    M: NodeMap<P>,
    K: KeyTraits,
{
    /// Erases `node` and inserts it under the key built from `fragments`.
    pub fn add_node<S: Storage>(&mut self, node: Node<S>, fragments: impl KeyFragments)
    where
        P: From<Box<dyn AnyNode>>,
    {
        let erased: Box<dyn AnyNode> = Box::new(node);
        self.add(P::from(erased), fragments);
    }

    /// Returns the node at `key` as a `Node<S>`.
    ///
    /// # Errors
    ///
    /// Returns [`PropexError::KeyNotFound`] if there is no such entry, and
    /// [`PropexError::TypeMismatch`] if the entry is not a `Node<S>`.
    pub fn node<S: Storage>(&self, key: &str) -> Result<&Node<S>> {
        let node = self.at(key)?;
        node.downcast_ref::<S>()
            .ok_or_else(|| type_mismatch::<S>(key, node.storage_type_name()))
    }

    /// Returns the node at `key` as a mutable `Node<S>`.
    ///
    /// # Errors
    ///
    /// Same as [`at_mut`](Self::at_mut), plus [`PropexError::TypeMismatch`]
    /// if the entry is not a `Node<S>`.
    pub fn node_mut<S: Storage>(&mut self, key: &str) -> Result<&mut Node<S>> {
        let node = self.at_mut(key)?;
        let found = node.storage_type_name();
        node.downcast_mut::<S>()
            .ok_or_else(|| type_mismatch::<S>(key, found))
    }

    /// Returns a [`PropertyView`] bound to the `Node<S>` at `key`.
    ///
    /// # Errors
    ///
    /// Same as [`node_mut`](Self::node_mut).
    pub fn view<S: Storage>(&mut self, key: &str) -> Result<PropertyView<'_, S>> {
        self.node_mut::<S>(key).map(PropertyView::new)
    }

    /// Returns a [`SharedView`] bound to the `Node<S>` at `key`.
    ///
    /// Unlike [`view`](Self::view) this only borrows the registry shared, so
    /// several views can be live at once and nodes held outside the registry
    /// are not an obstacle.
    ///
    /// # Errors
    ///
    /// Same as [`node`](Self::node).
    pub fn shared_view<S: Storage>(&self, key: &str) -> Result<SharedView<'_, S>> {
        self.node::<S>(key).map(SharedView::new)
    }
}

fn type_mismatch<S: Storage>(key: &str, found: &'static str) -> PropexError {
    PropexError::TypeMismatch {
        key: key.into(),
        expected: type_name::<S>(),
        found,
    }
}

impl<P, M: NodeMap<P>, K: KeyTraits> fmt::Debug for Registry<P, M, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.map.len())
            .field("delimiter", &K::DELIMITER)
            .finish_non_exhaustive()
    }
}
