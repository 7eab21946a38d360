// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Propex: typed property storage with pluggable ownership.
//!
//! This crate stores individual property values behind a uniform get/set
//! surface while letting each property choose how its value is owned.
//!
//! ## Core Concepts
//!
//! ### Ownership Policies
//!
//! Each policy is a [`Storage`] type, fixed when a node is built:
//!
//! | Policy | Holds | `get` returns |
//! |--------|-------|---------------|
//! | [`ByValue`] | the value inline | a reference |
//! | [`ByReference`] | a non-owning handle to a value owned elsewhere | a read guard |
//! | [`ByShared`] | a reference-counted handle shared with other nodes | a read guard |
//! | [`ByAtomic`] | a lock-free atomic cell | a copy |
//!
//! ### Nodes and Views
//!
//! A [`Node`] owns one storage. [`AnyNode`] erases the node type so nodes of
//! different value types can be stored together. A [`PropertyView`] is a
//! rebindable handle to a node with checked and unchecked access paths. It
//! borrows the node mutably; a [`SharedView`] borrows it shared, so several
//! can be bound to one node at once.
//!
//! ### Registry
//!
//! A [`Registry`] maps composed keys such as `"carA:speed"` to nodes. Keys
//! are composed by [`KeyTraits`]; the pointer type and map type are chosen by
//! type parameters.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use understory_propex::{
//!     ByShared, ByValue, ExclusiveRegistry, ExternalNode, OwnedNode, SharedNode, shared_cell,
//! };
//!
//! let mut registry = ExclusiveRegistry::new();
//!
//! // An owned value.
//! registry.add_node(OwnedNode::new(120.0_f64), ("carA", "speed"));
//!
//! // A value owned by the host application.
//! let fuel = shared_cell(0.75_f64);
//! registry.add_node(ExternalNode::new(&fuel), ("carA", "fuel"));
//!
//! // Two nodes sharing one value.
//! let color = SharedNode::new(String::from("red"));
//! registry.add_node(
//!     SharedNode::<String>::new(Arc::clone(color.handle())),
//!     ("carA", "color"),
//! );
//! registry.add_node(color, ("carB", "color"));
//!
//! registry.view::<ByValue<f64>>("carA:speed").unwrap().set(130.0).unwrap();
//! *fuel.write() = 0.5;
//! registry
//!     .view::<ByShared<String>>("carB:color")
//!     .unwrap()
//!     .set(String::from("blue"))
//!     .unwrap();
//!
//! let speed = registry.node::<ByValue<f64>>("carA:speed").unwrap();
//! assert_eq!(*speed.get().unwrap(), 130.0);
//! let color = registry.node::<ByShared<String>>("carA:color").unwrap();
//! assert_eq!(*color.get().unwrap(), "blue");
//! ```
//!
//! ## Features
//!
//! - `hashbrown` (default): use `hashbrown::HashMap` as [`DefaultMap`].
//!   Without it, `std::collections::HashMap` is used.
//!
//! ## Aliasing
//!
//! [`ByReference`], [`ByShared`] and [`ByAtomic`] keep their value behind
//! interior mutability and implement [`SharedWrite`], so any number of nodes,
//! views and outside handles can write through `&self` with [`Node::write`]
//! or [`SharedView::set`].
//!
//! The two lock-backed policies never block. A read guard returned by `get`
//! keeps its cell locked until it is dropped. While it is alive, every write
//! to that cell fails with [`PropexError::AlreadyBorrowed`], whether it goes
//! through the same node or a sibling built on the same cell. Reads fail the
//! same way while the cell is write-locked. Host code that holds a
//! [`SharedCell`] directly should use `try_write` when node guards may be
//! alive; a blocking `write` on the same thread would never return.
//!
//! ```rust
//! use understory_propex::{ExternalNode, PropexError, shared_cell};
//!
//! let host = shared_cell(1_i32);
//! let mut node = ExternalNode::new(&host);
//!
//! let guard = node.get().unwrap();
//! assert_eq!(node.set(2), Err(PropexError::AlreadyBorrowed));
//! assert!(host.try_write().is_none());
//! drop(guard);
//!
//! node.set(2).unwrap();
//! assert_eq!(*host.read(), 2);
//! ```
//!
//! ## Concurrency
//!
//! Only [`ByAtomic`] storage is safe for concurrent reads and writes of one
//! node, through [`Node::load`] and [`Node::store`], with relaxed ordering.
//! The lock-backed policies are `Sync` when their value is, but a write that
//! races a read on another thread fails with
//! [`PropexError::AlreadyBorrowed`] rather than waiting. Registries have no
//! internal locking.
//!
//! ## `no_std` Support
//!
//! This crate requires `std`. The shared and external policies are built on
//! `parking_lot` locks and `std::sync::{Arc, Weak}`, which have no `core` or
//! `alloc` counterparts. Items that live in `core` are still imported from
//! there.

mod atomic;
mod error;
mod key;
mod node;
mod ownership;
mod registry;
mod view;

pub use atomic::AtomicValue;
pub use error::{PropexError, Result};
pub use key::{DefaultKey, Delimited, Fragments, KeyFragments, KeyTraits};
pub use node::{AnyNode, AtomicNode, ExternalNode, Node, OwnedNode, SharedNode, ValueType};
pub use ownership::{
    ByAtomic, ByReference, ByShared, ByValue, ReturnsReference, ReturnsValue, SharedCell,
    SharedWrite, Storage, StorageKind, shared_cell,
};
pub use registry::{
    DefaultMap, ExclusiveRegistry, NodeMap, NodePtr, OrderedRegistry, Registry, SharedRegistry,
};
pub use view::{PropertyView, SharedView};
