// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Non-owning property views.
//!
//! A [`PropertyView`] is a rebindable handle to at most one [`Node`]. Code that
//! receives a view can read and write the property without knowing where the
//! node lives or who owns it. The borrow checker ties the view to the node, so
//! a view can never outlive what it points at.
//!
//! A [`PropertyView`] borrows its node mutably and is the only view on it.
//! A [`SharedView`] borrows its node shared, so any number of them can be
//! bound to one node at once. They write through [`SharedWrite`], which every
//! policy except [`ByValue`](crate::ByValue) implements.
//!
//! Views come with two access paths:
//!
//! - **Checked** ([`get_checked`](PropertyView::get_checked),
//!   [`set_checked`](PropertyView::set_checked)): fail with
//!   [`PropexError::UnboundAccess`] when the view is unbound.
//! - **Unchecked** ([`get`](PropertyView::get), [`set`](PropertyView::set),
//!   [`assign`](PropertyView::assign)): being bound is a precondition, asserted
//!   in debug builds only. Release builds skip the assertion and report the
//!   same error as the checked path.

use core::fmt;
use core::mem;

use crate::error::{PropexError, Result};
use crate::node::Node;
use crate::ownership::{SharedWrite, Storage};

/// A non-owning, rebindable handle to a [`Node`].
///
/// Views are move-only. [`take`](Self::take) moves the binding out into a new
/// view and leaves the source unbound.
///
/// # Example
///
/// ```rust
/// use understory_propex::{ByValue, OwnedNode, PropertyView, PropexError};
///
/// let mut temperature = OwnedNode::new(23.5_f64);
///
/// let unbound = PropertyView::<ByValue<f64>>::unbound();
/// assert!(!unbound.is_valid());
/// assert_eq!(unbound.get_checked().err(), Some(PropexError::UnboundAccess));
///
/// let mut view = PropertyView::new(&mut temperature);
/// assert_eq!(*view.get_checked().unwrap(), 23.5);
///
/// view.assign(42.0).unwrap();
/// assert_eq!(*view.get().unwrap(), 42.0);
///
/// let moved = view.take();
/// assert!(!view.is_valid());
/// assert!(moved.is_valid());
/// ```
pub struct PropertyView<'a, S: Storage> {
    node: Option<&'a mut Node<S>>,
}

impl<'a, S: Storage> PropertyView<'a, S> {
    /// Creates a view that is not bound to any node.
    #[must_use]
    #[inline]
    pub const fn unbound() -> Self {
        Self { node: None }
    }

    /// Creates a view bound to `node`.
    #[must_use]
    #[inline]
    pub fn new(node: &'a mut Node<S>) -> Self {
        Self { node: Some(node) }
    }

    /// Returns `true` if the view is bound to a node.
    #[must_use]
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.node.is_some()
    }

    /// Binds the view to `node`, returning the previously bound node, if any.
    #[inline]
    pub fn bind(&mut self, node: &'a mut Node<S>) -> Option<&'a mut Node<S>> {
        self.node.replace(node)
    }

    /// Unbinds the view, returning the previously bound node, if any.
    #[inline]
    pub fn unbind(&mut self) -> Option<&'a mut Node<S>> {
        self.node.take()
    }

    /// Moves the binding into a new view, leaving `self` unbound.
    #[must_use]
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Returns the bound node, if any.
    #[must_use]
    #[inline]
    pub fn node(&self) -> Option<&Node<S>> {
        self.node.as_deref()
    }

    /// Reads the value of the bound node.
    ///
    /// # Errors
    ///
    /// Returns [`PropexError::UnboundAccess`] if the view is unbound, and
    /// propagates storage failures otherwise.
    pub fn get_checked(&self) -> Result<S::Read<'_>> {
        self.node
            .as_deref()
            .ok_or(PropexError::UnboundAccess)?
            .get()
    }

    /// Writes the value of the bound node.
    ///
    /// # Errors
    ///
    /// Returns [`PropexError::UnboundAccess`] if the view is unbound, and
    /// propagates storage failures otherwise.
    pub fn set_checked(&mut self, value: S::Value) -> Result<()> {
        self.node
            .as_deref_mut()
            .ok_or(PropexError::UnboundAccess)?
            .set(value)
    }

    /// Reads the value of the bound node.
    ///
    /// The view must be bound. This is asserted in debug builds only.
    ///
    /// # Errors
    ///
    /// Propagates storage failures. In release builds an unbound view
    /// reports [`PropexError::UnboundAccess`].
    #[inline]
    pub fn get(&self) -> Result<S::Read<'_>> {
        debug_assert!(self.is_valid(), "PropertyView::get on an unbound view");
        self.get_checked()
    }

    /// Writes the value of the bound node.
    ///
    /// The view must be bound. This is asserted in debug builds only.
    ///
    /// # Errors
    ///
    /// Propagates storage failures. In release builds an unbound view
    /// reports [`PropexError::UnboundAccess`].
    #[inline]
    pub fn set(&mut self, value: S::Value) -> Result<()> {
        debug_assert!(self.is_valid(), "PropertyView::set on an unbound view");
        self.set_checked(value)
    }

    /// Writes the value and returns the view for chaining.
    ///
    /// Shorthand for [`set`](Self::set), with the same precondition.
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set).
    #[inline]
    pub fn assign(&mut self, value: S::Value) -> Result<&mut Self> {
        self.set(value)?;
        Ok(self)
    }
}

impl<S: Storage> Default for PropertyView<'_, S> {
    #[inline]
    fn default() -> Self {
        Self::unbound()
    }
}

impl<'a, S: Storage> From<&'a mut Node<S>> for PropertyView<'a, S> {
    #[inline]
    fn from(node: &'a mut Node<S>) -> Self {
        Self::new(node)
    }
}

impl<'a, S: Storage> From<PropertyView<'a, S>> for SharedView<'a, S> {
    #[inline]
    fn from(view: PropertyView<'a, S>) -> Self {
        Self {
            node: view.node.map(|node| &*node),
        }
    }
}

impl<S: Storage> fmt::Debug for PropertyView<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("PropertyView");
        s.field("valid", &self.is_valid());
        if let Some(node) = self.node() {
            s.field("value_type", &node.value_type())
                .field("storage_kind", &node.storage_kind());
        }
        s.finish()
    }
}

/// A shared, rebindable handle to a [`Node`].
///
/// Unlike [`PropertyView`], any number of shared views can be bound to one
/// node at the same time, and they are `Copy`. Reading works for every
/// policy; writing needs a [`SharedWrite`] policy. The access paths mirror
/// [`PropertyView`]: checked operations report
/// [`PropexError::UnboundAccess`], unchecked ones assert in debug builds.
///
/// # Example
///
/// ```rust
/// use understory_propex::{SharedNode, SharedView};
///
/// let speed = SharedNode::new(10_u32);
/// let display = SharedView::new(&speed);
/// let controller = SharedView::new(&speed);
///
/// controller.set(25).unwrap();
/// assert_eq!(*display.get().unwrap(), 25);
/// ```
pub struct SharedView<'a, S: Storage> {
    node: Option<&'a Node<S>>,
}

impl<'a, S: Storage> SharedView<'a, S> {
    /// Creates a view that is not bound to any node.
    #[must_use]
    #[inline]
    pub const fn unbound() -> Self {
        Self { node: None }
    }

    /// Creates a view bound to `node`.
    #[must_use]
    #[inline]
    pub const fn new(node: &'a Node<S>) -> Self {
        Self { node: Some(node) }
    }

    /// Returns `true` if the view is bound to a node.
    #[must_use]
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.node.is_some()
    }

    /// Binds the view to `node`, returning the previously bound node, if any.
    #[inline]
    pub fn bind(&mut self, node: &'a Node<S>) -> Option<&'a Node<S>> {
        self.node.replace(node)
    }

    /// Unbinds the view, returning the previously bound node, if any.
    #[inline]
    pub fn unbind(&mut self) -> Option<&'a Node<S>> {
        self.node.take()
    }

    /// Moves the binding into a new view, leaving `self` unbound.
    #[must_use]
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Returns the bound node, if any.
    #[must_use]
    #[inline]
    pub fn node(&self) -> Option<&'a Node<S>> {
        self.node
    }

    /// Reads the value of the bound node.
    ///
    /// # Errors
    ///
    /// Returns [`PropexError::UnboundAccess`] if the view is unbound, and
    /// propagates storage failures otherwise.
    pub fn get_checked(&self) -> Result<S::Read<'a>> {
        self.node.ok_or(PropexError::UnboundAccess)?.get()
    }

    /// Reads the value of the bound node.
    ///
    /// The view must be bound. This is asserted in debug builds only.
    ///
    /// # Errors
    ///
    /// Propagates storage failures. In release builds an unbound view
    /// reports [`PropexError::UnboundAccess`].
    #[inline]
    pub fn get(&self) -> Result<S::Read<'a>> {
        debug_assert!(self.is_valid(), "SharedView::get on an unbound view");
        self.get_checked()
    }
}

impl<S: SharedWrite> SharedView<'_, S> {
    /// Writes the value of the bound node.
    ///
    /// # Errors
    ///
    /// Returns [`PropexError::UnboundAccess`] if the view is unbound, and
    /// propagates storage failures otherwise.
    pub fn set_checked(&self, value: S::Value) -> Result<()> {
        self.node.ok_or(PropexError::UnboundAccess)?.write(value)
    }

    /// Writes the value of the bound node.
    ///
    /// The view must be bound. This is asserted in debug builds only.
    ///
    /// # Errors
    ///
    /// Propagates storage failures. In release builds an unbound view
    /// reports [`PropexError::UnboundAccess`].
    #[inline]
    pub fn set(&self, value: S::Value) -> Result<()> {
        debug_assert!(self.is_valid(), "SharedView::set on an unbound view");
        self.set_checked(value)
    }

    /// Writes the value and returns the view for chaining.
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set).
    #[inline]
    pub fn assign(&self, value: S::Value) -> Result<&Self> {
        self.set(value)?;
        Ok(self)
    }
}

impl<S: Storage> Clone for SharedView<'_, S> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Storage> Copy for SharedView<'_, S> {}

impl<S: Storage> Default for SharedView<'_, S> {
    #[inline]
    fn default() -> Self {
        Self::unbound()
    }
}

impl<'a, S: Storage> From<&'a Node<S>> for SharedView<'a, S> {
    #[inline]
    fn from(node: &'a Node<S>) -> Self {
        Self::new(node)
    }
}

impl<S: Storage> fmt::Debug for SharedView<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SharedView");
        s.field("valid", &self.is_valid());
        if let Some(node) = self.node {
            s.field("value_type", &node.value_type())
                .field("storage_kind", &node.storage_kind());
        }
        s.finish()
    }
}
