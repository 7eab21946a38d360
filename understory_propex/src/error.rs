// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

/// Errors surfaced by storage access, views, and registry lookups.
///
/// Every variant is reported synchronously to the immediate caller; nothing
/// in this crate retries or recovers on its own.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PropexError {
    /// An external-reference storage was accessed through a null handle, or
    /// its referent has already been dropped.
    #[error("dangling reference")]
    DanglingReference,
    /// A lock-backed value was read while it was being written, or written
    /// while a read guard of it was still alive.
    ///
    /// Guards handed out by `get` keep the value locked until they are
    /// dropped; this applies to every node sharing the same cell.
    #[error("value is already borrowed")]
    AlreadyBorrowed,
    /// A checked [`PropertyView`](crate::PropertyView) operation was invoked
    /// while the view was not bound to a node.
    #[error("property view: access through an unbound view")]
    UnboundAccess,
    /// A checked registry lookup found no entry under `key`.
    #[error("registry: key `{key}` not found")]
    KeyNotFound {
        /// The fully composed key that was looked up.
        key: String,
    },
    /// A typed registry lookup found a node of a different concrete type.
    #[error("registry: node at `{key}` is `{found}`, not `{expected}`")]
    TypeMismatch {
        /// The fully composed key that was looked up.
        key: String,
        /// Name of the storage type the caller asked for.
        expected: &'static str,
        /// Name of the storage type actually stored at `key`.
        found: &'static str,
    },
    /// Mutable access was requested for a node whose shared pointer is also
    /// held outside the registry.
    #[error("registry: node at `{key}` is shared and cannot be borrowed mutably")]
    NodeShared {
        /// The fully composed key that was looked up.
        key: String,
    },
}

/// Result alias used throughout this crate.
pub type Result<T, E = PropexError> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            PropexError::DanglingReference.to_string(),
            "dangling reference"
        );
        assert_eq!(
            PropexError::KeyNotFound {
                key: "carA:speed".into()
            }
            .to_string(),
            "registry: key `carA:speed` not found"
        );
        assert_eq!(
            PropexError::AlreadyBorrowed.to_string(),
            "value is already borrowed"
        );
        assert!(
            PropexError::UnboundAccess
                .to_string()
                .contains("unbound view")
        );
    }

    #[test]
    fn is_std_error() {
        fn assert_error<E: core::error::Error + Send + Sync + 'static>() {}
        assert_error::<PropexError>();
    }
}
