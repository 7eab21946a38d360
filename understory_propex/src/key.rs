// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical key composition.
//!
//! Registry keys are flat strings, but callers usually think of them as paths
//! such as `"carA:speed"`. [`KeyTraits`] splits such keys into fragments and
//! merges fragments back into a key using one delimiter character.
//!
//! The delimiter is part of the type: [`Delimited<':'>`](Delimited) and
//! [`Delimited<';'>`](Delimited) are distinct types, so registries built with
//! different delimiters cannot be mixed up.
//!
//! Splitting never collapses adjacent delimiters and never drops empty
//! fragments. `split` and `merge` invert each other only when no fragment
//! contains the delimiter; this is not validated.

use std::borrow::Cow;

use smallvec::SmallVec;

/// Fragment storage returned by [`KeyTraits::split`].
///
/// Keys rarely have more than a handful of levels, so the fragments are kept
/// inline.
pub type Fragments<'a> = SmallVec<[&'a str; 4]>;

/// Splits and merges delimited keys.
///
/// # Example
///
/// ```rust
/// use understory_propex::{DefaultKey, Delimited, KeyTraits};
///
/// assert_eq!(DefaultKey::merge(["carA", "speed"]), "carA:speed");
/// assert_eq!(DefaultKey::split("carA:speed").as_slice(), ["carA", "speed"]);
///
/// type Pipe = Delimited<'|'>;
/// assert_eq!(Pipe::merge(["user", "data", "settings"]), "user|data|settings");
/// assert_eq!(Pipe::delimiter(), '|');
/// ```
pub trait KeyTraits {
    /// The character separating fragments.
    const DELIMITER: char;

    /// Returns [`DELIMITER`](Self::DELIMITER).
    #[must_use]
    #[inline]
    fn delimiter() -> char {
        Self::DELIMITER
    }

    /// Cuts `key` at every delimiter.
    ///
    /// A key without a delimiter yields itself as the only fragment, and the
    /// empty key yields one empty fragment.
    #[must_use]
    fn split(key: &str) -> Fragments<'_> {
        key.split(Self::DELIMITER).collect()
    }

    /// Joins `fragments` with the delimiter.
    ///
    /// No fragments yield the empty string. Empty fragments are kept, so a
    /// trailing empty fragment produces a trailing delimiter.
    #[must_use]
    fn merge<I>(fragments: I) -> String
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut key = String::new();
        for (index, fragment) in fragments.into_iter().enumerate() {
            if index > 0 {
                key.push(Self::DELIMITER);
            }
            key.push_str(fragment.as_ref());
        }
        key
    }
}

/// Key composition with a fixed delimiter character `D`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Delimited<const D: char>;

impl<const D: char> KeyTraits for Delimited<D> {
    const DELIMITER: char = D;
}

/// The default key composition, delimited by `:`.
pub type DefaultKey = Delimited<':'>;

/// One or more key fragments, as accepted by [`Registry::add`](crate::Registry::add).
///
/// A single string-like fragment is taken verbatim and never passed through
/// [`KeyTraits::merge`]. Tuples of two to eight fragments are merged.
/// There is no implementation for `()`, so a key always has at least one
/// fragment.
///
/// # Example
///
/// ```rust
/// use understory_propex::{DefaultKey, Delimited, KeyFragments};
///
/// assert_eq!("carA:speed".into_key::<DefaultKey>(), "carA:speed");
/// assert_eq!(("carA", "speed").into_key::<DefaultKey>(), "carA:speed");
/// assert_eq!(("a", String::from("b"), "c").into_key::<Delimited<';'>>(), "a;b;c");
/// ```
pub trait KeyFragments {
    /// Builds the full key using the composition rules of `K`.
    fn into_key<K: KeyTraits>(self) -> String;
}

impl KeyFragments for &str {
    #[inline]
    fn into_key<K: KeyTraits>(self) -> String {
        String::from(self)
    }
}

impl KeyFragments for String {
    #[inline]
    fn into_key<K: KeyTraits>(self) -> String {
        self
    }
}

impl KeyFragments for &String {
    #[inline]
    fn into_key<K: KeyTraits>(self) -> String {
        self.clone()
    }
}

impl KeyFragments for Cow<'_, str> {
    #[inline]
    fn into_key<K: KeyTraits>(self) -> String {
        self.into_owned()
    }
}

macro_rules! impl_key_fragments_tuple {
    ($($name:ident),+) => {
        impl<$($name: AsRef<str>),+> KeyFragments for ($($name,)+) {
            #[inline]
            #[allow(non_snake_case, reason = "bindings reuse the type parameter names")]
            fn into_key<K: KeyTraits>(self) -> String {
                let ($($name,)+) = self;
                K::merge([$($name.as_ref()),+])
            }
        }
    };
}

impl_key_fragments_tuple!(A, B);
impl_key_fragments_tuple!(A, B, C);
impl_key_fragments_tuple!(A, B, C, D);
impl_key_fragments_tuple!(A, B, C, D, E);
impl_key_fragments_tuple!(A, B, C, D, E, F);
impl_key_fragments_tuple!(A, B, C, D, E, F, G);
impl_key_fragments_tuple!(A, B, C, D, E, F, G, H);
