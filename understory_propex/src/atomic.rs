// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value types that can live in a lock-free atomic cell.
//!
//! [`ByAtomic`](crate::ByAtomic) needs a lock-free cell per value type. Rust has
//! no generic `Atomic<T>`, so [`AtomicValue`] maps each supported value type onto
//! the matching `core::sync::atomic` cell. Floats are stored as their bit
//! patterns, which keeps loads and stores whole (never torn).

use core::fmt;
use core::sync::atomic::{
    AtomicBool, AtomicI8, AtomicI16, AtomicI32, AtomicIsize, AtomicU8, AtomicU16, AtomicU32,
    AtomicUsize, Ordering,
};
#[cfg(target_has_atomic = "64")]
use core::sync::atomic::{AtomicI64, AtomicU64};

/// A value type with a lock-free atomic representation.
///
/// Implemented for `bool`, the integer types up to the target's widest
/// native atomic (`i64`/`u64` where available; `i128`/`u128` never), `f32`,
/// and `f64` where 64-bit atomics exist. Compound types are not supported:
/// there is no lock-free cell for an arbitrary `Copy` type. Wrap such values
/// in [`ByShared`](crate::ByShared) instead, or split them into several
/// atomic nodes.
///
/// # Example
///
/// ```rust
/// use core::sync::atomic::Ordering;
/// use understory_propex::AtomicValue;
///
/// let cell = f64::new_cell(1.5);
/// f64::store(&cell, 2.5, Ordering::Relaxed);
/// assert_eq!(f64::load(&cell, Ordering::Relaxed), 2.5);
/// ```
pub trait AtomicValue: Copy + Send + Sync + 'static {
    /// The atomic cell holding values of this type.
    type Cell: Send + Sync + fmt::Debug;

    /// Creates a new cell holding `value`.
    fn new_cell(value: Self) -> Self::Cell;

    /// Atomically loads the current value.
    fn load(cell: &Self::Cell, order: Ordering) -> Self;

    /// Atomically replaces the current value.
    fn store(cell: &Self::Cell, value: Self, order: Ordering);

    /// Consumes the cell and returns the contained value.
    fn into_inner(cell: Self::Cell) -> Self;
}

macro_rules! impl_atomic_value {
    ($($value:ty => $cell:ty),* $(,)?) => {
        $(
            impl AtomicValue for $value {
                type Cell = $cell;

                #[inline]
                fn new_cell(value: Self) -> Self::Cell {
                    <$cell>::new(value)
                }

                #[inline]
                fn load(cell: &Self::Cell, order: Ordering) -> Self {
                    cell.load(order)
                }

                #[inline]
                fn store(cell: &Self::Cell, value: Self, order: Ordering) {
                    cell.store(value, order);
                }

                #[inline]
                fn into_inner(cell: Self::Cell) -> Self {
                    cell.into_inner()
                }
            }
        )*
    };
}

impl_atomic_value!(
    bool => AtomicBool,
    i8 => AtomicI8,
    i16 => AtomicI16,
    i32 => AtomicI32,
    isize => AtomicIsize,
    u8 => AtomicU8,
    u16 => AtomicU16,
    u32 => AtomicU32,
    usize => AtomicUsize,
);

#[cfg(target_has_atomic = "64")]
impl_atomic_value!(
    i64 => AtomicI64,
    u64 => AtomicU64,
);

macro_rules! impl_atomic_float {
    ($($value:ty => $cell:ty),* $(,)?) => {
        $(
            impl AtomicValue for $value {
                type Cell = $cell;

                #[inline]
                fn new_cell(value: Self) -> Self::Cell {
                    <$cell>::new(value.to_bits())
                }

                #[inline]
                fn load(cell: &Self::Cell, order: Ordering) -> Self {
                    <$value>::from_bits(cell.load(order))
                }

                #[inline]
                fn store(cell: &Self::Cell, value: Self, order: Ordering) {
                    cell.store(value.to_bits(), order);
                }

                #[inline]
                fn into_inner(cell: Self::Cell) -> Self {
                    <$value>::from_bits(cell.into_inner())
                }
            }
        )*
    };
}

impl_atomic_float!(f32 => AtomicU32);

#[cfg(target_has_atomic = "64")]
impl_atomic_float!(f64 => AtomicU64);

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: AtomicValue + PartialEq + fmt::Debug>(first: T, second: T) {
        let cell = T::new_cell(first);
        assert_eq!(T::load(&cell, Ordering::Relaxed), first);
        T::store(&cell, second, Ordering::Relaxed);
        assert_eq!(T::load(&cell, Ordering::Relaxed), second);
        assert_eq!(T::into_inner(cell), second);
    }

    #[test]
    fn integers_and_bool() {
        roundtrip(false, true);
        roundtrip(-3_i8, 7);
        roundtrip(-300_i16, 12);
        roundtrip(i32::MIN, i32::MAX);
        roundtrip(0_u8, u8::MAX);
        roundtrip(1_usize, 2);
    }

    #[test]
    fn remaining_integer_widths() {
        roundtrip(5_u16, u16::MAX);
        roundtrip(7_u32, u32::MAX);
        roundtrip(isize::MIN, -1);
        #[cfg(target_has_atomic = "64")]
        {
            roundtrip(i64::MIN, 0);
            roundtrip(0_u64, u64::MAX);
        }
    }

    #[test]
    fn floats_keep_bit_patterns() {
        roundtrip(0.5_f32, -0.0);
        roundtrip(f64::MIN_POSITIVE, f64::INFINITY);

        let cell = f64::new_cell(f64::NAN);
        assert!(f64::load(&cell, Ordering::Relaxed).is_nan());
    }
}
