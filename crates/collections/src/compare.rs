//! Comparators supplied to collections at construction time.
//!
//! Ordered maps use a comparator to order keys; linked lists use one to
//! search for payloads. Any `Fn(&T, &T) -> Ordering` closure is a
//! comparator, and [`NaturalOrder`] defers to `Ord`.

use std::cmp::Ordering;

/// A total order over `T`.
pub trait Comparator<T: ?Sized> {
    /// Compares two values.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// Orders values by their `Ord` implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<T: Ord + ?Sized> Comparator<T> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

impl<T: ?Sized, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}
