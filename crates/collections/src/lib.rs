//! Ordered and sequential collections for the glyphkit text renderer.
//!
//! - [`OrderedMap`]: red-black tree map with unique keys under a
//!   construction-time [`Comparator`]
//! - [`PriorityQueue`]: values keyed by unique `i32` priorities
//! - [`SortedBag`]: the same tree with duplicates kept, equal values
//!   ordered by arrival
//! - [`LinkedList`]: doubly-linked list with stable [`NodeHandle`]s
//!
//! All of them store their nodes in a slab arena and link them by index.
//! Each offers a borrow-checked iterator as well as a detached cursor
//! ([`MapCursor`], [`BagCursor`], [`ListCursor`]) that reports
//! [`CollectionError::StaleIterator`] once its collection is structurally
//! modified.

pub mod bag;
pub mod compare;
pub mod error;
pub mod list;
pub mod map;
pub mod priority;

pub use bag::{BagCursor, SortedBag};
pub use compare::{Comparator, NaturalOrder};
pub use error::{CollectionError, Result};
pub use list::{LinkedList, ListCursor, NodeHandle};
pub use map::{MapCursor, OrderedMap};
pub use priority::{Priority, PriorityQueue};
