//! glyphkit cache library
//!
//! Capacity-bounded caching of rendered artifacts, keyed by a composite
//! glyph index, with FIFO eviction and explicit payload release.

pub mod bounded;
pub mod config;
pub mod error;
pub mod glyph;
pub mod index;

pub use bounded::{BoundedCache, CacheStats, Fetched, Release};
pub use config::{CacheConfig, ConfigError};
pub use error::CacheError;
pub use glyph::{CachedGlyph, GlyphCache, GlyphRenderer, GlyphStyle};
pub use index::{Color, FontStyle, GlyphIndex, RenderStyle};
