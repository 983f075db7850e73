//! Composite glyph cache index.
//!
//! A rendered glyph depends on the character, its colors, the font style
//! flags and the render style. [`GlyphIndex`] bundles these into a key with
//! a fixed total order:
//!
//! 1. character code point
//! 2. font style flags
//! 3. render style
//! 4. foreground color (packed ARGB)
//! 5. background color (packed ARGB), **only** for [`RenderStyle::Shaded`]
//!
//! Solid and blended glyphs ignore the background when drawn, so two such
//! indices differing only in background compare equal and share one cache
//! slot.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// 32-bit ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::argb(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Opaque color from its components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { a: 255, r, g, b }
    }

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Packs the color as `0xAARRGGBB`.
    ///
    /// [`GlyphIndex`] orders colors by this value as an unsigned integer, so
    /// alpha is the most significant channel and an opaque color sorts above
    /// any translucent one.
    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Unpacks a `0xAARRGGBB` value.
    pub const fn from_argb(packed: u32) -> Self {
        Self {
            a: (packed >> 24) as u8,
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }

    /// Returns `true` if the alpha channel is zero.
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }
}

/// Font style flags, combinable with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FontStyle(u8);

impl FontStyle {
    pub const NORMAL: FontStyle = FontStyle(0);
    pub const BOLD: FontStyle = FontStyle(1);
    pub const ITALIC: FontStyle = FontStyle(2);
    pub const UNDERLINE: FontStyle = FontStyle(4);

    /// Raw flag bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every flag in `other` is set.
    pub const fn contains(self, other: FontStyle) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FontStyle {
    type Output = FontStyle;

    fn bitor(self, rhs: FontStyle) -> FontStyle {
        FontStyle(self.0 | rhs.0)
    }
}

impl BitOrAssign for FontStyle {
    fn bitor_assign(&mut self, rhs: FontStyle) {
        self.0 |= rhs.0;
    }
}

/// How glyph pixels are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RenderStyle {
    /// Fast, unantialiased, color-keyed.
    #[default]
    Solid,
    /// Antialiased against a fixed background color.
    Shaded,
    /// Antialiased with per-pixel alpha.
    Blended,
}

/// Key under which a rendered glyph is cached.
#[derive(Clone, Copy)]
pub struct GlyphIndex {
    pub ch: char,
    pub foreground: Color,
    /// Shade color. Only meaningful for [`RenderStyle::Shaded`].
    pub background: Color,
    pub style: FontStyle,
    pub render_style: RenderStyle,
}

impl GlyphIndex {
    pub fn new(
        ch: char,
        foreground: Color,
        background: Color,
        style: FontStyle,
        render_style: RenderStyle,
    ) -> Self {
        Self {
            ch,
            foreground,
            background,
            style,
            render_style,
        }
    }
}

/// Orders by character, font style, render style, foreground, then (for
/// [`RenderStyle::Shaded`] only) background. Colors compare by their unsigned
/// [`Color::to_argb`] value.
impl Ord for GlyphIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ch
            .cmp(&other.ch)
            .then(self.style.cmp(&other.style))
            .then(self.render_style.cmp(&other.render_style))
            .then(self.foreground.to_argb().cmp(&other.foreground.to_argb()))
            .then_with(|| {
                if self.render_style == RenderStyle::Shaded {
                    self.background.to_argb().cmp(&other.background.to_argb())
                } else {
                    Ordering::Equal
                }
            })
    }
}

impl PartialOrd for GlyphIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality must agree with the ordering, so the background is ignored
// outside the shaded style.
impl PartialEq for GlyphIndex {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GlyphIndex {}

impl fmt::Debug for GlyphIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("GlyphIndex");
        s.field("ch", &self.ch)
            .field("foreground", &format_args!("{:#010x}", self.foreground.to_argb()));
        if self.render_style == RenderStyle::Shaded {
            s.field("background", &format_args!("{:#010x}", self.background.to_argb()));
        }
        s.field("style", &self.style.bits())
            .field("render_style", &self.render_style)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(background: Color, render_style: RenderStyle) -> GlyphIndex {
        GlyphIndex::new('g', Color::WHITE, background, FontStyle::NORMAL, render_style)
    }

    #[test]
    fn test_color_packing() {
        let color = Color::argb(0x12, 0x34, 0x56, 0x78);
        assert_eq!(color.to_argb(), 0x1234_5678);
        assert_eq!(Color::from_argb(0x1234_5678), color);
        assert_eq!(Color::WHITE.to_argb(), 0xFFFF_FFFF);
        assert!(Color::TRANSPARENT.is_transparent());
        assert!(!Color::BLACK.is_transparent());
    }

    #[test]
    fn test_font_style_flags() {
        let style = FontStyle::BOLD | FontStyle::UNDERLINE;
        assert_eq!(style.bits(), 5);
        assert!(style.contains(FontStyle::BOLD));
        assert!(!style.contains(FontStyle::ITALIC));

        let mut style = FontStyle::NORMAL;
        style |= FontStyle::ITALIC;
        assert_eq!(style, FontStyle::ITALIC);
    }

    #[test]
    fn test_background_ignored_unless_shaded() {
        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);

        for style in [RenderStyle::Solid, RenderStyle::Blended] {
            assert_eq!(index(red, style), index(blue, style));
            assert_eq!(index(red, style).cmp(&index(blue, style)), Ordering::Equal);
        }

        assert_ne!(index(red, RenderStyle::Shaded), index(blue, RenderStyle::Shaded));
        assert_eq!(
            index(red, RenderStyle::Shaded).cmp(&index(blue, RenderStyle::Shaded)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_ordering_precedence() {
        let base = GlyphIndex::new('b', Color::BLACK, Color::BLACK, FontStyle::BOLD, RenderStyle::Shaded);

        // Character dominates every other field
        let lower_char = GlyphIndex { ch: 'a', style: FontStyle::UNDERLINE, ..base };
        assert!(lower_char < base);

        // Style flags dominate render style and colors
        let lower_style = GlyphIndex {
            style: FontStyle::NORMAL,
            render_style: RenderStyle::Blended,
            foreground: Color::WHITE,
            ..base
        };
        assert!(lower_style < base);

        // Render style dominates colors
        let solid = GlyphIndex { render_style: RenderStyle::Solid, foreground: Color::WHITE, ..base };
        assert!(solid < base);

        // Foreground dominates background
        let brighter = GlyphIndex { foreground: Color::WHITE, background: Color::TRANSPARENT, ..base };
        assert!(brighter > base);
    }

    #[test]
    fn test_color_order_is_unsigned() {
        let opaque = GlyphIndex::new('c', Color::BLACK, Color::BLACK, FontStyle::NORMAL, RenderStyle::Blended);
        let faint = GlyphIndex { foreground: Color::argb(0x10, 255, 255, 255), ..opaque };

        // 0xFF000000 sorts above 0x10FFFFFF; a signed comparison would invert this
        assert!(opaque > faint);

        let shaded = GlyphIndex { render_style: RenderStyle::Shaded, ..opaque };
        let on_faint = GlyphIndex { background: Color::argb(0x7F, 255, 255, 255), ..shaded };
        let on_half = GlyphIndex { background: Color::argb(0x80, 0, 0, 0), ..shaded };
        assert!(on_half > on_faint);
    }
}
