//! Rendered glyph caching.
//!
//! A [`GlyphRenderer`] turns a [`GlyphIndex`] into pixels plus metrics; a
//! [`GlyphCache`] memoizes the result so each distinct index is rendered
//! once while it stays cached.

use crate::bounded::{BoundedCache, Fetched, Release};
use crate::index::{Color, FontStyle, GlyphIndex, RenderStyle};

/// A rendered glyph and the metrics needed to place it.
#[derive(Debug)]
pub struct CachedGlyph<S> {
    pub index: GlyphIndex,
    /// Rendered pixels, owned by the glyph.
    pub surface: S,
    /// Horizontal offset from the pen position to the surface's left edge.
    pub offset_x: i32,
    /// Vertical offset from the line top to the surface's top edge.
    pub offset_y: i32,
    pub width: i32,
    /// Distance to advance the pen after drawing.
    pub advance: i32,
}

impl<S: Release> Release for CachedGlyph<S> {
    type Error = S::Error;

    fn release(&mut self) -> Result<(), Self::Error> {
        self.surface.release()
    }
}

/// Produces glyph images. Implemented by font backends.
pub trait GlyphRenderer {
    type Surface: Release;
    type Error;

    fn render(&mut self, index: &GlyphIndex) -> Result<CachedGlyph<Self::Surface>, Self::Error>;
}

/// Bounded cache of rendered glyphs.
pub type GlyphCache<S> = BoundedCache<GlyphIndex, CachedGlyph<S>>;

/// Drawing state that determines which glyph variant a character maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphStyle {
    pub color: Color,
    /// Fill behind the text. Transparent means no fill.
    pub back_color: Color,
    /// Explicit shade for [`RenderStyle::Shaded`], overriding `back_color`.
    pub shade_color: Option<Color>,
    pub font_style: FontStyle,
    pub render_style: RenderStyle,
}

impl Default for GlyphStyle {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            back_color: Color::TRANSPARENT,
            shade_color: None,
            font_style: FontStyle::NORMAL,
            render_style: RenderStyle::Solid,
        }
    }
}

impl GlyphStyle {
    /// Color that shaded glyphs are antialiased against: the explicit shade
    /// color, else an opaque back color, else black.
    pub fn shade(&self) -> Color {
        match self.shade_color {
            Some(shade) => shade,
            None if !self.back_color.is_transparent() => self.back_color,
            None => Color::BLACK,
        }
    }

    /// Cache index of `ch` drawn in this style.
    pub fn index_for(&self, ch: char) -> GlyphIndex {
        GlyphIndex::new(ch, self.color, self.shade(), self.font_style, self.render_style)
    }
}

impl<S: Release> GlyphCache<S> {
    /// Return the glyph for `index`, rendering it on a miss.
    ///
    /// With capacity 0 the glyph is rendered every time and returned as
    /// [`Fetched::Transient`]; the caller must release it.
    ///
    /// # Errors
    ///
    /// Whatever the renderer reports. Nothing is cached in that case.
    pub fn glyph<R>(&mut self, index: GlyphIndex, renderer: &mut R) -> Result<Fetched<'_, CachedGlyph<S>>, R::Error>
    where
        R: GlyphRenderer<Surface = S>,
    {
        self.get_or_insert_with(index, |index| renderer.render(index))
    }

    /// Width of `text` in pixels: the sum of glyph advances.
    pub fn text_width<R>(&mut self, text: &str, style: &GlyphStyle, renderer: &mut R) -> Result<i32, R::Error>
    where
        R: GlyphRenderer<Surface = S>,
    {
        let mut width = 0;
        for ch in text.chars() {
            width += self.advance_of(style.index_for(ch), renderer)?;
        }
        Ok(width)
    }

    /// Number of leading characters of `text` whose advances fit in
    /// `max_width` pixels.
    pub fn fit_count<R>(
        &mut self,
        text: &str,
        max_width: i32,
        style: &GlyphStyle,
        renderer: &mut R,
    ) -> Result<usize, R::Error>
    where
        R: GlyphRenderer<Surface = S>,
    {
        let mut pixels = 0;
        for (count, ch) in text.chars().enumerate() {
            pixels += self.advance_of(style.index_for(ch), renderer)?;
            if pixels > max_width {
                return Ok(count);
            }
        }
        Ok(text.chars().count())
    }

    fn advance_of<R>(&mut self, index: GlyphIndex, renderer: &mut R) -> Result<i32, R::Error>
    where
        R: GlyphRenderer<Surface = S>,
    {
        match self.glyph(index, renderer)? {
            Fetched::Cached(glyph) => Ok(glyph.advance),
            Fetched::Transient(mut glyph) => {
                if let Err(err) = glyph.release() {
                    tracing::warn!(error = %err, ch = %glyph.index.ch, "failed to release transient glyph");
                }
                Ok(glyph.advance)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct FakeSurface {
        ch: char,
        released: Rc<RefCell<Vec<char>>>,
    }

    impl Release for FakeSurface {
        type Error = std::convert::Infallible;

        fn release(&mut self) -> Result<(), Self::Error> {
            self.released.borrow_mut().push(self.ch);
            Ok(())
        }
    }

    /// Renders every glyph with an advance of 10, except 'i' (4).
    #[derive(Default)]
    struct FakeRenderer {
        renders: Vec<GlyphIndex>,
        released: Rc<RefCell<Vec<char>>>,
    }

    impl GlyphRenderer for FakeRenderer {
        type Surface = FakeSurface;
        type Error = String;

        fn render(&mut self, index: &GlyphIndex) -> Result<CachedGlyph<FakeSurface>, String> {
            if index.ch == '\u{fffd}' {
                return Err(format!("no glyph for {:?}", index.ch));
            }
            self.renders.push(*index);
            let advance = if index.ch == 'i' { 4 } else { 10 };
            Ok(CachedGlyph {
                index: *index,
                surface: FakeSurface {
                    ch: index.ch,
                    released: Rc::clone(&self.released),
                },
                offset_x: 0,
                offset_y: 0,
                width: advance - 1,
                advance,
            })
        }
    }

    #[test]
    fn test_glyph_rendered_once() {
        let mut renderer = FakeRenderer::default();
        let mut cache = GlyphCache::new(16);
        let index = GlyphStyle::default().index_for('A');

        for _ in 0..3 {
            let glyph = cache.glyph(index, &mut renderer).unwrap();
            assert!(glyph.is_cached());
            assert_eq!(glyph.advance, 10);
        }
        assert_eq!(renderer.renders.len(), 1);
    }

    #[test]
    fn test_unshaded_background_shares_slot() {
        let mut renderer = FakeRenderer::default();
        let mut cache = GlyphCache::new(16);

        let on_red = GlyphStyle {
            back_color: Color::rgb(255, 0, 0),
            ..Default::default()
        };
        let on_blue = GlyphStyle {
            back_color: Color::rgb(0, 0, 255),
            ..Default::default()
        };

        cache.glyph(on_red.index_for('x'), &mut renderer).unwrap();
        cache.glyph(on_blue.index_for('x'), &mut renderer).unwrap();
        assert_eq!(renderer.renders.len(), 1);

        let shaded_red = GlyphStyle { render_style: RenderStyle::Shaded, ..on_red };
        let shaded_blue = GlyphStyle { render_style: RenderStyle::Shaded, ..on_blue };
        cache.glyph(shaded_red.index_for('x'), &mut renderer).unwrap();
        cache.glyph(shaded_blue.index_for('x'), &mut renderer).unwrap();
        assert_eq!(renderer.renders.len(), 3);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_shade_resolution() {
        let mut style = GlyphStyle::default();
        assert_eq!(style.shade(), Color::BLACK);

        style.back_color = Color::rgb(1, 2, 3);
        assert_eq!(style.shade(), Color::rgb(1, 2, 3));

        style.shade_color = Some(Color::WHITE);
        assert_eq!(style.shade(), Color::WHITE);
        assert_eq!(style.index_for('q').background, Color::WHITE);
    }

    #[test]
    fn test_text_width_and_fit_count() {
        let mut renderer = FakeRenderer::default();
        let mut cache = GlyphCache::new(16);
        let style = GlyphStyle::default();

        assert_eq!(cache.text_width("hi", &style, &mut renderer), Ok(14));
        assert_eq!(cache.text_width("", &style, &mut renderer), Ok(0));

        // 10, 14, 24, 28
        assert_eq!(cache.fit_count("hihi", 24, &style, &mut renderer), Ok(3));
        assert_eq!(cache.fit_count("hihi", 9, &style, &mut renderer), Ok(0));
        assert_eq!(cache.fit_count("hihi", 100, &style, &mut renderer), Ok(4));

        // Only 'h' and 'i' were ever rendered
        assert_eq!(renderer.renders.len(), 2);
    }

    #[test]
    fn test_zero_capacity_releases_transient_glyphs() {
        let mut renderer = FakeRenderer::default();
        let released = Rc::clone(&renderer.released);
        let mut cache = GlyphCache::new(0);

        let width = cache.text_width("aa", &GlyphStyle::default(), &mut renderer).unwrap();
        assert_eq!(width, 20);
        assert_eq!(renderer.renders.len(), 2);
        assert_eq!(*released.borrow(), vec!['a', 'a']);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_render_error_propagates() {
        let mut renderer = FakeRenderer::default();
        let mut cache = GlyphCache::new(4);
        let style = GlyphStyle::default();

        let err = cache.text_width("a\u{fffd}", &style, &mut renderer).unwrap_err();
        assert!(err.contains("no glyph"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicted_glyph_surface_released() {
        let mut renderer = FakeRenderer::default();
        let released = Rc::clone(&renderer.released);
        let mut cache = GlyphCache::new(2);
        let style = GlyphStyle::default();

        cache.text_width("abc", &style, &mut renderer).unwrap();
        assert_eq!(*released.borrow(), vec!['a']);

        drop(cache);
        let mut all = released.borrow().clone();
        all.sort_unstable();
        assert_eq!(all, vec!['a', 'b', 'c']);
    }
}
