//! WordSurface trait for pluggable rendering surfaces
//!
//! The reading core never touches a presentation object model directly. A
//! surface owns whatever represents a rendered word (a DOM node, a cell span
//! in a terminal layout) and hands out opaque handles for them.

use crate::engine::error::FlowResult;
use std::fmt;

/// Axis-aligned rectangle. Surfaces report word rects in viewport
/// coordinates; the highlight renderer converts to content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Smallest rect covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Rendering surface the registry scans and the highlight renderer styles.
pub trait WordSurface {
    /// Opaque reference to one rendered word.
    type Handle: Clone + fmt::Debug;

    /// Lists the rendered words as `(token index, handle)` pairs.
    ///
    /// # Errors
    /// Returns `FlowError::LayoutPending` while the words for the current
    /// content have not been laid out yet.
    fn scan_words(&self) -> FlowResult<Vec<(usize, Self::Handle)>>;

    /// Current viewport rect of a word, or `None` if it no longer exists.
    fn word_rect(&self, handle: &Self::Handle) -> Option<Rect>;

    /// Viewport rect of the scrollable container.
    fn container_rect(&self) -> Rect;

    /// `(left, top)` scroll offset of the container.
    fn scroll_offset(&self) -> (f64, f64);

    fn set_word_active(&mut self, handle: &Self::Handle, active: bool);

    /// Draws the focus indicator; one rect per visual line.
    fn show_focus(&mut self, segments: &[Rect]);

    fn hide_focus(&mut self);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_covers_both() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 5.0, 10.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 25.0, 15.0));
    }

    #[test]
    fn test_translate() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0).translate(10.0, -2.0);
        assert_eq!(r, Rect::new(11.0, 0.0, 3.0, 4.0));
        assert_eq!(r.right(), 14.0);
        assert_eq!(r.bottom(), 4.0);
    }

    #[test]
    fn test_trait_usable_through_generics() {
        fn count<S: WordSurface>(surface: &S) -> usize {
            surface.scan_words().map(|w| w.len()).unwrap_or(0)
        }
        let surface = mock::MockSurface::new(4, 2);
        assert_eq!(count(&surface), 4);
    }
}
