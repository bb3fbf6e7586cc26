//! Highlight renderer: active word window and focus indicator.
//!
//! Reads the pacer's position, never writes it. All surface writes happen in
//! [`HighlightRenderer::render`], which the host calls once per frame after
//! the scheduler has run.

use crate::reading::registry::WordRegistry;
use crate::reading::surface::{Rect, WordSurface};
use std::collections::BTreeMap;
use tracing::trace;

/// What one render pass produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FocusFrame {
    /// Inclusive active range, `None` without content.
    pub range: Option<(usize, usize)>,
    /// Focus rects in container content coordinates, one per visual line,
    /// top to bottom. Empty when the focus indicator is hidden.
    pub segments: Vec<Rect>,
}

impl FocusFrame {
    pub fn is_hidden(&self) -> bool {
        self.segments.is_empty()
    }

    /// Single rect covering every segment.
    pub fn bounds(&self) -> Option<Rect> {
        let (first, rest) = self.segments.split_first()?;
        Some(rest.iter().fold(*first, |acc, r| acc.union(r)))
    }
}

#[derive(Debug)]
pub struct HighlightRenderer<H> {
    active: BTreeMap<usize, H>,
    seen_rebuilds: usize,
}

impl<H: Clone> Default for HighlightRenderer<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone> HighlightRenderer<H> {
    pub fn new() -> Self {
        Self {
            active: BTreeMap::new(),
            seen_rebuilds: 0,
        }
    }

    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.active.keys().copied()
    }

    /// Marks the window around `center` active and redraws the focus.
    ///
    /// Words leaving the window are deactivated; words that stay keep their
    /// state without being rewritten unless the registry was rebuilt, in
    /// which case their handles may point at new elements.
    pub fn render<S>(
        &mut self,
        registry: &mut WordRegistry<H>,
        surface: &mut S,
        center: f64,
        half_width: usize,
    ) -> FocusFrame
    where
        S: WordSurface<Handle = H>,
    {
        registry.refresh(surface);
        let relaid = registry.rebuild_count() != self.seen_rebuilds;
        self.seen_rebuilds = registry.rebuild_count();

        let range = registry.active_range(center, half_width);
        let mut next = BTreeMap::new();
        if let Some((start, end)) = range {
            for index in start..=end {
                if let Some(handle) = registry.peek_word(index) {
                    next.insert(index, handle.clone());
                }
            }
        }

        for (index, handle) in &self.active {
            if !next.contains_key(index) {
                surface.set_word_active(handle, false);
            }
        }
        for (index, handle) in &next {
            if relaid || !self.active.contains_key(index) {
                surface.set_word_active(handle, true);
            }
        }
        self.active = next;

        let segments = self.focus_segments(surface);
        if segments.is_empty() {
            surface.hide_focus();
        } else {
            surface.show_focus(&segments);
        }
        trace!(?range, lines = segments.len(), "Highlight rendered");

        FocusFrame { range, segments }
    }

    /// Deactivates everything and hides the focus indicator.
    pub fn clear<S>(&mut self, surface: &mut S)
    where
        S: WordSurface<Handle = H>,
    {
        for handle in self.active.values() {
            surface.set_word_active(handle, false);
        }
        self.active.clear();
        surface.hide_focus();
    }

    /// Union of active word rects per visual line, in content coordinates.
    fn focus_segments<S>(&self, surface: &S) -> Vec<Rect>
    where
        S: WordSurface<Handle = H>,
    {
        let container = surface.container_rect();
        let (scroll_left, scroll_top) = surface.scroll_offset();
        let dx = scroll_left - container.x;
        let dy = scroll_top - container.y;

        let mut lines: BTreeMap<i64, Rect> = BTreeMap::new();
        for handle in self.active.values() {
            let Some(rect) = surface.word_rect(handle) else {
                continue;
            };
            if rect.width <= 0.0 || rect.height <= 0.0 {
                continue;
            }
            let rect = rect.translate(dx, dy);
            lines
                .entry(rect.y.round() as i64)
                .and_modify(|line| *line = line.union(&rect))
                .or_insert(rect);
        }
        lines.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::surface::mock::MockSurface;

    fn setup(words: usize, per_line: usize) -> (WordRegistry<usize>, MockSurface) {
        let mut registry = WordRegistry::new();
        registry.reset(words);
        (registry, MockSurface::new(words, per_line))
    }

    #[test]
    fn test_window_marks_range_active() {
        let (mut registry, mut surface) = setup(20, 10);
        let mut renderer = HighlightRenderer::new();

        let frame = renderer.render(&mut registry, &mut surface, 5.4, 2);
        assert_eq!(frame.range, Some((3, 7)));
        assert_eq!(surface.active.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_moving_window_only_touches_changes() {
        let (mut registry, mut surface) = setup(20, 10);
        let mut renderer = HighlightRenderer::new();

        renderer.render(&mut registry, &mut surface, 5.0, 2);
        assert_eq!(surface.activations, 5);

        renderer.render(&mut registry, &mut surface, 6.0, 2);
        assert_eq!(surface.active.iter().copied().collect::<Vec<_>>(), vec![4, 5, 6, 7, 8]);
        assert_eq!(surface.activations, 6);
        assert_eq!(surface.deactivations, 1);
    }

    #[test]
    fn test_single_line_focus_is_one_rect() {
        let (mut registry, mut surface) = setup(20, 10);
        let mut renderer = HighlightRenderer::new();

        let frame = renderer.render(&mut registry, &mut surface, 5.0, 2);
        assert_eq!(frame.segments, vec![Rect::new(30.0, 0.0, 50.0, 20.0)]);
        assert_eq!(surface.focus, Some(frame.segments.clone()));
    }

    #[test]
    fn test_window_across_lines_is_segmented() {
        let (mut registry, mut surface) = setup(20, 10);
        let mut renderer = HighlightRenderer::new();

        // words 8..=10 straddle the first line break
        let frame = renderer.render(&mut registry, &mut surface, 9.0, 1);
        assert_eq!(frame.range, Some((8, 10)));
        assert_eq!(
            frame.segments,
            vec![
                Rect::new(80.0, 0.0, 20.0, 20.0),
                Rect::new(0.0, 20.0, 10.0, 20.0),
            ]
        );
        assert_eq!(frame.bounds(), Some(Rect::new(0.0, 0.0, 100.0, 40.0)));
    }

    #[test]
    fn test_focus_is_relative_to_content_origin() {
        let (mut registry, mut surface) = setup(40, 10);
        surface.origin = (5.0, 7.0);
        surface.scroll = (0.0, 40.0);
        let mut renderer = HighlightRenderer::new();

        // word 25 is on row 2, which is content y = 40 regardless of scroll
        let frame = renderer.render(&mut registry, &mut surface, 25.0, 0);
        assert_eq!(frame.segments, vec![Rect::new(50.0, 40.0, 10.0, 20.0)]);
    }

    #[test]
    fn test_empty_content_hides_focus() {
        let (mut registry, mut surface) = setup(0, 10);
        surface.focus = Some(vec![Rect::default()]);
        let mut renderer = HighlightRenderer::new();

        let frame = renderer.render(&mut registry, &mut surface, 0.0, 2);
        assert!(frame.is_hidden());
        assert_eq!(frame.range, None);
        assert_eq!(surface.focus, None);
    }

    #[test]
    fn test_layout_pending_hides_focus_without_fault() {
        let (mut registry, mut surface) = setup(10, 10);
        surface.laid_out = false;
        let mut renderer = HighlightRenderer::new();

        let frame = renderer.render(&mut registry, &mut surface, 3.0, 1);
        assert_eq!(frame.range, Some((2, 4)));
        assert!(frame.is_hidden());
        assert!(surface.active.is_empty());
    }

    #[test]
    fn test_rebuild_reapplies_active_state() {
        let (mut registry, mut surface) = setup(10, 10);
        let mut renderer = HighlightRenderer::new();
        renderer.render(&mut registry, &mut surface, 3.0, 1);
        assert_eq!(surface.activations, 3);

        registry.invalidate();
        renderer.render(&mut registry, &mut surface, 3.0, 1);
        assert_eq!(surface.activations, 6);
        assert_eq!(surface.deactivations, 0);
    }

    #[test]
    fn test_collapsed_words_never_draw_zero_size_focus() {
        let (mut registry, mut surface) = setup(10, 10);
        surface.collapsed.extend([2, 3, 4]);
        let mut renderer = HighlightRenderer::new();

        // words that render without width stay active but get no focus
        let frame = renderer.render(&mut registry, &mut surface, 3.0, 1);
        assert_eq!(frame.range, Some((2, 4)));
        assert!(frame.is_hidden());
        assert_eq!(surface.focus, None);
        assert_eq!(surface.active.len(), 3);

        let frame = renderer.render(&mut registry, &mut surface, 5.0, 1);
        assert_eq!(frame.segments, vec![Rect::new(50.0, 0.0, 20.0, 20.0)]);
    }

    #[test]
    fn test_clear_deactivates_everything() {
        let (mut registry, mut surface) = setup(10, 10);
        let mut renderer = HighlightRenderer::new();
        renderer.render(&mut registry, &mut surface, 3.0, 1);

        renderer.clear(&mut surface);
        assert!(surface.active.is_empty());
        assert_eq!(surface.focus, None);
        assert_eq!(renderer.active_indices().count(), 0);
    }
}
