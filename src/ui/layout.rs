//! Terminal word surface: lays a document out into character cells.
//!
//! Handles are token indices. Rects are in cells: `x` is the column, `y` the
//! row relative to the top of the visible text pane.

use crate::engine::config::FONT_SIZE_RANGE;
use crate::engine::error::{FlowError, FlowResult};
use crate::reading::surface::{Rect, WordSurface};
use crate::reading::token::{Document, Segment};
use crate::reading::tokenizer::is_block_markup;
use std::collections::BTreeSet;
use tracing::debug;
use unicode_width::UnicodeWidthStr;

/// Where a word sits in the laid-out content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub width: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineItem {
    Word(usize),
    Gap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LayoutKey {
    revision: u64,
    width: u16,
    font_size: u8,
}

#[derive(Debug, Default)]
pub struct TerminalSurface {
    key: Option<LayoutKey>,
    placements: Vec<Placement>,
    lines: Vec<Vec<LineItem>>,
    width: usize,
    height: usize,
    margin: usize,
    scroll_top: usize,
    active: BTreeSet<usize>,
    focus: Vec<Rect>,
}

/// Columns left blank on each side; larger font sizes read as a narrower
/// column of text.
pub fn margin_for(width: u16, font_size: u8) -> usize {
    let steps = font_size.saturating_sub(*FONT_SIZE_RANGE.start()) as usize;
    width as usize * steps / 16
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lays out `document` for a pane of `width x height` cells. Returns
    /// true when the words moved.
    pub fn layout(
        &mut self,
        document: Option<&Document>,
        revision: u64,
        width: u16,
        height: u16,
        font_size: u8,
    ) -> bool {
        self.height = height as usize;
        let key = LayoutKey {
            revision,
            width,
            font_size,
        };
        if self.key == Some(key) {
            return false;
        }

        self.width = width as usize;
        self.margin = margin_for(width, font_size);
        self.placements.clear();
        self.lines.clear();
        if let Some(document) = document {
            self.reflow(document);
        }
        self.scroll_top = self.scroll_top.min(self.max_scroll());
        self.key = Some(key);
        debug!(
            words = self.placements.len(),
            lines = self.lines.len(),
            width,
            font_size,
            "Terminal layout rebuilt"
        );
        true
    }

    fn reflow(&mut self, document: &Document) {
        let text_width = self.width.saturating_sub(2 * self.margin).max(1);
        let mut line: Vec<LineItem> = Vec::new();
        let mut col = 0;
        let mut breaks = 0;
        let mut space = false;

        for segment in document.segments() {
            match segment {
                Segment::Markup(markup) => {
                    if is_block_markup(markup) {
                        breaks = breaks.max(1);
                    }
                }
                Segment::Whitespace(_) => space = true,
                Segment::LineBreak(ws) => {
                    breaks = breaks.max(ws.matches('\n').count().min(2));
                    space = true;
                }
                Segment::Word(index) => {
                    let Some(token) = document.token(*index) else {
                        continue;
                    };
                    let width = token.text.width().max(1);

                    if !line.is_empty() {
                        if breaks > 0 {
                            self.lines.push(std::mem::take(&mut line));
                            for _ in 1..breaks {
                                self.lines.push(Vec::new());
                            }
                            col = 0;
                        } else if col + usize::from(space) + width > text_width {
                            self.lines.push(std::mem::take(&mut line));
                            col = 0;
                        } else if space {
                            line.push(LineItem::Gap);
                            col += 1;
                        }
                    }

                    self.placements.push(Placement {
                        row: self.lines.len(),
                        col: self.margin + col,
                        width,
                    });
                    line.push(LineItem::Word(*index));
                    col += width;
                    breaks = 0;
                    space = false;
                }
            }
        }
        if !line.is_empty() {
            self.lines.push(line);
        }
    }

    /// Scrolls so the row of `word` sits `scroll_level / 6` down the pane.
    pub fn follow(&mut self, word: usize, scroll_level: u8) {
        let Some(placement) = self.placements.get(word) else {
            return;
        };
        let anchor = self.height * scroll_level as usize / 6;
        self.scroll_top = placement.row.saturating_sub(anchor).min(self.max_scroll());
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    /// Rows currently in the pane, with their content row numbers.
    pub fn visible_lines(&self) -> impl Iterator<Item = (usize, &[LineItem])> + '_ {
        self.lines
            .iter()
            .enumerate()
            .skip(self.scroll_top)
            .take(self.height)
            .map(|(row, items)| (row, items.as_slice()))
    }

    pub fn placement(&self, word: usize) -> Option<Placement> {
        self.placements.get(word).copied()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn margin(&self) -> usize {
        self.margin
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn is_active(&self, word: usize) -> bool {
        self.active.contains(&word)
    }

    pub fn focus_segments(&self) -> &[Rect] {
        &self.focus
    }

    /// Whether the cell at content `row`, `col` is under the focus indicator.
    pub fn in_focus(&self, row: usize, col: usize) -> bool {
        let (row, col) = (row as f64, col as f64);
        self.focus
            .iter()
            .any(|r| r.y <= row && row < r.bottom() && r.x <= col && col < r.right())
    }
}

impl WordSurface for TerminalSurface {
    type Handle = usize;

    fn scan_words(&self) -> FlowResult<Vec<(usize, usize)>> {
        if self.key.is_none() {
            return Err(FlowError::LayoutPending);
        }
        Ok((0..self.placements.len()).map(|i| (i, i)).collect())
    }

    fn word_rect(&self, handle: &usize) -> Option<Rect> {
        let p = self.placements.get(*handle)?;
        Some(Rect::new(
            p.col as f64,
            p.row as f64 - self.scroll_top as f64,
            p.width as f64,
            1.0,
        ))
    }

    fn container_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }

    fn scroll_offset(&self) -> (f64, f64) {
        (0.0, self.scroll_top as f64)
    }

    fn set_word_active(&mut self, handle: &usize, active: bool) {
        if active {
            self.active.insert(*handle);
        } else {
            self.active.remove(handle);
        }
    }

    fn show_focus(&mut self, segments: &[Rect]) {
        self.focus = segments.to_vec();
    }

    fn hide_focus(&mut self) {
        self.focus.clear();
    }
}
