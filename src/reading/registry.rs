//! Word index registry: token index -> surface handle.
//!
//! The mapping is rebuilt from the surface, never patched. Invalidation only
//! marks it stale; the last good mapping keeps answering reads until the next
//! query succeeds in rebuilding it.

use crate::engine::error::FlowResult;
use crate::reading::surface::WordSurface;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct WordRegistry<H> {
    entries: Vec<Option<H>>,
    total_words: usize,
    stale: bool,
    rebuilds: usize,
}

impl<H: Clone> Default for WordRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone> WordRegistry<H> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            total_words: 0,
            stale: true,
            rebuilds: 0,
        }
    }

    /// Starts a new tokenization pass of `total_words` words.
    pub fn reset(&mut self, total_words: usize) {
        self.total_words = total_words;
        self.stale = true;
    }

    pub fn invalidate(&mut self) {
        if !self.stale {
            debug!("Word registry invalidated");
        }
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn total_words(&self) -> usize {
        self.total_words
    }

    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    /// Scans the surface and replaces the mapping.
    ///
    /// # Errors
    /// Propagates `FlowError::LayoutPending`; the previous mapping and the
    /// stale flag are left as they were.
    pub fn build<S>(&mut self, surface: &S) -> FlowResult<usize>
    where
        S: WordSurface<Handle = H>,
    {
        let words = surface.scan_words()?;

        let mut entries = vec![None; self.total_words];
        let mut mapped = 0;
        for (index, handle) in words {
            match entries.get_mut(index) {
                Some(slot) => {
                    *slot = Some(handle);
                    mapped += 1;
                }
                None => warn!(index, total = self.total_words, "Surface word outside content"),
            }
        }

        self.entries = entries;
        self.stale = false;
        self.rebuilds += 1;
        debug!(mapped, total = self.total_words, "Word registry rebuilt");
        Ok(mapped)
    }

    /// Rebuilds if stale. A failed rebuild keeps the previous mapping.
    pub fn refresh<S>(&mut self, surface: &S)
    where
        S: WordSurface<Handle = H>,
    {
        if !self.stale {
            return;
        }
        if let Err(err) = self.build(surface) {
            debug!(%err, "Word registry rebuild deferred");
        }
    }

    /// Handle for `index`, rebuilding first if the mapping is stale.
    pub fn get_word<S>(&mut self, surface: &S, index: usize) -> Option<&H>
    where
        S: WordSurface<Handle = H>,
    {
        self.refresh(surface);
        self.peek_word(index)
    }

    /// Handle for `index` from the current mapping, without rebuilding.
    pub fn peek_word(&self, index: usize) -> Option<&H> {
        if index >= self.total_words {
            return None;
        }
        self.entries.get(index).and_then(Option::as_ref)
    }

    /// Inclusive `[floor(center) - half_width, floor(center) + half_width]`,
    /// clamped to the content. `None` when there is no content.
    pub fn active_range(&self, center: f64, half_width: usize) -> Option<(usize, usize)> {
        active_range(self.total_words, center, half_width)
    }
}

pub fn active_range(total_words: usize, center: f64, half_width: usize) -> Option<(usize, usize)> {
    let last = total_words.checked_sub(1)?;
    // f64::max drops NaN, so a bad center lands on 0
    let center = center.max(0.0).floor() as usize;
    let start = center.saturating_sub(half_width).min(last);
    let end = center.saturating_add(half_width).min(last);
    Some((start, end))
}
