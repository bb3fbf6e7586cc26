//! Flow session: the reading core wired to a settings store and scheduler.
//!
//! Owns the current [`Document`], the [`Pacer`], the registry and the
//! highlight renderer. Hosts call [`FlowSession::render`] once per frame,
//! after running the scheduler, with their [`WordSurface`].

use crate::engine::error::{FlowError, FlowResult};
use crate::engine::scheduler::{Clock, Scheduler};
use crate::engine::settings::{SettingKey, SettingsStore, Subscription};
use crate::reading::highlight::{FocusFrame, HighlightRenderer};
use crate::reading::pacer::{ObserverError, Pacer, TickFrame, TickRequest};
use crate::reading::registry::{active_range, WordRegistry};
use crate::reading::surface::WordSurface;
use crate::reading::token::Document;
use crate::reading::tokenizer::{tokenize_as, ContentKind};
use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, info, warn};

/// Content shared between the session and its settings listeners.
#[derive(Default)]
struct ContentState {
    source: Option<String>,
    kind: ContentKind,
    document: Option<Rc<Document>>,
    /// Bumped whenever `document` is replaced; hosts re-lay out on change.
    revision: u64,
}

pub struct FlowSession<H> {
    store: Rc<SettingsStore>,
    scheduler: Rc<dyn Scheduler>,
    pacer: Pacer,
    content: Rc<RefCell<ContentState>>,
    registry: Rc<RefCell<WordRegistry<H>>>,
    renderer: HighlightRenderer<H>,
    subscriptions: Vec<Subscription>,
    alive: Rc<Cell<bool>>,
    clear_pending: bool,
}

impl<H: Clone + 'static> FlowSession<H> {
    pub fn new(
        store: Rc<SettingsStore>,
        scheduler: Rc<dyn Scheduler>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let pacer = Pacer::new(scheduler.clone(), clock, &store.snapshot().pacing);
        let mut session = Self {
            store,
            scheduler,
            pacer,
            content: Rc::new(RefCell::new(ContentState::default())),
            registry: Rc::new(RefCell::new(WordRegistry::new())),
            renderer: HighlightRenderer::new(),
            subscriptions: Vec::new(),
            alive: Rc::new(Cell::new(true)),
            clear_pending: false,
        };
        session.install_tick_callback();
        session.subscribe_settings();
        session
    }

    /// Replaces the content. Playback is reset before tokenizing, so no tick
    /// ever sees the new document with the old position.
    ///
    /// Returns the word count. Content without words is reported as
    /// [`FlowError::EmptyContent`] and leaves the session with zero words.
    pub fn load_content(&mut self, content: &str) -> FlowResult<usize> {
        self.load_content_as(content, ContentKind::Html)
    }

    pub fn load_content_as(&mut self, content: &str, kind: ContentKind) -> FlowResult<usize> {
        self.ensure_alive()?;
        self.pacer.reset();
        self.clear_pending = true;

        let (document, result) = match tokenize_as(content, kind, self.store.bionic()) {
            Ok(document) => {
                let total = document.total_words();
                (Some(Rc::new(document)), Ok(total))
            }
            Err(err) => (None, Err(err)),
        };
        let total = result.as_ref().map_or(0, |total| *total);
        {
            let mut state = self.content.borrow_mut();
            state.source = Some(content.to_string());
            state.kind = kind;
            state.document = document;
            state.revision += 1;
        }
        self.registry.borrow_mut().reset(total);
        self.pacer.set_total_words(total);

        match &result {
            Ok(_) => info!(words = total, "Content loaded"),
            Err(err) => warn!(%err, "Content has no readable words"),
        }
        result
    }

    pub fn start(&self, from_index: f64) -> FlowResult<()> {
        self.ensure_alive()?;
        self.pacer.start(from_index)
    }

    pub fn stop(&self) {
        self.pacer.stop();
    }

    /// Returns whether playback is running afterwards.
    pub fn toggle(&self) -> FlowResult<bool> {
        self.ensure_alive()?;
        self.pacer.toggle()
    }

    pub fn jump_to(&self, index: f64) -> FlowResult<()> {
        self.ensure_alive()?;
        self.pacer.jump_to(index)
    }

    /// Jumps `delta` words from the current one, clamped to the content.
    pub fn jump_by(&self, delta: i64) -> FlowResult<()> {
        let total = self.total_words();
        if total == 0 {
            return Err(FlowError::SeekOutOfRange {
                index: delta as f64,
                total,
            });
        }
        let target = (self.pacer.current_word() as i64 + delta).clamp(0, total as i64 - 1);
        self.jump_to(target as f64)
    }

    /// Inclusive window of active words around the current position.
    pub fn active_range(&self) -> Option<(usize, usize)> {
        active_range(
            self.total_words(),
            self.pacer.continuous_index(),
            self.store.focus_width(),
        )
    }

    pub fn total_words(&self) -> usize {
        self.registry.borrow().total_words()
    }

    pub fn continuous_index(&self) -> f64 {
        self.pacer.continuous_index()
    }

    pub fn current_word(&self) -> usize {
        self.pacer.current_word()
    }

    pub fn is_playing(&self) -> bool {
        self.pacer.is_playing()
    }

    /// Registers a completion observer on the pacer.
    pub fn on_complete(&self, observer: impl FnMut() -> Result<(), ObserverError> + 'static) {
        self.pacer.on_complete(observer);
    }

    pub fn document(&self) -> Option<Rc<Document>> {
        self.content.borrow().document.clone()
    }

    pub fn content_revision(&self) -> u64 {
        self.content.borrow().revision
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    pub fn store(&self) -> &Rc<SettingsStore> {
        &self.store
    }

    pub fn registry(&self) -> Ref<'_, WordRegistry<H>> {
        self.registry.borrow()
    }

    /// Tells the session the surface will re-lay out (e.g. a resize).
    pub fn invalidate_layout(&self) {
        defer_invalidation(&self.scheduler, &self.registry, &self.alive);
    }

    /// Applies the current position to `surface`.
    pub fn render<S>(&mut self, surface: &mut S) -> FocusFrame
    where
        S: WordSurface<Handle = H>,
    {
        if !self.alive.get() {
            return FocusFrame::default();
        }
        if self.clear_pending {
            self.renderer.clear(surface);
            self.clear_pending = false;
        }
        if !self.store.flow_mode() {
            self.renderer.clear(surface);
            return FocusFrame::default();
        }

        let center = self.pacer.continuous_index();
        let half_width = self.store.focus_width();
        let mut registry = self.registry.borrow_mut();
        self.renderer
            .render(&mut *registry, surface, center, half_width)
    }

    fn install_tick_callback(&self) {
        let content = Rc::downgrade(&self.content);
        self.pacer.set_tick_callback(move |frame| boundary_request(&content, frame));
    }

    fn subscribe_settings(&mut self) {
        let pacer = self.pacer.clone();
        let speed = self.store.subscribe(SettingKey::Speed, move |s| {
            if let Err(err) = pacer.set_speed(s.pacing.speed) {
                warn!(%err, "Speed change not applied");
            }
        });

        let pacer = self.pacer.clone();
        let multiplier = self
            .store
            .subscribe(SettingKey::NewlinePauseMultiplier, move |s| {
                if let Err(err) = pacer.set_newline_pause_multiplier(s.pacing.newline_pause_multiplier)
                {
                    warn!(%err, "Pause multiplier change not applied");
                }
            });

        let pacer = self.pacer.clone();
        let flow_mode = self.store.subscribe(SettingKey::FlowMode, move |s| {
            if !s.display.flow_mode {
                pacer.stop();
            }
        });

        self.subscriptions.extend([speed, multiplier, flow_mode]);

        for key in SettingKey::ALL.into_iter().filter(|key| key.affects_layout()) {
            let scheduler = self.scheduler.clone();
            let registry = self.registry.clone();
            let alive = self.alive.clone();
            let content = self.content.clone();
            let sub = self.store.subscribe(key, move |s| {
                if key == SettingKey::Bionic {
                    retokenize(&content, s.display.bionic);
                }
                defer_invalidation(&scheduler, &registry, &alive);
            });
            self.subscriptions.push(sub);
        }
    }

    fn ensure_alive(&self) -> FlowResult<()> {
        if self.alive.get() {
            Ok(())
        } else {
            Err(FlowError::Destroyed)
        }
    }
}

impl<H> FlowSession<H> {
    /// Stops playback and detaches from the store and scheduler. Idempotent.
    pub fn destroy(&mut self) {
        if !self.alive.replace(false) {
            return;
        }
        self.pacer.destroy();
        for sub in self.subscriptions.drain(..) {
            self.store.unsubscribe(sub);
        }
        debug!("Flow session destroyed");
    }
}

impl<H> Drop for FlowSession<H> {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Pause after the first line-ending word the frame reached, unless it is
/// the last word overall.
fn boundary_request(content: &Weak<RefCell<ContentState>>, frame: &TickFrame) -> TickRequest {
    let Some(content) = content.upgrade() else {
        return TickRequest::Continue;
    };
    let state = content.borrow();
    let Some(document) = state.document.as_ref() else {
        return TickRequest::Continue;
    };

    let last = document.total_words().saturating_sub(1);
    frame
        .crossed
        .clone()
        .take_while(|&word| word < last)
        .find(|&word| document.token(word).is_some_and(|t| t.is_break_boundary))
        .map_or(TickRequest::Continue, TickRequest::PauseAtBoundary)
}

/// Rebuilds emphasis for the loaded content. Word indices do not change.
fn retokenize(content: &Rc<RefCell<ContentState>>, emphasize: bool) {
    let mut state = content.borrow_mut();
    let Some(source) = state.source.as_deref() else {
        return;
    };
    match tokenize_as(source, state.kind, emphasize) {
        Ok(document) => {
            state.document = Some(Rc::new(document));
            state.revision += 1;
            debug!(emphasize, "Content re-tokenized");
        }
        Err(err) => debug!(%err, "Nothing to re-tokenize"),
    }
}

/// Invalidates the registry two frames from now, once the surface has
/// applied the layout change.
fn defer_invalidation<H: Clone + 'static>(
    scheduler: &Rc<dyn Scheduler>,
    registry: &Rc<RefCell<WordRegistry<H>>>,
    alive: &Rc<Cell<bool>>,
) {
    let registry = Rc::downgrade(registry);
    let scheduler_ref = Rc::downgrade(scheduler);
    let alive = Rc::downgrade(alive);
    scheduler.schedule_tick(Box::new(move |_| {
        let Some(scheduler) = scheduler_ref.upgrade() else {
            return;
        };
        scheduler.schedule_tick(Box::new(move |_| {
            let live = alive.upgrade().is_some_and(|a| a.get());
            if let (true, Some(registry)) = (live, registry.upgrade()) {
                registry.borrow_mut().invalidate();
            }
        }));
    }));
}
