//! Observable settings store with typed keys.
//!
//! The store is injected into the flow session rather than looked up
//! globally. Writers go through validating setters; listeners subscribe to a
//! single [`SettingKey`] and keep the returned [`Subscription`] to detach.

use crate::engine::config::{
    validate_focus_width, validate_font_size, validate_pause_multiplier, validate_scroll_level,
    validate_speed, AppConfig, DisplayConfig, PacingConfig,
};
use crate::engine::error::FlowResult;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Speed,
    FocusWidth,
    ScrollLevel,
    NewlinePauseMultiplier,
    FontFamily,
    FontSize,
    Bionic,
    FlowMode,
}

impl SettingKey {
    pub const ALL: [SettingKey; 8] = [
        SettingKey::Speed,
        SettingKey::FocusWidth,
        SettingKey::ScrollLevel,
        SettingKey::NewlinePauseMultiplier,
        SettingKey::FontFamily,
        SettingKey::FontSize,
        SettingKey::Bionic,
        SettingKey::FlowMode,
    ];

    /// Keys whose change moves rendered words on the surface.
    pub fn affects_layout(self) -> bool {
        matches!(
            self,
            SettingKey::FontFamily | SettingKey::FontSize | SettingKey::Bionic
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub pacing: PacingConfig,
    pub display: DisplayConfig,
}

impl From<&AppConfig> for Settings {
    fn from(config: &AppConfig) -> Self {
        Self {
            pacing: config.pacing.clone(),
            display: config.display.clone(),
        }
    }
}

#[must_use = "dropping the handle leaves no way to unsubscribe"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    key: SettingKey,
    id: u64,
}

impl Subscription {
    pub fn key(&self) -> SettingKey {
        self.key
    }
}

type Listener = Rc<RefCell<dyn FnMut(&Settings)>>;

pub struct SettingsStore {
    current: RefCell<Settings>,
    listeners: RefCell<Vec<(Subscription, Listener)>>,
    next_id: Cell<u64>,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> FlowResult<Self> {
        settings.pacing.validate()?;
        validate_font_size(settings.display.font_size)?;
        Ok(Self {
            current: RefCell::new(settings),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        })
    }

    pub fn from_config(config: &AppConfig) -> FlowResult<Self> {
        Self::new(Settings::from(config))
    }

    pub fn snapshot(&self) -> Settings {
        self.current.borrow().clone()
    }

    pub fn speed(&self) -> u32 {
        self.current.borrow().pacing.speed
    }

    pub fn focus_width(&self) -> usize {
        self.current.borrow().pacing.focus_width
    }

    pub fn scroll_level(&self) -> u8 {
        self.current.borrow().pacing.scroll_level
    }

    pub fn newline_pause_multiplier(&self) -> f64 {
        self.current.borrow().pacing.newline_pause_multiplier
    }

    pub fn font_family(&self) -> String {
        self.current.borrow().display.font_family.clone()
    }

    pub fn font_size(&self) -> u8 {
        self.current.borrow().display.font_size
    }

    pub fn bionic(&self) -> bool {
        self.current.borrow().display.bionic
    }

    pub fn flow_mode(&self) -> bool {
        self.current.borrow().display.flow_mode
    }

    pub fn set_speed(&self, wpm: u32) -> FlowResult<()> {
        let wpm = validate_speed(wpm)?;
        self.update(SettingKey::Speed, |s| s.pacing.speed = wpm);
        Ok(())
    }

    pub fn set_focus_width(&self, width: usize) -> FlowResult<()> {
        let width = validate_focus_width(width)?;
        self.update(SettingKey::FocusWidth, |s| s.pacing.focus_width = width);
        Ok(())
    }

    pub fn set_scroll_level(&self, level: u8) -> FlowResult<()> {
        let level = validate_scroll_level(level)?;
        self.update(SettingKey::ScrollLevel, |s| s.pacing.scroll_level = level);
        Ok(())
    }

    pub fn set_newline_pause_multiplier(&self, multiplier: f64) -> FlowResult<()> {
        let multiplier = validate_pause_multiplier(multiplier)?;
        self.update(SettingKey::NewlinePauseMultiplier, |s| {
            s.pacing.newline_pause_multiplier = multiplier
        });
        Ok(())
    }

    pub fn set_font_size(&self, size: u8) -> FlowResult<()> {
        let size = validate_font_size(size)?;
        self.update(SettingKey::FontSize, |s| s.display.font_size = size);
        Ok(())
    }

    pub fn set_font_family(&self, family: impl Into<String>) {
        let family = family.into();
        self.update(SettingKey::FontFamily, |s| s.display.font_family = family);
    }

    pub fn set_bionic(&self, enabled: bool) {
        self.update(SettingKey::Bionic, |s| s.display.bionic = enabled);
    }

    pub fn set_flow_mode(&self, enabled: bool) {
        self.update(SettingKey::FlowMode, |s| s.display.flow_mode = enabled);
    }

    pub fn subscribe(
        &self,
        key: SettingKey,
        listener: impl FnMut(&Settings) + 'static,
    ) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let subscription = Subscription { key, id };
        let listener: Listener = Rc::new(RefCell::new(listener));
        self.listeners.borrow_mut().push((subscription, listener));
        subscription
    }

    /// Returns false if the subscription was already removed.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(sub, _)| *sub != subscription);
        listeners.len() != before
    }

    pub fn listener_count(&self, key: SettingKey) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(sub, _)| sub.key == key)
            .count()
    }

    fn update(&self, key: SettingKey, apply: impl FnOnce(&mut Settings)) {
        let changed = {
            let mut current = self.current.borrow_mut();
            let before = current.clone();
            apply(&mut *current);
            *current != before
        };
        if changed {
            debug!(?key, "Setting changed");
            self.notify(key);
        }
    }

    fn notify(&self, key: SettingKey) {
        let snapshot = self.snapshot();
        // Listeners may subscribe, unsubscribe or write other keys while
        // running, so nothing of ours stays borrowed during the calls.
        let targets: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(sub, _)| sub.key == key)
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in targets {
            match listener.try_borrow_mut() {
                Ok(mut listener) => (&mut *listener)(&snapshot),
                Err(_) => warn!(?key, "Skipping re-entrant settings listener"),
            }
        }
    }
}
