use super::event::AppEvent;
use super::mode::AppMode;
use super::render_state::RenderState;
use crate::engine::config::{AppConfig, FOCUS_WIDTH_RANGE, FONT_SIZE_RANGE, SPEED_RANGE};
use crate::engine::error::FlowResult;
use crate::engine::scheduler::{Clock, Scheduler};
use crate::engine::settings::SettingsStore;
use crate::engine::timing::remaining_seconds;
use crate::reading::session::FlowSession;
use crate::reading::tokenizer::ContentKind;
use std::cell::Cell;
use std::rc::Rc;
use tracing::{info, warn};

pub struct App {
    mode: AppMode,
    store: Rc<SettingsStore>,
    session: FlowSession<usize>,
    completed: Rc<Cell<bool>>,
    message: Option<String>,
}

impl App {
    pub fn new(
        config: &AppConfig,
        scheduler: Rc<dyn Scheduler>,
        clock: Rc<dyn Clock>,
    ) -> FlowResult<Self> {
        let store = Rc::new(SettingsStore::from_config(config)?);
        let session = FlowSession::new(store.clone(), scheduler, clock);

        let completed = Rc::new(Cell::new(false));
        let flag = completed.clone();
        session.on_complete(move || {
            flag.set(true);
            Ok(())
        });

        Ok(Self {
            mode: AppMode::Paused,
            store,
            session,
            completed,
            message: None,
        })
    }

    pub fn load(&mut self, content: &str, kind: ContentKind) -> FlowResult<usize> {
        self.completed.set(false);
        self.mode = AppMode::Paused;
        let words = self.session.load_content_as(content, kind)?;
        info!(words, ?kind, "Document ready");
        Ok(words)
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    pub fn session(&self) -> &FlowSession<usize> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut FlowSession<usize> {
        &mut self.session
    }

    pub fn store(&self) -> &Rc<SettingsStore> {
        &self.store
    }

    /// Applies `event`; a rejected action is logged and shown, never fatal.
    pub fn handle_event(&mut self, event: AppEvent) {
        match self.apply(event) {
            Ok(()) => self.message = None,
            Err(err) => {
                warn!(?event, %err, "Action rejected");
                self.message = Some(err.to_string());
            }
        }
    }

    fn apply(&mut self, event: AppEvent) -> FlowResult<()> {
        match event {
            AppEvent::TogglePlay => {
                if self.session.toggle()? {
                    self.completed.set(false);
                    self.mode = AppMode::Reading;
                } else {
                    self.mode = AppMode::Paused;
                }
            }
            AppEvent::AdjustSpeed(delta) => {
                let speed = (self.store.speed() as i32 + delta)
                    .clamp(*SPEED_RANGE.start() as i32, *SPEED_RANGE.end() as i32);
                self.store.set_speed(speed as u32)?;
            }
            AppEvent::AdjustFocusWidth(delta) => {
                let width = (self.store.focus_width() as i32 + delta).clamp(
                    *FOCUS_WIDTH_RANGE.start() as i32,
                    *FOCUS_WIDTH_RANGE.end() as i32,
                );
                self.store.set_focus_width(width as usize)?;
            }
            AppEvent::AdjustPauseMultiplier(delta) => {
                let multiplier = (self.store.newline_pause_multiplier() + delta).max(0.0);
                self.store
                    .set_newline_pause_multiplier((multiplier * 100.0).round() / 100.0)?;
            }
            AppEvent::ToggleBionic => self.store.set_bionic(!self.store.bionic()),
            AppEvent::CycleFontSize => {
                let size = self.store.font_size();
                let next = if size >= *FONT_SIZE_RANGE.end() {
                    *FONT_SIZE_RANGE.start()
                } else {
                    size + 1
                };
                self.store.set_font_size(next)?;
            }
            AppEvent::JumpWords(delta) => self.session.jump_by(delta)?,
            AppEvent::JumpToStart => self.session.jump_to(0.0)?,
            AppEvent::Resize => self.session.invalidate_layout(),
            AppEvent::Quit => {
                self.session.stop();
                self.mode = AppMode::Quit;
            }
            AppEvent::None => {}
        }
        Ok(())
    }

    /// Picks up pacer state changes made during the last frame.
    pub fn sync(&mut self) {
        if self.mode != AppMode::Reading {
            return;
        }
        if self.completed.get() {
            self.mode = AppMode::Finished;
        } else if !self.session.is_playing() {
            self.mode = AppMode::Paused;
        }
    }

    pub fn get_render_state(&self) -> RenderState {
        let total = self.session.total_words();
        let current = if total == 0 {
            0
        } else if self.mode == AppMode::Finished {
            total
        } else {
            self.session.current_word()
        };
        let remaining = (total as f64 - self.session.continuous_index()).max(0.0);

        RenderState {
            mode: self.mode,
            progress: (current, total),
            speed: self.store.speed(),
            focus_width: self.store.focus_width(),
            pause_multiplier: self.store.newline_pause_multiplier(),
            font_size: self.store.font_size(),
            bionic: self.store.bionic(),
            remaining_secs: remaining_seconds(remaining, self.store.speed()),
            message: self.message.clone(),
        }
    }
}
