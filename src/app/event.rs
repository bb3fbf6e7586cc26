use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Application events
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum AppEvent {
    TogglePlay,
    AdjustSpeed(i32),
    AdjustFocusWidth(i32),
    AdjustPauseMultiplier(f64),
    ToggleBionic,
    CycleFontSize,
    JumpWords(i64),
    JumpToStart,
    /// The terminal changed size; words will move.
    Resize,
    Quit,
    None,
}

pub const SPEED_STEP: i32 = 25;
pub const JUMP_STEP: i64 = 10;
pub const PAUSE_STEP: f64 = 0.25;

impl AppEvent {
    pub fn from_key(key: KeyEvent) -> Self {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppEvent::Quit;
        }
        match key.code {
            KeyCode::Char(' ') => AppEvent::TogglePlay,
            KeyCode::Char('+') | KeyCode::Char('=') => AppEvent::AdjustSpeed(SPEED_STEP),
            KeyCode::Char('-') => AppEvent::AdjustSpeed(-SPEED_STEP),
            KeyCode::Char(']') => AppEvent::AdjustFocusWidth(1),
            KeyCode::Char('[') => AppEvent::AdjustFocusWidth(-1),
            KeyCode::Char('.') => AppEvent::AdjustPauseMultiplier(PAUSE_STEP),
            KeyCode::Char(',') => AppEvent::AdjustPauseMultiplier(-PAUSE_STEP),
            KeyCode::Char('b') => AppEvent::ToggleBionic,
            KeyCode::Char('f') => AppEvent::CycleFontSize,
            KeyCode::Left => AppEvent::JumpWords(-JUMP_STEP),
            KeyCode::Right => AppEvent::JumpWords(JUMP_STEP),
            KeyCode::Home => AppEvent::JumpToStart,
            KeyCode::Char('q') | KeyCode::Esc => AppEvent::Quit,
            _ => AppEvent::None,
        }
    }
}
