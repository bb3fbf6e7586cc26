use crate::app::mode::AppMode;

/// Render state for UI components
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub mode: AppMode,
    /// `(current word, total words)`.
    pub progress: (usize, usize),
    pub speed: u32,
    pub focus_width: usize,
    pub pause_multiplier: f64,
    pub font_size: u8,
    pub bionic: bool,
    pub remaining_secs: u64,
    /// Last rejected action, shown in the status line.
    pub message: Option<String>,
}
