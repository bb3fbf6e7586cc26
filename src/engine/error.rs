use std::io;
use std::path::Path;
use thiserror::Error;

/// Broad fault classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Out-of-range settings or seeks, rejected before any state mutation.
    Configuration,
    /// Empty or unusable content handed to the tokenizer.
    Content,
    /// Surface geometry requested before the rendered words exist.
    LayoutRace,
    Io,
}

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("speed {0} wpm is outside {min}..={max}", min = crate::engine::config::SPEED_RANGE.start(), max = crate::engine::config::SPEED_RANGE.end())]
    SpeedOutOfRange(u32),

    #[error("focus width {0} is outside {min}..={max}", min = crate::engine::config::FOCUS_WIDTH_RANGE.start(), max = crate::engine::config::FOCUS_WIDTH_RANGE.end())]
    FocusWidthOutOfRange(usize),

    #[error("scroll level {0} is outside {min}..={max}", min = crate::engine::config::SCROLL_LEVEL_RANGE.start(), max = crate::engine::config::SCROLL_LEVEL_RANGE.end())]
    ScrollLevelOutOfRange(u8),

    #[error("font size {0} is outside {min}..={max}", min = crate::engine::config::FONT_SIZE_RANGE.start(), max = crate::engine::config::FONT_SIZE_RANGE.end())]
    FontSizeOutOfRange(u8),

    #[error("newline pause multiplier {0} must be finite and >= 0")]
    InvalidPauseMultiplier(f64),

    #[error("cannot seek to word {index}: content has {total} words")]
    SeekOutOfRange { index: f64, total: usize },

    #[error("pacer is already playing")]
    AlreadyPlaying,

    #[error("pacer has been destroyed")]
    Destroyed,

    #[error("configuration parse error: {0}")]
    ConfigParse(String),

    #[error("content contains no readable words: {0}")]
    EmptyContent(String),

    #[error("rendered words are not laid out yet")]
    LayoutPending,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FlowError {
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::SpeedOutOfRange(_)
            | Self::FocusWidthOutOfRange(_)
            | Self::ScrollLevelOutOfRange(_)
            | Self::FontSizeOutOfRange(_)
            | Self::InvalidPauseMultiplier(_)
            | Self::SeekOutOfRange { .. }
            | Self::AlreadyPlaying
            | Self::Destroyed
            | Self::ConfigParse(_) => FaultKind::Configuration,
            Self::EmptyContent(_) => FaultKind::Content,
            Self::LayoutPending => FaultKind::LayoutRace,
            Self::Io(_) => FaultKind::Io,
        }
    }
}

pub type FlowResult<T> = Result<T, FlowError>;

/// Reads a content file, rejecting files with nothing but whitespace.
pub fn load_file_safe(path: impl AsRef<Path>) -> FlowResult<String> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    if content.trim().is_empty() {
        return Err(FlowError::EmptyContent(path.display().to_string()));
    }

    Ok(content)
}
