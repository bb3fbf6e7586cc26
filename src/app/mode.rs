#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Reading,
    Paused,
    /// The pacer ran off the end of the content.
    Finished,
    Quit,
}

impl AppMode {
    pub fn label(self) -> &'static str {
        match self {
            AppMode::Reading => "reading",
            AppMode::Paused => "paused",
            AppMode::Finished => "finished",
            AppMode::Quit => "quit",
        }
    }
}
