pub mod layout;
pub mod terminal;
pub mod terminal_guard;
pub mod theme;
pub mod view;

pub use layout::TerminalSurface;
pub use terminal::TuiManager;
pub use terminal_guard::TerminalGuard;
pub use theme::Theme;
