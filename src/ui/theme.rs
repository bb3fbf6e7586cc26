use ratatui::style::{Color, Modifier, Style};

/// Reader colors. Passed to the view functions; there is no global theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub dimmed: Color,
    /// Words inside the focus window.
    pub active: Color,
    /// Background of the focus indicator.
    pub focus: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::midnight()
    }
}

impl Theme {
    pub fn midnight() -> Self {
        Self {
            background: Color::Rgb(26, 27, 38), // #1A1B26
            text: Color::Rgb(100, 110, 150),    // #646E96
            dimmed: Color::Rgb(65, 72, 104),    // #414868
            active: Color::Rgb(192, 202, 245),  // #C0CAF5
            focus: Color::Rgb(41, 46, 66),      // #292E42
        }
    }

    pub fn word(&self, active: bool, in_focus: bool, emphasized: bool) -> Style {
        let mut style = Style::default().fg(if active { self.active } else { self.text });
        style = style.bg(if in_focus { self.focus } else { self.background });
        if emphasized {
            style = style.add_modifier(Modifier::BOLD);
        }
        style
    }

    pub fn gap(&self, in_focus: bool) -> Style {
        Style::default().bg(if in_focus { self.focus } else { self.background })
    }
}
