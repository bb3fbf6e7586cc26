use crate::app::{App, AppEvent, AppMode};
use crate::engine::scheduler::{Clock, FrameScheduler};
use crate::ui::layout::TerminalSurface;
use crate::ui::terminal_guard::TerminalGuard;
use crate::ui::theme::Theme;
use crate::ui::view::{render_progress_bar, render_status, render_text};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::info;

pub struct TuiManager {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    surface: TerminalSurface,
    theme: Theme,
    _guard: TerminalGuard,
}

impl TuiManager {
    pub fn new() -> Result<Self, io::Error> {
        let guard = TerminalGuard::new()?;
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;

        Ok(TuiManager {
            terminal,
            surface: TerminalSurface::new(),
            theme: Theme::default(),
            _guard: guard,
        })
    }

    /// One iteration per display frame: input, scheduler frame, then draw.
    pub fn run_event_loop(
        &mut self,
        app: &mut App,
        scheduler: &FrameScheduler,
        clock: &dyn Clock,
    ) -> io::Result<()> {
        let frame_budget = Duration::from_millis(1000 / 60);

        loop {
            if app.mode() == AppMode::Quit {
                info!("Reader closed");
                return Ok(());
            }

            if event::poll(frame_budget)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        app.handle_event(AppEvent::from_key(key));
                    }
                    Event::Resize(_, _) => app.handle_event(AppEvent::Resize),
                    _ => {}
                }
            }

            scheduler.run_frame(clock.now_ms());
            app.sync();
            self.render_frame(app)?;
        }
    }

    pub fn render_frame(&mut self, app: &mut App) -> io::Result<()> {
        let surface = &mut self.surface;
        let theme = self.theme;

        self.terminal.draw(|frame| {
            let [text_area, progress_area, status_area] = Layout::vertical([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(frame.area());

            let store = app.store().clone();
            let document = app.session().document();
            surface.layout(
                document.as_deref(),
                app.session().content_revision(),
                text_area.width,
                text_area.height,
                store.font_size(),
            );
            surface.follow(app.session().current_word(), store.scroll_level());
            app.session_mut().render(surface);

            if let Some(document) = &document {
                frame.render_widget(render_text(surface, document, &theme), text_area);
            }
            let state = app.get_render_state();
            frame.render_widget(
                render_progress_bar(state.progress, progress_area.width as usize, &theme),
                progress_area,
            );
            frame.render_widget(render_status(&state, &theme), status_area);
        })?;

        Ok(())
    }
}
