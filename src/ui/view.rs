use crate::app::{AppMode, RenderState};
use crate::reading::token::Document;
use crate::ui::layout::{LineItem, TerminalSurface};
use crate::ui::theme::Theme;
use ratatui::{
    layout::Alignment,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

pub fn render_text(surface: &TerminalSurface, document: &Document, theme: &Theme) -> Paragraph<'static> {
    Paragraph::new(text_lines(surface, document, theme)).style(Style::default().bg(theme.background))
}

/// Visible rows of the laid-out document with active, focus and bionic
/// styling applied.
pub fn text_lines(surface: &TerminalSurface, document: &Document, theme: &Theme) -> Vec<Line<'static>> {
    let margin = " ".repeat(surface.margin());
    let mut lines = Vec::new();

    for (row, items) in surface.visible_lines() {
        let mut spans = vec![Span::styled(margin.clone(), theme.gap(false))];
        let mut col = surface.margin();

        for item in items {
            match *item {
                LineItem::Gap => {
                    spans.push(Span::styled(" ", theme.gap(surface.in_focus(row, col))));
                    col += 1;
                }
                LineItem::Word(index) => {
                    let (Some(token), Some(placement)) =
                        (document.token(index), surface.placement(index))
                    else {
                        continue;
                    };
                    let active = surface.is_active(index);
                    let in_focus = surface.in_focus(row, placement.col);
                    for (piece, emphasized) in token.pieces() {
                        spans.push(Span::styled(
                            piece.to_string(),
                            theme.word(active, in_focus, emphasized),
                        ));
                    }
                    col = placement.col + placement.width;
                }
            }
        }
        lines.push(Line::from(spans));
    }
    lines
}

pub fn render_progress_bar(progress: (usize, usize), width: usize, theme: &Theme) -> Line<'static> {
    let (current, total) = progress;
    let ratio = if total == 0 {
        0.0
    } else {
        (current as f64 / total as f64).min(1.0)
    };

    let filled_len = (ratio * width as f64) as usize;
    let empty_len = width.saturating_sub(filled_len);

    Line::from(vec![
        Span::styled("─".repeat(filled_len), Style::default().fg(theme.active)),
        Span::styled("─".repeat(empty_len), Style::default().fg(theme.dimmed)),
    ])
}

pub fn render_status(state: &RenderState, theme: &Theme) -> Line<'static> {
    let icon = match state.mode {
        AppMode::Reading => "▶",
        AppMode::Paused => "⏸",
        AppMode::Finished => "■",
        AppMode::Quit => " ",
    };
    let (current, total) = state.progress;
    let mut text = format!(
        "{icon} {} wpm · focus {} · pause ×{:.2} · size {} · bionic {} · {current}/{total} · {}:{:02} left",
        state.speed,
        state.focus_width,
        state.pause_multiplier,
        state.font_size,
        if state.bionic { "on" } else { "off" },
        state.remaining_secs / 60,
        state.remaining_secs % 60,
    );
    if let Some(message) = &state.message {
        text.push_str(" · ");
        text.push_str(message);
    }

    Line::from(Span::styled(text, Style::default().fg(theme.text))).alignment(Alignment::Center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::highlight::HighlightRenderer;
    use crate::reading::registry::WordRegistry;
    use crate::reading::tokenizer::tokenize;
    use ratatui::style::Modifier;

    fn state() -> RenderState {
        RenderState {
            mode: AppMode::Reading,
            progress: (10, 40),
            speed: 300,
            focus_width: 2,
            pause_multiplier: 2.0,
            font_size: 3,
            bionic: false,
            remaining_secs: 75,
            message: None,
        }
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_progress_bar_fills_proportionally() {
        let theme = Theme::default();
        let bar = render_progress_bar((5, 10), 20, &theme);
        assert_eq!(bar.spans[0].content.chars().count(), 10);
        assert_eq!(bar.spans[1].content.chars().count(), 10);

        let empty = render_progress_bar((0, 0), 20, &theme);
        assert_eq!(empty.spans[0].content.chars().count(), 0);
        let done = render_progress_bar((12, 10), 20, &theme);
        assert_eq!(done.spans[1].content.chars().count(), 0);
    }

    #[test]
    fn test_status_line_contents() {
        let theme = Theme::default();
        let text = line_text(&render_status(&state(), &theme));
        assert!(text.contains("300 wpm"));
        assert!(text.contains("10/40"));
        assert!(text.contains("1:15 left"));

        let mut rejected = state();
        rejected.message = Some("nope".to_string());
        assert!(line_text(&render_status(&rejected, &theme)).ends_with("nope"));
    }

    #[test]
    fn test_text_styles_active_and_bionic_words() {
        let theme = Theme::default();
        let doc = tokenize("reading is fun", true).unwrap();
        let mut surface = TerminalSurface::new();
        surface.layout(Some(&doc), 1, 40, 5, 1);

        let mut registry = WordRegistry::new();
        registry.reset(doc.total_words());
        HighlightRenderer::new().render(&mut registry, &mut surface, 0.0, 0);

        let lines = text_lines(&surface, &doc, &theme);
        let expected = vec![Line::from(vec![
            Span::styled("", theme.gap(false)),
            Span::styled("read", theme.word(true, true, true)),
            Span::styled("ing", theme.word(true, true, false)),
            Span::styled(" ", theme.gap(false)),
            Span::styled("is", theme.word(false, false, false)),
            Span::styled(" ", theme.gap(false)),
            Span::styled("fu", theme.word(false, false, true)),
            Span::styled("n", theme.word(false, false, false)),
        ])];
        assert_eq!(lines, expected);
        assert!(theme.word(true, true, true).add_modifier.contains(Modifier::BOLD));
    }
}
