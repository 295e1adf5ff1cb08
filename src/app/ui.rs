//! Terminal UI rendering — layout, status bar, conversation and activity
//! panels.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::App;

impl App {
    /// Render the full TUI frame: status bar, conversation, activity log,
    /// and input prompt.
    pub fn draw(&mut self, frame: &mut Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(frame.area());

        // ── Status bar ───────────────────────────────────────────────
        let (state_label, turns) = self.session_status();
        let header_line = Line::from(vec![
            Span::styled("Agent: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                self.active_agent.clone(),
                Style::default().fg(Color::Magenta),
            ),
            Span::styled("  Model: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{} ({})", self.provider.model, self.provider.credential),
                Style::default().fg(Color::Green),
            ),
            Span::styled("  Session: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{} {state_label}", self.session_id),
                Style::default().fg(self.state_color()),
            ),
            Span::styled(
                format!(
                    "  Transcript: {}",
                    turns.map_or_else(|| "…".to_string(), |n| n.to_string())
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(header_line), chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(chunks[1]);

        // ── Conversation ─────────────────────────────────────────────
        let inner_width = body[0].width.saturating_sub(2);
        let inner_height = body[0].height.saturating_sub(2) as usize;

        let chat_paragraph = Paragraph::new(Text::from(
            self.conversation.render(&self.handler.agent().name),
        ))
        .wrap(Wrap { trim: false });

        let total_visual = chat_paragraph.line_count(inner_width);
        let max_scroll = total_visual.saturating_sub(inner_height);

        // Clamp scroll_offset (lines from the bottom) to valid range.
        if (self.scroll_offset as usize) > max_scroll {
            self.scroll_offset = max_scroll as u16;
        }
        let top_row = max_scroll.saturating_sub(self.scroll_offset as usize) as u16;

        let title = if self.scroll_offset > 0 {
            format!(" Conversation [↑{}] ", self.scroll_offset)
        } else {
            " Conversation ".to_string()
        };
        let chat_panel = chat_paragraph
            .block(Block::default().borders(Borders::ALL).title(title))
            .scroll((top_row, 0));
        frame.render_widget(chat_panel, body[0]);

        // ── Activity log ─────────────────────────────────────────────
        let log_width = body[1].width.saturating_sub(2);
        let log_height = body[1].height.saturating_sub(2) as usize;
        let log_lines: Vec<Line> = self.logs.iter().map(|l| l.render()).collect();
        let log_paragraph = Paragraph::new(Text::from(log_lines)).wrap(Wrap { trim: true });
        let log_top = log_paragraph
            .line_count(log_width)
            .saturating_sub(log_height) as u16;
        let log_panel = log_paragraph
            .block(Block::default().borders(Borders::ALL).title(" Activity "))
            .scroll((log_top, 0));
        frame.render_widget(log_panel, body[1]);

        // ── Input prompt ─────────────────────────────────────────────
        let prompt_title = if self.is_busy() {
            "Message (waiting for reply…)"
        } else {
            "Message"
        };
        let input_panel = Paragraph::new(self.input.as_str())
            .block(Block::default().borders(Borders::ALL).title(prompt_title));
        frame.render_widget(input_panel, chunks[2]);

        let input_width = chunks[2].width.saturating_sub(2) as usize;
        let cursor = self.cursor.min(input_width);
        frame.set_cursor_position(Position::new(
            chunks[2].x + 1 + cursor as u16,
            chunks[2].y + 1,
        ));
    }

    // ── Status-bar helpers ───────────────────────────────────────────

    /// Turn-state label and transcript length of the current session.
    ///
    /// While a turn is running the session is locked by its task.
    pub(crate) fn session_status(&self) -> (String, Option<usize>) {
        match self.session.try_lock() {
            Ok(session) => (
                session.state.label().to_string(),
                Some(session.transcript.len()),
            ),
            Err(_) => ("busy".to_string(), None),
        }
    }

    fn state_color(&self) -> Color {
        match self.session.try_lock() {
            Ok(session) if !session.state.is_busy() => Color::Cyan,
            _ => Color::Yellow,
        }
    }
}
