use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use askbox_core::Role;
use crate::app::App;
use crate::markdown::markdown_to_lines;

const SEND_WIDTH: u16 = 10;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input row, footer
    let [header_area, chat_area, input_row, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    let [input_area, send_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(SEND_WIDTH),
    ])
    .areas(input_row);

    // Store areas for mouse hit-testing
    app.chat_area = Some(chat_area);
    app.input_area = Some(input_area);
    app.send_area = Some(send_area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_send_button(app, frame, send_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" askbox ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            app.controller.client().endpoint().to_string(),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

/// Build the transcript, one block per message
fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.controller.transcript().iter() {
        match msg.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                // User text is shown as typed, never formatted
                for line in msg.text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            Role::Bot => {
                lines.push(Line::from(Span::styled(
                    "Bot:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.extend(markdown_to_lines(&msg.text));
            }
            Role::Error => {
                lines.push(Line::from(Span::styled(
                    msg.text.clone(),
                    Style::default().fg(Color::Red),
                )));
            }
        }
        lines.push(Line::default());
    }

    if let Some(loading) = app.controller.loading() {
        lines.push(Line::from(Span::styled(
            format!("{}{}", loading.text, app.spinner()),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let border_color = if app.controller.input_focused() { Color::DarkGray } else { Color::Cyan };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chat ");

    // Inner size minus borders
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let lines = transcript_lines(app);
    if lines.is_empty() {
        let placeholder = Paragraph::new(Text::from(Span::styled(
            "Ask a question about IPL statistics...",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    // Count rows with the same word wrapping the widget draws with
    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
    let total = chat.line_count(app.chat_width).min(u16::MAX as usize) as u16;
    let max_scroll = total.saturating_sub(app.chat_height);

    // Follow the newest message whenever the transcript changes
    if app.seen_revision != app.controller.revision() {
        app.seen_revision = app.controller.revision();
        app.chat_scroll = max_scroll;
    }
    app.chat_scroll = app.chat_scroll.min(max_scroll);

    let chat = chat.block(block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    if max_scroll > 0 {
        let mut scrollbar_state = ScrollbarState::new(max_scroll as usize)
            .position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.controller.input_focused();
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Ask ");

    let input = app.controller.input();
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = input.cursor();

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = input
        .text()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let paragraph = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(paragraph, area);

    if focused && inner_width > 0 {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_send_button(app: &App, frame: &mut Frame, area: Rect) {
    let (label_style, border_color) = if app.controller.send_enabled() {
        (Style::default().fg(Color::Green).add_modifier(Modifier::BOLD), Color::Green)
    } else {
        (Style::default().fg(Color::DarkGray), Color::DarkGray)
    };

    let button = Paragraph::new(Span::styled("Send", label_style))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color)),
        );
    frame.render_widget(button, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (status, status_style) = if app.controller.is_sending() {
        (" SENDING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let hints = "Enter send  PgUp/PgDn scroll  Esc quit";
    let footer = Line::from(vec![
        Span::styled(status, status_style),
        Span::raw(" "),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use askbox_core::{AskClient, ChatController, ControllerSettings};
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    async fn app_answering(body: serde_json::Value) -> (MockServer, App) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        let client = AskClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let app = App::new(ChatController::new(client, ControllerSettings::default()));
        (server, app)
    }

    #[tokio::test]
    async fn test_bot_markdown_rendered_without_asterisks() {
        let (_server, mut app) = app_answering(json!({ "answer": "Hello **world**" })).await;
        app.controller.input_mut().insert_str("greet me");
        app.submit();
        app.controller.settle().await;

        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let text = screen(&terminal);

        assert!(text.contains("greet me"));
        assert!(text.contains("Hello world"));
        assert!(!text.contains("**"));
    }

    #[tokio::test]
    async fn test_loading_indicator_shown_while_sending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "answer": "done" }))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        let client = AskClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let mut app = App::new(ChatController::new(client, ControllerSettings {
            loading_text: "Fetching".to_string(),
        }));

        app.controller.input_mut().insert_str("slow");
        app.submit();

        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("Fetching"));
        assert!(text.contains("SENDING"));

        app.controller.settle().await;
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let text = screen(&terminal);
        assert!(!text.contains("Fetching"));
        assert!(text.contains("READY"));
        assert!(text.contains("done"));
    }

    #[tokio::test]
    async fn test_user_text_is_not_formatted() {
        let (_server, mut app) = app_answering(json!({})).await;
        app.controller.input_mut().insert_str("what is **this**");
        app.submit();
        app.controller.settle().await;

        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("what is **this**"));
        assert!(text.contains("Sorry, I could not find that information."));
    }

    #[tokio::test]
    async fn test_long_wrapped_answer_tail_is_visible() {
        let answer = concat!(
            "aaaaaa bbbbbb cccccc dddddd eeeeee ffffff ",
            "gggggg hhhhhh iiiiii jjjjjj kkkkkk LASTWORD",
        );
        let (_server, mut app) = app_answering(json!({ "answer": answer })).await;
        app.controller.input_mut().insert_str("q");
        app.submit();
        app.controller.settle().await;

        let mut terminal = Terminal::new(TestBackend::new(14, 10)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(screen(&terminal).contains("LASTWORD"));

        // Scrolling past the end stays pinned to the last rows
        app.scroll_down(50);
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("LASTWORD"));
        assert!(text.contains("kkkkkk"));

        // and the top is still reachable
        app.scroll_up(50);
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(screen(&terminal).contains("You:"));
    }
}
