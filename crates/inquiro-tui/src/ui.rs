use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use inquiro_core::analytics::format_elapsed;
use inquiro_core::{Route, Sender, Severity, MAX_FLASHCARDS, MIN_FLASHCARDS};
use std::time::Instant;

use crate::app::{App, FormField, InputMode, Tab};
use crate::input::TextInput;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.route() {
        Route::Login => render_login(app, frame, body_area),
        Route::Register => render_register(app, frame, body_area),
        Route::Dashboard => render_dashboard(app, frame, body_area),
        Route::Root => {}
    }

    render_footer(app, frame, footer_area);

    if app.notification.visible {
        render_notification(app, frame, body_area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let session = if app.is_authenticated() {
        Span::styled(" signed in ", Style::default().fg(Color::Green))
    } else {
        Span::styled(" signed out ", Style::default().fg(Color::Gray))
    };

    let title = Line::from(vec![
        Span::styled(" InquiroAI Learning Assistant ", Style::default().fg(Color::Cyan).bold()),
        session,
        Span::styled(
            format!("{} ", app.api.client().base_url()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.route() {
        Route::Login => " LOGIN ",
        Route::Register => " REGISTER ",
        Route::Dashboard if app.input_mode == InputMode::Editing => " EDIT ",
        Route::Dashboard => " DASHBOARD ",
        Route::Root => " ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: Vec<(&str, &str)> = match (app.route(), app.input_mode, app.tab) {
        (Route::Login, _, _) => vec![
            ("Tab", "field"),
            ("Enter", "login"),
            ("Ctrl+R", "register"),
            ("Ctrl+C", "quit"),
        ],
        (Route::Register, _, _) => vec![
            ("Tab", "field"),
            ("Enter", "register"),
            ("Esc", "back"),
            ("Ctrl+C", "quit"),
        ],
        (Route::Dashboard, InputMode::Editing, _) => vec![
            ("Enter", "submit"),
            ("Esc", "cancel"),
            ("Ctrl+U", "clear"),
        ],
        (Route::Dashboard, InputMode::Normal, tab) => {
            let mut pairs = match tab {
                Tab::Upload => vec![("i", "path"), ("u", "upload")],
                Tab::Chat => vec![("i", "ask"), ("j/k", "scroll")],
                Tab::Flashcards => vec![
                    ("g", "generate"),
                    ("f", "saved"),
                    ("c/+/-", "count"),
                    ("Space", "flip"),
                    ("n/p", "card"),
                ],
                Tab::Documents => vec![("j/k", "select"), ("Enter", "chat")],
                Tab::Analytics => vec![],
            };
            pairs.extend([
                ("1-5", "tab"),
                ("[/]", "doc"),
                ("r", "refresh"),
                ("L", "logout"),
                ("q", "quit"),
            ]);
            pairs
        }
        (Route::Root, _, _) => vec![],
    };

    let mut hints = vec![Span::styled(mode_text, mode_style)];
    for (key, label) in pairs {
        hints.push(Span::styled(format!(" {} ", key), key_style));
        hints.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Bordered single-line input. Places the cursor when `focused`.
fn render_input(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    input: &TextInput,
    focused: bool,
    masked: bool,
) {
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", title));

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible, cursor_col) = input.visible(inner_width);
    let text = if masked {
        "*".repeat(visible.chars().count())
    } else {
        visible
    };

    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(paragraph, area);

    if focused {
        frame.set_cursor_position((area.x + 1 + cursor_col as u16, area.y + 1));
    }
}

fn spinner_text(app: &App, label: &str) -> String {
    let dots = ".".repeat((app.animation_frame as usize) + 1);
    format!("{}{}", label, dots)
}

fn render_login(app: &App, frame: &mut Frame, area: Rect) {
    let popup = centered(area, 56, 12);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Log in ");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [user_area, pass_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(1),
    ])
    .areas(inner);

    let focus = app.form_field;
    render_input(frame, user_area, "Username", &app.username, focus == FormField::Username, false);
    render_input(frame, pass_area, "Password", &app.password, focus == FormField::Password, true);

    let status = if app.login_task.is_busy() {
        Span::styled(spinner_text(app, "Logging in"), Style::default().fg(Color::Yellow))
    } else {
        Span::styled(
            "No account yet? Press Ctrl+R to register.",
            Style::default().fg(Color::DarkGray),
        )
    };
    frame.render_widget(Paragraph::new(Line::from(status)), status_area);
}

fn render_register(app: &App, frame: &mut Frame, area: Rect) {
    let popup = centered(area, 56, 15);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Create an account ");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [user_area, email_area, pass_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(1),
    ])
    .areas(inner);

    let focus = app.form_field;
    render_input(frame, user_area, "Username", &app.username, focus == FormField::Username, false);
    render_input(frame, email_area, "Email", &app.email, focus == FormField::Email, false);
    render_input(frame, pass_area, "Password", &app.password, focus == FormField::Password, true);

    if app.register_task.is_busy() {
        let status = Span::styled(
            spinner_text(app, "Registering"),
            Style::default().fg(Color::Yellow),
        );
        frame.render_widget(Paragraph::new(Line::from(status)), status_area);
    }
}

fn render_dashboard(app: &mut App, frame: &mut Frame, area: Rect) {
    let [tabs_area, doc_area, content_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!("{} {}", i + 1, tab.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, tabs_area);

    let doc_line = match (app.documents.selected(), app.documents.selected_index()) {
        (Some(doc), Some(idx)) => Line::from(vec![
            Span::styled(" Document: ", Style::default().fg(Color::DarkGray)),
            Span::styled(doc.title.clone(), Style::default().fg(Color::Yellow)),
            Span::styled(
                format!(" ({}/{})", idx + 1, app.documents.documents().len()),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        _ if app.documents_task.is_busy() => Line::from(Span::styled(
            spinner_text(app, " Loading documents"),
            Style::default().fg(Color::DarkGray),
        )),
        _ => Line::from(Span::styled(
            " No document selected",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(doc_line), doc_area);

    match app.tab {
        Tab::Upload => render_upload(app, frame, content_area),
        Tab::Chat => render_chat(app, frame, content_area),
        Tab::Flashcards => render_flashcards(app, frame, content_area),
        Tab::Documents => render_documents(app, frame, content_area),
        Tab::Analytics => render_analytics(app, frame, content_area),
    }
}

fn render_upload(app: &App, frame: &mut Frame, area: Rect) {
    let [input_area, status_area, _] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(2),
        Constraint::Min(0),
    ])
    .areas(area);

    render_input(
        frame,
        input_area,
        "File path (PDF)",
        &app.upload_path,
        app.input_mode == InputMode::Editing,
        false,
    );

    let status = if app.upload_task.is_busy() {
        Span::styled(spinner_text(app, "Uploading"), Style::default().fg(Color::Yellow))
    } else {
        Span::styled(
            "Type a path with 'i', then press Enter or 'u' to upload.",
            Style::default().fg(Color::DarkGray),
        )
    };
    frame.render_widget(Paragraph::new(Line::from(status)), status_area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(3),
    ])
    .areas(area);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" AI Assistant ");

    let loading = app.query_task.is_busy();
    let chat_text = if app.chat.is_empty() && !loading {
        Text::from(Span::styled(
            "Ask a question about the selected document...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in app.chat.messages() {
            let (label, color) = match msg.sender {
                Sender::User => ("You:", Color::Cyan),
                Sender::Bot => ("AI:", Color::Yellow),
            };
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            for line in msg.text.lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::default());
        }

        if loading {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                spinner_text(app, "Thinking"),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    // Keep the scroll inside the content
    let max_scroll =
        (chat_text.lines.len() as u16).saturating_sub(chat_area.height.saturating_sub(2));
    app.chat_scroll = app.chat_scroll.min(max_scroll);

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(
        frame,
        input_area,
        "Question",
        &app.question,
        app.input_mode == InputMode::Editing,
        false,
    );
}

fn render_flashcards(app: &App, frame: &mut Frame, area: Rect) {
    let [controls_area, card_area, position_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .areas(area);

    let [count_area, status_area] = Layout::horizontal([
        Constraint::Length(24),
        Constraint::Min(0),
    ])
    .areas(controls_area);

    render_input(
        frame,
        count_area,
        &format!("Cards ({}-{})", MIN_FLASHCARDS, MAX_FLASHCARDS),
        &app.flashcard_count,
        app.input_mode == InputMode::Editing,
        false,
    );

    let status = if app.generate_task.is_busy() {
        Span::styled(spinner_text(app, " Generating"), Style::default().fg(Color::Yellow))
    } else if app.saved_cards_task.is_busy() {
        Span::styled(spinner_text(app, " Loading saved cards"), Style::default().fg(Color::Yellow))
    } else {
        Span::raw("")
    };
    frame.render_widget(
        Paragraph::new(Line::from(status)),
        Rect::new(status_area.x, status_area.y + 1, status_area.width, 1),
    );

    let (title, color) = if app.deck.is_flipped() {
        (" Answer ", Color::Green)
    } else {
        (" Question ", Color::Cyan)
    };
    let card_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title);

    let face = match app.deck.face() {
        Some(text) => Paragraph::new(text.to_string()).style(Style::default().fg(color)),
        None => Paragraph::new(
            "No flashcards yet. Press 'g' to generate or 'f' to load saved ones.",
        )
        .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(face.block(card_block).wrap(Wrap { trim: true }), card_area);

    if let Some((current, total)) = app.deck.position() {
        let position = Paragraph::new(format!(" Card {} of {}", current, total))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(position, position_area);
    }
}

fn render_documents(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Documents ({}) ", app.documents.documents().len()));

    if app.documents.is_empty() {
        let text = if app.documents_task.is_busy() {
            spinner_text(app, "Loading")
        } else {
            "No documents uploaded yet.".to_string()
        };
        let empty = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .documents
        .documents()
        .iter()
        .map(|doc| ListItem::new(doc.title.clone()))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.documents.selected_index());
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_analytics(app: &App, frame: &mut Frame, area: Rect) {
    let stats = &app.stats;
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let answer_rate = stats
        .answer_rate()
        .map(|rate| format!("{}%", rate))
        .unwrap_or_else(|| "-".to_string());

    let rows = [
        ("Documents", stats.documents.to_string()),
        ("Uploaded this session", stats.uploads.to_string()),
        ("Questions asked", stats.questions_asked.to_string()),
        ("Answered", answer_rate),
        ("Flashcards generated", stats.flashcards_generated.to_string()),
        ("Cards reviewed", stats.cards_reviewed.to_string()),
        ("Time studied", format_elapsed(stats.elapsed(Instant::now()))),
    ];

    let lines: Vec<Line> = rows
        .into_iter()
        .map(|(name, v)| {
            Line::from(vec![
                Span::styled(format!("{:<24}", name), label),
                Span::styled(v, value),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Study session ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_notification(app: &App, frame: &mut Frame, area: Rect) {
    let color = match app.notification.severity {
        Severity::Info => Color::Blue,
        Severity::Success => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    };

    let width = (app.notification.message.chars().count() as u16 + 4)
        .min(area.width.saturating_sub(2))
        .max(20.min(area.width));
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + area.height.saturating_sub(4),
        width,
        3.min(area.height),
    );

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let text = Paragraph::new(app.notification.message.clone())
        .style(Style::default().fg(color))
        .block(block);
    frame.render_widget(text, popup);
}
