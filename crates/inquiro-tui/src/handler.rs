use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use inquiro_core::Route;
use std::time::Instant;

use crate::app::{App, FormField, InputMode, Tab};
use crate::input::TextInput;
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.poll_tasks().await;
            app.tick(Instant::now());
        }
        AppEvent::Session(event) => app.handle_session_event(event),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.route() {
        Route::Login | Route::Register => handle_form(app, key),
        Route::Dashboard => match app.input_mode {
            InputMode::Normal => handle_dashboard_normal(app, key),
            InputMode::Editing => handle_dashboard_editing(app, key),
        },
        Route::Root => app.sync_route(),
    }
}

fn form_fields(route: Route) -> &'static [FormField] {
    match route {
        Route::Register => &[FormField::Username, FormField::Email, FormField::Password],
        _ => &[FormField::Username, FormField::Password],
    }
}

fn step_field(app: &mut App, step: isize) {
    let fields = form_fields(app.route());
    let current = fields.iter().position(|f| *f == app.form_field).unwrap_or(0) as isize;
    let next = (current + step).rem_euclid(fields.len() as isize) as usize;
    app.form_field = fields[next];
}

fn handle_form(app: &mut App, key: KeyEvent) {
    let on_register = app.route() == Route::Register;
    match key.code {
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) && !on_register => {
            app.navigate(Route::Register);
        }
        KeyCode::Esc if on_register => app.back(),
        KeyCode::Tab | KeyCode::Down => step_field(app, 1),
        KeyCode::BackTab | KeyCode::Up => step_field(app, -1),
        KeyCode::Enter => {
            if on_register {
                app.submit_register();
            } else {
                app.submit_login();
            }
        }
        _ => {
            let field = match app.form_field {
                FormField::Username => &mut app.username,
                FormField::Email => &mut app.email,
                FormField::Password => &mut app.password,
            };
            edit_input(field, key);
        }
    }
}

fn handle_dashboard_normal(app: &mut App, key: KeyEvent) {
    // Keys shared by every tab
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('L') => {
            app.logout();
            return;
        }
        KeyCode::Char(c @ '1'..='5') => {
            let idx = c as usize - '1' as usize;
            app.tab = Tab::ALL[idx];
            return;
        }
        KeyCode::Tab => {
            app.tab = app.tab.next();
            return;
        }
        KeyCode::BackTab => {
            app.tab = app.tab.previous();
            return;
        }
        KeyCode::Char('r') => {
            app.refresh_documents();
            return;
        }
        KeyCode::Char(']') => {
            app.documents.cycle(1);
            return;
        }
        KeyCode::Char('[') => {
            app.documents.cycle(-1);
            return;
        }
        KeyCode::Esc => {
            app.notification.dismiss();
            return;
        }
        _ => {}
    }

    match app.tab {
        Tab::Upload => match key.code {
            KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
            KeyCode::Char('u') => app.upload(),
            _ => {}
        },
        Tab::Chat => match key.code {
            KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
            KeyCode::Char('j') | KeyCode::Down => {
                app.chat_scroll = app.chat_scroll.saturating_add(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                app.chat_scroll = app.chat_scroll.saturating_sub(1);
            }
            _ => {}
        },
        Tab::Flashcards => match key.code {
            KeyCode::Char('g') => app.generate_flashcards(),
            KeyCode::Char('f') => app.load_saved_flashcards(),
            KeyCode::Char('c') => app.input_mode = InputMode::Editing,
            KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_flashcard_count(1),
            KeyCode::Char('-') => app.adjust_flashcard_count(-1),
            KeyCode::Char(' ') | KeyCode::Enter => app.flip_card(),
            KeyCode::Char('n') | KeyCode::Char('l') | KeyCode::Right => app.deck.next(),
            KeyCode::Char('p') | KeyCode::Char('h') | KeyCode::Left => app.deck.previous(),
            _ => {}
        },
        Tab::Documents => match key.code {
            KeyCode::Char('j') | KeyCode::Down => app.documents.cycle(1),
            KeyCode::Char('k') | KeyCode::Up => app.documents.cycle(-1),
            KeyCode::Enter => app.tab = Tab::Chat,
            _ => {}
        },
        Tab::Analytics => {}
    }
}

fn handle_dashboard_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            match app.tab {
                Tab::Upload => app.upload(),
                Tab::Chat => app.ask(),
                Tab::Flashcards => app.generate_flashcards(),
                Tab::Documents | Tab::Analytics => {}
            }
        }
        _ => {
            let input = match app.tab {
                Tab::Upload => &mut app.upload_path,
                Tab::Chat => &mut app.question,
                Tab::Flashcards => {
                    // Count field takes digits only
                    if let KeyCode::Char(c) = key.code {
                        if !c.is_ascii_digit() {
                            return;
                        }
                    }
                    &mut app.flashcard_count
                }
                Tab::Documents | Tab::Analytics => {
                    app.input_mode = InputMode::Normal;
                    return;
                }
            };
            edit_input(input, key);
        }
    }
}

fn edit_input(input: &mut TextInput, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.left(),
        KeyCode::Right => input.right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => input.clear(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert(c),
        _ => {}
    }
}
