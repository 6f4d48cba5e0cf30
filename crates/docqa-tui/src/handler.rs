use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use docqa_core::Route;
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, InputMode, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(Instant::now()),
        AppEvent::Manager(event) => app.apply_manager(event),
        AppEvent::Console(event) => app.apply_console(event),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Delete confirmation takes every key until answered
    if app.manager.pending_delete().is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.manager.confirm_delete(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.manager.confirm_delete(false),
            _ => {}
        }
        return;
    }

    match (app.screen, app.input_mode) {
        (Screen::Documents, InputMode::Normal) => handle_documents_normal(app, key),
        (Screen::Documents, InputMode::Editing) => handle_path_editing(app, key),
        (Screen::Ask, InputMode::Normal) => handle_ask_normal(app, key),
        (Screen::Ask, InputMode::Editing) => handle_question_editing(app, key),
    }
}

fn handle_documents_normal(app: &mut App, key: KeyEvent) {
    // No chorded bindings here; Ctrl-U must not start an upload
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => app.documents_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.documents_nav_up(),

        // File selection
        KeyCode::Char('o') | KeyCode::Char('i') => {
            app.path_cursor = app.path_input.chars().count();
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('u') => app.manager.upload(&mut app.notices),

        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(id) = app.highlighted_document_id() {
                app.manager.request_delete(id);
            }
        }
        KeyCode::Char('r') => app.manager.load(),

        // Open the question screen on the highlighted document
        KeyCode::Char('a') | KeyCode::Enter => {
            if let Some(id) = app.highlighted_document_id() {
                let route = app.manager.ask_route(&id);
                app.navigate(route);
            }
        }
        KeyCode::Tab => app.navigate(Route::Ask { doc: None }),

        _ => {}
    }
}

fn handle_path_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.commit_path_input();
            app.input_mode = InputMode::Normal;
        }
        _ => edit_line(&mut app.path_input, &mut app.path_cursor, key),
    }
}

fn handle_ask_normal(app: &mut App, key: KeyEvent) {
    // Preview overlay swallows navigation keys while open
    if app.console.preview.is_some() {
        match key.code {
            KeyCode::Esc | KeyCode::Char('p') | KeyCode::Char('q') => {
                app.console.close_preview();
                app.preview_scroll = 0;
            }
            KeyCode::Char('j') | KeyCode::Down => app.preview_scroll = app.preview_scroll.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => app.preview_scroll = app.preview_scroll.saturating_sub(1),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => app.navigate(Route::Documents),

        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),

        KeyCode::Char('i') => {
            app.focus = FocusPane::Question;
            app.question_cursor = app.console.question.chars().count();
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('p') => {
            app.preview_scroll = 0;
            app.console.load_preview(&mut app.notices);
        }
        KeyCode::Char('r') => app.console.load_documents(),
        KeyCode::Char('e') => app.console.expand_all(),
        KeyCode::Char('E') => app.console.collapse_all(),

        // Half-page answer scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.answer_scroll = app.answer_scroll.saturating_add(10);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.answer_scroll = app.answer_scroll.saturating_sub(10);
        }

        _ => match app.focus {
            FocusPane::Documents => match key.code {
                KeyCode::Char('j') | KeyCode::Down => app.picker_nav_down(),
                KeyCode::Char('k') | KeyCode::Up => app.picker_nav_up(),
                KeyCode::Enter | KeyCode::Char('l') => app.select_picked_document(),
                _ => {}
            },
            FocusPane::Question => match key.code {
                KeyCode::Enter => app.ask(),
                KeyCode::Char('j') | KeyCode::Down => app.answer_scroll = app.answer_scroll.saturating_add(1),
                KeyCode::Char('k') | KeyCode::Up => app.answer_scroll = app.answer_scroll.saturating_sub(1),
                _ => {}
            },
            FocusPane::Sources => match key.code {
                KeyCode::Char('j') | KeyCode::Down => app.sources_nav_down(),
                KeyCode::Char('k') | KeyCode::Up => app.sources_nav_up(),
                KeyCode::Enter | KeyCode::Char(' ') => app.toggle_highlighted_source(),
                _ => {}
            },
            FocusPane::History => match key.code {
                KeyCode::Char('j') | KeyCode::Down => app.history_scroll = app.history_scroll.saturating_add(1),
                KeyCode::Char('k') | KeyCode::Up => app.history_scroll = app.history_scroll.saturating_sub(1),
                _ => {}
            },
        },
    }
}

fn handle_question_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.ask(),
        _ => edit_line(&mut app.console.question, &mut app.question_cursor, key),
    }
}

/// Single-line editing shared by the path and question inputs
fn edit_line(input: &mut String, cursor: &mut usize, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = input.chars().count();
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = input.chars().count();
            *cursor = (*cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = input.chars().count();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            input.clear();
            *cursor = 0;
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(input, *cursor);
            input.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

fn handle_paste(app: &mut App, text: &str) {
    match (app.screen, app.input_mode) {
        // The whole documents screen is the drop target
        (Screen::Documents, _) => {
            app.drop_file(text);
            app.input_mode = InputMode::Normal;
        }
        (Screen::Ask, InputMode::Editing) => {
            let flattened: String = text
                .chars()
                .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
                .collect();
            let byte_pos = char_to_byte_index(&app.console.question, app.question_cursor);
            app.console.question.insert_str(byte_pos, &flattened);
            app.question_cursor += flattened.chars().count();
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Determine which area the mouse is in (position-based scrolling)
    let in_list = app.list_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_answer = app.answer_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_sources = app.sources_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_history = app.history_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    let down = match mouse.kind {
        MouseEventKind::ScrollDown => true,
        MouseEventKind::ScrollUp => false,
        _ => return,
    };

    match app.screen {
        Screen::Documents => {
            if in_list {
                if down {
                    app.documents_nav_down();
                } else {
                    app.documents_nav_up();
                }
            }
        }
        Screen::Ask => {
            if in_list {
                if down {
                    app.picker_nav_down();
                } else {
                    app.picker_nav_up();
                }
            } else if in_answer {
                app.answer_scroll = if down {
                    app.answer_scroll.saturating_add(3)
                } else {
                    app.answer_scroll.saturating_sub(3)
                };
            } else if in_sources {
                if down {
                    app.sources_nav_down();
                } else {
                    app.sources_nav_up();
                }
            } else if in_history {
                app.history_scroll = if down {
                    app.history_scroll.saturating_add(3)
                } else {
                    app.history_scroll.saturating_sub(3)
                };
            }
        }
    }
}
