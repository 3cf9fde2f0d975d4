//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes. Network actions only start background tasks;
//! nothing here waits on the network.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use vailog_core::forms::{can_add_char, ProfileField, RegisterField};
use vailog_core::Route;

use crate::app::{App, AppState, HomeFocus, LoginFocus};

/// Direction for cycling through form fields
enum CycleDirection {
    Forward,
    Backward,
}

/// Step a focus index over `count` fields plus the submit button.
fn cycle_focus(current: usize, count: usize, direction: CycleDirection) -> usize {
    let slots = count + 1;
    match direction {
        CycleDirection::Forward => (current + 1) % slots,
        CycleDirection::Backward => (current + slots - 1) % slots,
    }
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.kind != KeyEventKind::Press {
        return Ok(false);
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    if key.code == KeyCode::F(1) {
        app.state = AppState::ShowingHelp;
        return Ok(false);
    }

    app.status_message = None;
    match app.route {
        Route::Login => handle_login_input(app, key),
        Route::Register => handle_register_input(app, key),
        Route::Home => handle_home_input(app, key),
        Route::ProfileEdit => handle_profile_input(app, key),
    }
    Ok(false)
}

fn handle_login_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                if app.login.can_submit() {
                    app.attempt_login();
                }
            }
            LoginFocus::Remember => app.login.remember = !app.login.remember,
            LoginFocus::Register => app.navigate(Route::Register),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login.email.pop();
            }
            LoginFocus::Password => {
                app.login.password.pop();
            }
            _ => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_char(&app.login.email, c) {
                    app.login.email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_char(&app.login.password, c) {
                    app.login.password.push(c);
                }
            }
            LoginFocus::Remember if c == ' ' => {
                app.login.remember = !app.login.remember;
            }
            _ => {}
        },
        _ => {}
    }
}

fn handle_register_input(app: &mut App, key: KeyEvent) {
    let count = RegisterField::ALL.len();
    let field = RegisterField::ALL.get(app.register_focus).copied();

    match key.code {
        KeyCode::Esc => app.navigate(Route::Login),
        KeyCode::Down | KeyCode::Tab => {
            app.register_focus = cycle_focus(app.register_focus, count, CycleDirection::Forward);
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.register_focus = cycle_focus(app.register_focus, count, CycleDirection::Backward);
        }
        KeyCode::Enter => match field {
            Some(_) => {
                app.register_focus = cycle_focus(app.register_focus, count, CycleDirection::Forward);
            }
            None => {
                if app.register.can_submit() {
                    app.attempt_register();
                }
            }
        },
        KeyCode::Backspace => {
            if let Some(field) = field {
                app.register.pop(field);
            }
        }
        KeyCode::Char(c) => {
            if let Some(field) = field {
                let current = app.register.value(field);
                if can_add_char(current, c) {
                    let mut text = current.to_string();
                    text.push(c);
                    app.register.set(field, text);
                }
            }
        }
        _ => {}
    }
}

fn handle_home_input(app: &mut App, key: KeyEvent) {
    if is_ctrl(&key, 'n') {
        app.new_conversation();
        return;
    }
    if is_ctrl(&key, 'p') {
        app.navigate(Route::ProfileEdit);
        return;
    }
    if is_ctrl(&key, 'l') {
        app.logout();
        return;
    }
    if key.code == KeyCode::Tab {
        app.toggle_drawer();
        return;
    }

    match app.home_focus {
        HomeFocus::History => handle_history_input(app, key),
        HomeFocus::Input => handle_chat_input(app, key),
    }
}

fn handle_history_input(app: &mut App, key: KeyEvent) {
    let max_index = app.history.len().saturating_sub(1);
    match key.code {
        KeyCode::Esc | KeyCode::Left => app.toggle_drawer(),
        KeyCode::Up | KeyCode::Char('k') => {
            app.history_selection = app.history_selection.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.history_selection = (app.history_selection + 1).min(max_index);
        }
        KeyCode::Home => app.history_selection = 0,
        KeyCode::End => app.history_selection = max_index,
        KeyCode::Enter => app.open_conversation(),
        KeyCode::Char('r') => app.load_history(),
        _ => {}
    }
}

fn handle_chat_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.state = AppState::ConfirmingQuit,
        KeyCode::Enter => match app.selected_suggestion() {
            Some(suggestion) => app.send_chat(Some(suggestion)),
            None => app.send_chat(None),
        },
        KeyCode::Up => app.cycle_suggestion(false),
        KeyCode::Down => app.cycle_suggestion(true),
        KeyCode::Backspace => {
            app.chat_input.pop();
        }
        KeyCode::Char(c) if !c.is_control() => {
            app.chat_input.push(c);
        }
        _ => {}
    }
}

fn handle_profile_input(app: &mut App, key: KeyEvent) {
    let count = ProfileField::ALL.len();
    let field = ProfileField::ALL.get(app.profile_focus).copied();

    match key.code {
        KeyCode::Esc => app.navigate(Route::Home),
        KeyCode::Down | KeyCode::Tab => {
            app.profile_focus = cycle_focus(app.profile_focus, count, CycleDirection::Forward);
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.profile_focus = cycle_focus(app.profile_focus, count, CycleDirection::Backward);
        }
        KeyCode::Enter => match field {
            Some(_) => {
                app.profile_focus = cycle_focus(app.profile_focus, count, CycleDirection::Forward);
            }
            None => {
                if app.profile.can_submit() {
                    app.save_profile();
                }
            }
        },
        KeyCode::Backspace => {
            if let Some(field) = field {
                app.profile.value_mut(field).pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(field) = field {
                if can_add_char(app.profile.value(field), c) {
                    app.profile.value_mut(field).push(c);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vailog_core::{ApiClient, Config, SessionRecord, SessionStore};

    fn app_with(session: SessionStore) -> App {
        let api = ApiClient::with_base_url("http://127.0.0.1:9", session.clone(), None)
            .expect("client");
        App::with_services(Config::default(), session, api, String::new())
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_input(app, KeyEvent::new(code, KeyModifiers::NONE)).expect("input")
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_cycle_focus() {
        assert_eq!(cycle_focus(0, 3, CycleDirection::Forward), 1);
        assert_eq!(cycle_focus(3, 3, CycleDirection::Forward), 0);
        assert_eq!(cycle_focus(0, 3, CycleDirection::Backward), 3);
    }

    #[test]
    fn test_login_typing_and_focus() {
        let mut app = app_with(SessionStore::in_memory());
        assert_eq!(app.route, Route::Login);

        type_text(&mut app, "a@b.com");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "secret1");
        press(&mut app, KeyCode::Backspace);

        assert_eq!(app.login.email, "a@b.com");
        assert_eq!(app.login.password, "secret");
        assert_eq!(app.login_focus, LoginFocus::Password);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char(' '));
        assert!(!app.login.remember);
    }

    #[test]
    fn test_login_to_register_and_back() {
        let mut app = app_with(SessionStore::in_memory());
        app.login_focus = LoginFocus::Register;
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.route, Route::Register);

        type_text(&mut app, "Ana");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.route, Route::Login);
    }

    #[test]
    fn test_register_phone_is_masked_while_typing() {
        let mut app = app_with(SessionStore::in_memory());
        app.navigate(Route::Register);
        app.register_focus = RegisterField::ALL
            .iter()
            .position(|f| *f == RegisterField::Phone)
            .expect("phone field");

        type_text(&mut app, "11987654321");
        assert_eq!(app.register.phone, "(11) 98765-4321");
        press(&mut app, KeyCode::Backspace);
        // Ten digits fall back to the landline layout
        assert_eq!(app.register.phone, "(11) 9876-5432");
    }

    #[test]
    fn test_quit_confirmation() {
        let mut app = app_with(SessionStore::in_memory());
        assert!(!press(&mut app, KeyCode::Esc));
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(!press(&mut app, KeyCode::Char('n')));
        assert_eq!(app.state, AppState::Normal);

        press(&mut app, KeyCode::Esc);
        assert!(press(&mut app, KeyCode::Char('s')));
        assert_eq!(app.state, AppState::Quitting);
    }

    #[test]
    fn test_home_shortcuts() {
        let session = SessionStore::in_memory();
        session.write(SessionRecord::new("tok", Some(serde_json::json!({"nome": "Ana Souza"}))));
        let mut app = app_with(session.clone());
        assert_eq!(app.route, Route::Home);

        // Whitespace never leaves the input as a message
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.chat.messages().len(), 1);

        handle_input(&mut app, KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL))
            .expect("input");
        assert_eq!(app.route, Route::ProfileEdit);
        assert_eq!(app.profile.name, "Ana Souza");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.route, Route::Home);

        handle_input(&mut app, KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL))
            .expect("input");
        assert_eq!(app.route, Route::Login);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_help_overlay() {
        let mut app = app_with(SessionStore::in_memory());
        press(&mut app, KeyCode::F(1));
        assert_eq!(app.state, AppState::ShowingHelp);
        // Keys do not reach the form while help is open
        press(&mut app, KeyCode::Char('x'));
        assert!(app.login.email.is_empty());
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Normal);
    }
}
