//! Key handling for both views

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::*;

impl App {
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.current_view {
            View::Selector if self.is_filtering => self.handle_filter_key(key.code),
            View::Selector => self.handle_selector_key(key.code),
            View::Execution => self.handle_execution_key(key.code),
        }
    }

    fn handle_filter_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.clear_filter(),
            KeyCode::Enter => {
                self.is_filtering = false;
                self.start_selected();
            }
            KeyCode::Down => self.select_next(),
            KeyCode::Up => self.select_previous(),
            KeyCode::Backspace => self.pop_filter_char(),
            KeyCode::Char(c) => self.push_filter_char(c),
            _ => {}
        }
    }

    fn handle_selector_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Char('/') => self.start_filtering(),
            KeyCode::Esc => self.clear_filter(),
            KeyCode::Enter => self.start_selected(),
            KeyCode::Char('R') => self.reload_workflows(),
            _ => {}
        }
    }

    fn handle_execution_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Right | KeyCode::Char('l') => {
                self.next_step()
            }
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Left | KeyCode::Char('h') => {
                self.previous_step()
            }
            KeyCode::Char(' ') => self.toggle_current_step(),
            KeyCode::Char('o') => self.open_current_link(),
            KeyCode::Char('x') => self.run_current_command(),
            KeyCode::Char('r') => self.reset_workflow(),
            KeyCode::Esc | KeyCode::Char('b') => self.pause_workflow(),
            KeyCode::Enter => self.confirm_step(),
            _ => {}
        }
    }
}
