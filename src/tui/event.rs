//! Keyboard event handling for the terminal timeline.
//!
//! Maps crossterm keyboard events to application state changes. Behavior
//! depends on which panel currently has focus.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};

/// Handles a keyboard event and updates the app state accordingly.
///
/// Returns `true` if the application should quit.
///
/// - `q`: quit (from any panel)
/// - `Tab` / `Shift+Tab`: cycle panel focus
/// - `Esc`: back to the filter bar, clearing the selection
/// - Filter bar: character input narrows the timeline
/// - Story list: j/k navigation, `m` requests the next page
/// - Detail panel: j/k scrolls
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.is_empty() {
        return true;
    }

    if key.code == KeyCode::Tab {
        app.next_focus();
        return false;
    }
    if key.code == KeyCode::BackTab {
        app.prev_focus();
        return false;
    }

    if key.code == KeyCode::Esc {
        app.reset_focus();
        app.clear_selection();
        return false;
    }

    match app.focus() {
        Focus::FilterInput => handle_filter_input(app, key),
        Focus::StoryList => handle_story_list(app, key),
        Focus::DetailView => handle_detail_view(app, key),
    }

    false
}

/// Character input and backspace edit the filter buffer.
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_filter_char(c);
        }
        KeyCode::Backspace => {
            app.pop_filter_char();
        }
        _ => {}
    }
}

/// Vim-style navigation plus incremental loading.
fn handle_story_list(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_previous();
        }
        KeyCode::Char('m') => {
            app.request_load_more();
        }
        _ => {}
    }
}

/// Scrolls the detail panel.
fn handle_detail_view(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.scroll_detail_down(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.scroll_detail_up(1);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n;
    use crate::models::{Language, Story, StoryBuilder, StoryId, Theme};

    fn app() -> App {
        App::new(i18n::messages(Language::En), Theme::Light)
    }

    fn story(id: i64, title: &str) -> Story {
        StoryBuilder::new()
            .id(StoryId::new(id))
            .title(title)
            .happened_at(id)
            .build()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn quit_key_triggers_shutdown_from_any_focus() {
        let mut app = app();
        assert!(handle_key_event(&mut app, key(KeyCode::Char('q'))));

        let mut app = self::app();
        app.next_focus();
        assert!(handle_key_event(&mut app, key(KeyCode::Char('q'))));

        let mut app = self::app();
        app.next_focus();
        app.next_focus();
        assert!(handle_key_event(&mut app, key(KeyCode::Char('q'))));
    }

    #[test]
    fn tab_cycles_focus_without_quitting() {
        let mut app = app();
        assert!(!handle_key_event(&mut app, key(KeyCode::Tab)));
        assert_eq!(app.focus(), Focus::StoryList);
        assert!(!handle_key_event(&mut app, key(KeyCode::Tab)));
        assert_eq!(app.focus(), Focus::DetailView);
        assert!(!handle_key_event(&mut app, key(KeyCode::BackTab)));
        assert_eq!(app.focus(), Focus::StoryList);
    }

    #[test]
    fn typing_in_filter_updates_buffer() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('h')));
        handle_key_event(&mut app, key(KeyCode::Char('i')));
        assert_eq!(app.filter_input(), "hi");

        handle_key_event(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.filter_input(), "h");
    }

    #[test]
    fn j_and_k_navigate_the_story_list() {
        let mut app = app();
        app.apply_page(vec![story(1, "a"), story(2, "b")]);
        app.next_focus(); // -> StoryList, auto-selects first

        handle_key_event(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.selected_index(), Some(1));
        handle_key_event(&mut app, key(KeyCode::Char('k')));
        assert_eq!(app.selected_index(), Some(0));
    }

    #[test]
    fn m_requests_next_page_when_more_remain() {
        let mut app = app();
        app.apply_page(vec![story(1, "a")]);
        app.set_total_count(10);
        app.next_focus();

        handle_key_event(&mut app, key(KeyCode::Char('m')));
        assert!(app.take_load_more_request());
    }

    #[test]
    fn escape_returns_to_filter_and_clears_selection() {
        let mut app = app();
        app.apply_page(vec![story(1, "a")]);
        app.next_focus();
        assert!(app.selected_index().is_some());

        handle_key_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.focus(), Focus::FilterInput);
        assert_eq!(app.selected_index(), None);
    }

    #[test]
    fn m_in_filter_input_is_text_not_load_more() {
        let mut app = app();
        app.apply_page(vec![story(1, "a")]);
        app.set_total_count(10);

        handle_key_event(&mut app, key(KeyCode::Char('m')));
        assert_eq!(app.filter_input(), "m");
        assert!(!app.take_load_more_request());
    }
}
