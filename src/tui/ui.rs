//! Rendering for the terminal timeline.
//!
//! Three-panel layout: filter bar on top, story list and detail panel
//! side by side, shortcut bar at the bottom. Everything rendered here is
//! read through the app's caches, never from the database.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use time::OffsetDateTime;
use time::macros::format_description;

use super::app::{App, Focus};
use crate::models::{Story, Theme};

/// Main rendering function.
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Filter bar
            Constraint::Min(0),    // Content area
            Constraint::Length(1), // Shortcut bar
        ])
        .split(size);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40), // Story list
            Constraint::Percentage(60), // Detail panel
        ])
        .split(main_chunks[1]);

    render_filter_bar(frame, app, main_chunks[0]);
    render_story_list(frame, app, content_chunks[0]);
    render_detail_view(frame, app, content_chunks[1]);
    render_shortcut_bar(frame, app, main_chunks[2]);
}

/// Accent color for the focused panel border, per the stored theme.
fn accent(theme: Theme) -> Color {
    match theme {
        Theme::Light => Color::Blue,
        Theme::Dark => Color::Cyan,
    }
}

/// Background for the selected list row, per the stored theme.
fn highlight_style(theme: Theme) -> Style {
    let bg = match theme {
        Theme::Light => Color::Gray,
        Theme::Dark => Color::DarkGray,
    };
    Style::default().bg(bg).add_modifier(Modifier::REVERSED)
}

fn border_style(focused: bool, theme: Theme) -> Style {
    if focused {
        Style::default().fg(accent(theme))
    } else {
        Style::default()
    }
}

/// Formats Unix milliseconds as YYYY-MM-DD for the list rows.
fn format_day(ms: i64) -> String {
    let format = format_description!("[year]-[month]-[day]");
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .ok()
        .and_then(|t| t.format(format).ok())
        .unwrap_or_else(|| "????-??-??".to_string())
}

/// Renders the filter bar with a cursor indicator when focused.
fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = matches!(app.focus(), Focus::FilterInput);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.messages().filter)
        .border_style(border_style(is_focused, app.theme()));

    let mut content = app.filter_input().to_string();
    if is_focused {
        content.push('█');
    }

    frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Renders the story list: one row per loaded story, date then title,
/// with a load progress indicator in the panel title.
fn render_story_list(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = matches!(app.focus(), Focus::StoryList);

    let title = format!(
        "{} ({}/{})",
        app.messages().timeline,
        app.loaded_count(),
        app.total_count()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style(is_focused, app.theme()));

    let items: Vec<ListItem> = app
        .visible_stories()
        .into_iter()
        .map(|story| story_row(app, story))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style(app.theme()));

    let mut list_state = ListState::default();
    list_state.select(app.selected_index());

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn story_row(app: &App, story: &Story) -> ListItem<'static> {
    let mut spans = vec![
        Span::styled(
            format_day(story.happened_at),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::raw(story.title.clone()),
    ];
    if story.is_archived {
        spans.push(Span::styled(
            format!(" [{}]", app.messages().archived),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ));
    }
    ListItem::new(Line::from(spans))
}

/// Renders the detail panel for the selected story: title, date, tags
/// resolved through the tag cache, then the body text.
fn render_detail_view(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = matches!(app.focus(), Focus::DetailView);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.messages().detail)
        .border_style(border_style(is_focused, app.theme()));

    let content = match app.selected_story() {
        Some(story) => {
            let mut text = Text::default();
            text.lines.push(Line::from(Span::styled(
                story.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            text.lines.push(Line::from(Span::styled(
                format_day(story.happened_at),
                Style::default().fg(Color::DarkGray),
            )));

            if !story.tag_ids.is_empty() {
                let labels: Vec<String> = story
                    .tag_ids
                    .iter()
                    .map(|id| app.tag_label(*id))
                    .collect();
                text.lines.push(Line::from(labels.join(", ")));
            }

            text.lines.push(Line::from(""));
            for line in story.detail.lines() {
                text.lines.push(Line::from(line.to_string()));
            }
            text
        }
        None => Text::from(app.messages().no_selection),
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll(), 0));

    frame.render_widget(paragraph, area);
}

/// Renders the one-line shortcut bar, with the load-more hint while
/// pages remain.
fn render_shortcut_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut help = app.messages().help.to_string();
    if app.has_more() {
        help.push_str(&format!("  ({})", app.messages().load_more));
    }

    let paragraph = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_colors_follow_the_theme() {
        assert_ne!(accent(Theme::Light), accent(Theme::Dark));
        assert_ne!(highlight_style(Theme::Light), highlight_style(Theme::Dark));
    }

    #[test]
    fn only_the_focused_panel_gets_the_accent_border() {
        for theme in [Theme::Light, Theme::Dark] {
            let focused = border_style(true, theme);
            assert_eq!(focused.fg, Some(accent(theme)));
            assert_eq!(border_style(false, theme), Style::default());
        }
    }

    #[test]
    fn format_day_renders_date_only() {
        // 2022-04-15T05:20:00Z
        assert_eq!(format_day(1_650_000_000_000), "2022-04-15");
        assert_eq!(format_day(0), "1970-01-01");
    }
}
